//! Shared fixtures for store tests.

#![allow(dead_code)]

use licensor_types::{ApiLogEntry, License, LicenseId, LicenseRequest, LicenseStatus, LogId, RequestId};

pub fn sample_license(id: &str, domain: &str, key: &str) -> License {
    License {
        id: LicenseId::parse(id).unwrap(),
        organization: "Berufsfeuerwehr Großstadt".into(),
        contact_person: "Leitstelle".into(),
        email: format!("admin@{domain}"),
        phone_number: Some("+49 30 112233".into()),
        domain: domain.into(),
        key: key.into(),
        valid_until: "2030-12-31".into(),
        status: LicenseStatus::Active,
        features: [("inventory".to_string(), true), ("respiratory".to_string(), true)]
            .into_iter()
            .collect(),
        created_at: "2024-01-15T10:00:00+00:00".into(),
        note: None,
    }
}

pub fn sample_request(id: &str, domain: &str) -> LicenseRequest {
    LicenseRequest {
        id: RequestId::parse(id).unwrap(),
        organization: "Freiwillige Feuerwehr Musterstadt".into(),
        contact_person: "Hans Müller".into(),
        email: format!("h.mueller@{domain}"),
        phone_number: None,
        requested_domain: domain.into(),
        request_date: "2024-03-01T08:00:00+00:00".into(),
        note: Some("Wir benötigen das Modul für Atemschutz.".into()),
        custom_message: None,
    }
}

pub fn sample_log(id: &str, timestamp: &str) -> ApiLogEntry {
    ApiLogEntry {
        id: LogId::parse(id).unwrap(),
        timestamp: timestamp.into(),
        method: "POST".into(),
        endpoint: "/v1/license/verify".into(),
        source_url: "ffw-musterstadt.de".into(),
        provided_key: None,
        response_status: 201,
        response_body: r#"{"status":"requested"}"#.into(),
    }
}
