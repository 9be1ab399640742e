//! Shared fixtures for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use licensor_store::LicenseStore;
use licensor_types::{License, LicenseId, LicenseRequest, LicenseStatus, RequestId};

/// Fixed clock: 2025-06-01 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn store() -> LicenseStore {
    LicenseStore::open_in_memory().unwrap()
}

pub fn license(id: &str, domain: &str, key: &str, valid_until: &str) -> License {
    License {
        id: LicenseId::parse(id).unwrap(),
        organization: "Feuerwehr Musterstadt".into(),
        contact_person: "Kommandant".into(),
        email: format!("info@{domain}"),
        phone_number: None,
        domain: domain.into(),
        key: key.into(),
        valid_until: valid_until.into(),
        status: LicenseStatus::Active,
        features: [
            ("inventory".to_string(), true),
            ("respiratory".to_string(), true),
            ("hoses".to_string(), false),
        ]
        .into_iter()
        .collect(),
        created_at: "2024-01-01T00:00:00+00:00".into(),
        note: None,
    }
}

pub fn request(id: &str, domain: &str) -> LicenseRequest {
    LicenseRequest {
        id: RequestId::parse(id).unwrap(),
        organization: "FF Beispielheim".into(),
        contact_person: "Erika Mustermann".into(),
        email: format!("erika@{domain}"),
        phone_number: Some("0123 456".into()),
        requested_domain: domain.into(),
        request_date: "2025-05-30T09:00:00+00:00".into(),
        note: Some("Bitte mit Atemschutz".into()),
        custom_message: None,
    }
}
