//! Builders for new licenses and requests.
//!
//! These only assemble records; persisting and pushing them is the caller's
//! job (see the admin console in `licensor-sync`).

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Months, Utc};
use licensor_types::{
    is_registrable_domain, normalize_domain, parse_valid_until, FeatureSet, License, LicenseId,
    LicenseRequest, LicenseStatus, ModuleDefinition, RequestId,
};
use serde::{Deserialize, Serialize};

pub const AUTO_REQUEST_ORGANIZATION: &str = "Unbekannt (Auto-Request)";
pub const AUTO_REQUEST_CONTACT: &str = "System Admin";
pub const AUTO_REQUEST_NOTE: &str = "Automatische Anfrage von Installation";
pub const AUTO_REQUEST_MESSAGE: &str =
    "Ihre Registrierungsanfrage wird bearbeitet. Bitte warten Sie auf die Freigabe.";

/// Module enabled on new licenses unless the admin picks otherwise.
pub const BASE_MODULE: &str = "inventory";

/// Contact block shared by licenses and requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub organization: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl ContactDetails {
    pub fn new(
        organization: impl Into<String>,
        contact_person: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            contact_person: contact_person.into(),
            email: email.into(),
            phone_number: None,
        }
    }

    /// Sets the phone number; blank values clear it.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        let phone = phone.into();
        self.phone_number = (!phone.trim().is_empty()).then_some(phone);
        self
    }
}

/// A manually created license before it gets an id and a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseDraft {
    #[serde(flatten)]
    pub contact: ContactDetails,
    pub domain: String,
    pub valid_until: String,
    #[serde(default)]
    pub features: FeatureSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LicenseDraft {
    /// Builds an active license with the given key.
    ///
    /// The organization must be set, the domain must normalize to something
    /// registrable and `validUntil` must lie after `now`.
    pub fn build(self, key: String, now: DateTime<Utc>) -> LicenseResult<License> {
        if self.contact.organization.trim().is_empty() {
            return Err(LicenseError::MissingField("organization"));
        }
        let domain = normalize_domain(&self.domain);
        if !is_registrable_domain(&domain) {
            return Err(LicenseError::InvalidDomain(self.domain));
        }
        check_valid_until(&self.valid_until, now)?;

        Ok(License {
            id: LicenseId::new(),
            organization: self.contact.organization,
            contact_person: self.contact.contact_person,
            email: self.contact.email,
            phone_number: self.contact.phone_number,
            domain,
            key,
            valid_until: self.valid_until,
            status: LicenseStatus::Active,
            features: self.features,
            created_at: now.to_rfc3339(),
            note: self.note.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Turns a pending request into an active license.
///
/// The domain comes from the request; the contact block may have been
/// corrected by the admin during review.
pub fn approve_request(
    request: &LicenseRequest,
    contact: ContactDetails,
    features: FeatureSet,
    valid_until: impl Into<String>,
    key: String,
    now: DateTime<Utc>,
) -> LicenseResult<License> {
    LicenseDraft {
        contact,
        domain: request.requested_domain.clone(),
        valid_until: valid_until.into(),
        features,
        note: request.note.clone(),
    }
    .build(key, now)
}

/// A manually entered request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDraft {
    #[serde(flatten)]
    pub contact: ContactDetails,
    pub requested_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

impl RequestDraft {
    pub fn build(self, now: DateTime<Utc>) -> LicenseResult<LicenseRequest> {
        let domain = normalize_domain(&self.requested_domain);
        if !is_registrable_domain(&domain) {
            return Err(LicenseError::InvalidDomain(self.requested_domain));
        }
        Ok(LicenseRequest {
            id: RequestId::new(),
            organization: self.contact.organization,
            contact_person: self.contact.contact_person,
            email: self.contact.email,
            phone_number: self.contact.phone_number,
            requested_domain: domain,
            request_date: now.to_rfc3339(),
            note: self.note,
            custom_message: self.custom_message,
        })
    }
}

/// The request registered when an unknown domain calls without a key.
#[must_use]
pub fn auto_request(domain: &str, now: DateTime<Utc>) -> LicenseRequest {
    LicenseRequest {
        id: RequestId::new(),
        organization: AUTO_REQUEST_ORGANIZATION.to_string(),
        contact_person: AUTO_REQUEST_CONTACT.to_string(),
        email: format!("admin@{domain}"),
        phone_number: None,
        requested_domain: domain.to_string(),
        request_date: now.to_rfc3339(),
        note: Some(AUTO_REQUEST_NOTE.to_string()),
        custom_message: Some(AUTO_REQUEST_MESSAGE.to_string()),
    }
}

/// One year from `now`, as a plain date.
#[must_use]
pub fn default_valid_until(now: DateTime<Utc>) -> String {
    let until = now.checked_add_months(Months::new(12)).unwrap_or(now);
    until.format("%Y-%m-%d").to_string()
}

/// Feature set with every catalog module present and only the base module on.
#[must_use]
pub fn default_features(catalog: &[ModuleDefinition]) -> FeatureSet {
    catalog
        .iter()
        .map(|m| (m.id.clone(), m.id == BASE_MODULE))
        .collect()
}

fn check_valid_until(value: &str, now: DateTime<Utc>) -> LicenseResult<()> {
    match parse_valid_until(value) {
        Some(until) if until > now => Ok(()),
        _ => Err(LicenseError::InvalidDate(value.to_string())),
    }
}
