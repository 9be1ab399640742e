mod common;

use common::{now, request};
use licensor_license::{
    approve_request, auto_request, default_features, default_valid_until, ContactDetails,
    LicenseDraft, LicenseError, RequestDraft, AUTO_REQUEST_CONTACT, AUTO_REQUEST_NOTE,
};
use licensor_types::{default_catalog, FeatureSet, LicenseStatus};
use pretty_assertions::assert_eq;

fn draft(domain: &str, valid_until: &str) -> LicenseDraft {
    LicenseDraft {
        contact: ContactDetails::new("FF Nordheim", "Max Brand", "max@nordheim.de").with_phone("  "),
        domain: domain.into(),
        valid_until: valid_until.into(),
        features: [("vehicles".to_string(), true)].into_iter().collect(),
        note: Some("Vertrag 2025".into()),
    }
}

#[test]
fn draft_builds_active_license() {
    let license = draft("HTTPS://Nordheim.de:443/portal", "2026-06-01")
        .build("FFW-1111-2222".into(), now())
        .unwrap();

    assert!(license.id.as_str().starts_with("lic_"));
    assert_eq!(license.domain, "nordheim.de");
    assert_eq!(license.key, "FFW-1111-2222");
    assert_eq!(license.status, LicenseStatus::Active);
    assert_eq!(license.phone_number, None);
    assert_eq!(license.created_at, now().to_rfc3339());
    assert!(license.has_feature("vehicles"));
}

#[test]
fn draft_requires_organization() {
    let mut d = draft("nordheim.de", "2026-06-01");
    d.contact.organization = " ".into();
    let err = d.build("FFW-1111-2222".into(), now()).unwrap_err();
    assert!(matches!(err, LicenseError::MissingField("organization")));
}

#[test]
fn draft_rejects_empty_domain() {
    let err = draft("", "2026-06-01").build("FFW-1111-2222".into(), now()).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidDomain(_)));
}

#[test]
fn draft_rejects_past_or_garbage_dates() {
    for date in ["2025-06-01", "2024-12-31", "morgen", ""] {
        let err = draft("nordheim.de", date).build("FFW-1111-2222".into(), now()).unwrap_err();
        assert!(matches!(err, LicenseError::InvalidDate(_)), "{date}");
    }
}

#[test]
fn approval_takes_domain_and_note_from_request() {
    let req = request("req_7", "https://beispielheim.de/");
    let contact = ContactDetails::new("FF Beispielheim e.V.", "Erika Mustermann", "erika@beispielheim.de");
    let features: FeatureSet = [("respiratory".to_string(), true)].into_iter().collect();

    let license =
        approve_request(&req, contact, features, "2026-01-01", "FFW-ABCD-EFGH".into(), now())
            .unwrap();
    assert_eq!(license.domain, "beispielheim.de");
    assert_eq!(license.organization, "FF Beispielheim e.V.");
    assert_eq!(license.note, req.note);
    assert!(license.has_feature("respiratory"));
}

#[test]
fn request_draft_normalizes_domain() {
    let draft = RequestDraft {
        contact: ContactDetails::new("FF Süd", "Anna", "anna@sued.de"),
        requested_domain: "http://Sued.de/".into(),
        note: None,
        custom_message: Some("Wir melden uns.".into()),
    };
    let req = draft.build(now()).unwrap();
    assert!(req.id.as_str().starts_with("req_"));
    assert_eq!(req.requested_domain, "sued.de");
    assert_eq!(req.request_date, now().to_rfc3339());
}

#[test]
fn auto_request_fields() {
    let req = auto_request("ffw-neu.de", now());
    assert_eq!(req.contact_person, AUTO_REQUEST_CONTACT);
    assert_eq!(req.email, "admin@ffw-neu.de");
    assert_eq!(req.note.as_deref(), Some(AUTO_REQUEST_NOTE));
}

#[test]
fn defaults() {
    assert_eq!(default_valid_until(now()), "2026-06-01");

    let features = default_features(&default_catalog());
    assert_eq!(features.len(), 6);
    assert_eq!(features.get("inventory"), Some(&true));
    assert_eq!(features.values().filter(|on| **on).count(), 1);
}

#[test]
fn draft_deserializes_flat_camel_case() {
    let json = r#"{
        "organization": "FF Ost",
        "contactPerson": "Paul",
        "email": "paul@ost.de",
        "domain": "ost.de",
        "validUntil": "2026-01-01"
    }"#;
    let draft: LicenseDraft = serde_json::from_str(json).unwrap();
    assert_eq!(draft.contact.contact_person, "Paul");
    assert!(draft.features.is_empty());
}
