mod common;

use common::{license, now, request, store};
use licensor_license::{
    Verifier, VerifierConfig, VerifyResponse, VerifyStatus, AUTO_REQUEST_MESSAGE,
    AUTO_REQUEST_ORGANIZATION, ERR_DOMAIN_MISMATCH, ERR_INVALID_DOMAIN, ERR_INVALID_KEY,
    ERR_REGISTRATION_CLOSED, ERR_SUSPENDED, MSG_DOMAIN_MATCH, MSG_PENDING, VERIFY_ENDPOINT,
};
use licensor_types::LicenseStatus;
use pretty_assertions::assert_eq;

fn grant(body: &VerifyResponse) -> &licensor_license::LicenseGrant {
    match body {
        VerifyResponse::License(grant) => grant,
        other => panic!("expected a license body, got {other:?}"),
    }
}

fn notice(body: &VerifyResponse) -> &licensor_license::RequestNotice {
    match body {
        VerifyResponse::Request(notice) => notice,
        other => panic!("expected a request body, got {other:?}"),
    }
}

// ── No key ───────────────────────────────────────────────────────

#[test]
fn unknown_domain_registers_request() {
    let store = store();
    let verifier = Verifier::new(store.clone());

    let result = verifier.verify("https://ffw-neu.de/app", None, now()).unwrap();
    assert_eq!(result.status_code, 201);
    let notice = notice(&result.body);
    assert_eq!(notice.status, VerifyStatus::Requested);

    let stored = store.get_request(&notice.request_id).unwrap().unwrap();
    assert_eq!(stored.requested_domain, "ffw-neu.de");
    assert_eq!(stored.organization, AUTO_REQUEST_ORGANIZATION);
    assert_eq!(stored.email, "admin@ffw-neu.de");
    assert_eq!(stored.custom_message.as_deref(), Some(AUTO_REQUEST_MESSAGE));
}

#[test]
fn second_call_reports_pending() {
    let store = store();
    let verifier = Verifier::new(store.clone());

    let first = verifier.verify("ffw-neu.de", None, now()).unwrap();
    let second = verifier.verify("https://FFW-NEU.de:8443", None, now()).unwrap();

    assert_eq!(second.status_code, 200);
    let pending = notice(&second.body);
    assert_eq!(pending.status, VerifyStatus::Pending);
    assert_eq!(pending.message, AUTO_REQUEST_MESSAGE);
    assert_eq!(pending.request_id, notice(&first.body).request_id);
    assert_eq!(store.list_requests().unwrap().len(), 1);
}

#[test]
fn pending_without_custom_message_uses_default() {
    let store = store();
    store.insert_request(&request("req_1", "ffw-wartet.de")).unwrap();

    let result = Verifier::new(store).verify("ffw-wartet.de", None, now()).unwrap();
    let pending = notice(&result.body);
    assert_eq!(pending.status, VerifyStatus::Pending);
    assert_eq!(pending.message, MSG_PENDING);
}

#[test]
fn www_prefix_is_a_different_domain() {
    let store = store();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2025-06-11"))
        .unwrap();

    let result = Verifier::new(store).verify("https://www.ffw-alt.de/login", None, now());
    // www. is part of the host and must not match
    assert_eq!(result.unwrap().status_code, 201);
}

#[test]
fn domain_match_returns_active_license() {
    let store = store();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2025-06-11"))
        .unwrap();

    let result = Verifier::new(store).verify("http://FFW-ALT.de:8080/x", None, now()).unwrap();
    assert_eq!(result.status_code, 200);
    let grant = grant(&result.body);
    assert_eq!(grant.status, VerifyStatus::Active);
    assert_eq!(grant.message.as_deref(), Some(MSG_DOMAIN_MATCH));
    assert_eq!(grant.key.as_deref(), Some("FFW-AAAA-BBBB"));
    assert_eq!(grant.valid_until, "2025-06-11");
    assert_eq!(grant.days_remaining, 9);
    assert_eq!(grant.modules.len(), 6);
    assert_eq!(grant.modules[0].technical_name, "inventory");
    assert!(grant.modules[0].active);
    let hoses = grant.modules.iter().find(|m| m.technical_name == "hoses").unwrap();
    assert!(!hoses.active);
    assert_eq!(grant.features.get("respiratory"), Some(&true));
}

#[test]
fn domain_match_on_expired_license() {
    let store = store();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2025-01-01"))
        .unwrap();

    let result = Verifier::new(store).verify("ffw-alt.de", None, now()).unwrap();
    assert_eq!(result.status_code, 200);
    let grant = grant(&result.body);
    assert_eq!(grant.status, VerifyStatus::Expired);
    assert_eq!(grant.key.as_deref(), Some("FFW-AAAA-BBBB"));
    assert_eq!(grant.days_remaining, 0);
    assert!(grant.features.is_empty());
    assert_module_flags_match_license(&grant);
}

fn assert_module_flags_match_license(grant: &licensor_license::LicenseGrant) {
    let active: Vec<&str> = grant
        .modules
        .iter()
        .filter(|m| m.active)
        .map(|m| m.technical_name.as_str())
        .collect();
    assert_eq!(active, vec!["inventory", "respiratory"]);
}

#[test]
fn domain_match_on_suspended_license_hides_key() {
    let store = store();
    let mut lic = license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2026-01-01");
    lic.status = LicenseStatus::Suspended;
    store.insert_license(&lic).unwrap();

    let result = Verifier::new(store).verify("ffw-alt.de", None, now()).unwrap();
    assert_eq!(result.status_code, 200);
    let grant = grant(&result.body);
    assert_eq!(grant.status, VerifyStatus::Suspended);
    assert_eq!(grant.key, None);
    assert!(grant.features.is_empty());
    assert!(grant.modules.iter().all(|m| !m.active));
}

#[test]
fn missing_origin_is_rejected() {
    let store = store();
    let result = Verifier::new(store.clone()).verify("", None, now()).unwrap();
    assert_eq!(result.status_code, 400);
    assert_eq!(result.body.error_message(), Some(ERR_INVALID_DOMAIN));
    assert!(store.list_requests().unwrap().is_empty());
    assert_eq!(result.log.source_url, "unknown");
}

#[test]
fn auto_register_can_be_disabled() {
    let store = store();
    let config = VerifierConfig {
        auto_register: false,
        ..VerifierConfig::default()
    };
    let result = Verifier::with_config(store.clone(), config)
        .verify("ffw-neu.de", None, now())
        .unwrap();
    assert_eq!(result.status_code, 403);
    assert_eq!(result.body.error_message(), Some(ERR_REGISTRATION_CLOSED));
    assert!(store.list_requests().unwrap().is_empty());
}

#[test]
fn blank_key_counts_as_no_key() {
    let store = store();
    let result = Verifier::new(store).verify("ffw-neu.de", Some("   "), now()).unwrap();
    assert_eq!(result.status_code, 201);
    assert_eq!(result.log.provided_key, None);
}

// ── With key ─────────────────────────────────────────────────────

#[test]
fn unknown_key_is_rejected() {
    let store = store();
    let result = Verifier::new(store).verify("ffw-alt.de", Some("FFW-NOPE-NOPE"), now()).unwrap();
    assert_eq!(result.status_code, 403);
    assert_eq!(result.body.error_message(), Some(ERR_INVALID_KEY));
}

#[test]
fn key_from_other_domain_is_rejected() {
    let store = store();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2026-01-01"))
        .unwrap();
    let result = Verifier::new(store)
        .verify("https://evil.example", Some("FFW-AAAA-BBBB"), now())
        .unwrap();
    assert_eq!(result.status_code, 403);
    assert_eq!(result.body.error_message(), Some(ERR_DOMAIN_MISMATCH));
}

#[test]
fn suspended_key_is_rejected() {
    let store = store();
    let mut lic = license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2026-01-01");
    lic.status = LicenseStatus::Suspended;
    store.insert_license(&lic).unwrap();

    let result = Verifier::new(store)
        .verify("ffw-alt.de", Some("FFW-AAAA-BBBB"), now())
        .unwrap();
    assert_eq!(result.status_code, 403);
    assert_eq!(result.body.error_message(), Some(ERR_SUSPENDED));
}

#[test]
fn valid_key_returns_features() {
    let store = store();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2025-06-11"))
        .unwrap();

    let result = Verifier::new(store)
        .verify("https://ffw-alt.de/", Some(" FFW-AAAA-BBBB "), now())
        .unwrap();
    assert_eq!(result.status_code, 200);
    let grant = grant(&result.body);
    assert_eq!(grant.status, VerifyStatus::Valid);
    assert_eq!(grant.key, None);
    assert_eq!(grant.message, None);
    assert_eq!(grant.days_remaining, 9);
    assert_eq!(grant.features.get("inventory"), Some(&true));
}

#[test]
fn expired_key_returns_empty_features() {
    let store = store();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2025-05-31T23:59:59Z"))
        .unwrap();

    let result = Verifier::new(store)
        .verify("ffw-alt.de", Some("FFW-AAAA-BBBB"), now())
        .unwrap();
    assert_eq!(result.status_code, 200);
    let grant = grant(&result.body);
    assert_eq!(grant.status, VerifyStatus::Expired);
    assert!(grant.features.is_empty());
    assert_module_flags_match_license(&grant);
}

// ── Logging and wire shape ───────────────────────────────────────

#[test]
fn every_call_is_logged() {
    let store = store();
    let verifier = Verifier::new(store.clone());
    verifier.verify("ffw-neu.de", None, now()).unwrap();
    verifier.verify("ffw-neu.de", Some("FFW-NOPE-NOPE"), now()).unwrap();

    let logs = store.list_logs(10).unwrap();
    assert_eq!(logs.len(), 2);
    let rejected = logs.iter().find(|l| l.response_status == 403).unwrap();
    assert_eq!(rejected.provided_key.as_deref(), Some("FFW-NOPE-NOPE"));
    assert_eq!(rejected.endpoint, VERIFY_ENDPOINT);
    assert_eq!(rejected.source_url, "ffw-neu.de");
    assert!(rejected.response_body.contains(ERR_INVALID_KEY));
}

#[test]
fn grant_serializes_camel_case() {
    let store = store();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2025-06-11"))
        .unwrap();
    let result = Verifier::new(store).verify("ffw-alt.de", None, now()).unwrap();

    let json = serde_json::to_value(&result.body).unwrap();
    assert_eq!(json["status"], "active");
    assert_eq!(json["validUntil"], "2025-06-11");
    assert_eq!(json["daysRemaining"], 9);
    assert_eq!(json["modules"][0]["technicalName"], "inventory");
    assert_eq!(json["modules"][0]["iconName"], "Server");

    let back: VerifyResponse = serde_json::from_value(json).unwrap();
    assert_eq!(back, result.body);
}

#[test]
fn unreadable_license_row_is_logged_as_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licenses.sqlite");
    let store = licensor_store::LicenseStore::open(&path).unwrap();
    store
        .insert_license(&license("lic_1", "ffw-alt.de", "FFW-AAAA-BBBB", "2025-06-11"))
        .unwrap();
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute("UPDATE licenses SET features = '{broken' WHERE id = 'lic_1'", [])
        .unwrap();

    let result = Verifier::new(store.clone()).verify("ffw-alt.de", None, now());
    assert!(result.is_err());

    let logs = store.list_logs(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].response_status, 500);
    assert_eq!(logs[0].source_url, "ffw-alt.de");
    assert!(logs[0].response_body.contains("error"));
}
