mod common;

use licensor_sync::protocol::{
    data_reply, error_reply, ok_reply, snapshot_reply, value_reply, INVALID_SECRET,
};
use licensor_sync::{AdminAction, AdminEnvelope, Snapshot};
use licensor_types::{LicenseId, LicenseStatus};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn envelope_is_flat() {
    let envelope = AdminEnvelope::new(
        "s3cret",
        AdminAction::RevokeLicense {
            id: LicenseId::parse("lic_1").unwrap(),
        },
    );
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(
        value,
        json!({"secret": "s3cret", "action": "revoke_license", "id": "lic_1"})
    );
}

#[test]
fn unit_actions_carry_only_the_tag() {
    let value = serde_json::to_value(AdminEnvelope::new("x", AdminAction::SyncAdmin)).unwrap();
    assert_eq!(value, json!({"secret": "x", "action": "sync_admin"}));
}

#[test]
fn envelope_parses_dashboard_push() {
    let body = json!({
        "action": "push_license",
        "secret": "123",
        "license": {
            "id": "lic_man_1712",
            "organization": "FF Talheim",
            "contactPerson": "Jana",
            "email": "jana@talheim.de",
            "phoneNumber": "",
            "domain": "talheim.de",
            "key": "FFW-AB12-CD34",
            "validUntil": "2026-01-01",
            "status": "active",
            "features": {"inventory": true},
            "createdAt": "2025-01-01T00:00:00.000Z"
        }
    });
    let envelope: AdminEnvelope = serde_json::from_value(body).unwrap();
    assert_eq!(envelope.secret, "123");
    match envelope.action {
        AdminAction::PushLicense { license } => {
            assert_eq!(license.key, "FFW-AB12-CD34");
            assert!(license.has_feature("inventory"));
        }
        other => panic!("unexpected action {other:?}"),
    }
}

#[test]
fn unknown_action_fails_to_parse() {
    let body = json!({"action": "drop_tables", "secret": "123"});
    assert!(serde_json::from_value::<AdminEnvelope>(body).is_err());
}

#[test]
fn names_match_wire_tags() {
    let actions = [
        AdminAction::SyncAdmin,
        AdminAction::GetLogs,
        AdminAction::DeleteModule { id: "hoses".into() },
        AdminAction::SaveSetting {
            key: "apiUrl".into(),
            value: "https://x".into(),
        },
    ];
    for action in actions {
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["action"], action.name());
    }
}

#[test]
fn mutations() {
    assert!(!AdminAction::SyncAdmin.is_mutation());
    assert!(!AdminAction::GetSetting { key: "apiUrl".into() }.is_mutation());
    assert!(AdminAction::DeleteModule { id: "hoses".into() }.is_mutation());
    assert!(
        AdminAction::SaveSetting {
            key: "apiUrl".into(),
            value: String::new()
        }
        .is_mutation()
    );
}

#[test]
fn snapshot_accepts_php_rows() {
    let reply = json!({
        "status": "ok",
        "licenses": [{
            "id": "lic_1",
            "organization": "FF Talheim",
            "contactPerson": "Jana",
            "email": "jana@talheim.de",
            "phoneNumber": null,
            "domain": "talheim.de",
            "key": "FFW-AB12-CD34",
            "validUntil": "2026-01-01",
            "status": "suspended",
            "features": [],
            "createdAt": "2025-01-01",
            "note": null
        }, {
            "id": "lic_2",
            "organization": null,
            "contactPerson": null,
            "email": null,
            "domain": "bergdorf.de",
            "key": "FFW-ZZ99-YY88",
            "validUntil": null,
            "status": null,
            "features": null,
            "createdAt": null
        }],
        "requests": [{
            "id": "req_1",
            "organization": "FF Au",
            "contactPerson": null,
            "email": null,
            "phoneNumber": null,
            "requestedDomain": "au.de",
            "requestDate": null,
            "note": null,
            "customMessage": null
        }],
        "logs": [{
            "id": "log_1",
            "timestamp": "2025-01-02T10:00:00+00:00",
            "method": "POST",
            "endpoint": "/v1/license/verify",
            "sourceUrl": "talheim.de",
            "providedKey": null,
            "responseStatus": 201,
            "responseBody": "{}"
        }]
    });
    let snapshot: Snapshot = serde_json::from_value(reply).unwrap();
    assert_eq!(snapshot.licenses[0].status, LicenseStatus::Suspended);
    assert!(snapshot.licenses[0].features.is_empty());
    assert_eq!(snapshot.logs[0].provided_key, None);
    assert_eq!(snapshot.logs[0].response_status, 201);

    let sparse = &snapshot.licenses[1];
    assert_eq!(sparse.organization, "");
    assert_eq!(sparse.status, LicenseStatus::Active);
    assert_eq!(sparse.valid_until, "");
    assert!(sparse.features.is_empty());
    assert_eq!(snapshot.requests[0].contact_person, "");
    assert_eq!(snapshot.requests[0].requested_domain, "au.de");
}

#[test]
fn log_rows_tolerate_nulls() {
    let entry: licensor_types::ApiLogEntry = serde_json::from_value(json!({
        "id": "log_9",
        "timestamp": "2025-01-02T10:00:00+00:00",
        "method": null,
        "endpoint": null,
        "sourceUrl": null,
        "responseStatus": 200,
        "responseBody": null
    }))
    .unwrap();
    assert_eq!(entry.method, "POST");
    assert_eq!(entry.source_url, "");
    assert_eq!(entry.response_body, "");
}

#[test]
fn reply_builders() {
    assert_eq!(ok_reply(), json!({"status": "ok"}));
    assert_eq!(data_reply(vec![1, 2]).unwrap(), json!({"status": "ok", "data": [1, 2]}));
    assert_eq!(value_reply(None), json!({"status": "ok", "value": null}));
    assert_eq!(error_reply(INVALID_SECRET), json!({"error": "Invalid Secret"}));

    let snapshot = Snapshot {
        licenses: vec![common::license("lic_1", "talheim.de", "FFW-AB12-CD34")],
        ..Snapshot::default()
    };
    let reply = snapshot_reply(&snapshot).unwrap();
    assert_eq!(reply["status"], "ok");
    assert_eq!(reply["licenses"][0]["key"], "FFW-AB12-CD34");
    let back: Snapshot = serde_json::from_value(reply).unwrap();
    assert_eq!(back, snapshot);
}
