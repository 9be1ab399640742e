//! Shared fixtures for endpoint tests.

#![allow(dead_code)]

use licensor_server::{AppState, ServerConfig, build_router};
use licensor_store::LicenseStore;
use licensor_types::{License, LicenseId, LicenseRequest, LicenseStatus, RequestId};
use serde_json::{Value, json};
use std::sync::Arc;

pub const SECRET: &str = "s3cret-admin";

pub fn store() -> LicenseStore {
    LicenseStore::open_in_memory().unwrap()
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
pub async fn spawn_test_server(store: LicenseStore) -> String {
    spawn_with_config(store, ServerConfig::new(SECRET)).await
}

pub async fn spawn_with_config(store: LicenseStore, config: ServerConfig) -> String {
    let app = build_router(Arc::new(AppState::new(store, config)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

/// Posts an admin call and returns status and body.
pub async fn admin(base: &str, mut body: Value) -> (u16, Value) {
    if body.get("secret").is_none() {
        body["secret"] = json!(SECRET);
    }
    let resp = reqwest::Client::new()
        .post(base)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

pub fn license(id: &str, domain: &str, key: &str) -> License {
    License {
        id: LicenseId::parse(id).unwrap(),
        organization: "FF Talheim".into(),
        contact_person: "Jana Kraft".into(),
        email: format!("jana@{domain}"),
        phone_number: None,
        domain: domain.into(),
        key: key.into(),
        valid_until: "2099-12-31".into(),
        status: LicenseStatus::Active,
        features: [
            ("inventory".to_string(), true),
            ("vehicles".to_string(), true),
            ("hoses".to_string(), false),
        ]
        .into_iter()
        .collect(),
        created_at: "2025-02-01T10:00:00+00:00".into(),
        note: None,
    }
}

pub fn request(id: &str, domain: &str) -> LicenseRequest {
    LicenseRequest {
        id: RequestId::parse(id).unwrap(),
        organization: "FF Bergdorf".into(),
        contact_person: "Tom Berg".into(),
        email: format!("tom@{domain}"),
        phone_number: None,
        requested_domain: domain.into(),
        request_date: "2025-03-01T08:00:00+00:00".into(),
        note: None,
        custom_message: None,
    }
}
