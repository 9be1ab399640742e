//! HTTP backend for Licensor.
//!
//! One endpoint serves both audiences. A JSON body carrying an `action`
//! field is an admin call and must carry the shared secret; anything else is
//! a public verification call from an installation, identified by its
//! `Origin` (or `Referer`) header.

mod admin;
mod verify;

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use licensor_license::{VERIFY_ENDPOINT, Verifier, VerifierConfig};
use licensor_store::{LicenseStore, StoreStats};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

pub use admin::{AdminError, dispatch};

/// Backend settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Shared secret expected in admin calls.
    pub admin_secret: String,
    pub verifier: VerifierConfig,
}

impl ServerConfig {
    pub fn new(admin_secret: impl Into<String>) -> Self {
        Self {
            admin_secret: admin_secret.into(),
            verifier: VerifierConfig::default(),
        }
    }
}

/// State shared by all handlers.
pub struct AppState {
    store: LicenseStore,
    verifier: Verifier,
    secret_digest: [u8; 32],
}

impl AppState {
    pub fn new(store: LicenseStore, config: ServerConfig) -> Self {
        Self {
            verifier: Verifier::with_config(store.clone(), config.verifier),
            store,
            secret_digest: digest(&config.admin_secret),
        }
    }

    pub fn store(&self) -> &LicenseStore {
        &self.store
    }

    /// Compares digests so the comparison does not depend on secret length.
    pub fn secret_matches(&self, provided: &str) -> bool {
        digest(provided) == self.secret_digest
    }

    /// Short hex fingerprint of the configured secret, safe to log.
    pub fn secret_fingerprint(&self) -> String {
        hex::encode(&self.secret_digest[..4])
    }
}

fn digest(secret: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(secret.as_bytes()));
    out
}

/// Reachability report.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub stats: StoreStats,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || store.stats()).await {
        Ok(Ok(stats)) => Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: state.store.location().to_string(),
            stats,
        })
        .into_response(),
        Ok(Err(e)) => internal_error(e),
        Err(e) => internal_error(e),
    }
}

async fn root_get_handler(
    state: State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if query.contains_key("health") {
        return health_handler(state).await;
    }
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not Found" })),
    )
        .into_response()
}

/// Entry point for `POST /` and `POST /v1/license/verify`.
async fn entry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let input: Option<Value> = serde_json::from_slice(&body).ok();
    match input {
        Some(input) if input.get("action").is_some() => admin::handle(state, input).await,
        input => {
            let key = input
                .as_ref()
                .and_then(|v| v.get("key"))
                .and_then(Value::as_str)
                .map(str::to_string);
            verify::handle(state, request_origin(&headers), key).await
        }
    }
}

/// `Origin`, falling back to `Referer`, or empty.
fn request_origin(headers: &HeaderMap) -> String {
    [header::ORIGIN, header::REFERER]
        .iter()
        .find_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
        .unwrap_or_default()
        .to_string()
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

/// Build the HTTP router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ORIGIN,
            HeaderName::from_static("x-auth-token"),
        ]);

    Router::new()
        .route("/", get(root_get_handler).post(entry_handler))
        .route(VERIFY_ENDPOINT, post(entry_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}
