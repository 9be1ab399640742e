//! Core type definitions for Licensor.
//!
//! This crate defines the records shared by the store, the verification
//! engine, the sync engine and the backend endpoint:
//! - Licenses, license requests, module definitions and API log entries
//! - Prefixed string identifiers (`lic_…`, `req_…`, `log_…`)
//! - Domain normalization used for every domain comparison
//!
//! All records serialize with the camelCase field names used on the wire by
//! the admin dashboard and the backend endpoint.

mod catalog;
mod domain;
mod ids;
mod license;
mod log;
mod request;
mod wire;

pub use catalog::{default_catalog, ModuleDefinition};
pub use domain::{is_registrable_domain, normalize_domain, UNKNOWN_DOMAIN};
pub use ids::{LicenseId, LogId, RequestId};
pub use license::{parse_valid_until, FeatureSet, License, LicenseStatus};
pub use log::{ApiLogEntry, LOG_METHOD};
pub use request::LicenseRequest;

/// Well-known setting key holding the remote API URL.
pub const SETTING_API_URL: &str = "apiUrl";

/// Well-known setting key holding the shared admin secret.
pub const SETTING_ADMIN_SECRET: &str = "adminSecret";

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid identifier: {0:?}")]
    InvalidId(String),

    #[error("invalid license status: {0}")]
    InvalidStatus(String),
}
