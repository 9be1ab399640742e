//! Error types for the licensing module.

use licensor_store::StoreError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The domain cannot hold a license or request.
    #[error("invalid domain: {0:?}")]
    InvalidDomain(String),

    /// `validUntil` is neither a date nor an RFC 3339 timestamp.
    #[error("invalid expiry date: {0:?}")]
    InvalidDate(String),

    /// Required field missing or blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// No unused key could be generated.
    #[error("could not generate a unique key after {0} attempts")]
    KeySpaceExhausted(u32),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
