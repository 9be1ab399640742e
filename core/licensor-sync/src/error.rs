//! Error types for the sync layer.

use licensor_license::LicenseError;
use licensor_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error, including timeouts.
    #[error("network error: {0}")]
    Network(String),

    /// Protocol error (non-JSON reply, unexpected shape).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote rejected the admin secret.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The remote answered with an error body.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Local storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Licensing error.
    #[error("license error: {0}")]
    License(#[from] LicenseError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No API URL or secret available.
    #[error("sync is not configured: missing {0}")]
    NotConfigured(&'static str),

    /// The scheduler task is gone.
    #[error("channel closed")]
    ChannelClosed,
}

impl SyncError {
    /// Returns true if retrying the same call later may succeed.
    ///
    /// A remote that rejected a payload with a client error will reject it
    /// again, so those are not retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Auth(_) | Self::Protocol(_) | Self::ChannelClosed => true,
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
