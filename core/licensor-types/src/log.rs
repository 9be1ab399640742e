//! Audit trail of verification calls.

use crate::ids::LogId;
use serde::{Deserialize, Deserializer, Serialize};

/// HTTP method recorded for verification calls.
pub const LOG_METHOD: &str = "POST";

/// One verification call. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLogEntry {
    pub id: LogId,
    /// RFC 3339 timestamp of the call.
    pub timestamp: String,
    #[serde(default = "default_method", deserialize_with = "method_or_default")]
    pub method: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub endpoint: String,
    /// Normalized domain the call came from.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided_key: Option<String>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub response_status: u16,
    /// JSON text of the response body.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub response_body: String,
}

fn default_method() -> String {
    LOG_METHOD.to_string()
}

fn method_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_method))
}
