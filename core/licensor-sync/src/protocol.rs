//! Admin wire protocol.
//!
//! Every admin call is a JSON object POSTed to the backend:
//!
//! ```json
//! {"action": "revoke_license", "secret": "…", "id": "lic_1"}
//! ```
//!
//! Replies are `{"status": "ok", …}` or `{"error": "…"}`. Read actions put
//! their rows under `data`, `sync_admin` returns `licenses`, `requests` and
//! `logs`, and `get_setting` returns `value`.

use licensor_types::{
    ApiLogEntry, FeatureSet, License, LicenseId, LicenseRequest, ModuleDefinition, RequestId,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Error message for a wrong or missing secret.
pub const INVALID_SECRET: &str = "Invalid Secret";

/// Number of log entries returned by `sync_admin`.
pub const SNAPSHOT_LOG_LIMIT: usize = 50;

/// Number of log entries returned by `get_logs`.
pub const LOG_PAGE_LIMIT: usize = 100;

/// An admin action and its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    /// Full snapshot for a pull.
    SyncAdmin,
    GetLicenses,
    GetRequests,
    GetLogs,
    GetModules,
    CreateLicense {
        license: License,
    },
    /// Insert or replace a license by id.
    PushLicense {
        license: License,
    },
    UpdateLicense {
        license: License,
    },
    UpdateLicenseFeatures {
        id: LicenseId,
        features: FeatureSet,
    },
    RevokeLicense {
        id: LicenseId,
    },
    DeleteLicense {
        id: LicenseId,
    },
    CreateRequest {
        request: LicenseRequest,
    },
    UpdateRequest {
        request: LicenseRequest,
    },
    DeleteRequest {
        id: RequestId,
    },
    AddModule {
        module: ModuleDefinition,
    },
    DeleteModule {
        id: String,
    },
    GetSetting {
        key: String,
    },
    SaveSetting {
        key: String,
        value: String,
    },
}

impl AdminAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SyncAdmin => "sync_admin",
            Self::GetLicenses => "get_licenses",
            Self::GetRequests => "get_requests",
            Self::GetLogs => "get_logs",
            Self::GetModules => "get_modules",
            Self::CreateLicense { .. } => "create_license",
            Self::PushLicense { .. } => "push_license",
            Self::UpdateLicense { .. } => "update_license",
            Self::UpdateLicenseFeatures { .. } => "update_license_features",
            Self::RevokeLicense { .. } => "revoke_license",
            Self::DeleteLicense { .. } => "delete_license",
            Self::CreateRequest { .. } => "create_request",
            Self::UpdateRequest { .. } => "update_request",
            Self::DeleteRequest { .. } => "delete_request",
            Self::AddModule { .. } => "add_module",
            Self::DeleteModule { .. } => "delete_module",
            Self::GetSetting { .. } => "get_setting",
            Self::SaveSetting { .. } => "save_setting",
        }
    }

    /// Returns true for actions that change remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::SyncAdmin
                | Self::GetLicenses
                | Self::GetRequests
                | Self::GetLogs
                | Self::GetModules
                | Self::GetSetting { .. }
        )
    }

    /// The license this action changes, if any.
    pub fn license_id(&self) -> Option<&LicenseId> {
        match self {
            Self::CreateLicense { license }
            | Self::PushLicense { license }
            | Self::UpdateLicense { license } => Some(&license.id),
            Self::UpdateLicenseFeatures { id, .. }
            | Self::RevokeLicense { id }
            | Self::DeleteLicense { id } => Some(id),
            _ => None,
        }
    }

    /// The request this action changes, if any.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::CreateRequest { request } | Self::UpdateRequest { request } => Some(&request.id),
            Self::DeleteRequest { id } => Some(id),
            _ => None,
        }
    }
}

/// An action together with the shared secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminEnvelope {
    pub secret: String,
    #[serde(flatten)]
    pub action: AdminAction,
}

impl AdminEnvelope {
    pub fn new(secret: impl Into<String>, action: AdminAction) -> Self {
        Self {
            secret: secret.into(),
            action,
        }
    }
}

/// The `sync_admin` reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub licenses: Vec<License>,
    #[serde(default)]
    pub requests: Vec<LicenseRequest>,
    #[serde(default)]
    pub logs: Vec<ApiLogEntry>,
}

/// Builds `{"status": "ok"}`.
pub fn ok_reply() -> Value {
    json!({ "status": "ok" })
}

/// Builds `{"status": "ok", "data": …}`.
pub fn data_reply(data: impl Serialize) -> Result<Value, serde_json::Error> {
    Ok(json!({ "status": "ok", "data": serde_json::to_value(data)? }))
}

/// Builds the `sync_admin` reply.
pub fn snapshot_reply(snapshot: &Snapshot) -> Result<Value, serde_json::Error> {
    let mut reply = serde_json::to_value(snapshot)?;
    if let Value::Object(map) = &mut reply {
        map.insert("status".to_string(), Value::from("ok"));
    }
    Ok(reply)
}

/// Builds `{"status": "ok", "value": …}`.
pub fn value_reply(value: Option<String>) -> Value {
    json!({ "status": "ok", "value": value })
}

/// Builds `{"error": …}`.
pub fn error_reply(message: impl std::fmt::Display) -> Value {
    json!({ "error": message.to_string() })
}
