//! Admin actions.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use licensor_store::{LicenseStore, StoreError};
use licensor_sync::protocol::{
    INVALID_SECRET, LOG_PAGE_LIMIT, SNAPSHOT_LOG_LIMIT, data_reply, error_reply, ok_reply,
    snapshot_reply, value_reply,
};
use licensor_sync::{AdminAction, AdminEnvelope, Snapshot};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::AppState;

/// Failure of an admin call, mapped onto an HTTP status.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminError {
    /// Wrong or missing secret.
    Forbidden,
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl AdminError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Forbidden => INVALID_SECRET,
            Self::BadRequest(m) | Self::NotFound(m) | Self::Internal(m) => m,
        }
    }
}

impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(format!("Not found: {what}")),
            StoreError::Conflict(what) => Self::BadRequest(format!("Already exists: {what}")),
            StoreError::InvalidData(what) => Self::BadRequest(what),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        if let Self::Internal(message) = &self {
            error!("Admin action failed: {}", message);
        }
        (self.status(), Json(error_reply(self.message()))).into_response()
    }
}

/// Executes one admin action against the store.
pub fn dispatch(store: &LicenseStore, action: AdminAction) -> Result<Value, AdminError> {
    let reply = match action {
        AdminAction::SyncAdmin => snapshot_reply(&Snapshot {
            licenses: store.list_licenses()?,
            requests: store.list_requests()?,
            logs: store.list_logs(SNAPSHOT_LOG_LIMIT)?,
        })?,
        AdminAction::GetLicenses => data_reply(store.list_licenses()?)?,
        AdminAction::GetRequests => data_reply(store.list_requests()?)?,
        AdminAction::GetLogs => data_reply(store.list_logs(LOG_PAGE_LIMIT)?)?,
        AdminAction::GetModules => data_reply(store.list_modules()?)?,
        AdminAction::CreateLicense { license } => {
            store.insert_license(&license)?;
            ok_reply()
        }
        AdminAction::PushLicense { license } => {
            store.upsert_license(&license)?;
            ok_reply()
        }
        AdminAction::UpdateLicense { license } => {
            store.update_license(&license)?;
            ok_reply()
        }
        AdminAction::UpdateLicenseFeatures { id, features } => {
            store.update_license_features(&id, &features)?;
            ok_reply()
        }
        AdminAction::RevokeLicense { id } => {
            store.revoke_license(&id)?;
            ok_reply()
        }
        AdminAction::DeleteLicense { id } => {
            store.delete_license(&id)?;
            ok_reply()
        }
        AdminAction::CreateRequest { request } => {
            store.insert_request(&request)?;
            ok_reply()
        }
        AdminAction::UpdateRequest { request } => {
            store.update_request(&request)?;
            ok_reply()
        }
        AdminAction::DeleteRequest { id } => {
            store.delete_request(&id)?;
            ok_reply()
        }
        AdminAction::AddModule { module } => match store.add_module(&module) {
            Ok(()) => ok_reply(),
            Err(StoreError::Conflict(_)) => {
                return Err(AdminError::BadRequest("Module ID already exists".to_string()));
            }
            Err(e) => return Err(e.into()),
        },
        AdminAction::DeleteModule { id } => {
            store.delete_module(&id)?;
            ok_reply()
        }
        AdminAction::GetSetting { key } => value_reply(store.get_setting(&key)?),
        AdminAction::SaveSetting { key, value } => {
            store.save_setting(&key, &value)?;
            ok_reply()
        }
    };
    Ok(reply)
}

/// Authenticates and runs an admin call.
pub(crate) async fn handle(state: Arc<AppState>, input: Value) -> Response {
    let provided = input.get("secret").and_then(Value::as_str).unwrap_or_default();
    if !state.secret_matches(provided) {
        warn!("Rejected admin call with invalid secret");
        return AdminError::Forbidden.into_response();
    }

    let envelope: AdminEnvelope = match serde_json::from_value(input) {
        Ok(envelope) => envelope,
        Err(e) => {
            return AdminError::BadRequest(format!("Malformed admin request: {e}")).into_response();
        }
    };

    let name = envelope.action.name();
    debug!("Admin action {}", name);
    let store = state.store().clone();
    match tokio::task::spawn_blocking(move || dispatch(&store, envelope.action)).await {
        Ok(Ok(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(Err(e)) => {
            debug!("Admin action {} failed: {}", name, e.message());
            e.into_response()
        }
        Err(e) => AdminError::Internal(e.to_string()).into_response(),
    }
}
