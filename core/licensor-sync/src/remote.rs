//! Remote backend access.

use crate::error::{SyncError, SyncResult};
use crate::protocol::{AdminAction, AdminEnvelope, Snapshot};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default timeout for one admin call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A remote store the sync engine reconciles with.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches a full snapshot.
    async fn pull(&self) -> SyncResult<Snapshot>;

    /// Sends one mutating action.
    async fn push(&self, action: &AdminAction) -> SyncResult<()>;
}

/// The backend endpoint, reached over HTTP.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    api_url: String,
    secret: String,
}

impl std::fmt::Debug for HttpRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemote")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl HttpRemote {
    /// Creates a client for the endpoint at `api_url`.
    pub fn new(
        api_url: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            secret: secret.into(),
        })
    }

    /// Returns the endpoint URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Sends any admin action and returns the decoded `ok` reply.
    pub async fn call(&self, action: &AdminAction) -> SyncResult<Value> {
        let envelope = AdminEnvelope::new(self.secret.clone(), action.clone());
        debug!("POST {} action={}", self.api_url, action.name());

        let response = self
            .client
            .post(&self.api_url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("{} failed: {e}", action.name())))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Network(format!("failed to read reply: {e}")))?;

        if !is_json {
            let preview: String = text.chars().take(120).collect();
            return Err(SyncError::Protocol(format!(
                "expected JSON from {} (HTTP {}), got: {preview}",
                self.api_url,
                status.as_u16()
            )));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| SyncError::Protocol(format!("invalid JSON reply: {e}")))?;
        let error = body.get("error").and_then(Value::as_str).map(str::to_string);

        if status == StatusCode::FORBIDDEN {
            return Err(SyncError::Auth(error.unwrap_or_else(|| "forbidden".to_string())));
        }
        if let Some(message) = error {
            return Err(SyncError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(SyncError::Remote {
                status: status.as_u16(),
                message: text,
            });
        }
        if body.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(SyncError::Protocol(format!(
                "reply to {} lacks status \"ok\"",
                action.name()
            )));
        }
        Ok(body)
    }

    /// Reads a setting stored on the remote.
    pub async fn get_setting(&self, key: &str) -> SyncResult<Option<String>> {
        let reply = self
            .call(&AdminAction::GetSetting {
                key: key.to_string(),
            })
            .await?;
        Ok(reply.get("value").and_then(Value::as_str).map(str::to_string))
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn pull(&self) -> SyncResult<Snapshot> {
        let reply = self.call(&AdminAction::SyncAdmin).await?;
        let snapshot: Snapshot = serde_json::from_value(reply)?;
        debug!(
            licenses = snapshot.licenses.len(),
            requests = snapshot.requests.len(),
            logs = snapshot.logs.len(),
            "Pulled snapshot"
        );
        Ok(snapshot)
    }

    async fn push(&self, action: &AdminAction) -> SyncResult<()> {
        if !action.is_mutation() {
            return Err(SyncError::Protocol(format!(
                "{} is not a push action",
                action.name()
            )));
        }
        self.call(action).await.map(|_| ())
    }
}
