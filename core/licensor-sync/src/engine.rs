//! Pull-merge sync with a push outbox.
//!
//! Local mutations are pushed to the remote right away. Pushes that fail
//! are queued in the store's outbox and replayed, oldest first, at the
//! start of the next sync before the snapshot is pulled and merged. Rows
//! whose changes are still queued after the replay are left out of the merge.

use crate::error::{SyncError, SyncResult};
use crate::protocol::{AdminAction, Snapshot};
use crate::remote::{HttpRemote, RemoteStore, DEFAULT_TIMEOUT};
use chrono::{DateTime, Utc};
use licensor_store::{LicenseStore, MergeReport};
use licensor_types::{SETTING_ADMIN_SECRET, SETTING_API_URL};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default interval of the background sync.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Sync configuration.
///
/// Unset values fall back to the `apiUrl` and `adminSecret` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api_url: Option<String>,
    pub secret: Option<String>,
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            secret: None,
            interval: DEFAULT_SYNC_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SyncConfig {
    /// Resolves the API URL and secret, consulting the settings table for
    /// anything not set explicitly.
    pub fn resolve(&self, store: &LicenseStore) -> SyncResult<(String, String)> {
        let api_url = match self.api_url.clone().filter(|u| !u.trim().is_empty()) {
            Some(url) => url,
            None => store
                .get_setting(SETTING_API_URL)?
                .filter(|u| !u.trim().is_empty())
                .ok_or(SyncError::NotConfigured(SETTING_API_URL))?,
        };
        let secret = match self.secret.clone().filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => store
                .get_setting(SETTING_ADMIN_SECRET)?
                .filter(|s| !s.is_empty())
                .ok_or(SyncError::NotConfigured(SETTING_ADMIN_SECRET))?,
        };
        Ok((api_url, secret))
    }

    /// Builds an HTTP remote from the resolved configuration.
    pub fn connect(&self, store: &LicenseStore) -> SyncResult<HttpRemote> {
        let (api_url, secret) = self.resolve(store)?;
        HttpRemote::new(api_url, secret, self.timeout)
    }
}

/// Outcome of replaying the outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Queued pushes delivered.
    pub delivered: usize,
    /// Queued pushes the remote rejected for good and that were dropped.
    pub dropped: usize,
    /// Pushes still queued.
    pub remaining: usize,
}

/// Outcome of one sync round.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub flush: FlushReport,
    pub merge: MergeReport,
    /// Snapshot rows skipped because local changes to them are still queued.
    pub held_back: usize,
    pub finished_at: DateTime<Utc>,
}

/// What happened to a pushed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The remote accepted it.
    Delivered,
    /// It sits in the outbox for the next sync.
    Queued,
}

/// Reconciles the local store with a remote.
#[derive(Clone)]
pub struct SyncEngine {
    store: LicenseStore,
    remote: Arc<dyn RemoteStore>,
}

impl SyncEngine {
    pub fn new(store: LicenseStore, remote: Arc<dyn RemoteStore>) -> Self {
        Self { store, remote }
    }

    /// Connects to the remote described by `config`.
    pub fn from_config(store: LicenseStore, config: &SyncConfig) -> SyncResult<Self> {
        let remote = config.connect(&store)?;
        info!("Syncing with {}", remote.api_url());
        Ok(Self::new(store, Arc::new(remote)))
    }

    pub fn store(&self) -> &LicenseStore {
        &self.store
    }

    /// Replays the outbox, then pulls and merges a snapshot.
    pub async fn sync_once(&self) -> SyncResult<SyncReport> {
        let flush = self.flush_outbox().await?;
        let mut snapshot = self.remote.pull().await?;
        let held_back = self.hold_back_pending(&mut snapshot)?;
        if held_back > 0 {
            debug!("Held back {} rows with queued local changes", held_back);
        }
        let merge =
            self.store
                .merge_snapshot(&snapshot.licenses, &snapshot.requests, &snapshot.logs)?;

        if merge.changed() {
            info!(
                "Sync merged {} new and {} updated licenses, {} new and {} updated requests, {} log entries",
                merge.licenses.inserted,
                merge.licenses.updated,
                merge.requests.inserted,
                merge.requests.updated,
                merge.logs_added
            );
        } else {
            debug!("Sync found nothing new");
        }

        Ok(SyncReport {
            flush,
            merge,
            held_back,
            finished_at: Utc::now(),
        })
    }

    /// Removes snapshot rows that still have local changes in the outbox.
    ///
    /// Those rows are older than the local state, so merging them would undo
    /// the queued change.
    fn hold_back_pending(&self, snapshot: &mut Snapshot) -> SyncResult<usize> {
        let pending = self.store.pending_pushes()?;
        if pending.is_empty() {
            return Ok(0);
        }

        let mut licenses = HashSet::new();
        let mut requests = HashSet::new();
        for entry in &pending {
            let Ok(action) = serde_json::from_value::<AdminAction>(entry.payload.clone()) else {
                continue;
            };
            if let Some(id) = action.license_id() {
                licenses.insert(id.clone());
            }
            if let Some(id) = action.request_id() {
                requests.insert(id.clone());
            }
        }

        let before = snapshot.licenses.len() + snapshot.requests.len();
        snapshot.licenses.retain(|l| !licenses.contains(&l.id));
        snapshot.requests.retain(|r| !requests.contains(&r.id));
        Ok(before - snapshot.licenses.len() - snapshot.requests.len())
    }

    /// Pushes an action, queueing it if the remote cannot take it now.
    ///
    /// While older pushes are queued, new ones are queued behind them so the
    /// remote sees mutations in order.
    pub async fn push(&self, action: AdminAction) -> SyncResult<PushOutcome> {
        if !action.is_mutation() {
            return Err(SyncError::Protocol(format!(
                "{} is not a push action",
                action.name()
            )));
        }

        let payload = serde_json::to_value(&action)?;
        if !self.store.pending_pushes()?.is_empty() {
            self.store
                .enqueue_push(action.name(), &payload, "queued behind earlier pushes")?;
            return Ok(PushOutcome::Queued);
        }

        match self.remote.push(&action).await {
            Ok(()) => Ok(PushOutcome::Delivered),
            Err(e) => {
                warn!("Push of {} failed, queued for retry: {}", action.name(), e);
                self.store
                    .enqueue_push(action.name(), &payload, &e.to_string())?;
                Ok(PushOutcome::Queued)
            }
        }
    }

    /// Replays queued pushes oldest first, stopping at the first retryable failure.
    pub async fn flush_outbox(&self) -> SyncResult<FlushReport> {
        let queued = self.store.pending_pushes()?;
        let mut report = FlushReport::default();

        for (idx, entry) in queued.iter().enumerate() {
            let action: AdminAction = match serde_json::from_value(entry.payload.clone()) {
                Ok(action) => action,
                Err(e) => {
                    warn!("Dropping unreadable queued push {}: {}", entry.id, e);
                    self.store.remove_push(entry.id)?;
                    report.dropped += 1;
                    continue;
                }
            };

            match self.remote.push(&action).await {
                Ok(()) => {
                    self.store.remove_push(entry.id)?;
                    report.delivered += 1;
                }
                Err(e) if e.is_retryable() => {
                    self.store.record_push_failure(entry.id, &e.to_string())?;
                    report.remaining = queued.len() - idx;
                    warn!(
                        "Outbox flush stopped at {} ({} left): {}",
                        entry.action, report.remaining, e
                    );
                    return Ok(report);
                }
                Err(e) => {
                    warn!("Remote rejected queued {}, dropping it: {}", entry.action, e);
                    self.store.remove_push(entry.id)?;
                    report.dropped += 1;
                }
            }
        }

        if report.delivered > 0 {
            info!("Delivered {} queued pushes", report.delivered);
        }
        Ok(report)
    }
}
