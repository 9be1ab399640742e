//! Shared fixtures for sync tests.

#![allow(dead_code)]

use async_trait::async_trait;
use licensor_store::LicenseStore;
use licensor_sync::{AdminAction, RemoteStore, Snapshot, SyncError, SyncResult};
use licensor_types::{License, LicenseId, LicenseRequest, LicenseStatus, RequestId};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How the fake remote answers pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    Accept,
    /// Network failure; retryable.
    Offline,
    /// Client error; the payload is rejected for good.
    Reject,
}

/// In-memory remote recording every push.
pub struct FakeRemote {
    pub snapshot: Mutex<Snapshot>,
    pub pushed: Mutex<Vec<AdminAction>>,
    pub mode: Mutex<PushMode>,
    pub pull_offline: Mutex<bool>,
    pub pulls: AtomicUsize,
}

impl FakeRemote {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            pushed: Mutex::new(Vec::new()),
            mode: Mutex::new(PushMode::Accept),
            pull_offline: Mutex::new(false),
            pulls: AtomicUsize::new(0),
        }
    }

    pub fn set_mode(&self, mode: PushMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn pushed_names(&self) -> Vec<&'static str> {
        self.pushed.lock().unwrap().iter().map(AdminAction::name).collect()
    }

    pub fn pull_count(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn pull(&self) -> SyncResult<Snapshot> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        if *self.pull_offline.lock().unwrap() {
            return Err(SyncError::Network("connection refused".into()));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn push(&self, action: &AdminAction) -> SyncResult<()> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            PushMode::Accept => {
                self.pushed.lock().unwrap().push(action.clone());
                Ok(())
            }
            PushMode::Offline => Err(SyncError::Network("connection refused".into())),
            PushMode::Reject => Err(SyncError::Remote {
                status: 400,
                message: "Malformed payload".into(),
            }),
        }
    }
}

pub fn store() -> LicenseStore {
    LicenseStore::open_in_memory().unwrap()
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
        features: [("inventory".to_string(), true)].into_iter().collect(),
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
        note: Some("Bitte Fahrtenbuch".into()),
        custom_message: None,
    }
}
