//! Sync between a local Licensor store and the backend endpoint.
//!
//! - [`protocol`]: the admin action wire format
//! - [`HttpRemote`]: reqwest client for the backend, behind [`RemoteStore`]
//! - [`SyncEngine`]: outbox replay followed by pull-merge
//! - [`SyncScheduler`]: the periodic background loop
//! - [`AdminConsole`]: local admin mutations pushed to the remote

mod console;
mod engine;
mod error;
pub mod protocol;
mod remote;
mod scheduler;

pub use console::{AdminConsole, LicenseUpdate, Mirrored};
pub use engine::{
    FlushReport, PushOutcome, SyncConfig, SyncEngine, SyncReport, DEFAULT_SYNC_INTERVAL,
};
pub use error::{SyncError, SyncResult};
pub use protocol::{AdminAction, AdminEnvelope, Snapshot};
pub use remote::{HttpRemote, RemoteStore, DEFAULT_TIMEOUT};
pub use scheduler::{SyncScheduler, SyncStatus};
