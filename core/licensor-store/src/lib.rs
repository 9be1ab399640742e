//! Embedded SQLite store for Licensor.
//!
//! Holds licenses, license requests, the API log, the module catalog,
//! settings and the push outbox in one SQLite file. Existing
//! `ffw_licenses.sqlite` databases open unchanged; missing columns are added
//! on open.
//!
//! # Architecture
//!
//! - One connection behind `Arc<Mutex<_>>`; the store is cheap to clone
//! - Schema creation and column migrations run on open
//! - An empty module table is seeded with the default catalog
//! - All calls are blocking; the HTTP handlers wrap them in `spawn_blocking`

mod error;
mod licenses;
mod logs;
mod merge;
mod modules;
mod outbox;
mod requests;
mod schema;
mod settings;

pub use error::{StoreError, StoreResult};
pub use merge::{MergeCounts, MergeReport};
pub use outbox::QueuedPush;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Location label used for in-memory stores.
pub const IN_MEMORY: &str = ":memory:";

/// Row counts per table, for health reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub licenses: usize,
    pub requests: usize,
    pub logs: usize,
    pub modules: usize,
    pub pending_pushes: usize,
}

/// Persistent license store backed by SQLite.
#[derive(Clone)]
pub struct LicenseStore {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl LicenseStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::init(conn, path.display().to_string())
    }

    /// Opens an in-memory store (for testing and dry runs).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, IN_MEMORY.to_string())
    }

    fn init(conn: Connection, location: String) -> StoreResult<Self> {
        schema::init_schema(&conn)?;
        schema::migrate(&conn)?;
        schema::seed_modules(&conn)?;
        debug!("Opened license store at {}", location);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Returns the file path, or `:memory:`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns row counts for every table.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let conn = self.conn()?;
        let count = |table: &str| -> StoreResult<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            licenses: count("licenses")?,
            requests: count("requests")?,
            logs: count("logs")?,
            modules: count("modules")?,
            pending_pushes: count("push_outbox")?,
        })
    }

    pub(crate) fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Wraps a decoding failure so it can be returned from a row mapper.
pub(crate) fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// Treats `NULL` and `''` as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Maps a primary-key collision to [`StoreError::Conflict`].
pub(crate) fn map_constraint(err: rusqlite::Error, what: impl FnOnce() -> String) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(what())
        }
        _ => StoreError::Database(err),
    }
}
