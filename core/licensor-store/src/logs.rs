//! API log persistence. The log is append-only.

use crate::error::StoreResult;
use crate::{non_empty, LicenseStore};
use licensor_types::{ApiLogEntry, LogId, LOG_METHOD};
use rusqlite::{params, Connection, Row};

const COLUMNS: &str =
    "id, timestamp, method, endpoint, sourceUrl, providedKey, responseStatus, responseBody";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ApiLogEntry> {
    let status: Option<i64> = row.get(6)?;
    Ok(ApiLogEntry {
        id: LogId::from(row.get::<_, String>(0)?),
        timestamp: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        method: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| LOG_METHOD.to_string()),
        endpoint: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        source_url: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        provided_key: non_empty(row.get(5)?),
        response_status: status.and_then(|s| u16::try_from(s).ok()).unwrap_or(0),
        response_body: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

/// Inserts a log entry unless its id is already present. Returns true if inserted.
pub(crate) fn insert_if_absent(conn: &Connection, entry: &ApiLogEntry) -> StoreResult<bool> {
    let changed = conn.execute(
        &format!("INSERT OR IGNORE INTO logs ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            entry.id.as_str(),
            entry.timestamp,
            entry.method,
            entry.endpoint,
            entry.source_url,
            entry.provided_key.as_deref().unwrap_or(""),
            entry.response_status,
            entry.response_body,
        ],
    )?;
    Ok(changed > 0)
}

impl LicenseStore {
    /// Appends a log entry.
    pub fn append_log(&self, entry: &ApiLogEntry) -> StoreResult<()> {
        let conn = self.conn()?;
        insert_if_absent(&conn, entry)?;
        Ok(())
    }

    /// Appends a log entry unless one with the same id exists.
    pub fn insert_log_if_absent(&self, entry: &ApiLogEntry) -> StoreResult<bool> {
        let conn = self.conn()?;
        insert_if_absent(&conn, entry)
    }

    /// Lists the most recent log entries, newest first.
    pub fn list_logs(&self, limit: usize) -> StoreResult<Vec<ApiLogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM logs ORDER BY timestamp DESC, rowid DESC LIMIT ?1"
        ))?;
        let logs = stmt
            .query_map(params![limit as i64], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}
