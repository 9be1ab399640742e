//! Queue of push operations that could not reach the remote store.
//!
//! Payloads are opaque JSON; the sync layer owns their shape.

use crate::error::StoreResult;
use crate::LicenseStore;
use rusqlite::params;
use serde_json::Value;

/// A push waiting to be retried.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedPush {
    pub id: i64,
    pub action: String,
    pub payload: Value,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub queued_at: String,
}

impl LicenseStore {
    /// Queues a push. Returns the queue id.
    pub fn enqueue_push(&self, action: &str, payload: &Value, error: &str) -> StoreResult<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO push_outbox (action, payload, attempts, lastError, queuedAt)
             VALUES (?1, ?2, 1, ?3, ?4)",
            params![
                action,
                serde_json::to_string(payload)?,
                error,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Lists queued pushes, oldest first.
    pub fn pending_pushes(&self) -> StoreResult<Vec<QueuedPush>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, action, payload, attempts, lastError, queuedAt FROM push_outbox ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut pushes = Vec::with_capacity(rows.len());
        for (id, action, payload, attempts, last_error, queued_at) in rows {
            pushes.push(QueuedPush {
                id,
                action,
                payload: serde_json::from_str(&payload)?,
                attempts: attempts.max(0) as u32,
                last_error,
                queued_at,
            });
        }
        Ok(pushes)
    }

    /// Drops a queued push after it was delivered.
    pub fn remove_push(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM push_outbox WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Records another failed delivery attempt.
    pub fn record_push_failure(&self, id: i64, error: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE push_outbox SET attempts = attempts + 1, lastError = ?1 WHERE id = ?2",
            params![error, id],
        )?;
        Ok(())
    }
}
