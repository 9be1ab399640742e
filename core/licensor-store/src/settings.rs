//! Key/value settings.

use crate::error::StoreResult;
use crate::LicenseStore;
use rusqlite::{params, OptionalExtension};

impl LicenseStore {
    /// Reads a setting.
    pub fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        let value: Option<Option<String>> = conn
            .query_row(
                r#"SELECT value FROM settings WHERE "key" = ?1"#,
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    /// Writes a setting, replacing any previous value.
    pub fn save_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT OR REPLACE INTO settings ("key", value) VALUES (?1, ?2)"#,
            params![key, value],
        )?;
        Ok(())
    }
}
