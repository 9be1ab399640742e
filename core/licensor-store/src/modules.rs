//! Module catalog persistence.

use crate::error::{StoreError, StoreResult};
use crate::LicenseStore;
use licensor_types::ModuleDefinition;
use rusqlite::params;

impl LicenseStore {
    /// Lists the module catalog in insertion order.
    pub fn list_modules(&self) -> StoreResult<Vec<ModuleDefinition>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, label, description, iconName FROM modules ORDER BY rowid")?;
        let modules = stmt
            .query_map([], |row| {
                Ok(ModuleDefinition {
                    id: row.get(0)?,
                    label: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    icon_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(modules)
    }

    /// Adds a module. Fails with [`StoreError::Conflict`] if the id is taken.
    pub fn add_module(&self, module: &ModuleDefinition) -> StoreResult<()> {
        if module.id.trim().is_empty() {
            return Err(StoreError::InvalidData("module id must not be empty".into()));
        }
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM modules WHERE id = ?1)",
            params![module.id],
            |row| row.get(0),
        )?;
        if exists {
            return Err(StoreError::Conflict(format!("module id {} already exists", module.id)));
        }
        conn.execute(
            "INSERT INTO modules (id, label, description, iconName) VALUES (?1, ?2, ?3, ?4)",
            params![module.id, module.label, module.description, module.icon_name],
        )?;
        Ok(())
    }

    /// Removes a module from the catalog. Existing license features are left alone.
    pub fn delete_module(&self, id: &str) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM modules WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
