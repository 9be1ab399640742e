//! License persistence.

use crate::error::{StoreError, StoreResult};
use crate::{conversion_error, map_constraint, non_empty, LicenseStore};
use licensor_types::{FeatureSet, License, LicenseId, LicenseStatus, RequestId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = r#"id, organization, contactPerson, email, phoneNumber, domain, "key",
    validUntil, status, features, createdAt, note"#;

fn from_row(row: &Row<'_>) -> rusqlite::Result<License> {
    let status: Option<String> = row.get(8)?;
    let status = match status {
        Some(s) => s.parse::<LicenseStatus>().map_err(|e| conversion_error(8, e))?,
        None => LicenseStatus::Active,
    };

    let features: Option<String> = row.get(9)?;
    let features = match features.as_deref().map(str::trim) {
        None | Some("") | Some("[]") | Some("null") => FeatureSet::new(),
        Some(json) => serde_json::from_str(json).map_err(|e| conversion_error(9, e))?,
    };

    Ok(License {
        id: LicenseId::from(row.get::<_, String>(0)?),
        organization: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        contact_person: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        email: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        phone_number: non_empty(row.get(4)?),
        domain: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        key: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        valid_until: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        status,
        features,
        created_at: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        note: non_empty(row.get(11)?),
    })
}

pub(crate) fn load(conn: &Connection, id: &LicenseId) -> StoreResult<Option<License>> {
    let license = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM licenses WHERE id = ?1"),
            params![id.as_str()],
            from_row,
        )
        .optional()?;
    Ok(license)
}

/// Inserts or replaces a license row.
pub(crate) fn write(conn: &Connection, license: &License, replace: bool) -> StoreResult<()> {
    let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
    conn.execute(
        &format!(
            r#"{verb} INTO licenses (id, organization, contactPerson, email, phoneNumber, domain,
                "key", validUntil, status, features, createdAt, note)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#
        ),
        params![
            license.id.as_str(),
            license.organization,
            license.contact_person,
            license.email,
            license.phone_number,
            license.domain,
            license.key,
            license.valid_until,
            license.status.as_str(),
            serde_json::to_string(&license.features)?,
            license.created_at,
            license.note,
        ],
    )
    .map_err(|e| map_constraint(e, || format!("license {} already exists", license.id)))?;
    Ok(())
}

impl LicenseStore {
    /// Lists all licenses, newest first.
    pub fn list_licenses(&self) -> StoreResult<Vec<License>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM licenses ORDER BY createdAt DESC"))?;
        let licenses = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(licenses)
    }

    /// Loads a license by id.
    pub fn get_license(&self, id: &LicenseId) -> StoreResult<Option<License>> {
        let conn = self.conn()?;
        load(&conn, id)
    }

    /// Finds the license holding the given key (exact match).
    pub fn find_license_by_key(&self, key: &str) -> StoreResult<Option<License>> {
        let conn = self.conn()?;
        let license = conn
            .query_row(
                &format!(r#"SELECT {COLUMNS} FROM licenses WHERE "key" = ?1 LIMIT 1"#),
                params![key],
                from_row,
            )
            .optional()?;
        Ok(license)
    }

    /// Finds the license for a normalized domain (case-insensitive).
    pub fn find_license_by_domain(&self, domain: &str) -> StoreResult<Option<License>> {
        let conn = self.conn()?;
        let license = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM licenses WHERE lower(domain) = lower(?1) LIMIT 1"),
                params![domain],
                from_row,
            )
            .optional()?;
        Ok(license)
    }

    /// Returns true if any license already uses the key.
    pub fn key_exists(&self, key: &str) -> StoreResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            r#"SELECT EXISTS(SELECT 1 FROM licenses WHERE "key" = ?1)"#,
            params![key],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Inserts a new license. Fails with [`StoreError::Conflict`] if the id exists.
    pub fn insert_license(&self, license: &License) -> StoreResult<()> {
        let conn = self.conn()?;
        write(&conn, license, false)
    }

    /// Inserts or replaces a license by id.
    pub fn upsert_license(&self, license: &License) -> StoreResult<()> {
        let conn = self.conn()?;
        write(&conn, license, true)
    }

    /// Overwrites every field of an existing license except `createdAt`.
    pub fn update_license(&self, license: &License) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"UPDATE licenses SET organization = ?1, contactPerson = ?2, email = ?3,
                phoneNumber = ?4, domain = ?5, "key" = ?6, validUntil = ?7, status = ?8,
                features = ?9, note = ?10
               WHERE id = ?11"#,
            params![
                license.organization,
                license.contact_person,
                license.email,
                license.phone_number,
                license.domain,
                license.key,
                license.valid_until,
                license.status.as_str(),
                serde_json::to_string(&license.features)?,
                license.note,
                license.id.as_str(),
            ],
        )?;
        ensure_changed(changed, &license.id)
    }

    /// Replaces the feature map of a license.
    pub fn update_license_features(&self, id: &LicenseId, features: &FeatureSet) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE licenses SET features = ?1 WHERE id = ?2",
            params![serde_json::to_string(features)?, id.as_str()],
        )?;
        ensure_changed(changed, id)
    }

    /// Flips a license to `suspended`.
    pub fn revoke_license(&self, id: &LicenseId) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE licenses SET status = ?1 WHERE id = ?2",
            params![LicenseStatus::Suspended.as_str(), id.as_str()],
        )?;
        ensure_changed(changed, id)
    }

    /// Inserts the license issued for a request and deletes the request, in
    /// one transaction.
    ///
    /// Fails with [`StoreError::NotFound`] and changes nothing if the request
    /// no longer exists.
    pub fn issue_for_request(&self, license: &License, request_id: &RequestId) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        write(&tx, license, false)?;
        let removed = tx.execute(
            "DELETE FROM requests WHERE id = ?1",
            params![request_id.as_str()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("request {request_id}")));
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes a license. Returns false if it did not exist.
    pub fn delete_license(&self, id: &LicenseId) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM licenses WHERE id = ?1", params![id.as_str()])?;
        Ok(changed > 0)
    }
}

fn ensure_changed(changed: usize, id: &LicenseId) -> StoreResult<()> {
    if changed == 0 {
        return Err(StoreError::NotFound(format!("license {id}")));
    }
    Ok(())
}
