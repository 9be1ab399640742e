//! License request persistence.

use crate::error::{StoreError, StoreResult};
use crate::{map_constraint, non_empty, LicenseStore};
use licensor_types::{LicenseRequest, RequestId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, organization, contactPerson, email, phoneNumber, requestedDomain,
    requestDate, note, customMessage";

fn from_row(row: &Row<'_>) -> rusqlite::Result<LicenseRequest> {
    Ok(LicenseRequest {
        id: RequestId::from(row.get::<_, String>(0)?),
        organization: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        contact_person: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        email: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        phone_number: non_empty(row.get(4)?),
        requested_domain: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        request_date: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        note: non_empty(row.get(7)?),
        custom_message: non_empty(row.get(8)?),
    })
}

pub(crate) fn load(conn: &Connection, id: &RequestId) -> StoreResult<Option<LicenseRequest>> {
    let request = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM requests WHERE id = ?1"),
            params![id.as_str()],
            from_row,
        )
        .optional()?;
    Ok(request)
}

pub(crate) fn write(conn: &Connection, request: &LicenseRequest, replace: bool) -> StoreResult<()> {
    let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
    conn.execute(
        &format!(
            "{verb} INTO requests (id, organization, contactPerson, email, phoneNumber,
                requestedDomain, requestDate, note, customMessage)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            request.id.as_str(),
            request.organization,
            request.contact_person,
            request.email,
            request.phone_number,
            request.requested_domain,
            request.request_date,
            request.note,
            request.custom_message,
        ],
    )
    .map_err(|e| map_constraint(e, || format!("request {} already exists", request.id)))?;
    Ok(())
}

impl LicenseStore {
    /// Lists all requests, newest first.
    pub fn list_requests(&self) -> StoreResult<Vec<LicenseRequest>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM requests ORDER BY requestDate DESC"))?;
        let requests = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }

    /// Loads a request by id.
    pub fn get_request(&self, id: &RequestId) -> StoreResult<Option<LicenseRequest>> {
        let conn = self.conn()?;
        load(&conn, id)
    }

    /// Finds the pending request for a normalized domain (case-insensitive).
    pub fn find_request_by_domain(&self, domain: &str) -> StoreResult<Option<LicenseRequest>> {
        let conn = self.conn()?;
        let request = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM requests WHERE lower(requestedDomain) = lower(?1) LIMIT 1"
                ),
                params![domain],
                from_row,
            )
            .optional()?;
        Ok(request)
    }

    /// Inserts a new request. Fails with [`StoreError::Conflict`] if the id exists.
    pub fn insert_request(&self, request: &LicenseRequest) -> StoreResult<()> {
        let conn = self.conn()?;
        write(&conn, request, false)
    }

    /// Inserts or replaces a request by id.
    pub fn upsert_request(&self, request: &LicenseRequest) -> StoreResult<()> {
        let conn = self.conn()?;
        write(&conn, request, true)
    }

    /// Updates the contact details, note and custom message of a request.
    ///
    /// The requested domain and request date are immutable.
    pub fn update_request(&self, request: &LicenseRequest) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE requests SET organization = ?1, contactPerson = ?2, email = ?3,
                phoneNumber = ?4, note = ?5, customMessage = ?6
             WHERE id = ?7",
            params![
                request.organization,
                request.contact_person,
                request.email,
                request.phone_number,
                request.note,
                request.custom_message,
                request.id.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("request {}", request.id)));
        }
        Ok(())
    }

    /// Deletes a request. Returns false if it did not exist.
    pub fn delete_request(&self, id: &RequestId) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM requests WHERE id = ?1", params![id.as_str()])?;
        Ok(changed > 0)
    }
}
