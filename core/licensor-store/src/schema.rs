//! Table creation, column migrations and catalog seeding.

use crate::error::StoreResult;
use licensor_types::default_catalog;
use rusqlite::{params, Connection};
use tracing::info;

pub(crate) fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            organization TEXT,
            contactPerson TEXT,
            email TEXT,
            domain TEXT,
            "key" TEXT,
            validUntil TEXT,
            status TEXT,
            features TEXT,
            createdAt TEXT,
            phoneNumber TEXT,
            note TEXT
        );

        CREATE TABLE IF NOT EXISTS requests (
            id TEXT PRIMARY KEY,
            organization TEXT,
            contactPerson TEXT,
            email TEXT,
            requestedDomain TEXT,
            requestDate TEXT,
            note TEXT,
            phoneNumber TEXT,
            customMessage TEXT
        );

        CREATE TABLE IF NOT EXISTS logs (
            id TEXT PRIMARY KEY,
            timestamp TEXT,
            method TEXT,
            endpoint TEXT,
            sourceUrl TEXT,
            providedKey TEXT,
            responseStatus INTEGER,
            responseBody TEXT
        );

        CREATE TABLE IF NOT EXISTS modules (
            id TEXT PRIMARY KEY,
            label TEXT,
            description TEXT,
            iconName TEXT
        );

        CREATE TABLE IF NOT EXISTS settings (
            "key" TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE TABLE IF NOT EXISTS push_outbox (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action TEXT NOT NULL,
            payload TEXT NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 0,
            lastError TEXT,
            queuedAt TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Adds columns introduced after the first schema version.
pub(crate) fn migrate(conn: &Connection) -> StoreResult<()> {
    ensure_column(conn, "licenses", "phoneNumber")?;
    ensure_column(conn, "licenses", "note")?;
    ensure_column(conn, "requests", "phoneNumber")?;
    ensure_column(conn, "requests", "note")?;
    ensure_column(conn, "requests", "customMessage")?;

    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_licenses_key ON licenses ("key");
        CREATE INDEX IF NOT EXISTS idx_licenses_domain ON licenses (lower(domain));
        CREATE INDEX IF NOT EXISTS idx_requests_domain ON requests (lower(requestedDomain));
        "#,
    )?;
    Ok(())
}

fn ensure_column(conn: &Connection, table: &str, column: &str) -> StoreResult<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if !names.iter().any(|n| n == column) {
        info!("Migrating {}: adding column {}", table, column);
        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} TEXT"))?;
    }
    Ok(())
}

pub(crate) fn seed_modules(conn: &Connection) -> StoreResult<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM modules", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let mut stmt = conn.prepare(
        "INSERT INTO modules (id, label, description, iconName) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for module in default_catalog() {
        stmt.execute(params![
            module.id,
            module.label,
            module.description,
            module.icon_name
        ])?;
    }
    info!("Seeded module catalog");
    Ok(())
}
