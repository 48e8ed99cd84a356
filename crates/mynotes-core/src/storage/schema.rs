//! Notes database schema
//!
//! Migrations are listed in order; `MIGRATIONS[n]` brings a database from
//! version `n` to `n + 1`. The version lives in the `schema_info` table.

use rusqlite::{params, Connection, OptionalExtension, Result};
use tracing::debug;

/// Schema version written by this build
pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

const MIGRATIONS: [&str; 1] = [r#"
    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        subtitle TEXT NOT NULL DEFAULT '',
        body TEXT NOT NULL,
        color TEXT NOT NULL DEFAULT '#333333',
        image_path TEXT,
        web_link TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_notes_updated_at ON notes(updated_at);
    CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at);
    CREATE INDEX IF NOT EXISTS idx_notes_color ON notes(color);
"#];

/// Create or upgrade the schema to `SCHEMA_VERSION`
pub fn init_schema(conn: &Connection) -> Result<()> {
    migrate(conn, &MIGRATIONS)
}

/// Apply the pending `migrations` and record the new version
///
/// Runs in one transaction; a failed step leaves the database as it was.
fn migrate(conn: &Connection, migrations: &[&str]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_info (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;

    let current = get_schema_version(&tx)?.unwrap_or(0).max(0) as usize;
    for (version, sql) in migrations.iter().enumerate().skip(current) {
        debug!("Applying schema migration {}", version + 1);
        tx.execute_batch(sql)?;
    }

    tx.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        params![migrations.len().to_string()],
    )?;
    tx.commit()
}

/// Stored schema version, `None` for a fresh database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    if !has_table(conn, "schema_info")? {
        return Ok(None);
    }
    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.and_then(|v| v.parse().ok()))
}

/// Whether `init_schema` has work to do
pub fn needs_init(conn: &Connection) -> bool {
    !matches!(get_schema_version(conn), Ok(Some(v)) if v >= SCHEMA_VERSION)
}

fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")?
        .exists(params![name])
}
