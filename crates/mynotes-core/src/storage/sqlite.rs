//! SQLite-backed note store
//!
//! ## Tables
//!
//! - `notes` - Note records, timestamps stored as epoch milliseconds
//! - `schema_info` - Schema version
//!
//! Every read re-queries the database; nothing holds a cursor open between
//! calls.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use super::schema::{init_schema, needs_init};
use super::NoteStore;
use crate::config::Config;
use crate::error::{NotesError, NotesResult};
use crate::models::{now_millis, Note, NoteColor, NoteDraft};

const NOTE_COLUMNS: &str =
    "id, title, subtitle, body, color, image_path, web_link, created_at, updated_at";

const RECENCY_ORDER: &str = "ORDER BY updated_at DESC, created_at DESC, id DESC";

/// Note store backed by a SQLite database
pub struct SqliteNoteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteNoteStore {
    /// Open or create the database described by the configuration
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_at(&config.sqlite_path())
    }

    /// Open or create a database at a specific path
    pub fn open_at(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(path).map_err(|e| StorageError::from_sqlite(e, path))?;

        if needs_init(&conn) {
            init_schema(&conn).map_err(|e| StorageError::from_sqlite(e, path))?;
            info!("Initialized notes database at {:?}", path);
        }

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size of the database file in bytes
    pub fn file_size(&self) -> u64 {
        self.path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> NotesResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, NoteRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|row| row.hydrate().map_err(NotesError::from))
            .collect()
    }
}

impl NoteStore for SqliteNoteStore {
    fn insert(&mut self, draft: NoteDraft) -> NotesResult<Note> {
        let tx = self.conn.transaction()?;
        let note = Note::from_draft(Uuid::new_v4(), draft, next_timestamp(&tx)?);
        insert_row(&tx, &note)?;
        commit(tx, self.path.as_deref())?;
        debug!("Inserted note {}", note.id);
        Ok(note)
    }

    fn update(&mut self, note: &Note) -> NotesResult<Note> {
        let tx = self.conn.transaction()?;

        let (created_at, _) =
            stored_timestamps(&tx, note.id)?.ok_or(NotesError::NotFound(note.id))?;

        let mut stored = note.clone();
        stored.created_at = created_at;
        stored.updated_at = next_timestamp(&tx)?;

        tx.execute(
            r#"
            UPDATE notes
            SET title = ?, subtitle = ?, body = ?, color = ?, image_path = ?, web_link = ?,
                updated_at = ?
            WHERE id = ?
            "#,
            params![
                stored.title,
                stored.subtitle,
                stored.body,
                stored.color.hex(),
                stored.image_path,
                stored.web_link,
                stored.updated_at.timestamp_millis(),
                stored.id.to_string(),
            ],
        )?;
        commit(tx, self.path.as_deref())?;

        debug!("Updated note {}", stored.id);
        Ok(stored)
    }

    fn delete(&mut self, id: Uuid) -> NotesResult<Note> {
        let tx = self.conn.transaction()?;

        let sql = format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS);
        let row = tx
            .query_row(&sql, params![id.to_string()], NoteRow::from_row)
            .optional()?
            .ok_or(NotesError::NotFound(id))?;
        let note = row.hydrate()?;

        tx.execute("DELETE FROM notes WHERE id = ?", params![id.to_string()])?;
        commit(tx, self.path.as_deref())?;

        debug!("Deleted note {}", id);
        Ok(note)
    }

    fn restore(&mut self, note: &Note) -> NotesResult<Note> {
        let tx = self.conn.transaction()?;

        if stored_timestamps(&tx, note.id)?.is_some() {
            return Err(StorageError::AlreadyExists {
                id: note.id.to_string(),
            }
            .into());
        }

        let mut stored = note.clone();
        stored.updated_at = next_timestamp(&tx)?.max(note.updated_at + Duration::milliseconds(1));
        insert_row(&tx, &stored)?;
        commit(tx, self.path.as_deref())?;

        debug!("Restored note {}", stored.id);
        Ok(stored)
    }

    fn get(&self, id: Uuid) -> NotesResult<Option<Note>> {
        let sql = format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], NoteRow::from_row)
            .optional()?;
        row.map(|r| r.hydrate().map_err(NotesError::from))
            .transpose()
    }

    fn list(&self) -> NotesResult<Vec<Note>> {
        let sql = format!("SELECT {} FROM notes {}", NOTE_COLUMNS, RECENCY_ORDER);
        self.query_notes(&sql, params![])
    }

    fn search(&self, query: &str) -> NotesResult<Vec<Note>> {
        // Matching happens in Rust so it agrees with the list filter
        // (SQLite's LIKE only folds ASCII case).
        let notes = self.list()?;
        Ok(notes.into_iter().filter(|n| n.matches(query)).collect())
    }

    fn count(&self) -> NotesResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

/// Commit, classifying failures against the database file
fn commit(tx: Transaction<'_>, path: Option<&Path>) -> NotesResult<()> {
    tx.commit().map_err(|e| match path {
        Some(path) => StorageError::from_sqlite(e, path).into(),
        None => e.into(),
    })
}

/// Timestamp for the next mutation
///
/// Strictly later than every stored `updated_at`, so recency order matches
/// mutation order even when several writes land in the same millisecond.
fn next_timestamp(conn: &Connection) -> NotesResult<DateTime<Utc>> {
    let now = now_millis();
    let latest: Option<i64> =
        conn.query_row("SELECT MAX(updated_at) FROM notes", [], |row| row.get(0))?;

    Ok(match latest.and_then(DateTime::from_timestamp_millis) {
        Some(latest) => now.max(latest + Duration::milliseconds(1)),
        None => now,
    })
}

/// `(created_at, updated_at)` for a stored note, if present
fn stored_timestamps(
    conn: &Connection,
    id: Uuid,
) -> NotesResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let row: Option<(i64, i64)> = conn
        .query_row(
            "SELECT created_at, updated_at FROM notes WHERE id = ?",
            params![id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((created, updated)) = row else {
        return Ok(None);
    };
    let key = id.to_string();
    Ok(Some((
        millis_to_datetime(&key, created)?,
        millis_to_datetime(&key, updated)?,
    )))
}

fn insert_row(conn: &Connection, note: &Note) -> rusqlite::Result<()> {
    let sql = format!(
        "INSERT INTO notes ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        NOTE_COLUMNS
    );
    conn.execute(
        &sql,
        params![
            note.id.to_string(),
            note.title,
            note.subtitle,
            note.body,
            note.color.hex(),
            note.image_path,
            note.web_link,
            note.created_at.timestamp_millis(),
            note.updated_at.timestamp_millis(),
        ],
    )?;
    Ok(())
}

fn millis_to_datetime(id: &str, millis: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StorageError::InvalidRecord {
        id: id.to_string(),
        details: format!("timestamp out of range: {}", millis),
    })
}

// ==================== Internal structs ====================

struct NoteRow {
    id: String,
    title: String,
    subtitle: String,
    body: String,
    color: Option<String>,
    image_path: Option<String>,
    web_link: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl NoteRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            subtitle: row.get(2)?,
            body: row.get(3)?,
            color: row.get(4)?,
            image_path: row.get(5)?,
            web_link: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn hydrate(self) -> StorageResult<Note> {
        let id = Uuid::parse_str(&self.id).map_err(|e| StorageError::InvalidRecord {
            id: self.id.clone(),
            details: e.to_string(),
        })?;

        Ok(Note {
            id,
            created_at: millis_to_datetime(&self.id, self.created_at)?,
            updated_at: millis_to_datetime(&self.id, self.updated_at)?,
            title: self.title,
            subtitle: self.subtitle,
            body: self.body,
            color: NoteColor::from_stored(self.color.as_deref()),
            image_path: self.image_path,
            web_link: self.web_link,
        })
    }
}
