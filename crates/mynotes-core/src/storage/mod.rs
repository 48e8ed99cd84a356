//! Storage layer
//!
//! The persistence store owns note records. `NoteStore` is the seam the
//! repository talks to; `SqliteNoteStore` is the on-device implementation.
//!
//! ## Ownership
//!
//! - Ids are assigned by the store on insert and never change
//! - `created_at` is fixed on insert (and kept by `restore`)
//! - `updated_at` is stamped by the store on every mutation, strictly
//!   later than any timestamp already stored

pub mod error;
pub mod schema;
pub mod sqlite;

use uuid::Uuid;

use crate::error::NotesResult;
use crate::models::{Note, NoteDraft};

pub use error::{StorageError, StorageResult};
pub use schema::{get_schema_version, init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteNoteStore;

/// Persistence operations over note records
pub trait NoteStore {
    /// Store a new note, assigning its id and timestamps
    fn insert(&mut self, draft: NoteDraft) -> NotesResult<Note>;

    /// Overwrite the content of an existing note
    ///
    /// Fails with `NotFound` when the id is absent.
    fn update(&mut self, note: &Note) -> NotesResult<Note>;

    /// Remove a note, returning what was removed
    fn delete(&mut self, id: Uuid) -> NotesResult<Note>;

    /// Re-insert a deleted note under its original id
    fn restore(&mut self, note: &Note) -> NotesResult<Note>;

    fn get(&self, id: Uuid) -> NotesResult<Option<Note>>;

    /// All notes, most recently updated first
    fn list(&self) -> NotesResult<Vec<Note>>;

    /// Notes matching a case-insensitive text query, in `list()` order
    fn search(&self, query: &str) -> NotesResult<Vec<Note>>;

    fn count(&self) -> NotesResult<i64>;
}
