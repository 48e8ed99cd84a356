//! Note repository
//!
//! Mediates between the persistence store and the presentation layer.
//! Drafts are normalized and validated here, so a blank note or a malformed
//! link never reaches the store and the caller gets field-level issues back.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{NoteField, NotesResult, ValidationError};
use crate::models::{Note, NoteDraft};
use crate::storage::{NoteStore, SqliteNoteStore, StorageResult};

static WEB_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(https?://)?(localhost|(\d{1,3}\.){3}\d{1,3}|([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,63})(:\d{1,5})?([/?#]\S*)?$",
    )
    .expect("valid web url regex")
});

pub const EMPTY_NOTE_MESSAGE: &str = "Note can't be empty";
pub const INVALID_LINK_MESSAGE: &str = "Enter a valid web link";

/// Validating front for a note store
pub struct NoteRepository<S: NoteStore = SqliteNoteStore> {
    store: S,
}

impl NoteRepository<SqliteNoteStore> {
    /// Open the on-device store described by the configuration
    pub fn open(config: &Config) -> StorageResult<Self> {
        Ok(Self::new(SqliteNoteStore::open(config)?))
    }

    /// Repository over an in-memory store (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new(SqliteNoteStore::open_in_memory()?))
    }
}

impl<S: NoteStore> NoteRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and store a new note
    pub fn create(&mut self, draft: NoteDraft) -> NotesResult<Note> {
        let draft = normalize_draft(draft);
        validate_draft(&draft)?;
        self.store.insert(draft)
    }

    /// Validate and write back an edited note
    pub fn update(&mut self, note: &Note) -> NotesResult<Note> {
        let draft = normalize_draft(note.to_draft());
        validate_draft(&draft)?;

        let mut normalized = note.clone();
        normalized.apply_draft(draft);
        self.store.update(&normalized)
    }

    pub fn delete(&mut self, id: Uuid) -> NotesResult<Note> {
        self.store.delete(id)
    }

    /// Put back a previously deleted note under its original id
    pub fn restore(&mut self, note: &Note) -> NotesResult<Note> {
        debug!("Restoring note {}", note.id());
        self.store.restore(note)
    }

    pub fn get(&self, id: Uuid) -> NotesResult<Option<Note>> {
        self.store.get(id)
    }

    /// All notes, most recently updated first
    pub fn list(&self) -> NotesResult<Vec<Note>> {
        self.store.list()
    }

    pub fn search(&self, query: &str) -> NotesResult<Vec<Note>> {
        if query.trim().is_empty() {
            return self.store.list();
        }
        self.store.search(query)
    }

    pub fn count(&self) -> NotesResult<i64> {
        self.store.count()
    }
}

/// Canonical form of a draft
///
/// Title and subtitle are trimmed, the body loses trailing whitespace only,
/// and blank links or image paths become `None`.
pub fn normalize_draft(draft: NoteDraft) -> NoteDraft {
    NoteDraft {
        title: draft.title.trim().to_string(),
        subtitle: draft.subtitle.trim().to_string(),
        body: draft.body.trim_end().to_string(),
        color: draft.color,
        image_path: non_blank(draft.image_path),
        web_link: non_blank(draft.web_link),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Check a draft against the note rules
pub fn validate_draft(draft: &NoteDraft) -> Result<(), ValidationError> {
    let mut issues = ValidationError::new();

    if draft.title.trim().is_empty() && draft.body.trim().is_empty() {
        issues.push(NoteField::Title, EMPTY_NOTE_MESSAGE);
        issues.push(NoteField::Body, EMPTY_NOTE_MESSAGE);
    }

    if let Some(link) = draft.web_link.as_deref() {
        if !link.trim().is_empty() && !is_web_url(link.trim()) {
            issues.push(NoteField::WebLink, INVALID_LINK_MESSAGE);
        }
    }

    issues.into_result()
}

/// Whether text looks like a web URL
pub fn is_web_url(text: &str) -> bool {
    WEB_URL_RE.is_match(text)
}
