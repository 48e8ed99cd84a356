//! Error types surfaced to callers of the store and repository
//!
//! Three kinds of failure reach the UI and each is handled differently:
//! - `Validation`: the user can fix it; shown next to the offending field
//! - `NotFound`: a stale reference; the list should be refreshed
//! - `Storage`: unexpected I/O or database failure; shown as a transient message

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Errors returned by store, repository and worker operations
#[derive(Error, Debug)]
pub enum NotesError {
    /// Input failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No note with this id exists
    #[error("Note not found: {0}")]
    NotFound(Uuid),

    /// Underlying storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for NotesError {
    fn from(error: rusqlite::Error) -> Self {
        NotesError::Storage(StorageError::Database(error))
    }
}

impl NotesError {
    pub fn is_validation(&self) -> bool {
        matches!(self, NotesError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NotesError::NotFound(_))
    }

    /// Validation details, if this is a validation failure
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            NotesError::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// Short message suitable for a status line
    pub fn user_message(&self) -> String {
        match self {
            NotesError::Validation(v) => v.to_string(),
            NotesError::NotFound(_) => "That note no longer exists".to_string(),
            NotesError::Storage(e) => match e.recovery_suggestion() {
                Some(hint) => format!("{} {}", e, hint),
                None => e.to_string(),
            },
        }
    }
}

/// Result type for note operations
pub type NotesResult<T> = Result<T, NotesError>;

/// A user-editable note field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteField {
    Title,
    Subtitle,
    Body,
    WebLink,
    ImagePath,
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteField::Title => "title",
            NoteField::Subtitle => "subtitle",
            NoteField::Body => "body",
            NoteField::WebLink => "web link",
            NoteField::ImagePath => "image path",
        };
        f.write_str(name)
    }
}

/// One problem with one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: NoteField,
    pub message: String,
}

/// Validation failure carrying field-level issues
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue for a field
    pub fn push(&mut self, field: NoteField, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field,
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// First message recorded for a field
    pub fn for_field(&self, field: NoteField) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message.as_str())
    }

    /// `Ok(())` when no issues were recorded
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seen = Vec::new();
        for issue in &self.issues {
            if !seen.contains(&issue.message.as_str()) {
                seen.push(issue.message.as_str());
            }
        }
        write!(f, "{}", seen.join("; "))
    }
}

impl std::error::Error for ValidationError {}
