//! Storage errors
//!
//! I/O and SQLite failures are classified so the UI can tell the user what
//! to do about them.

use std::io;
use std::path::{Path, PathBuf};

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied: cannot write '{path}'")]
    PermissionDenied { path: PathBuf },

    #[error("Disk full while writing '{path}'")]
    DiskFull { path: PathBuf },

    #[error("Not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("Failed to open database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored row could not be decoded
    #[error("Invalid note record '{id}': {details}")]
    InvalidRecord { id: String, details: String },

    /// Restore of a note whose id is still present
    #[error("A note with id '{id}' already exists")]
    AlreadyExists { id: String },
}

impl StorageError {
    /// Classify a filesystem failure while preparing `path`
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied { path },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ if is_disk_full(&error.to_string()) => StorageError::DiskFull { path },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Classify a SQLite failure on the database at `path`
    pub fn from_sqlite(error: rusqlite::Error, path: &Path) -> Self {
        let path = path.to_path_buf();
        match error.sqlite_error_code() {
            Some(ErrorCode::DiskFull) => StorageError::DiskFull { path },
            Some(ErrorCode::PermissionDenied | ErrorCode::ReadOnly) => {
                StorageError::PermissionDenied { path }
            }
            Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase) => StorageError::Open {
                path,
                source: error,
            },
            _ => StorageError::Database(error),
        }
    }

    /// Whether the user can fix this without losing data
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::DiskFull { .. }
                | StorageError::PermissionDenied { .. }
                | StorageError::CreateDirectory { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check file permissions, or point data_dir somewhere writable.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and is writable.")
            }
            StorageError::InvalidRecord { .. } => {
                Some("The database may have been edited by another program.")
            }
            _ => None,
        }
    }
}

fn is_disk_full(message: &str) -> bool {
    let message = message.to_lowercase();
    ["no space left", "disk full", "quota exceeded", "not enough space"]
        .iter()
        .any(|needle| message.contains(needle))
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_error(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_io_classification() {
        let path = PathBuf::from("/data/mynotes");

        let err = StorageError::from_io(
            io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
            path.clone(),
        );
        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.is_recoverable());

        let err = StorageError::from_io(
            io::Error::new(io::ErrorKind::Other, "No space left on device"),
            path.clone(),
        );
        assert!(matches!(err, StorageError::DiskFull { .. }));

        let err = StorageError::from_io(io::Error::new(io::ErrorKind::Other, "weird"), path);
        assert!(matches!(err, StorageError::CreateDirectory { .. }));
        assert!(err.to_string().contains("/data/mynotes"));
    }

    #[test]
    fn test_sqlite_classification() {
        let path = Path::new("/data/mynotes/notes.db");

        let err = StorageError::from_sqlite(sqlite_error(rusqlite::ffi::SQLITE_FULL), path);
        assert!(matches!(err, StorageError::DiskFull { .. }));
        assert_eq!(err.recovery_suggestion(), Some("Free up disk space and try again."));

        let err = StorageError::from_sqlite(sqlite_error(rusqlite::ffi::SQLITE_READONLY), path);
        assert!(matches!(err, StorageError::PermissionDenied { .. }));

        let err = StorageError::from_sqlite(sqlite_error(rusqlite::ffi::SQLITE_CANTOPEN), path);
        assert!(matches!(err, StorageError::Open { .. }));
        assert!(!err.is_recoverable());

        let err = StorageError::from_sqlite(rusqlite::Error::QueryReturnedNoRows, path);
        assert!(matches!(err, StorageError::Database(_)));
    }

    #[test]
    fn test_invalid_record_has_hint() {
        let err = StorageError::InvalidRecord {
            id: "not-a-uuid".to_string(),
            details: "invalid character".to_string(),
        };
        assert!(err.to_string().contains("not-a-uuid"));
        assert!(err.recovery_suggestion().is_some());
    }
}
