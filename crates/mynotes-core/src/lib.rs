//! mynotes Core Library
//!
//! This crate provides the core functionality for mynotes, a local
//! note-taking system backed by an on-device SQLite database.
//!
//! # Architecture
//!
//! - **Persistence store**: owns note records (`storage`)
//! - **Repository**: validates drafts before they reach the store
//! - **Presenter**: cached, ordered list with row-level change notifications
//! - **Worker**: runs the repository off the UI thread and reports events
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut repo = NoteRepository::open(&config)?;
//!
//! let note = repo.create(NoteDraft::new().with_title("Groceries").with_body("milk"))?;
//! let notes = repo.list()?;
//! ```
//!
//! # Modules
//!
//! - `models`: Note, draft and color palette
//! - `storage`: `NoteStore` trait and the SQLite store
//! - `repository`: validation and normalization
//! - `presenter`: visible list and `ListChange` notifications
//! - `history`: undo/redo
//! - `worker`: background thread and its command/event protocol
//! - `query`: sort orders and filters
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod presenter;
pub mod query;
pub mod repository;
pub mod storage;
pub mod worker;

pub use config::Config;
pub use error::{FieldIssue, NoteField, NotesError, NotesResult, ValidationError};
pub use history::{CommandHistory, HistoryDirection, NoteCommand};
pub use models::{Note, NoteColor, NoteDraft, ParseColorError};
pub use presenter::{ListChange, NoteChange, NoteListPresenter, NoteRow};
pub use query::{NoteFilter, ParseSortError, SortOrder};
pub use repository::NoteRepository;
pub use storage::{NoteStore, SqliteNoteStore, StorageError};
pub use worker::{spawn_worker, WorkerAction, WorkerCommand, WorkerEvent, WorkerHandle};
