//! Background note worker
//!
//! Owns the repository and the command history on a dedicated thread so
//! persistence never blocks the UI. Commands are handled one at a time in
//! arrival order and every outcome is reported back as a `WorkerEvent`.
//!
//! The worker remembers the last search query; `Refresh` (and the reload
//! that follows a `NotFound` failure) re-runs it.

use std::fmt;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{NotesError, NotesResult};
use crate::history::{CommandHistory, HistoryDirection};
use crate::models::{Note, NoteDraft};
use crate::presenter::NoteChange;
use crate::repository::NoteRepository;
use crate::storage::NoteStore;

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;

/// Commands sent to the worker
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    /// Reload the list using the current query
    Refresh,
    /// Set the query and reload; a blank query lists everything
    Search(String),
    Create(NoteDraft),
    Update(Note),
    Delete(Uuid),
    Undo,
    Redo,
    /// Stop the worker thread
    Shutdown,
}

impl WorkerCommand {
    fn action(&self) -> WorkerAction {
        match self {
            WorkerCommand::Refresh | WorkerCommand::Shutdown => WorkerAction::Refresh,
            WorkerCommand::Search(_) => WorkerAction::Search,
            WorkerCommand::Create(_) => WorkerAction::Create,
            WorkerCommand::Update(_) => WorkerAction::Update,
            WorkerCommand::Delete(_) => WorkerAction::Delete,
            WorkerCommand::Undo => WorkerAction::Undo,
            WorkerCommand::Redo => WorkerAction::Redo,
        }
    }
}

/// What the worker was doing when it produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerAction {
    Refresh,
    Search,
    Create,
    Update,
    Delete,
    Undo,
    Redo,
}

impl fmt::Display for WorkerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerAction::Refresh => "refresh",
            WorkerAction::Search => "search",
            WorkerAction::Create => "create",
            WorkerAction::Update => "save",
            WorkerAction::Delete => "delete",
            WorkerAction::Undo => "undo",
            WorkerAction::Redo => "redo",
        };
        f.write_str(name)
    }
}

/// Events emitted by the worker
#[derive(Debug)]
pub enum WorkerEvent {
    /// A fresh list for the current query
    Loaded(Vec<Note>),
    /// A single note changed
    Changed {
        origin: WorkerAction,
        change: NoteChange,
    },
    /// Undo or redo had nothing to do
    NothingTo(HistoryDirection),
    /// An operation failed; nothing was changed
    Failed {
        action: WorkerAction,
        error: NotesError,
    },
}

/// Handle to control the worker
pub struct WorkerHandle {
    /// Send commands to the worker
    pub command_tx: mpsc::Sender<WorkerCommand>,
    /// Receive events from the worker
    pub event_rx: mpsc::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Queue a command; `false` if the worker has stopped
    pub async fn send(&self, command: WorkerCommand) -> bool {
        self.command_tx.send(command).await.is_ok()
    }

    /// Next event; `None` once the worker has stopped
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.event_rx.recv().await
    }
}

/// Start the worker thread
///
/// The worker takes ownership of the repository. It stops on `Shutdown`,
/// when every command sender is dropped, or when the event receiver goes
/// away.
pub fn spawn_worker<S>(
    repository: NoteRepository<S>,
    history_limit: usize,
) -> std::io::Result<WorkerHandle>
where
    S: NoteStore + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);

    let worker = NoteWorker {
        repository,
        history: CommandHistory::new(history_limit),
        query: String::new(),
        command_rx,
        event_tx,
    };

    thread::Builder::new()
        .name("mynotes-worker".to_string())
        .spawn(move || worker.run())?;

    Ok(WorkerHandle {
        command_tx,
        event_rx,
    })
}

struct NoteWorker<S: NoteStore> {
    repository: NoteRepository<S>,
    history: CommandHistory,
    query: String,
    command_rx: mpsc::Receiver<WorkerCommand>,
    event_tx: mpsc::Sender<WorkerEvent>,
}

impl<S: NoteStore> NoteWorker<S> {
    fn run(mut self) {
        info!("Note worker started");

        while let Some(command) = self.command_rx.blocking_recv() {
            if matches!(command, WorkerCommand::Shutdown) {
                break;
            }
            if !self.handle(command) {
                debug!("Event receiver dropped");
                break;
            }
        }

        info!("Note worker stopped");
    }

    /// Handle one command; `false` once events can no longer be delivered
    fn handle(&mut self, command: WorkerCommand) -> bool {
        let action = command.action();

        match command {
            WorkerCommand::Refresh | WorkerCommand::Shutdown => self.load(action),
            WorkerCommand::Search(query) => {
                self.query = query;
                self.load(action)
            }
            WorkerCommand::Create(draft) => {
                let result = self.history.create(&mut self.repository, draft);
                self.report_change(action, result)
            }
            WorkerCommand::Update(note) => {
                let result = self.history.update(&mut self.repository, &note);
                self.report_change(action, result)
            }
            WorkerCommand::Delete(id) => {
                let result = self.history.delete(&mut self.repository, id);
                self.report_change(action, result)
            }
            WorkerCommand::Undo => {
                let result = self.history.undo(&mut self.repository);
                self.report_history(action, HistoryDirection::Undo, result)
            }
            WorkerCommand::Redo => {
                let result = self.history.redo(&mut self.repository);
                self.report_history(action, HistoryDirection::Redo, result)
            }
        }
    }

    fn load(&mut self, action: WorkerAction) -> bool {
        match self.repository.search(&self.query) {
            Ok(notes) => {
                debug!("Loaded {} notes for {:?}", notes.len(), self.query);
                self.emit(WorkerEvent::Loaded(notes))
            }
            Err(error) => self.fail(action, error),
        }
    }

    fn report_change(&mut self, action: WorkerAction, result: NotesResult<NoteChange>) -> bool {
        match result {
            Ok(change) => self.emit(WorkerEvent::Changed {
                origin: action,
                change,
            }),
            Err(error) => self.fail(action, error),
        }
    }

    fn report_history(
        &mut self,
        action: WorkerAction,
        direction: HistoryDirection,
        result: NotesResult<Option<NoteChange>>,
    ) -> bool {
        match result {
            Ok(Some(change)) => self.emit(WorkerEvent::Changed {
                origin: action,
                change,
            }),
            Ok(None) => self.emit(WorkerEvent::NothingTo(direction)),
            Err(error) => self.fail(action, error),
        }
    }

    /// Report a failure; a stale reference is followed by a fresh list
    fn fail(&mut self, action: WorkerAction, error: NotesError) -> bool {
        if error.is_validation() {
            debug!("{} rejected: {}", action, error);
        } else {
            warn!("{} failed: {}", action, error);
        }

        let reload = error.is_not_found();
        if !self.emit(WorkerEvent::Failed { action, error }) {
            return false;
        }
        if reload {
            return self.load(WorkerAction::Refresh);
        }
        true
    }

    fn emit(&self, event: WorkerEvent) -> bool {
        self.event_tx.blocking_send(event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn next(handle: &mut WorkerHandle) -> WorkerEvent {
        tokio::time::timeout(Duration::from_secs(5), handle.next_event())
            .await
            .expect("worker event timed out")
            .expect("worker stopped")
    }

    fn start() -> WorkerHandle {
        let repo = NoteRepository::open_in_memory().unwrap();
        spawn_worker(repo, 10).unwrap()
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_refresh_on_empty_store() {
        let mut handle = start();
        handle.send(WorkerCommand::Refresh).await;

        match next(&mut handle).await {
            WorkerEvent::Loaded(notes) => assert!(notes.is_empty()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_events_follow_command_order() {
        let mut handle = start();
        handle
            .send(WorkerCommand::Create(NoteDraft::new().with_title("a")))
            .await;
        handle
            .send(WorkerCommand::Create(NoteDraft::new().with_title("b")))
            .await;
        handle.send(WorkerCommand::Refresh).await;

        for expected in ["a", "b"] {
            match next(&mut handle).await {
                WorkerEvent::Changed {
                    origin: WorkerAction::Create,
                    change: NoteChange::Created(note),
                } => assert_eq!(note.title, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }

        match next(&mut handle).await {
            WorkerEvent::Loaded(notes) => assert_eq!(titles(&notes), vec!["b", "a"]),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_followed_by_reload() {
        let mut handle = start();
        handle.send(WorkerCommand::Delete(Uuid::new_v4())).await;

        match next(&mut handle).await {
            WorkerEvent::Failed {
                action: WorkerAction::Delete,
                error,
            } => assert!(error.is_not_found()),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(next(&mut handle).await, WorkerEvent::Loaded(_)));
    }

    #[tokio::test]
    async fn test_validation_failure_has_no_reload() {
        let mut handle = start();
        handle.send(WorkerCommand::Create(NoteDraft::new())).await;
        handle.send(WorkerCommand::Undo).await;

        match next(&mut handle).await {
            WorkerEvent::Failed { error, .. } => assert!(error.is_validation()),
            other => panic!("unexpected event: {:?}", other),
        }
        // The failed create was never recorded
        assert!(matches!(
            next(&mut handle).await,
            WorkerEvent::NothingTo(HistoryDirection::Undo)
        ));
    }

    #[tokio::test]
    async fn test_undo_and_redo_through_worker() {
        let mut handle = start();
        handle
            .send(WorkerCommand::Create(NoteDraft::new().with_title("undo me")))
            .await;
        let id = match next(&mut handle).await {
            WorkerEvent::Changed { change, .. } => change.id(),
            other => panic!("unexpected event: {:?}", other),
        };

        handle.send(WorkerCommand::Undo).await;
        match next(&mut handle).await {
            WorkerEvent::Changed {
                origin: WorkerAction::Undo,
                change: NoteChange::Deleted(note),
            } => assert_eq!(note.id(), id),
            other => panic!("unexpected event: {:?}", other),
        }

        handle.send(WorkerCommand::Redo).await;
        match next(&mut handle).await {
            WorkerEvent::Changed {
                origin: WorkerAction::Redo,
                change: NoteChange::Created(note),
            } => assert_eq!(note.id(), id),
            other => panic!("unexpected event: {:?}", other),
        }

        handle.send(WorkerCommand::Redo).await;
        assert!(matches!(
            next(&mut handle).await,
            WorkerEvent::NothingTo(HistoryDirection::Redo)
        ));
    }

    #[tokio::test]
    async fn test_refresh_reuses_search_query() {
        let mut handle = start();
        for title in ["Rust", "Go", "rustacean"] {
            handle
                .send(WorkerCommand::Create(NoteDraft::new().with_title(title)))
                .await;
            next(&mut handle).await;
        }

        handle.send(WorkerCommand::Search("RUST".to_string())).await;
        handle.send(WorkerCommand::Refresh).await;

        for _ in 0..2 {
            match next(&mut handle).await {
                WorkerEvent::Loaded(notes) => {
                    assert_eq!(titles(&notes), vec!["rustacean", "Rust"])
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let mut handle = start();
        handle.send(WorkerCommand::Shutdown).await;

        let closed = tokio::time::timeout(Duration::from_secs(5), handle.next_event())
            .await
            .expect("worker did not stop");
        assert!(closed.is_none());
    }
}
