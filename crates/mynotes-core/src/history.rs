//! Undo/redo of note mutations
//!
//! Every create, edit and delete that goes through `CommandHistory` is
//! recorded as a `NoteCommand`. Undoing or redoing one is itself an ordinary
//! repository mutation, so ids are preserved and `updated_at` keeps moving
//! forward.

use std::collections::VecDeque;
use std::fmt;

use tracing::debug;
use uuid::Uuid;

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::error::{NotesError, NotesResult};
use crate::models::{Note, NoteDraft};
use crate::presenter::NoteChange;
use crate::repository::NoteRepository;
use crate::storage::NoteStore;

/// A recorded, reversible mutation
#[derive(Debug, Clone, PartialEq)]
pub enum NoteCommand {
    /// A note was created; holds the stored note
    Add(Note),
    /// A note's content changed
    Edit { before: Note, after: Note },
    /// A note was deleted; holds the note as it was
    Delete(Note),
}

impl NoteCommand {
    pub fn note_id(&self) -> Uuid {
        match self {
            NoteCommand::Add(note) | NoteCommand::Delete(note) => note.id(),
            NoteCommand::Edit { after, .. } => after.id(),
        }
    }

    /// Short description for status messages
    pub fn describe(&self) -> &'static str {
        match self {
            NoteCommand::Add(_) => "add",
            NoteCommand::Edit { .. } => "edit",
            NoteCommand::Delete(_) => "delete",
        }
    }

    fn reapply<S: NoteStore>(&self, repo: &mut NoteRepository<S>) -> NotesResult<NoteChange> {
        Ok(match self {
            NoteCommand::Add(note) => NoteChange::Created(repo.restore(note)?),
            NoteCommand::Edit { after, .. } => NoteChange::Updated(repo.update(after)?),
            NoteCommand::Delete(note) => NoteChange::Deleted(repo.delete(note.id())?),
        })
    }

    fn revert<S: NoteStore>(&self, repo: &mut NoteRepository<S>) -> NotesResult<NoteChange> {
        Ok(match self {
            NoteCommand::Add(note) => NoteChange::Deleted(repo.delete(note.id())?),
            NoteCommand::Edit { before, .. } => NoteChange::Updated(repo.update(before)?),
            NoteCommand::Delete(note) => NoteChange::Created(repo.restore(note)?),
        })
    }
}

/// Which stack an undo/redo request addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryDirection::Undo => f.write_str("undo"),
            HistoryDirection::Redo => f.write_str("redo"),
        }
    }
}

/// Undo and redo stacks over a repository
#[derive(Debug)]
pub struct CommandHistory {
    undo_stack: VecDeque<NoteCommand>,
    redo_stack: Vec<NoteCommand>,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl CommandHistory {
    /// Create a history keeping at most `limit` undoable commands
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    pub fn create<S: NoteStore>(
        &mut self,
        repo: &mut NoteRepository<S>,
        draft: NoteDraft,
    ) -> NotesResult<NoteChange> {
        let note = repo.create(draft)?;
        self.record(NoteCommand::Add(note.clone()));
        Ok(NoteChange::Created(note))
    }

    pub fn update<S: NoteStore>(
        &mut self,
        repo: &mut NoteRepository<S>,
        note: &Note,
    ) -> NotesResult<NoteChange> {
        let before = repo.get(note.id())?.ok_or(NotesError::NotFound(note.id()))?;
        let after = repo.update(note)?;
        self.record(NoteCommand::Edit {
            before,
            after: after.clone(),
        });
        Ok(NoteChange::Updated(after))
    }

    pub fn delete<S: NoteStore>(
        &mut self,
        repo: &mut NoteRepository<S>,
        id: Uuid,
    ) -> NotesResult<NoteChange> {
        let note = repo.delete(id)?;
        self.record(NoteCommand::Delete(note.clone()));
        Ok(NoteChange::Deleted(note))
    }

    /// Revert the most recent command
    ///
    /// Returns `Ok(None)` when there is nothing to undo. A command whose
    /// revert fails is dropped rather than moved to the redo stack.
    pub fn undo<S: NoteStore>(
        &mut self,
        repo: &mut NoteRepository<S>,
    ) -> NotesResult<Option<NoteChange>> {
        let Some(command) = self.undo_stack.pop_back() else {
            return Ok(None);
        };

        debug!("Undoing {} of note {}", command.describe(), command.note_id());
        let change = command.revert(repo)?;
        self.redo_stack.push(command);
        Ok(Some(change))
    }

    /// Re-apply the most recently undone command
    pub fn redo<S: NoteStore>(
        &mut self,
        repo: &mut NoteRepository<S>,
    ) -> NotesResult<Option<NoteChange>> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(None);
        };

        debug!("Redoing {} of note {}", command.describe(), command.note_id());
        let change = command.reapply(repo)?;
        self.push_undo(command);
        Ok(Some(change))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Record a freshly executed command; new history invalidates redo
    fn record(&mut self, command: NoteCommand) {
        self.redo_stack.clear();
        self.push_undo(command);
    }

    fn push_undo(&mut self, command: NoteCommand) {
        if self.limit == 0 {
            return;
        }
        while self.undo_stack.len() >= self.limit {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(command);
    }
}
