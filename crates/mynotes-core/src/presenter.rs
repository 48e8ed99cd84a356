//! Cached, ordered note list for list views
//!
//! `NoteListPresenter` mirrors the store and keeps a visible sequence (the
//! mirror filtered by the current query and ordered by the current sort).
//! Each mutation reported through `apply` yields at most one `ListChange`
//! so a view only needs to redraw the affected row.

use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Note, NoteColor};
use crate::query::{NoteFilter, SortOrder};

/// A persisted mutation, as reported by the repository or worker
#[derive(Debug, Clone, PartialEq)]
pub enum NoteChange {
    Created(Note),
    Updated(Note),
    Deleted(Note),
}

impl NoteChange {
    /// The note as it is after the change (or as it was, for deletes)
    pub fn note(&self) -> &Note {
        match self {
            NoteChange::Created(n) | NoteChange::Updated(n) | NoteChange::Deleted(n) => n,
        }
    }

    pub fn id(&self) -> Uuid {
        self.note().id()
    }
}

/// Row-level notification for the visible sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    Inserted { index: usize },
    Removed { index: usize },
    Changed { index: usize },
    Moved { from: usize, to: usize },
    /// The whole sequence changed
    Reset,
}

#[derive(Debug, Default)]
pub struct NoteListPresenter {
    mirror: Vec<Note>,
    visible: Vec<Note>,
    filter: NoteFilter,
    sort: SortOrder,
}

impl NoteListPresenter {
    pub fn new(sort: SortOrder) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Replace the mirror with a fresh load from the store
    pub fn replace_all(&mut self, notes: Vec<Note>) -> ListChange {
        self.mirror = notes;
        self.rebuild()
    }

    /// Fold a single persisted change into the list
    ///
    /// Returns `None` when the note is hidden by the filter both before and
    /// after the change.
    pub fn apply(&mut self, change: NoteChange) -> Option<ListChange> {
        match change {
            NoteChange::Created(note) | NoteChange::Updated(note) => self.upsert(note),
            NoteChange::Deleted(note) => self.remove(note.id()),
        }
    }

    fn upsert(&mut self, note: Note) -> Option<ListChange> {
        match self.mirror.iter().position(|n| n.id() == note.id()) {
            Some(i) => self.mirror[i] = note.clone(),
            None => self.mirror.push(note.clone()),
        }

        let old = self.position_of(note.id());
        if let Some(index) = old {
            self.visible.remove(index);
        }

        if !self.filter.matches(&note) {
            return old.map(|index| ListChange::Removed { index });
        }

        let new = self.insertion_point(&note);
        self.visible.insert(new, note);

        Some(match old {
            Some(from) if from == new => ListChange::Changed { index: new },
            Some(from) => ListChange::Moved { from, to: new },
            None => ListChange::Inserted { index: new },
        })
    }

    fn remove(&mut self, id: Uuid) -> Option<ListChange> {
        self.mirror.retain(|n| n.id() != id);
        let index = self.position_of(id)?;
        self.visible.remove(index);
        Some(ListChange::Removed { index })
    }

    fn insertion_point(&self, note: &Note) -> usize {
        self.visible
            .partition_point(|n| self.sort.compare(n, note).is_lt())
    }

    fn rebuild(&mut self) -> ListChange {
        self.visible = self.filter.apply(&self.mirror, self.sort);
        ListChange::Reset
    }

    /// Set the text query; `None` if it didn't change
    pub fn set_query(&mut self, text: &str) -> Option<ListChange> {
        if self.filter.text == text {
            return None;
        }
        self.filter.text = text.to_string();
        Some(self.rebuild())
    }

    pub fn set_color_filter(&mut self, color: Option<NoteColor>) -> Option<ListChange> {
        if self.filter.color == color {
            return None;
        }
        self.filter.color = color;
        Some(self.rebuild())
    }

    pub fn set_sort(&mut self, sort: SortOrder) -> Option<ListChange> {
        if self.sort == sort {
            return None;
        }
        self.sort = sort;
        Some(self.rebuild())
    }

    pub fn query(&self) -> &str {
        &self.filter.text
    }

    pub fn filter(&self) -> &NoteFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// The visible sequence
    pub fn items(&self) -> &[Note] {
        &self.visible
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.visible.get(index)
    }

    pub fn find(&self, id: Uuid) -> Option<&Note> {
        self.mirror.iter().find(|n| n.id() == id)
    }

    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.visible.iter().position(|n| n.id() == id)
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Number of notes in the mirror, ignoring the filter
    pub fn total(&self) -> usize {
        self.mirror.len()
    }

    pub fn rows(&self) -> Vec<NoteRow<'_>> {
        self.visible.iter().map(NoteRow::from_note).collect()
    }
}

/// Display projection of a note for one list row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NoteRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    /// `None` when the note's subtitle is blank
    pub subtitle: Option<&'a str>,
    pub date_label: String,
    pub color: NoteColor,
    pub color_hex: &'static str,
    pub has_image: bool,
    pub has_link: bool,
}

impl<'a> NoteRow<'a> {
    pub fn from_note(note: &'a Note) -> Self {
        let subtitle = note.subtitle.trim();
        Self {
            id: note.id(),
            title: row_title(note),
            subtitle: (!subtitle.is_empty()).then_some(subtitle),
            date_label: date_label(note),
            color: note.color,
            color_hex: note.color.hex(),
            has_image: note.image_path.is_some(),
            has_link: note.web_link.is_some(),
        }
    }
}

/// Title for display; body-only notes use their first non-blank line
pub fn row_title(note: &Note) -> &str {
    note.display_title()
}

/// Local-time label for a note's last update, e.g. "Friday, 16 October 2026 09:41 AM"
pub fn date_label(note: &Note) -> String {
    note.updated_at()
        .with_timezone(&Local)
        .format("%A, %d %B %Y %I:%M %p")
        .to_string()
}
