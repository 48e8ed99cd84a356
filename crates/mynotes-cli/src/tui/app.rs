//! TUI application state

use std::time::{Duration, Instant};

use mynotes_core::{
    Config, Note, NoteChange, NoteColor, NoteListPresenter, NotesError, SortOrder,
    WorkerAction, WorkerCommand, WorkerEvent,
};
use uuid::Uuid;

use super::form::{NoteForm, TextInput};

/// How long status messages stay visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Quiet period before typed search text filters the list
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    List,
    Edit,
}

/// Input mode of the list screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    SortPicker,
    ConfirmDelete,
}

/// Work the event loop has to do outside the app state
#[derive(Debug)]
pub enum AppAction {
    Worker(WorkerCommand),
    /// Edit the open form's body in $EDITOR
    EditBody,
    OpenLink(String),
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub presenter: NoteListPresenter,
    /// Index into the visible list
    pub selected: usize,
    selected_id: Option<Uuid>,
    pub search: TextInput,
    search_edited_at: Option<Instant>,
    /// Highlighted row of the sort picker
    pub sort_cursor: usize,
    pub form: Option<NoteForm>,
    pub status_message: Option<String>,
    pub status_is_error: bool,
    pub status_message_time: Option<Instant>,
    pub show_help: bool,
    pub pending_g: Option<Instant>,
    /// A list load is in flight
    pub is_loading: bool,
    pub default_color: NoteColor,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            should_quit: false,
            screen: Screen::List,
            input_mode: InputMode::Normal,
            presenter: NoteListPresenter::new(config.sort_order),
            selected: 0,
            selected_id: None,
            search: TextInput::default(),
            search_edited_at: None,
            sort_cursor: 0,
            form: None,
            status_message: None,
            status_is_error: false,
            status_message_time: None,
            show_help: false,
            pending_g: None,
            is_loading: true,
            default_color: config.default_color,
        }
    }

    // ==================== Status ====================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = false;
        self.status_message_time = Some(Instant::now());
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.set_status(message);
        self.status_is_error = true;
    }

    /// Clear the status message once it has been shown long enough
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_is_error = false;
                self.status_message_time = None;
            }
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ==================== Selection ====================

    pub fn current_note(&self) -> Option<&Note> {
        self.presenter.get(self.selected)
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.selected_id = self.presenter.get(index).map(|n| n.id());
    }

    /// Re-find the selected note after the list changed
    fn follow_selection(&mut self) {
        let len = self.presenter.len();
        if len == 0 {
            self.selected = 0;
            self.selected_id = None;
            return;
        }

        let index = self
            .selected_id
            .and_then(|id| self.presenter.position_of(id))
            .unwrap_or_else(|| self.selected.min(len - 1));
        self.select(index);
    }

    fn select_note(&mut self, id: Uuid) {
        self.selected_id = Some(id);
        self.follow_selection();
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.select(self.selected - 1);
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.presenter.len() {
            self.select(self.selected + 1);
        }
    }

    pub fn move_to_first(&mut self) {
        if !self.presenter.is_empty() {
            self.select(0);
        }
    }

    pub fn move_to_last(&mut self) {
        if !self.presenter.is_empty() {
            self.select(self.presenter.len() - 1);
        }
    }

    // ==================== Search ====================

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Record a search edit made at `now`
    pub fn search_edited(&mut self, now: Instant) {
        self.search_edited_at = Some(now);
    }

    /// Filter by the typed search once typing has paused; `true` if applied
    pub fn due_search(&mut self, now: Instant) -> bool {
        let Some(edited) = self.search_edited_at else {
            return false;
        };
        if now.duration_since(edited) < SEARCH_DEBOUNCE {
            return false;
        }
        self.flush_search()
    }

    /// Filter by the typed search right away
    ///
    /// Filtering is local: the presenter keeps every stored note, so the
    /// totals and the empty-list message stay accurate while searching.
    pub fn flush_search(&mut self) -> bool {
        self.search_edited_at = None;
        if self.search.value() == self.presenter.query() {
            return false;
        }
        let query = self.search.value().to_string();
        self.presenter.set_query(&query);
        self.follow_selection();
        true
    }

    /// Drop the search and show everything again
    pub fn clear_search(&mut self) {
        self.search.clear();
        self.exit_input_mode();
        self.flush_search();
    }

    // ==================== Sort & filter ====================

    pub fn open_sort_picker(&mut self) {
        self.sort_cursor = SortOrder::ALL
            .iter()
            .position(|s| *s == self.presenter.sort())
            .unwrap_or(0);
        self.input_mode = InputMode::SortPicker;
    }

    pub fn sort_picker_up(&mut self) {
        self.sort_cursor = self.sort_cursor.saturating_sub(1);
    }

    pub fn sort_picker_down(&mut self) {
        self.sort_cursor = (self.sort_cursor + 1).min(SortOrder::ALL.len() - 1);
    }

    pub fn apply_sort_picker(&mut self) {
        let sort = SortOrder::ALL[self.sort_cursor];
        self.exit_input_mode();
        if self.presenter.set_sort(sort).is_some() {
            self.follow_selection();
            self.set_status(format!("Sorted by {}", sort.label()));
        }
    }

    /// Cycle the color filter: off, then each color in turn
    pub fn cycle_color_filter(&mut self) {
        let next = match self.presenter.filter().color {
            None => Some(NoteColor::ALL[0]),
            Some(color) => {
                let pos = NoteColor::ALL.iter().position(|c| *c == color).unwrap_or(0);
                NoteColor::ALL.get(pos + 1).copied()
            }
        };
        self.presenter.set_color_filter(next);
        self.follow_selection();
        match next {
            Some(color) => self.set_status(format!("Showing {} notes", color.name())),
            None => self.set_status("Showing all colors"),
        }
    }

    // ==================== Notes ====================

    pub fn open_new_note(&mut self) {
        self.form = Some(NoteForm::create(self.default_color));
        self.screen = Screen::Edit;
    }

    pub fn open_selected_note(&mut self) {
        if let Some(note) = self.current_note() {
            self.form = Some(NoteForm::edit(note));
            self.screen = Screen::Edit;
        }
    }

    /// Leave the edit screen without saving
    pub fn close_form(&mut self) {
        self.form = None;
        self.screen = Screen::List;
    }

    /// Save the open form; `None` if a save is already running
    pub fn save_form(&mut self) -> Option<WorkerCommand> {
        let form = self.form.as_mut()?;
        if form.saving {
            return None;
        }
        if !form.is_new() && !form.is_dirty() {
            self.close_form();
            return None;
        }
        Some(form.save_command())
    }

    pub fn request_delete(&mut self) {
        if self.current_note().is_some() {
            self.input_mode = InputMode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self) -> Option<WorkerCommand> {
        self.exit_input_mode();
        self.current_note().map(|n| WorkerCommand::Delete(n.id()))
    }

    /// Web link of the selected note, with a scheme so it can be opened
    pub fn current_link(&self) -> Option<String> {
        let link = self.current_note()?.web_link.as_deref()?;
        if link.contains("://") {
            Some(link.to_string())
        } else {
            Some(format!("https://{}", link))
        }
    }

    // ==================== Worker events ====================

    pub fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Loaded(notes) => {
                self.is_loading = false;
                self.presenter.replace_all(notes);
                self.follow_selection();
            }
            WorkerEvent::Changed { origin, change } => self.handle_change(origin, change),
            WorkerEvent::NothingTo(direction) => {
                self.set_status(format!("Nothing to {}", direction));
            }
            WorkerEvent::Failed { action, error } => self.handle_failure(action, error),
        }
    }

    fn handle_change(&mut self, origin: WorkerAction, change: NoteChange) {
        let id = change.id();
        let deleted = matches!(change, NoteChange::Deleted(_));

        // Close the form once its save or delete went through
        let form_done = self.form.as_ref().is_some_and(|form| match origin {
            WorkerAction::Create => form.is_new() && form.saving,
            WorkerAction::Update => form.note_id() == Some(id) && form.saving,
            _ => deleted && form.note_id() == Some(id),
        });
        if form_done {
            self.close_form();
        }

        self.presenter.apply(change);
        if deleted {
            self.follow_selection();
        } else {
            self.select_note(id);
        }

        let message = match (origin, deleted) {
            (WorkerAction::Create, _) => "Note created",
            (WorkerAction::Update, _) => "Note saved",
            (WorkerAction::Delete, _) => "Note deleted (u to undo)",
            (WorkerAction::Undo, _) => "Undone",
            (WorkerAction::Redo, _) => "Redone",
            (_, true) => "Note deleted",
            (_, false) => "Note updated",
        };
        self.set_status(message);
    }

    fn handle_failure(&mut self, action: WorkerAction, error: NotesError) {
        match error {
            NotesError::Validation(issues) => match self.form.as_mut() {
                Some(form) => {
                    form.reject(issues);
                    self.set_error("Fix the highlighted fields");
                }
                None => self.set_error(issues.to_string()),
            },
            error if error.is_not_found() => {
                // The worker reloads after this
                if self.form.as_ref().is_some_and(|f| f.saving || f.confirm_delete) {
                    self.close_form();
                }
                self.is_loading = true;
                self.set_error(format!("Couldn't {}: {}", action, error.user_message()));
            }
            error => {
                if let Some(form) = self.form.as_mut() {
                    form.saving = false;
                }
                if action == WorkerAction::Refresh {
                    self.is_loading = false;
                }
                self.set_error(format!("Couldn't {}: {}", action, error.user_message()));
            }
        }
    }

    /// Text for the list block title
    pub fn list_title(&self) -> String {
        let mut title = format!(" Notes ({}", self.presenter.len());
        if self.presenter.len() != self.presenter.total() {
            title.push_str(&format!(" of {}", self.presenter.total()));
        }
        title.push(')');
        if let Some(color) = self.presenter.filter().color {
            title.push_str(&format!(" [{}]", color.name()));
        }
        title.push_str(&format!(" - {} ", self.presenter.sort().label()));
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mynotes_core::{HistoryDirection, NoteDraft, NoteField, NoteRepository, ValidationError};

    fn app() -> App {
        App::new(&Config::default())
    }

    fn notes(titles: &[&str]) -> (NoteRepository, Vec<Note>) {
        let mut repo = NoteRepository::open_in_memory().unwrap();
        let notes = titles
            .iter()
            .map(|t| repo.create(NoteDraft::new().with_title(*t)).unwrap())
            .collect();
        (repo, notes)
    }

    fn loaded(app: &mut App, repo: &NoteRepository) {
        app.handle_worker_event(WorkerEvent::Loaded(repo.list().unwrap()));
    }

    #[test]
    fn test_loaded_fills_list() {
        let (repo, _) = notes(&["a", "b"]);
        let mut app = app();
        assert!(app.is_loading);

        loaded(&mut app, &repo);
        assert!(!app.is_loading);
        assert_eq!(app.presenter.len(), 2);
        assert_eq!(app.current_note().unwrap().title, "b");
    }

    #[test]
    fn test_navigation() {
        let (repo, _) = notes(&["a", "b", "c"]);
        let mut app = app();
        loaded(&mut app, &repo);

        app.move_down();
        app.move_down();
        app.move_down();
        assert_eq!(app.selected, 2);
        app.move_to_first();
        assert_eq!(app.selected, 0);
        app.move_up();
        assert_eq!(app.selected, 0);
        app.move_to_last();
        assert_eq!(app.current_note().unwrap().title, "a");
    }

    #[test]
    fn test_change_selects_changed_note() {
        let (mut repo, created) = notes(&["a", "b", "c"]);
        let mut app = app();
        loaded(&mut app, &repo);

        // Select "b" and then bump "a" to the top
        app.move_down();
        assert_eq!(app.current_note().unwrap().title, "b");
        let updated = repo.update(&created[0]).unwrap();
        app.handle_worker_event(WorkerEvent::Changed {
            origin: WorkerAction::Undo,
            change: NoteChange::Updated(updated),
        });

        assert_eq!(app.current_note().unwrap().title, "a");
    }

    #[test]
    fn test_create_closes_form() {
        let (mut repo, _) = notes(&[]);
        let mut app = app();
        loaded(&mut app, &repo);

        app.open_new_note();
        let form = app.form.as_mut().unwrap();
        form.title.set("Fresh");
        let command = app.save_form().unwrap();
        assert!(app.save_form().is_none(), "second save while saving");

        let WorkerCommand::Create(draft) = command else {
            panic!("expected create");
        };
        let note = repo.create(draft).unwrap();
        app.handle_worker_event(WorkerEvent::Changed {
            origin: WorkerAction::Create,
            change: NoteChange::Created(note),
        });

        assert_eq!(app.screen, Screen::List);
        assert!(app.form.is_none());
        assert_eq!(app.current_note().unwrap().title, "Fresh");
        assert_eq!(app.status_message.as_deref(), Some("Note created"));
    }

    #[test]
    fn test_validation_failure_keeps_form_open() {
        let mut app = app();
        app.open_new_note();
        app.save_form();

        let mut issues = ValidationError::new();
        issues.push(NoteField::Body, "Note can't be empty");
        app.handle_worker_event(WorkerEvent::Failed {
            action: WorkerAction::Create,
            error: NotesError::Validation(issues),
        });

        let form = app.form.as_ref().unwrap();
        assert_eq!(app.screen, Screen::Edit);
        assert!(!form.saving);
        assert!(form.issues.is_some());
        assert!(app.status_is_error);
    }

    #[test]
    fn test_unchanged_edit_closes_without_saving() {
        let (repo, _) = notes(&["a"]);
        let mut app = app();
        loaded(&mut app, &repo);

        app.open_selected_note();
        assert_eq!(app.screen, Screen::Edit);
        assert!(app.save_form().is_none());
        assert_eq!(app.screen, Screen::List);
    }

    #[test]
    fn test_delete_and_not_found() {
        let (mut repo, _) = notes(&["a", "b"]);
        let mut app = app();
        loaded(&mut app, &repo);

        app.request_delete();
        assert_eq!(app.input_mode, InputMode::ConfirmDelete);
        let Some(WorkerCommand::Delete(id)) = app.confirm_delete() else {
            panic!("expected delete");
        };
        assert_eq!(app.input_mode, InputMode::Normal);

        let deleted = repo.delete(id).unwrap();
        app.handle_worker_event(WorkerEvent::Changed {
            origin: WorkerAction::Delete,
            change: NoteChange::Deleted(deleted),
        });
        assert_eq!(app.presenter.len(), 1);
        assert_eq!(app.current_note().unwrap().title, "a");

        app.handle_worker_event(WorkerEvent::Failed {
            action: WorkerAction::Delete,
            error: NotesError::NotFound(id),
        });
        assert!(app.status_is_error);
        assert!(app.is_loading);
    }

    #[test]
    fn test_search_debounce() {
        let (repo, _) = notes(&["rust", "go"]);
        let mut app = app();
        loaded(&mut app, &repo);

        let start = Instant::now();
        app.enter_search_mode();
        app.search.insert('r');
        app.search_edited(start);

        // Nothing filters until typing pauses
        assert!(!app.due_search(start));
        assert_eq!(app.presenter.len(), 2);

        assert!(app.due_search(start + SEARCH_DEBOUNCE));
        assert_eq!(app.presenter.len(), 1);
        assert!(!app.due_search(start + SEARCH_DEBOUNCE * 2));

        app.clear_search();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.presenter.len(), 2);
    }

    #[test]
    fn test_search_keeps_every_note() {
        let (repo, _) = notes(&["Groceries"]);
        let mut app = app();
        loaded(&mut app, &repo);

        app.enter_search_mode();
        for c in "zzz".chars() {
            app.search.insert(c);
        }
        assert!(app.flush_search());

        assert!(app.presenter.is_empty());
        assert_eq!(app.presenter.total(), 1);
        assert_eq!(app.list_title(), " Notes (0 of 1) - Recently updated ");

        // A reload after the search still holds the whole store
        loaded(&mut app, &repo);
        assert_eq!(app.presenter.total(), 1);

        app.clear_search();
        assert_eq!(app.current_note().unwrap().title, "Groceries");
    }

    #[test]
    fn test_sort_picker_and_color_filter() {
        let mut repo = NoteRepository::open_in_memory().unwrap();
        repo.create(NoteDraft::new().with_title("b")).unwrap();
        repo.create(NoteDraft::new().with_title("a").with_color(NoteColor::Yellow))
            .unwrap();
        let mut app = app();
        loaded(&mut app, &repo);

        app.open_sort_picker();
        while SortOrder::ALL[app.sort_cursor] != SortOrder::Title {
            app.sort_picker_down();
        }
        app.apply_sort_picker();
        assert_eq!(app.presenter.sort(), SortOrder::Title);
        assert_eq!(app.current_note().unwrap().title, "a");

        app.cycle_color_filter();
        assert_eq!(app.presenter.filter().color, Some(NoteColor::ALL[0]));
        while app.presenter.filter().color != Some(NoteColor::Yellow) {
            app.cycle_color_filter();
        }
        assert_eq!(app.presenter.len(), 1);
        while app.presenter.filter().color.is_some() {
            app.cycle_color_filter();
        }
        assert_eq!(app.presenter.filter().color, None);
    }

    #[test]
    fn test_nothing_to_undo_and_status_timeout() {
        let mut app = app();
        app.handle_worker_event(WorkerEvent::NothingTo(HistoryDirection::Undo));
        assert_eq!(app.status_message.as_deref(), Some("Nothing to undo"));

        app.status_message_time = Some(Instant::now() - Duration::from_secs(4));
        app.check_status_timeout();
        assert!(app.status_message.is_none());
    }
}
