//! Edit/create screen state

use mynotes_core::{Note, NoteColor, NoteDraft, NoteField, ValidationError, WorkerCommand};
use uuid::Uuid;

/// Single or multi-line text buffer with a cursor
///
/// The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    /// Create an input with the cursor at the end
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, value: impl Into<String>) {
        *self = Self::new(value);
    }

    pub fn clear(&mut self) {
        self.set(String::new());
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    /// Delete the character under the cursor
    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    /// Move to the start of the current line
    pub fn home(&mut self) {
        let (_, col) = self.cursor_position();
        self.cursor -= col;
    }

    /// Move to the end of the current line
    pub fn end(&mut self) {
        let rest = self
            .value
            .chars()
            .skip(self.cursor)
            .take_while(|c| *c != '\n')
            .count();
        self.cursor += rest;
    }

    /// Cursor as (line, column), both zero-based
    pub fn cursor_position(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for c in self.value.chars().take(self.cursor) {
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}

/// Fields of the edit screen, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Subtitle,
    Color,
    WebLink,
    ImagePath,
    Body,
}

impl EditField {
    pub const ALL: [EditField; 6] = [
        EditField::Title,
        EditField::Subtitle,
        EditField::Color,
        EditField::WebLink,
        EditField::ImagePath,
        EditField::Body,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditField::Title => "Title",
            EditField::Subtitle => "Subtitle",
            EditField::Color => "Color",
            EditField::WebLink => "Web link",
            EditField::ImagePath => "Image",
            EditField::Body => "Note",
        }
    }

    /// The validated field this input maps to
    pub fn note_field(self) -> Option<NoteField> {
        match self {
            EditField::Title => Some(NoteField::Title),
            EditField::Subtitle => Some(NoteField::Subtitle),
            EditField::Color => None,
            EditField::WebLink => Some(NoteField::WebLink),
            EditField::ImagePath => Some(NoteField::ImagePath),
            EditField::Body => Some(NoteField::Body),
        }
    }

    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let pos = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// State of the edit/create screen
#[derive(Debug, Clone)]
pub struct NoteForm {
    /// The note being edited; `None` when creating
    pub original: Option<Note>,
    pub title: TextInput,
    pub subtitle: TextInput,
    pub body: TextInput,
    pub web_link: TextInput,
    pub image_path: TextInput,
    pub color: NoteColor,
    pub focus: EditField,
    /// Issues from the last rejected save
    pub issues: Option<ValidationError>,
    /// A save is in flight
    pub saving: bool,
    /// Waiting for the user to confirm deletion
    pub confirm_delete: bool,
    initial: NoteDraft,
}

impl NoteForm {
    /// Blank form for a new note
    pub fn create(color: NoteColor) -> Self {
        Self::from_draft(None, NoteDraft::new().with_color(color))
    }

    /// Form prefilled from an existing note
    pub fn edit(note: &Note) -> Self {
        Self::from_draft(Some(note.clone()), note.to_draft())
    }

    fn from_draft(original: Option<Note>, draft: NoteDraft) -> Self {
        Self {
            original,
            title: TextInput::new(draft.title.clone()),
            subtitle: TextInput::new(draft.subtitle.clone()),
            body: TextInput::new(draft.body.clone()),
            web_link: TextInput::new(draft.web_link.clone().unwrap_or_default()),
            image_path: TextInput::new(draft.image_path.clone().unwrap_or_default()),
            color: draft.color,
            focus: EditField::Title,
            issues: None,
            saving: false,
            confirm_delete: false,
            initial: draft,
        }
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    pub fn note_id(&self) -> Option<Uuid> {
        self.original.as_ref().map(|n| n.id())
    }

    /// Current contents as a draft
    pub fn draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.value().to_string(),
            subtitle: self.subtitle.value().to_string(),
            body: self.body.value().to_string(),
            color: self.color,
            web_link: optional(self.web_link.value()),
            image_path: optional(self.image_path.value()),
        }
    }

    /// Whether anything changed since the form opened
    pub fn is_dirty(&self) -> bool {
        self.draft() != self.initial
    }

    /// Mark the form as saving and build the command that saves it
    pub fn save_command(&mut self) -> WorkerCommand {
        self.saving = true;
        match &self.original {
            Some(note) => {
                let mut note = note.clone();
                note.apply_draft(self.draft());
                WorkerCommand::Update(note)
            }
            None => WorkerCommand::Create(self.draft()),
        }
    }

    /// Show issues from a rejected save and focus the first bad field
    pub fn reject(&mut self, issues: ValidationError) {
        self.saving = false;
        if let Some(first) = issues.issues().first() {
            if let Some(field) = EditField::ALL
                .iter()
                .find(|f| f.note_field() == Some(first.field))
            {
                self.focus = *field;
            }
        }
        self.issues = Some(issues);
    }

    pub fn issue_for(&self, field: EditField) -> Option<&str> {
        let note_field = field.note_field()?;
        self.issues.as_ref()?.for_field(note_field)
    }

    pub fn input(&self, field: EditField) -> Option<&TextInput> {
        match field {
            EditField::Title => Some(&self.title),
            EditField::Subtitle => Some(&self.subtitle),
            EditField::Body => Some(&self.body),
            EditField::WebLink => Some(&self.web_link),
            EditField::ImagePath => Some(&self.image_path),
            EditField::Color => None,
        }
    }

    /// The focused text input, `None` when the color picker has focus
    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            EditField::Title => Some(&mut self.title),
            EditField::Subtitle => Some(&mut self.subtitle),
            EditField::Body => Some(&mut self.body),
            EditField::WebLink => Some(&mut self.web_link),
            EditField::ImagePath => Some(&mut self.image_path),
            EditField::Color => None,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Replace the body (after editing it externally)
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body.set(body);
        self.focus = EditField::Body;
    }
}

fn optional(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
