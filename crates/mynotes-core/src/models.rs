//! Data models for mynotes
//!
//! Defines the stored `Note`, the user-editable `NoteDraft`, and the
//! `NoteColor` palette used to tint notes in list views.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A stored note
///
/// `id` and the timestamps are owned by the persistence store: the id is
/// assigned on insert and never changes, `updated_at` moves forward on every
/// mutation. Everything else is user content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub(crate) id: Uuid,
    /// Note title
    pub title: String,
    /// Short secondary line shown under the title
    pub subtitle: String,
    /// Note body content
    pub body: String,
    /// Palette color
    pub color: NoteColor,
    /// Path to an image attached to the note
    pub image_path: Option<String>,
    /// Web link attached to the note
    pub web_link: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Note {
    /// Build a stored note from a draft (store use only)
    pub(crate) fn from_draft(id: Uuid, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            subtitle: draft.subtitle,
            body: draft.body,
            color: draft.color,
            image_path: draft.image_path,
            web_link: draft.web_link,
            created_at: now,
            updated_at: now,
        }
    }

    /// Unique identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this note was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When this note was last updated
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Title as shown in lists; body-only notes use their first non-blank line
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if !title.is_empty() {
            return title;
        }
        self.body
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("Untitled")
    }

    /// Short id for display (first 8 characters of the UUID)
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }

    /// Copy the editable fields into a draft
    pub fn to_draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            body: self.body.clone(),
            color: self.color,
            image_path: self.image_path.clone(),
            web_link: self.web_link.clone(),
        }
    }

    /// Replace the editable fields with those of a draft
    ///
    /// Id and timestamps are left alone; the store decides the new
    /// `updated_at` when the note is written back.
    pub fn apply_draft(&mut self, draft: NoteDraft) {
        self.title = draft.title;
        self.subtitle = draft.subtitle;
        self.body = draft.body;
        self.color = draft.color;
        self.image_path = draft.image_path;
        self.web_link = draft.web_link;
    }

    /// Set the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Set the subtitle
    pub fn set_subtitle(&mut self, subtitle: impl Into<String>) {
        self.subtitle = subtitle.into();
    }

    /// Set the body
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Set the color
    pub fn set_color(&mut self, color: NoteColor) {
        self.color = color;
    }

    /// Set or clear the web link
    pub fn set_web_link(&mut self, web_link: Option<String>) {
        self.web_link = web_link;
    }

    /// Set or clear the image path
    pub fn set_image_path(&mut self, image_path: Option<String>) {
        self.image_path = image_path;
    }

    /// Whether the note matches a case-insensitive text query
    ///
    /// Title, subtitle and body are searched. A blank query matches.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.subtitle.to_lowercase().contains(&query)
            || self.body.to_lowercase().contains(&query)
    }
}

/// User-supplied content for a new or edited note
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub color: NoteColor,
    pub image_path: Option<String>,
    pub web_link: Option<String>,
}

impl NoteDraft {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    pub fn with_web_link(mut self, web_link: impl Into<String>) -> Self {
        self.web_link = Some(web_link.into());
        self
    }
}

/// Palette of note colors
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Default,
    Yellow,
    Red,
    Blue,
    Green,
    Purple,
}

impl NoteColor {
    /// Every palette entry, in picker order
    pub const ALL: [NoteColor; 6] = [
        NoteColor::Default,
        NoteColor::Yellow,
        NoteColor::Red,
        NoteColor::Blue,
        NoteColor::Green,
        NoteColor::Purple,
    ];

    /// Hex code (`#RRGGBB`, uppercase)
    pub fn hex(self) -> &'static str {
        match self {
            NoteColor::Default => "#333333",
            NoteColor::Yellow => "#FDBE3B",
            NoteColor::Red => "#FF4842",
            NoteColor::Blue => "#3A52FC",
            NoteColor::Green => "#17C51E",
            NoteColor::Purple => "#AF00FF",
        }
    }

    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            NoteColor::Default => "default",
            NoteColor::Yellow => "yellow",
            NoteColor::Red => "red",
            NoteColor::Blue => "blue",
            NoteColor::Green => "green",
            NoteColor::Purple => "purple",
        }
    }

    /// RGB components of the hex code
    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = &self.hex()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }

    /// Decode a stored color, falling back to `Default` for anything unknown
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Next palette entry (wrapping), used by color pickers
    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    /// Previous palette entry (wrapping)
    pub fn prev(self) -> Self {
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a color name or hex code isn't in the palette
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown color '{0}'. Valid colors: default, yellow, red, blue, green, purple")]
pub struct ParseColorError(pub String);

impl FromStr for NoteColor {
    type Err = ParseColorError;

    /// Accepts a palette name or hex code, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        NoteColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(needle) || c.hex().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

/// Current time truncated to the millisecond precision used on disk
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        let draft = NoteDraft::new()
            .with_title("Groceries")
            .with_subtitle("Saturday")
            .with_body("Milk, eggs, Bread");
        Note::from_draft(Uuid::new_v4(), draft, now_millis())
    }

    #[test]
    fn test_draft_builder() {
        let draft = NoteDraft::new()
            .with_title("Title")
            .with_body("Body")
            .with_color(NoteColor::Green)
            .with_web_link("https://example.com")
            .with_image_path("/tmp/cat.png");
        assert_eq!(draft.title, "Title");
        assert_eq!(draft.body, "Body");
        assert!(draft.subtitle.is_empty());
        assert_eq!(draft.color, NoteColor::Green);
        assert_eq!(draft.web_link.as_deref(), Some("https://example.com"));
        assert_eq!(draft.image_path.as_deref(), Some("/tmp/cat.png"));
    }

    #[test]
    fn test_from_draft_sets_timestamps() {
        let note = sample_note();
        assert_eq!(note.created_at(), note.updated_at());
        assert_eq!(note.short_id().len(), 8);
    }

    #[test]
    fn test_draft_round_trip_through_note() {
        let mut note = sample_note();
        let id = note.id();
        let mut draft = note.to_draft();
        draft.title = "Hardware store".to_string();
        note.apply_draft(draft);
        assert_eq!(note.title, "Hardware store");
        assert_eq!(note.subtitle, "Saturday");
        assert_eq!(note.id(), id);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let note = sample_note();
        assert!(note.matches("grocer"));
        assert!(note.matches("SATURDAY"));
        assert!(note.matches("bread"));
        assert!(note.matches("  "));
        assert!(!note.matches("butter"));
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("yellow".parse::<NoteColor>().unwrap(), NoteColor::Yellow);
        assert_eq!("#fdbe3b".parse::<NoteColor>().unwrap(), NoteColor::Yellow);
        assert_eq!(" #3A52Fc ".parse::<NoteColor>().unwrap(), NoteColor::Blue);
        assert_eq!("Purple".parse::<NoteColor>().unwrap(), NoteColor::Purple);
        assert!("#123456".parse::<NoteColor>().is_err());
    }

    #[test]
    fn test_color_from_stored_falls_back() {
        assert_eq!(NoteColor::from_stored(Some("#FF4842")), NoteColor::Red);
        assert_eq!(NoteColor::from_stored(Some("mauve")), NoteColor::Default);
        assert_eq!(NoteColor::from_stored(None), NoteColor::Default);
    }

    #[test]
    fn test_color_cycle() {
        assert_eq!(NoteColor::Default.next(), NoteColor::Yellow);
        assert_eq!(NoteColor::Purple.next(), NoteColor::Default);
        assert_eq!(NoteColor::Default.prev(), NoteColor::Purple);
    }

    #[test]
    fn test_color_rgb() {
        assert_eq!(NoteColor::Default.rgb(), (0x33, 0x33, 0x33));
        assert_eq!(NoteColor::Red.rgb(), (0xFF, 0x48, 0x42));
    }

    #[test]
    fn test_note_serialization() {
        let note = sample_note();
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"color\":\"default\""));
        let deserialized: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(note, deserialized);
    }
}
