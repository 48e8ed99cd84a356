//! Sorting and filtering of note lists
//!
//! `SortOrder::Recent` uses the same key as the store's `list()`
//! (`updated_at DESC, created_at DESC, id DESC`), so a freshly loaded list is
//! already in Recent order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Note, NoteColor};

/// How a note list is ordered
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently updated first
    #[default]
    Recent,
    /// Most recently created first
    Created,
    /// Alphabetical by title, case-insensitive
    Title,
    /// Grouped by palette color
    Color,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Recent,
        SortOrder::Created,
        SortOrder::Title,
        SortOrder::Color,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortOrder::Recent => "recent",
            SortOrder::Created => "created",
            SortOrder::Title => "title",
            SortOrder::Color => "color",
        }
    }

    /// Human label for pickers
    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Recent => "Recently updated",
            SortOrder::Created => "Recently created",
            SortOrder::Title => "Title",
            SortOrder::Color => "Color",
        }
    }

    /// Next order (wrapping)
    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    /// Total order between two notes
    ///
    /// Every order falls back to recency and then id, so sorting is
    /// deterministic even when the primary keys tie.
    pub fn compare(self, a: &Note, b: &Note) -> Ordering {
        let primary = match self {
            SortOrder::Recent => Ordering::Equal,
            SortOrder::Created => b.created_at.cmp(&a.created_at),
            SortOrder::Title => a
                .display_title()
                .to_lowercase()
                .cmp(&b.display_title().to_lowercase()),
            SortOrder::Color => color_rank(a.color).cmp(&color_rank(b.color)),
        };
        primary.then_with(|| recency(a, b))
    }

    /// Sort notes in place
    pub fn sort(self, notes: &mut [Note]) {
        notes.sort_by(|a, b| self.compare(a, b));
    }
}

fn recency(a: &Note, b: &Note) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

fn color_rank(color: NoteColor) -> usize {
    NoteColor::ALL
        .iter()
        .position(|c| *c == color)
        .unwrap_or(0)
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown sort order '{0}'. Valid orders: recent, created, title, color")]
pub struct ParseSortError(pub String);

impl FromStr for SortOrder {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recent" | "date" | "updated" => Ok(SortOrder::Recent),
            "created" => Ok(SortOrder::Created),
            "title" => Ok(SortOrder::Title),
            "color" | "colour" => Ok(SortOrder::Color),
            _ => Err(ParseSortError(s.to_string())),
        }
    }
}

/// Filter applied on top of a note list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Case-insensitive substring over title, subtitle and body
    pub text: String,
    /// Only notes with this color
    pub color: Option<NoteColor>,
}

impl NoteFilter {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.color.is_none()
    }

    pub fn matches(&self, note: &Note) -> bool {
        if let Some(color) = self.color {
            if note.color != color {
                return false;
            }
        }
        note.matches(&self.text)
    }

    /// Filter then sort a list of notes
    pub fn apply(&self, notes: &[Note], order: SortOrder) -> Vec<Note> {
        let mut out: Vec<Note> = notes.iter().filter(|n| self.matches(n)).cloned().collect();
        order.sort(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{now_millis, NoteDraft};
    use chrono::Duration;
    use uuid::Uuid;

    fn note(title: &str, color: NoteColor, created_offset: i64, updated_offset: i64) -> Note {
        let base = now_millis();
        let mut note = Note::from_draft(
            Uuid::new_v4(),
            NoteDraft::new().with_title(title).with_color(color),
            base + Duration::seconds(created_offset),
        );
        note.updated_at = base + Duration::seconds(updated_offset);
        note
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_sort_recent() {
        let mut notes = vec![
            note("old", NoteColor::Default, 0, 1),
            note("edited", NoteColor::Default, 0, 10),
            note("new", NoteColor::Default, 5, 5),
        ];
        SortOrder::Recent.sort(&mut notes);
        assert_eq!(titles(&notes), vec!["edited", "new", "old"]);
    }

    #[test]
    fn test_sort_created() {
        let mut notes = vec![
            note("first", NoteColor::Default, 0, 100),
            note("second", NoteColor::Default, 5, 5),
        ];
        SortOrder::Created.sort(&mut notes);
        assert_eq!(titles(&notes), vec!["second", "first"]);
    }

    #[test]
    fn test_sort_title_case_insensitive() {
        let mut notes = vec![
            note("banana", NoteColor::Default, 0, 0),
            note("Apple", NoteColor::Default, 0, 0),
            note("cherry", NoteColor::Default, 0, 0),
        ];
        SortOrder::Title.sort(&mut notes);
        assert_eq!(titles(&notes), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_sort_title_uses_displayed_title() {
        let mut body_only = note("", NoteColor::Default, 0, 0);
        body_only.body = "\n  mango smoothie\nblend well".to_string();
        let mut notes = vec![
            body_only,
            note("zucchini", NoteColor::Default, 0, 0),
            note("apple", NoteColor::Default, 0, 0),
        ];

        SortOrder::Title.sort(&mut notes);
        let shown: Vec<&str> = notes.iter().map(|n| n.display_title()).collect();
        assert_eq!(shown, vec!["apple", "mango smoothie", "zucchini"]);
    }

    #[test]
    fn test_sort_color_uses_palette_order() {
        let mut notes = vec![
            note("purple", NoteColor::Purple, 0, 0),
            note("default", NoteColor::Default, 0, 0),
            note("red", NoteColor::Red, 0, 0),
        ];
        SortOrder::Color.sort(&mut notes);
        assert_eq!(titles(&notes), vec!["default", "red", "purple"]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("Title".parse::<SortOrder>().unwrap(), SortOrder::Title);
        assert_eq!("date".parse::<SortOrder>().unwrap(), SortOrder::Recent);
        assert!("size".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Color.next(), SortOrder::Recent);
    }

    #[test]
    fn test_filter_text_and_color() {
        let notes = vec![
            note("Rust notes", NoteColor::Red, 0, 0),
            note("rusty bike", NoteColor::Blue, 0, 1),
            note("Groceries", NoteColor::Red, 0, 2),
        ];

        let filter = NoteFilter::text("rust");
        assert_eq!(
            titles(&filter.apply(&notes, SortOrder::Title)),
            vec!["Rust notes", "rusty bike"]
        );

        let filter = NoteFilter {
            text: "rust".to_string(),
            color: Some(NoteColor::Red),
        };
        assert_eq!(titles(&filter.apply(&notes, SortOrder::Recent)), vec!["Rust notes"]);

        assert!(NoteFilter::default().is_empty());
        assert_eq!(NoteFilter::default().apply(&notes, SortOrder::Recent).len(), 3);
    }
}
