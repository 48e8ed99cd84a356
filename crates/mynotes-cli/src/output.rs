//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Local, Utc};
use mynotes_core::presenter::{date_label, row_title};
use mynotes_core::{Note, ValidationError};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - ids only
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single note in full
    pub fn print_note(&self, note: &Note) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", note.id());
                println!("Title:    {}", note.title);
                if !note.subtitle.trim().is_empty() {
                    println!("Subtitle: {}", note.subtitle);
                }
                println!("Color:    {} ({})", note.color, note.color.hex());
                if let Some(ref link) = note.web_link {
                    println!("Link:     {}", link);
                }
                if let Some(ref image) = note.image_path {
                    println!("Image:    {}", image);
                }
                println!("Created:  {}", local_time(note.created_at()));
                println!("Updated:  {}", local_time(note.updated_at()));

                if !note.body.is_empty() {
                    println!();
                    println!("{}", note.body);
                }
            }
            OutputFormat::Json => print_json(note),
            OutputFormat::Quiet => println!("{}", note.id()),
        }
    }

    /// Print a list of notes, one per line
    pub fn print_notes(&self, notes: &[Note]) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes found.");
                    return;
                }
                for note in notes {
                    let subtitle = if note.subtitle.trim().is_empty() {
                        String::new()
                    } else {
                        format!(" - {}", truncate(note.subtitle.trim(), 25))
                    };
                    println!(
                        "{} | {:<7} | {}{} | {}",
                        note.short_id(),
                        note.color.name(),
                        truncate_line(row_title(note), 35),
                        subtitle,
                        local_time(note.updated_at()),
                    );
                }
                println!("\n{} note(s)", notes.len());
            }
            OutputFormat::Json => print_json(&notes),
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id());
                }
            }
        }
    }

    /// Print a one-line summary after a write (used for create and edit)
    pub fn print_saved(&self, verb: &str, note: &Note) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ {} note {}: {}", verb, note.short_id(), row_title(note));
                println!("  {}", date_label(note));
            }
            OutputFormat::Json => print_json(note),
            OutputFormat::Quiet => println!("{}", note.id()),
        }
    }

    /// Print field-level validation issues to stderr
    pub fn print_validation(&self, error: &ValidationError) {
        match self.format {
            OutputFormat::Json => {
                let issues: Vec<_> = error
                    .issues()
                    .iter()
                    .map(|i| serde_json::json!({"field": i.field.to_string(), "message": i.message}))
                    .collect();
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "invalid", "issues": issues})
                );
            }
            _ => {
                eprintln!("Note not saved:");
                for issue in error.issues() {
                    eprintln!("  {}: {}", issue.field, issue.message);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Short local-time timestamp for tables
pub fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
pub fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        // Multi-byte characters are counted, not bytes
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_local_time_shape() {
        let at = DateTime::from_timestamp(0, 0).unwrap();
        let label = local_time(at);
        assert_eq!(label.len(), "1970-01-01 00:00".len());
        assert!(label.starts_with("1970") || label.starts_with("1969"));
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
        assert_eq!(truncate_line("", 20), "");
    }
}
