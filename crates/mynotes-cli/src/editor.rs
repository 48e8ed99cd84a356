//! Interactive editing support
//!
//! Opens $EDITOR on a note template and parses the result back into a draft.
//!
//! Template layout:
//!
//! ```text
//! # Lines starting with # above the --- line are ignored
//! title: Groceries
//! subtitle: Saturday
//! color: yellow
//! link: https://example.com
//! image:
//! ---
//! Body text, kept verbatim.
//! ```

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

use mynotes_core::{NoteColor, NoteDraft};

const BODY_SEPARATOR: &str = "---";

/// Open content in the user's preferred editor
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors.
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let temp_path = env::temp_dir().join(format!("mynotes_edit_{}.md", std::process::id()));

    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        let _ = fs::remove_file(&temp_path);
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    let content = fs::read_to_string(&temp_path)
        .with_context(|| format!("Failed to read edited file: {:?}", temp_path))?;

    let _ = fs::remove_file(&temp_path);

    Ok(content)
}

/// Edit a whole draft through the template
pub fn edit_draft(draft: &NoteDraft) -> Result<NoteDraft> {
    let content = edit_text(&note_template(draft)).context("Failed to edit note")?;
    parse_note_template(&content)
}

/// Render a draft as an editable template
pub fn note_template(draft: &NoteDraft) -> String {
    format!(
        "# Lines starting with # above the --- line are ignored.\n\
         # Colors: default, yellow, red, blue, green, purple (or a hex code)\n\
         title: {}\n\
         subtitle: {}\n\
         color: {}\n\
         link: {}\n\
         image: {}\n\
         {}\n\
         {}",
        draft.title,
        draft.subtitle,
        draft.color,
        draft.web_link.as_deref().unwrap_or(""),
        draft.image_path.as_deref().unwrap_or(""),
        BODY_SEPARATOR,
        draft.body,
    )
}

/// Parse an edited template back into a draft
///
/// Header keys are case-insensitive. Everything after the first `---` line
/// is the body. Without a separator the whole text after the header lines
/// is taken as the body.
pub fn parse_note_template(content: &str) -> Result<NoteDraft> {
    let mut draft = NoteDraft::new();
    let mut lines = content.lines();
    let mut body_lines: Vec<&str> = Vec::new();

    for line in lines.by_ref() {
        let trimmed = line.trim();
        if trimmed == BODY_SEPARATOR {
            break;
        }
        if trimmed.starts_with('#') || trimmed.is_empty() {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            // Not a header line; the body starts here
            body_lines.push(line);
            break;
        };
        let value = value.trim();

        match key.trim().to_lowercase().as_str() {
            "title" => draft.title = value.to_string(),
            "subtitle" => draft.subtitle = value.to_string(),
            "color" | "colour" => {
                draft.color = if value.is_empty() {
                    NoteColor::Default
                } else {
                    value.parse::<NoteColor>()?
                };
            }
            "link" | "web_link" | "url" => draft.web_link = optional(value),
            "image" | "image_path" => draft.image_path = optional(value),
            _ => {
                // Unknown key; treat it as the first body line
                body_lines.push(line);
                break;
            }
        }
    }

    body_lines.extend(lines);
    draft.body = body_lines.join("\n");
    Ok(draft)
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    if let Ok(editor) = env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    if let Ok(visual) = env::var("VISUAL") {
        if !visual.is_empty() {
            return Ok(visual);
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "code", "notepad"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
