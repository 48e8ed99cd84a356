//! Note command handlers

use anyhow::{bail, Context, Result};
use clap::Args;
use uuid::Uuid;

use mynotes_core::repository::normalize_draft;
use mynotes_core::{
    Config, Note, NoteColor, NoteDraft, NoteFilter, NoteRepository, NotesError, SortOrder,
};

use crate::editor::{confirm, edit_draft};
use crate::output::{truncate_line, Output};

/// Note fields settable from the command line
#[derive(Args, Debug, Clone, Default)]
pub struct NoteFields {
    /// Note title
    #[arg(short = 'T', long)]
    pub title: Option<String>,
    /// Short line shown under the title
    #[arg(short, long)]
    pub subtitle: Option<String>,
    /// Note body
    #[arg(short, long)]
    pub body: Option<String>,
    /// Color (default, yellow, red, blue, green, purple or a hex code)
    #[arg(short, long)]
    pub color: Option<NoteColor>,
    /// Web link attached to the note (empty to clear)
    #[arg(short, long)]
    pub link: Option<String>,
    /// Path to an image attached to the note (empty to clear)
    #[arg(short, long)]
    pub image: Option<String>,
}

impl NoteFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.body.is_none()
            && self.color.is_none()
            && self.link.is_none()
            && self.image.is_none()
    }

    /// Overlay the given fields onto a draft
    fn apply_to(self, draft: &mut NoteDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(subtitle) = self.subtitle {
            draft.subtitle = subtitle;
        }
        if let Some(body) = self.body {
            draft.body = body;
        }
        if let Some(color) = self.color {
            draft.color = color;
        }
        if let Some(link) = self.link {
            draft.web_link = Some(link);
        }
        if let Some(image) = self.image {
            draft.image_path = Some(image);
        }
    }
}

/// Create a new note
///
/// Opens the editor when neither a title nor a body was given.
pub fn add(
    repo: &mut NoteRepository,
    config: &Config,
    fields: NoteFields,
    output: &Output,
) -> Result<()> {
    let needs_editor = fields.title.is_none() && fields.body.is_none();

    let mut draft = NoteDraft::new().with_color(config.default_color);
    fields.apply_to(&mut draft);

    if needs_editor {
        draft = edit_draft(&draft)?;
    }

    let note = save(repo.create(draft), output).context("Failed to create note")?;
    output.print_saved("Created", &note);
    Ok(())
}

/// List notes in the configured or requested order
pub fn list(
    repo: &NoteRepository,
    sort: Option<SortOrder>,
    color: Option<NoteColor>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let notes = listed_notes(repo, sort, color, config)?;
    output.print_notes(&notes);
    Ok(())
}

fn listed_notes(
    repo: &NoteRepository,
    sort: Option<SortOrder>,
    color: Option<NoteColor>,
    config: &Config,
) -> Result<Vec<Note>> {
    let filter = NoteFilter {
        text: String::new(),
        color,
    };
    Ok(filter.apply(&repo.list()?, sort.unwrap_or(config.sort_order)))
}

/// Show a single note
pub fn show(repo: &NoteRepository, id: String, output: &Output) -> Result<()> {
    let note = find_note(repo, &id)?;
    output.print_note(&note);
    Ok(())
}

/// Edit a note from flags, or in the editor when no flags are given
pub fn edit(
    repo: &mut NoteRepository,
    id: String,
    fields: NoteFields,
    output: &Output,
) -> Result<()> {
    let note = find_note(repo, &id)?;

    let draft = if fields.is_empty() {
        edit_draft(&note.to_draft())?
    } else {
        let mut draft = note.to_draft();
        fields.apply_to(&mut draft);
        draft
    };

    match update_note(repo, note, draft, output)? {
        Some(note) => output.print_saved("Updated", &note),
        None => output.message("No changes."),
    }
    Ok(())
}

/// Save `draft` over `note`; `None` when it would store the same content
fn update_note(
    repo: &mut NoteRepository,
    mut note: Note,
    draft: NoteDraft,
    output: &Output,
) -> Result<Option<Note>> {
    let draft = normalize_draft(draft);
    if draft == normalize_draft(note.to_draft()) {
        return Ok(None);
    }

    note.apply_draft(draft);
    let note = save(repo.update(&note), output).context("Failed to update note")?;
    Ok(Some(note))
}

/// Delete a note, asking first in interactive mode
pub fn delete(repo: &mut NoteRepository, id: String, output: &Output) -> Result<()> {
    let note = find_note(repo, &id)?;

    if output.should_prompt() {
        println!(
            "Delete note: {} - {}",
            note.short_id(),
            truncate_line(mynotes_core::presenter::row_title(&note), 50)
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = repo.delete(note.id()).context("Failed to delete note")?;
    output.success(&format!("Deleted note: {}", deleted.short_id()));
    Ok(())
}

/// Search notes by title, subtitle and body
pub fn search(repo: &NoteRepository, query: String, output: &Output) -> Result<()> {
    let notes = repo.search(&query)?;
    output.print_notes(&notes);
    Ok(())
}

/// Report validation issues field by field before bailing
fn save(result: Result<Note, NotesError>, output: &Output) -> Result<Note> {
    match result {
        Ok(note) => Ok(note),
        Err(NotesError::Validation(issues)) => {
            output.print_validation(&issues);
            bail!("{}", issues)
        }
        Err(e) => Err(e.into()),
    }
}

fn find_note(repo: &NoteRepository, id: &str) -> Result<Note> {
    let uuid = parse_note_id(id, repo)?;
    repo.get(uuid)?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))
}

/// Parse a note ID (supports full UUID or prefix)
fn parse_note_id(id: &str, repo: &NoteRepository) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    let prefix = id.to_lowercase();
    let notes = repo.list()?;
    let matches: Vec<_> = notes
        .iter()
        .filter(|n| n.id().to_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => bail!("No note found matching: {}", id),
        1 => Ok(matches[0].id()),
        _ => {
            eprintln!("Multiple notes match '{}':", id);
            for note in &matches {
                eprintln!("  {} - {}", note.id(), truncate_line(&note.title, 40));
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
