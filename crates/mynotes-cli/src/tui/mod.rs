//! mynotes TUI
//!
//! Terminal interface for browsing and editing notes.
//!
//! ## Screens
//!
//! - List: notes on the left, preview of the selected note on the right
//! - Edit: title, subtitle, color, link, image and body of one note
//!
//! ## List keys
//!
//! - j/k or ↑/↓: Move selection, gg/G: first/last
//! - Enter/e: Edit note, n/a: New note
//! - d: Delete note, u: Undo, U or Ctrl+r: Redo
//! - /: Search, s: Sort order, c: Cycle color filter
//! - o: Open web link, r: Reload, ?: Help, q: Quit
//!
//! ## Edit keys
//!
//! - Tab/Shift+Tab: Next/previous field
//! - ←/→ on the color field: Change color
//! - Ctrl+s: Save, Esc: Cancel
//! - Ctrl+e: Edit body in $EDITOR, Ctrl+d: Delete note
//!
//! All persistence happens on the note worker thread; the UI only sends
//! commands and folds the resulting events into its list.

mod app;
mod form;
mod ui;

use std::fs::{self, File};
use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mynotes_core::{spawn_worker, Config, NoteRepository, WorkerCommand, WorkerHandle};

use app::{App, AppAction, InputMode, Screen};
use form::EditField;

use crate::editor;
use crate::LOG_ENV;

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    // File-based logging, only if MYNOTES_LOG is set
    init_tui_logging(&config);

    let repo = NoteRepository::open(&config).context("Failed to open notes database")?;
    let mut worker =
        spawn_worker(repo, config.history_limit).context("Failed to start note worker")?;

    let mut app = App::new(&config);
    if !worker.send(WorkerCommand::Refresh).await {
        bail!("Note worker stopped before start");
    }

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, &mut app, &mut worker).await;

    let _ = worker.send(WorkerCommand::Shutdown).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    worker: &mut WorkerHandle,
) -> Result<()> {
    loop {
        app.check_status_timeout();

        // Filter once typing has paused
        app.due_search(Instant::now());

        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            biased;

            event = worker.event_rx.recv() => {
                match event {
                    Some(event) => app.handle_worker_event(event),
                    None => bail!("Note worker stopped unexpectedly"),
                }
            }

            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        if let Some(action) = handle_key(app, key) {
                            perform(terminal, app, worker, action).await?;
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn send(worker: &WorkerHandle, command: WorkerCommand) -> Result<()> {
    if !worker.send(command).await {
        bail!("Note worker stopped unexpectedly");
    }
    Ok(())
}

async fn perform<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    worker: &WorkerHandle,
    action: AppAction,
) -> Result<()> {
    match action {
        AppAction::Worker(command) => send(worker, command).await?,
        AppAction::OpenLink(url) => {
            if let Err(e) = open::that_detached(&url) {
                warn!("Failed to open {}: {}", url, e);
                app.set_error(format!("Couldn't open link: {}", e));
            } else {
                app.set_status(format!("Opened {}", url));
            }
        }
        AppAction::EditBody => {
            let Some(body) = app.form.as_ref().map(|f| f.body.value().to_string()) else {
                return Ok(());
            };

            // Leave the TUI while the editor runs
            disable_raw_mode()?;
            stdout().execute(LeaveAlternateScreen)?;
            stdout().execute(cursor::Show)?;

            let edited = editor::edit_text(&body);

            enable_raw_mode()?;
            stdout().execute(EnterAlternateScreen)?;
            terminal.clear()?;

            match edited {
                Ok(text) => {
                    if let Some(form) = app.form.as_mut() {
                        form.set_body(text.trim_end_matches('\n'));
                    }
                }
                Err(e) => app.set_error(format!("Editor failed: {}", e)),
            }
        }
    }
    Ok(())
}

/// Route a key press to the handler for the current screen and mode
fn handle_key(app: &mut App, key: KeyEvent) -> Option<AppAction> {
    // If help is showing, any key dismisses it
    if app.show_help {
        app.show_help = false;
        return None;
    }

    match app.screen {
        Screen::Edit => handle_edit_mode(app, key),
        Screen::List => match app.input_mode {
            InputMode::Normal => handle_normal_mode(app, key),
            InputMode::Search => handle_search_mode(app, key),
            InputMode::SortPicker => {
                handle_sort_mode(app, key);
                None
            }
            InputMode::ConfirmDelete => handle_confirm_mode(app, key),
        },
    }
}

/// Handle key events on the list screen
fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Option<AppAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Clear pending 'g' if timeout expired (500ms)
    if let Some(time) = app.pending_g {
        if time.elapsed() > Duration::from_millis(500) {
            app.pending_g = None;
        }
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if ctrl => app.should_quit = true,

        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),

        KeyCode::Char('G') => {
            app.pending_g = None;
            app.move_to_last();
        }
        KeyCode::Char('g') => {
            if app.pending_g.is_some() {
                app.pending_g = None;
                app.move_to_first();
            } else {
                app.pending_g = Some(Instant::now());
            }
        }

        KeyCode::Enter | KeyCode::Char('e') => app.open_selected_note(),
        KeyCode::Char('n') | KeyCode::Char('a') => app.open_new_note(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),

        KeyCode::Char('u') => return Some(AppAction::Worker(WorkerCommand::Undo)),
        KeyCode::Char('r') if ctrl => return Some(AppAction::Worker(WorkerCommand::Redo)),
        KeyCode::Char('U') => return Some(AppAction::Worker(WorkerCommand::Redo)),
        KeyCode::Char('r') => {
            app.is_loading = true;
            return Some(AppAction::Worker(WorkerCommand::Refresh));
        }

        KeyCode::Char('/') => app.enter_search_mode(),
        KeyCode::Char('s') => app.open_sort_picker(),
        KeyCode::Char('c') => app.cycle_color_filter(),

        KeyCode::Char('o') => match app.current_link() {
            Some(url) => return Some(AppAction::OpenLink(url)),
            None => app.set_status("No link on this note"),
        },

        KeyCode::Char('?') => app.toggle_help(),

        _ => {
            // Any other key clears pending 'g'
            app.pending_g = None;
        }
    }

    None
}

/// Handle key events while typing a search
fn handle_search_mode(app: &mut App, key: KeyEvent) -> Option<AppAction> {
    match key.code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => {
            app.exit_input_mode();
            app.flush_search();
        }
        KeyCode::Char(c) => {
            app.search.insert(c);
            app.search_edited(Instant::now());
        }
        KeyCode::Backspace => {
            app.search.backspace();
            app.search_edited(Instant::now());
        }
        KeyCode::Left => app.search.left(),
        KeyCode::Right => app.search.right(),
        KeyCode::Down => app.move_down(),
        KeyCode::Up => app.move_up(),
        _ => {}
    }
    None
}

fn handle_sort_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.exit_input_mode(),
        KeyCode::Char('k') | KeyCode::Up => app.sort_picker_up(),
        KeyCode::Char('j') | KeyCode::Down => app.sort_picker_down(),
        KeyCode::Enter => app.apply_sort_picker(),
        _ => {}
    }
}

fn handle_confirm_mode(app: &mut App, key: KeyEvent) -> Option<AppAction> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete().map(AppAction::Worker),
        _ => {
            app.exit_input_mode();
            None
        }
    }
}

/// Handle key events on the edit screen
fn handle_edit_mode(app: &mut App, key: KeyEvent) -> Option<AppAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let form = app.form.as_mut()?;

    if form.confirm_delete {
        form.confirm_delete = false;
        return match (key.code, form.note_id()) {
            (KeyCode::Char('y') | KeyCode::Char('Y'), Some(id)) => {
                form.saving = true;
                Some(AppAction::Worker(WorkerCommand::Delete(id)))
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('s') if ctrl => return app.save_form().map(AppAction::Worker),
        KeyCode::Char('e') if ctrl => return Some(AppAction::EditBody),
        KeyCode::Char('d') if ctrl => {
            if !form.is_new() {
                form.confirm_delete = true;
            }
        }
        KeyCode::Char('c') if ctrl => app.close_form(),
        KeyCode::Esc => {
            let dirty = form.is_dirty();
            app.close_form();
            if dirty {
                app.set_status("Changes discarded");
            }
        }

        KeyCode::Tab => form.next_field(),
        KeyCode::BackTab => form.prev_field(),

        KeyCode::Left if form.focus == EditField::Color => form.color = form.color.prev(),
        KeyCode::Right | KeyCode::Char(' ') if form.focus == EditField::Color => {
            form.color = form.color.next()
        }

        KeyCode::Enter if form.focus == EditField::Body => {
            if let Some(input) = form.focused_input() {
                input.insert('\n');
            }
        }
        KeyCode::Enter => form.next_field(),

        code => {
            if let Some(input) = form.focused_input() {
                match code {
                    KeyCode::Char(c) if !ctrl => input.insert(c),
                    KeyCode::Backspace => input.backspace(),
                    KeyCode::Delete => input.delete(),
                    KeyCode::Left => input.left(),
                    KeyCode::Right => input.right(),
                    KeyCode::Home => input.home(),
                    KeyCode::End => input.end(),
                    _ => {}
                }
            }
        }
    }

    None
}

/// Initialize logging for TUI mode
///
/// Only initializes if MYNOTES_LOG is set. Logs go to `config.log_path()`
/// since stderr belongs to the terminal UI.
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var(LOG_ENV) else {
        return;
    };

    let Some(subscriber) = tui_subscriber(config, &log_level) else {
        return;
    };

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("TUI logging initialized to {:?}", config.log_path());
    }
}

/// Subscriber writing plain-text events for both crates to the log file
fn tui_subscriber(
    config: &Config,
    log_level: &str,
) -> Option<impl tracing::Subscriber + Send + Sync> {
    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let env_filter = EnvFilter::new(format!("mynotes_core={},mynotes={}", log_level, log_level));

    Some(
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(log_file)
            .finish(),
    )
}
