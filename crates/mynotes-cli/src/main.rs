//! mynotes CLI
//!
//! Command-line and terminal interface for mynotes - local note taking.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mynotes_core::{Config, NoteColor, NoteRepository, SortOrder};

mod commands;
mod editor;
mod output;
mod tui;

use commands::note::NoteFields;
use output::{Output, OutputFormat};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "MYNOTES_LOG";

#[derive(Parser)]
#[command(name = "mynotes")]
#[command(about = "mynotes - local note taking from the terminal")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - ids only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show storage location and note counts
    Status,
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Create a new note (opens $EDITOR without --title or --body)
    #[command(alias = "create")]
    Add {
        #[command(flatten)]
        fields: NoteFields,
    },
    /// List notes
    #[command(alias = "ls")]
    List {
        /// Sort order (recent, created, title, color)
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Only notes with this color
        #[arg(short, long)]
        color: Option<NoteColor>,
    },
    /// Show a note in full
    Show {
        /// Note ID (full UUID or prefix)
        id: String,
    },
    /// Edit a note (opens $EDITOR when no fields are given)
    Edit {
        /// Note ID (full UUID or prefix)
        id: String,
        #[command(flatten)]
        fields: NoteFields,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID (full UUID or prefix)
        id: String,
    },
    /// Search titles, subtitles and bodies
    Search {
        /// Search query
        query: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, default_color, sort_order, history_limit, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work on the file directly
    if let Some(Commands::Config { command }) = &cli.command {
        init_cli_logging();
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // TUI is the default when no command is given. It sets up its own
    // file logging, so the stderr subscriber must not be installed first.
    let Some(command) = non_tui_command(cli.command) else {
        return tui::run(config).await;
    };

    init_cli_logging();
    let mut repo = NoteRepository::open(&config).context("Failed to open notes database")?;

    match command {
        Commands::Note { command } => handle_note_command(command, &mut repo, &config, &output),
        Commands::Status => commands::status::show(&repo, &config, &output),
        Commands::Config { .. } | Commands::Tui => Ok(()), // Handled above
    }
}

/// The command to run with CLI logging, `None` when the TUI should start
fn non_tui_command(command: Option<Commands>) -> Option<Commands> {
    command.filter(|command| !matches!(command, Commands::Tui))
}

fn handle_note_command(
    command: NoteCommands,
    repo: &mut NoteRepository,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        NoteCommands::Add { fields } => commands::note::add(repo, config, fields, output),
        NoteCommands::List { sort, color } => {
            commands::note::list(repo, sort, color, config, output)
        }
        NoteCommands::Show { id } => commands::note::show(repo, id, output),
        NoteCommands::Edit { id, fields } => commands::note::edit(repo, id, fields, output),
        NoteCommands::Delete { id } => commands::note::delete(repo, id, output),
        NoteCommands::Search { query } => commands::note::search(repo, query, output),
    }
}

/// Initialize logging for CLI commands
///
/// Logs go to stderr so they never mix with command output. The level comes
/// from MYNOTES_LOG and defaults to warnings only.
fn init_cli_logging() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_for(args: &[&str]) -> Option<Commands> {
        let cli = Cli::try_parse_from(args).unwrap();
        non_tui_command(cli.command)
    }

    #[test]
    fn test_tui_skips_cli_logging() {
        assert!(command_for(&["mynotes"]).is_none());
        assert!(command_for(&["mynotes", "tui"]).is_none());
        assert!(command_for(&["mynotes", "--json", "tui"]).is_none());
    }

    #[test]
    fn test_other_commands_use_cli_logging() {
        assert!(matches!(command_for(&["mynotes", "status"]), Some(Commands::Status)));
        assert!(matches!(
            command_for(&["mynotes", "note", "list", "--sort", "title"]),
            Some(Commands::Note {
                command: NoteCommands::List { .. }
            })
        ));
    }
}
