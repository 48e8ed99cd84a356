//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use mynotes_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str = "data_dir, default_color, sort_order, history_limit, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "default_color": config.default_color,
                    "sort_order": config.sort_order,
                    "history_limit": config.history_limit,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!(
                "  default_color: {} ({})",
                config.default_color,
                config.default_color.hex()
            );
            println!("  sort_order:    {}", config.sort_order);
            println!("  history_limit: {}", config.history_limit);
            println!(
                "  log_file:      {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply_setting(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "default_color" => {
            config.default_color = value.parse()?;
        }
        "sort_order" | "sort" => {
            config.sort_order = value.parse()?;
        }
        "history_limit" => {
            config.history_limit = value
                .parse()
                .context("Invalid value for history_limit. Use a whole number.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mynotes_core::{NoteColor, SortOrder};

    #[test]
    fn test_apply_known_settings() {
        let mut config = Config::default();
        apply_setting(&mut config, "default_color", "Purple").unwrap();
        apply_setting(&mut config, "sort", "title").unwrap();
        apply_setting(&mut config, "history_limit", "5").unwrap();
        apply_setting(&mut config, "log_file", "/tmp/notes.log").unwrap();

        assert_eq!(config.default_color, NoteColor::Purple);
        assert_eq!(config.sort_order, SortOrder::Title);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/notes.log")));

        apply_setting(&mut config, "log_file", "none").unwrap();
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_set_writes_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let data_dir = dir.path().join("data");
        std::fs::write(&path, format!("data_dir = {:?}\n", data_dir.display().to_string()))
            .unwrap();

        let output = Output::new(OutputFormat::Quiet);
        set(
            "default_color".to_string(),
            "red".to_string(),
            Some(&path),
            &output,
        )
        .unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("data_dir"));
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.default_color, NoteColor::Red);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "sync_url", "x").is_err());
        assert!(apply_setting(&mut config, "default_color", "mauve").is_err());
        assert!(apply_setting(&mut config, "history_limit", "-1").is_err());
    }
}
