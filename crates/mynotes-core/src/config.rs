//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/mynotes/config.toml)
//! 3. Environment variables (MYNOTES_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::NoteColor;
use crate::query::SortOrder;

/// Environment variable prefix
const ENV_PREFIX: &str = "MYNOTES";

/// Default depth of the undo history
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory for data storage (SQLite db, debug log)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Color given to new notes
    #[serde(default)]
    pub default_color: NoteColor,

    /// Initial sort order for note lists
    #[serde(default)]
    pub sort_order: SortOrder,

    /// How many actions undo can walk back
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Log file for TUI debug logging
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_color: NoteColor::default(),
            sort_order: SortOrder::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MYNOTES_DATA_DIR, MYNOTES_DEFAULT_COLOR, ...)
    /// 2. Config file (~/.config/mynotes/config.toml or MYNOTES_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Values that don't parse are ignored and a warning is logged.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_DEFAULT_COLOR", ENV_PREFIX)) {
            match val.parse() {
                Ok(color) => self.default_color = color,
                Err(e) => tracing::warn!("Ignoring {}_DEFAULT_COLOR: {}", ENV_PREFIX, e),
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SORT", ENV_PREFIX)) {
            match val.parse() {
                Ok(order) => self.sort_order = order,
                Err(e) => tracing::warn!("Ignoring {}_SORT: {}", ENV_PREFIX, e),
            }
        }

        if let Ok(val) = std::env::var(format!("{}_HISTORY_LIMIT", ENV_PREFIX)) {
            match val.parse() {
                Ok(limit) => self.history_limit = limit,
                Err(e) => tracing::warn!("Ignoring {}_HISTORY_LIMIT: {}", ENV_PREFIX, e),
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MYNOTES_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mynotes")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("notes.db")
    }

    /// Get the path used for TUI debug logs
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mynotes")
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "MYNOTES_DATA_DIR",
        "MYNOTES_DEFAULT_COLOR",
        "MYNOTES_SORT",
        "MYNOTES_HISTORY_LIMIT",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_color, NoteColor::Default);
        assert_eq!(config.sort_order, SortOrder::Recent);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(config.log_file.is_none());
        assert!(config.data_dir.ends_with("mynotes"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/mynotes"),
            ..Config::default()
        };

        assert_eq!(config.sqlite_path(), PathBuf::from("/data/mynotes/notes.db"));
        assert_eq!(config.log_path(), PathBuf::from("/data/mynotes/debug.log"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MYNOTES_DATA_DIR", "/tmp/mynotes-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/mynotes-test"));
    }

    #[test]
    fn test_env_override_color_and_sort() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MYNOTES_DEFAULT_COLOR", "#FDBE3B");
        env::set_var("MYNOTES_SORT", "title");
        config.apply_env_overrides();

        assert_eq!(config.default_color, NoteColor::Yellow);
        assert_eq!(config.sort_order, SortOrder::Title);
    }

    #[test]
    fn test_env_override_ignores_garbage() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MYNOTES_DEFAULT_COLOR", "chartreuse");
        env::set_var("MYNOTES_HISTORY_LIMIT", "lots");
        config.apply_env_overrides();

        assert_eq!(config.default_color, NoteColor::Default);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/mynotes"),
            default_color: NoteColor::Purple,
            sort_order: SortOrder::Color,
            history_limit: 20,
            log_file: Some(PathBuf::from("/tmp/mynotes.log")),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("default_color = \"purple\""));
        assert!(toml_str.contains("sort_order = \"color\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            default_color = "red"
            history_limit = 5
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.default_color, NoteColor::Red);
        assert_eq!(config.sort_order, SortOrder::Recent);
        assert_eq!(config.history_limit, 5);
    }

    #[test]
    fn test_env_beats_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("MYNOTES_SORT", "created");
        let config = Config::load_from_str("sort_order = \"title\"").unwrap();
        assert_eq!(config.sort_order, SortOrder::Created);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            default_color: NoteColor::Green,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.data_dir.exists());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("MYNOTES_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(config.data_dir.exists());
    }
}
