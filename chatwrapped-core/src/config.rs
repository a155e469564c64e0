//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatwrapped/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatwrapped/` (~/.config/chatwrapped/)
//! - State/Logs: `$XDG_STATE_HOME/chatwrapped/` (~/.local/state/chatwrapped/)

use crate::error::{Error, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Archive/ingest configuration
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Archive and ingest configuration
#[derive(Debug, Deserialize)]
pub struct ArchiveConfig {
    /// Directory containing `chat_*.json` export files
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,

    /// Caller-facing label for the archive owner
    #[serde(default = "default_self_label")]
    pub self_label: String,

    /// Fixed UTC offset every timestamp is normalized to, e.g. "-05:00".
    /// When unset, the system local offset is used. The statistics engine
    /// requires one consistent timezone per run.
    #[serde(default)]
    pub timezone_offset: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            exports_dir: default_exports_dir(),
            self_label: default_self_label(),
            timezone_offset: None,
        }
    }
}

impl ArchiveConfig {
    /// Parse the configured timezone offset, if any.
    pub fn fixed_offset(&self) -> Result<Option<FixedOffset>> {
        let Some(raw) = self.timezone_offset.as_deref() else {
            return Ok(None);
        };
        raw.parse::<FixedOffset>()
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid timezone_offset {raw:?}: {e}")))
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "chatwrapped_core=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_self_label() -> String {
    "You".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Returns the config directory path
    pub fn config_dir() -> PathBuf {
        xdg_config_home().join("chatwrapped")
    }

    /// Returns the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Returns the state directory (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatwrapped")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("chatwrapped.log")
    }

    /// Load configuration from the default path.
    ///
    /// A missing file yields the default configuration; a malformed file
    /// is an error.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}
