//! # Configuration
//!
//! Optional user configuration stored in `~/.config/supervisor-tui/config.json`.
//!
//! ## Overview
//!
//! The [`Config`] struct is deserialized from a JSON file in the user's XDG
//! config directory. Every field has a default, so a missing file (or an
//! empty object) gives a working setup that runs `supervisorctl` from `PATH`
//! against its own default configuration.
//!
//! ```json
//! {
//!   "supervisorctl": "/usr/bin/supervisorctl",
//!   "supervisor_config": "/etc/supervisor/supervisord.conf",
//!   "server_url": "unix:///var/run/supervisor.sock",
//!   "tick_ms": 10,
//!   "log_level": "info"
//! }
//! ```
//!
//! The `directories` crate is used to resolve the platform-appropriate config
//! and data directories.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "supervisor-tui";

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The control program to run.
    #[serde(default = "default_supervisorctl")]
    pub supervisorctl: PathBuf,

    /// Passed to supervisorctl as `-c`.
    #[serde(default)]
    pub supervisor_config: Option<PathBuf>,

    /// Passed to supervisorctl as `-s`.
    #[serde(default)]
    pub server_url: Option<String>,

    /// Sleep between event-loop ticks, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Log filter used when `SUPERVISOR_TUI_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_supervisorctl() -> PathBuf {
    PathBuf::from("supervisorctl")
}

fn default_tick_ms() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supervisorctl: default_supervisorctl(),
            supervisor_config: None,
            server_url: None,
            tick_ms: default_tick_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location. Returns
    /// `Config::default()` if the file does not exist.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path. Returns `Config::default()` if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Return the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
        Some(dirs.config_dir().join("config.json"))
    }

    /// Directory the log file is written to.
    pub fn log_dir() -> Option<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
        Some(dirs.data_local_dir().join("logs"))
    }
}
