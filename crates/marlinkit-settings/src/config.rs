//! Configuration and settings management for MarlinKit
//!
//! Supports JSON and TOML files; the format follows the file extension.
//!
//! Configuration is organized into sections:
//! - Runner settings (event history, broadcast capacity, chatter logging)
//! - Logging preferences (level, output format)

use marlinkit_communication::RunnerConfig;
use marlinkit_core::EmitterConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};

/// Directory name under the platform config directory
const APP_DIR: &str = "marlinkit";

/// Default config file name
const CONFIG_FILE: &str = "config.toml";

/// Runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Number of recent events to keep; 0 disables history
    pub event_history_size: usize,
    /// Capacity of the broadcast tap used by async relays
    pub broadcast_capacity: usize,
    /// Trace-log lines that match no rule
    pub log_unrecognized: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            event_history_size: 0,
            broadcast_capacity: 256,
            log_unrecognized: false,
        }
    }
}

impl RunnerSettings {
    /// Runner configuration for these settings
    pub fn to_runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            emitter: EmitterConfig {
                channel_capacity: self.broadcast_capacity,
                max_history_size: self.event_history_size,
            },
            log_unrecognized: self.log_unrecognized,
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented
    Pretty,
    /// Single line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Compact
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Runner settings
    pub runner: RunnerSettings,
    /// Logging preferences
    pub logging: LoggingSettings,
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Self::Json),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path).ok_or_else(|| {
            SettingsError::LoadError(format!(
                "{}: config file must be .json or .toml",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let format = Format::from_path(path).ok_or_else(|| {
            SettingsError::SaveError(format!(
                "{}: config file must be .json or .toml",
                path.display()
            ))
        })?;

        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(e.to_string()))?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.runner.broadcast_capacity == 0 {
            return Err(SettingsError::invalid(
                "runner.broadcast_capacity",
                "must be > 0",
            ));
        }

        Ok(())
    }

    /// Default config location: `<config_dir>/marlinkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load the default config file, or defaults if it does not exist
    pub fn load_default() -> SettingsResult<Self> {
        let path = Self::default_path()?;
        Self::load_or_default(&path)
    }

    /// Load `path`, or defaults if it does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}
