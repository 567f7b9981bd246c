//! MarlinKit Settings Crate
//!
//! Handles application configuration: file loading and saving, validation
//! and the default location.

pub mod config;
pub mod error;

pub use config::{Config, LogFormat, LogLevel, LoggingSettings, RunnerSettings};
pub use error::{SettingsError, SettingsResult};
