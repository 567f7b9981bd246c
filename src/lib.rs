//! # MarlinKit
//!
//! Classifies the line responses of Marlin firmware and turns them into typed
//! events, one runner per connection.
//!
//! ## Architecture
//!
//! MarlinKit is organized as a workspace with multiple crates:
//!
//! 1. **marlinkit-core** - Error types and the event emitter
//! 2. **marlinkit-communication** - Marlin line classifier, runner and hold model
//! 3. **marlinkit-settings** - Configuration files
//! 4. **marlinkit** - This crate: re-exports, logging setup and the replay CLI

pub use marlinkit_communication::firmware;
pub use marlinkit_communication::{
    Axis, FirmwareInfo, HeaterReading, HoldKind, HoldPrompt, HoldReason, HoldStatus,
    MarlinEvent, MarlinEventKind, MarlinLineParser, MarlinResponse, MarlinRunner, MessageLine,
    PositionReport, RawLine, RunnerConfig, TemperatureReport,
};
pub use marlinkit_core::{EmitterConfig, Error, Event, EventEmitter, FirmwareError, ListenerId, Result};
pub use marlinkit_settings::{
    Config, LogFormat, LogLevel, LoggingSettings, RunnerSettings, SettingsError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr, so stdout stays free for events
/// - RUST_LOG environment variable support, falling back to the configured level
/// - Pretty, compact or JSON formatting
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    match settings.format {
        LogFormat::Pretty => registry
            .with(layer.pretty().with_line_number(true))
            .try_init()?,
        LogFormat::Compact => registry.with(layer.compact()).try_init()?,
        LogFormat::Json => registry.with(layer.json()).try_init()?,
    }

    Ok(())
}
