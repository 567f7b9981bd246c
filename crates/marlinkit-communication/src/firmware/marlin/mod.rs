//! Marlin firmware support
//!
//! Marlin answers on a line basis. [`MarlinLineParser`] classifies each line
//! into a [`MarlinResponse`]; [`MarlinRunner`] keeps the per-connection state
//! and publishes a [`MarlinEvent`] for every recognized line.

pub mod events;
pub mod firmware_info;
pub mod hold;
pub mod position_parser;
pub mod response_parser;
pub mod runner;
pub mod temperature_parser;

pub use events::{MarlinEvent, MarlinEventKind};
pub use firmware_info::FirmwareInfo;
pub use hold::{hold_title, HoldKind, HoldPrompt, HoldReason, HoldStatus, WAIT};
pub use position_parser::{Axis, PositionReport};
pub use response_parser::{MarlinLineParser, MarlinResponse, MessageLine, RawLine};
pub use runner::{MarlinRunner, RunnerConfig};
pub use temperature_parser::{HeaterReading, TemperatureReport};
