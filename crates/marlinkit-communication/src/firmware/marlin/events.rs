//! Events published by the Marlin runner.
//!
//! Events serialize adjacently tagged so relays can forward them as-is:
//!
//! ```json
//! {"event": "pos", "payload": {"raw": "X:0.00 Y:0.00 Z:0.00", "pos": {"x": "0.00", "y": "0.00", "z": "0.00"}}}
//! ```

use marlinkit_core::{Event, FirmwareError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::firmware_info::FirmwareInfo;
use super::position_parser::PositionReport;
use super::response_parser::{MessageLine, RawLine};
use super::temperature_parser::TemperatureReport;

/// Event emitted for a recognized response line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum MarlinEvent {
    /// `echo:` message
    #[serde(rename = "echo")]
    Echo(MessageLine),
    /// `Error:` message
    #[serde(rename = "error")]
    Error(MessageLine),
    /// Firmware identification
    #[serde(rename = "firmware")]
    Firmware(FirmwareInfo),
    /// Acknowledgement
    #[serde(rename = "ok")]
    Ok(RawLine),
    /// Position report
    #[serde(rename = "pos")]
    Position(PositionReport),
    /// Controller start
    #[serde(rename = "start")]
    Start(RawLine),
    /// Temperature report
    #[serde(rename = "temperature")]
    Temperature(TemperatureReport),
}

impl MarlinEvent {
    /// Original line the event was built from
    pub fn raw(&self) -> &str {
        match self {
            Self::Echo(line) | Self::Error(line) => &line.raw,
            Self::Firmware(info) => &info.raw,
            Self::Ok(line) | Self::Start(line) => &line.raw,
            Self::Position(report) => &report.raw,
            Self::Temperature(report) => &report.raw,
        }
    }
}

impl Event for MarlinEvent {
    type Kind = MarlinEventKind;

    fn kind(&self) -> MarlinEventKind {
        match self {
            Self::Echo(_) => MarlinEventKind::Echo,
            Self::Error(_) => MarlinEventKind::Error,
            Self::Firmware(_) => MarlinEventKind::Firmware,
            Self::Ok(_) => MarlinEventKind::Ok,
            Self::Position(_) => MarlinEventKind::Position,
            Self::Start(_) => MarlinEventKind::Start,
            Self::Temperature(_) => MarlinEventKind::Temperature,
        }
    }
}

/// Event names listeners subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MarlinEventKind {
    #[serde(rename = "echo")]
    Echo,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "firmware")]
    Firmware,
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "pos")]
    Position,
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "temperature")]
    Temperature,
}

impl MarlinEventKind {
    /// Every event kind
    pub const ALL: [MarlinEventKind; 7] = [
        Self::Echo,
        Self::Error,
        Self::Firmware,
        Self::Ok,
        Self::Position,
        Self::Start,
        Self::Temperature,
    ];

    /// Wire name of the event
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::Error => "error",
            Self::Firmware => "firmware",
            Self::Ok => "ok",
            Self::Position => "pos",
            Self::Start => "start",
            Self::Temperature => "temperature",
        }
    }
}

impl fmt::Display for MarlinEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MarlinEventKind {
    type Err = FirmwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FirmwareError::UnknownEvent {
                name: s.to_string(),
            })
    }
}
