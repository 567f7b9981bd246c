//! Marlin response line classifier
//!
//! Every line the controller prints maps to exactly one [`MarlinResponse`].
//! Rules are tried in a fixed order and the first match wins, so an `ok`
//! that carries temperatures (`ok T:...`) is a temperature report while a
//! bare `ok` is an acknowledgement.

use serde::Serialize;

use super::events::{MarlinEvent, MarlinEventKind};
use super::firmware_info::FirmwareInfo;
use super::position_parser::PositionReport;
use super::temperature_parser::TemperatureReport;

/// Line carrying a free-form message (`echo:` and `Error:` lines)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageLine {
    /// Original line
    pub raw: String,
    /// Text after the prefix, trimmed
    pub message: String,
}

/// Line whose only content is the line itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLine {
    /// Original line
    pub raw: String,
}

/// Classified Marlin response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarlinResponse {
    /// `echo:` informational message
    Echo(MessageLine),
    /// `Error:` message
    Error(MessageLine),
    /// M115 identification
    Firmware(FirmwareInfo),
    /// Bare acknowledgement
    Ok(RawLine),
    /// M114 position report
    Position(PositionReport),
    /// Controller (re)started
    Start(RawLine),
    /// Temperature report
    Temperature(TemperatureReport),
    /// Anything else
    Unrecognized(RawLine),
}

impl MarlinResponse {
    /// Original line
    pub fn raw(&self) -> &str {
        match self {
            Self::Echo(line) | Self::Error(line) => &line.raw,
            Self::Firmware(info) => &info.raw,
            Self::Ok(line) | Self::Start(line) | Self::Unrecognized(line) => &line.raw,
            Self::Position(report) => &report.raw,
            Self::Temperature(report) => &report.raw,
        }
    }

    /// Event kind this response is published as; `None` for unrecognized lines
    pub fn kind(&self) -> Option<MarlinEventKind> {
        match self {
            Self::Echo(_) => Some(MarlinEventKind::Echo),
            Self::Error(_) => Some(MarlinEventKind::Error),
            Self::Firmware(_) => Some(MarlinEventKind::Firmware),
            Self::Ok(_) => Some(MarlinEventKind::Ok),
            Self::Position(_) => Some(MarlinEventKind::Position),
            Self::Start(_) => Some(MarlinEventKind::Start),
            Self::Temperature(_) => Some(MarlinEventKind::Temperature),
            Self::Unrecognized(_) => None,
        }
    }

    /// Short name for logs: the event name, or "unrecognized"
    pub fn name(&self) -> &'static str {
        self.kind()
            .map(MarlinEventKind::as_str)
            .unwrap_or("unrecognized")
    }

    /// Check if this line was not recognized
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized(_))
    }

    /// Convert into the event published for it
    pub fn into_event(self) -> Option<MarlinEvent> {
        match self {
            Self::Echo(line) => Some(MarlinEvent::Echo(line)),
            Self::Error(line) => Some(MarlinEvent::Error(line)),
            Self::Firmware(info) => Some(MarlinEvent::Firmware(info)),
            Self::Ok(line) => Some(MarlinEvent::Ok(line)),
            Self::Position(report) => Some(MarlinEvent::Position(report)),
            Self::Start(line) => Some(MarlinEvent::Start(line)),
            Self::Temperature(report) => Some(MarlinEvent::Temperature(report)),
            Self::Unrecognized(_) => None,
        }
    }
}

/// Stateless classifier for Marlin response lines
#[derive(Debug, Clone, Copy, Default)]
pub struct MarlinLineParser;

impl MarlinLineParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Classify a single line
    ///
    /// The line is expected without its terminator. Leading whitespace is
    /// significant: Marlin indents unsolicited temperature reports.
    pub fn parse(&self, line: &str) -> MarlinResponse {
        if let Some(text) = line.strip_prefix("echo:") {
            return MarlinResponse::Echo(message_line(line, text));
        }

        if let Some(text) = line.strip_prefix("Error:") {
            return MarlinResponse::Error(message_line(line, text));
        }

        if let Some(info) = FirmwareInfo::parse(line) {
            return MarlinResponse::Firmware(info);
        }

        if line == "ok" {
            return MarlinResponse::Ok(raw_line(line));
        }

        if let Some(report) = PositionReport::parse(line) {
            return MarlinResponse::Position(report);
        }

        if line == "start" {
            return MarlinResponse::Start(raw_line(line));
        }

        if let Some(report) = TemperatureReport::parse(line) {
            return MarlinResponse::Temperature(report);
        }

        MarlinResponse::Unrecognized(raw_line(line))
    }
}

fn message_line(line: &str, text: &str) -> MessageLine {
    MessageLine {
        raw: line.to_string(),
        message: text.trim().to_string(),
    }
}

fn raw_line(line: &str) -> RawLine {
    RawLine {
        raw: line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo() {
        let parser = MarlinLineParser::new();
        match parser.parse("echo:  SD card ok ") {
            MarlinResponse::Echo(line) => {
                assert_eq!(line.raw, "echo:  SD card ok ");
                assert_eq!(line.message, "SD card ok");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_is_case_sensitive() {
        let parser = MarlinLineParser::new();
        assert!(matches!(
            parser.parse("Error:Printer halted"),
            MarlinResponse::Error(_)
        ));
        assert!(parser.parse("error:Printer halted").is_unrecognized());
        assert!(parser.parse(" Error:Printer halted").is_unrecognized());
    }

    #[test]
    fn test_ok_must_be_exact() {
        let parser = MarlinLineParser::new();
        assert!(matches!(parser.parse("ok"), MarlinResponse::Ok(_)));
        assert!(parser.parse("ok ").is_unrecognized());
        assert!(parser.parse("OK").is_unrecognized());
        assert!(matches!(
            parser.parse("ok T:0"),
            MarlinResponse::Temperature(_)
        ));
    }

    #[test]
    fn test_start_must_be_exact() {
        let parser = MarlinLineParser::new();
        assert!(matches!(parser.parse("start"), MarlinResponse::Start(_)));
        assert!(parser.parse("started").is_unrecognized());
    }

    #[test]
    fn test_echo_wins_over_other_rules() {
        let parser = MarlinLineParser::new();
        let response = parser.parse("echo:X:1 Y:2 Z:3");
        assert_eq!(response.kind(), Some(MarlinEventKind::Echo));
    }

    #[test]
    fn test_names() {
        let parser = MarlinLineParser::new();
        assert_eq!(parser.parse("X:0 Y:0 Z:0").name(), "pos");
        assert_eq!(parser.parse("wait").name(), "unrecognized");
        assert_eq!(parser.parse("").kind(), None);
    }

    #[test]
    fn test_into_event_keeps_raw() {
        let parser = MarlinLineParser::new();
        let response = parser.parse("start");
        let raw = response.raw().to_string();
        let event = response.into_event().unwrap();
        assert_eq!(event.raw(), raw);
        assert!(parser.parse("busy").into_event().is_none());
    }
}
