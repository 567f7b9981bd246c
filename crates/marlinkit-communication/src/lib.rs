//! # MarlinKit Communication
//!
//! Firmware response handling for MarlinKit. Lines arrive already framed by
//! the transport; this crate classifies them and turns them into events.

pub mod firmware;

pub use firmware::marlin::{
    Axis, FirmwareInfo, HeaterReading, HoldKind, HoldPrompt, HoldReason, HoldStatus,
    MarlinEvent, MarlinEventKind, MarlinLineParser, MarlinResponse, MarlinRunner, MessageLine,
    PositionReport, RawLine, RunnerConfig, TemperatureReport,
};
