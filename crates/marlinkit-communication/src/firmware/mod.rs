//! Firmware implementations
//!
//! Supported controllers:
//! - Marlin: 3D printer and CNC firmware speaking the RepRap line protocol

pub mod marlin;

pub use marlin::{MarlinEvent, MarlinEventKind, MarlinLineParser, MarlinResponse, MarlinRunner};
