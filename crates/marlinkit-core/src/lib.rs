//! # MarlinKit Core
//!
//! Core types shared by the MarlinKit crates: the error taxonomy and the
//! event emitter that runners publish through.

pub mod error;
pub mod event_bus;

pub use error::{Error, FirmwareError, Result};

pub use event_bus::{EmitterConfig, Event, EventEmitter, EventFilter, ListenerId};
