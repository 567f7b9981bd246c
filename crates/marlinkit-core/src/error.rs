//! Error handling for MarlinKit
//!
//! Line classification never fails: text the parser does not understand is
//! reported as an unrecognized line, not as an error. The types here cover the
//! edges of the system instead:
//! - Firmware errors (event naming, response extraction)
//! - I/O errors from whatever feeds lines into a runner
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Firmware error type
///
/// Represents errors specific to firmware protocols and the event contract
/// built on top of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FirmwareError {
    /// Event name does not match any event the runner emits
    #[error("Unknown event name: {name}")]
    UnknownEvent {
        /// The name that was requested.
        name: String,
    },

    /// Response parsing error
    #[error("Failed to parse firmware response: {reason}")]
    ResponseParseError {
        /// The reason the response parsing failed.
        reason: String,
    },

    /// Generic firmware error
    #[error("Firmware error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Main error type for MarlinKit
///
/// A unified error type used in public APIs that can fail.
#[derive(Error, Debug)]
pub enum Error {
    /// Firmware error
    #[error(transparent)]
    Firmware(#[from] FirmwareError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a firmware error
    pub fn is_firmware_error(&self) -> bool {
        matches!(self, Error::Firmware(_))
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
