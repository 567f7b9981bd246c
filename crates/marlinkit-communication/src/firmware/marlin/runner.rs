//! Per-connection Marlin runner
//!
//! The runner classifies each incoming line, folds it into the connection
//! state and publishes one event for it. Listeners observe the state as it
//! is after the line was applied.

use marlinkit_core::{EmitterConfig, EventEmitter, ListenerId, Result};
use std::collections::BTreeMap;
use std::io::BufRead;
use tokio::sync::broadcast;

use super::events::{MarlinEvent, MarlinEventKind};
use super::firmware_info::FirmwareInfo;
use super::hold::{HoldReason, HoldStatus};
use super::position_parser::Axis;
use super::response_parser::{MarlinLineParser, MarlinResponse};
use super::temperature_parser::HeaterReading;

/// Runner configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Emitter settings (broadcast capacity, history)
    pub emitter: EmitterConfig,
    /// Trace-log lines that match no rule
    pub log_unrecognized: bool,
}

/// Connection state folded from responses and feeder updates
#[derive(Debug, Clone)]
struct RunnerState {
    hold: bool,
    hold_reason: Option<HoldReason>,
    firmware: Option<FirmwareInfo>,
    position: BTreeMap<Axis, String>,
    extruder: Option<HeaterReading>,
    heated_bed: Option<HeaterReading>,
    hotend: BTreeMap<String, HeaterReading>,
}

impl Default for RunnerState {
    fn default() -> Self {
        let position = [Axis::X, Axis::Y, Axis::Z, Axis::E]
            .into_iter()
            .map(|axis| (axis, "0.000".to_string()))
            .collect();
        Self {
            hold: false,
            hold_reason: None,
            firmware: None,
            position,
            extruder: None,
            heated_bed: None,
            hotend: BTreeMap::new(),
        }
    }
}

/// Marlin runner for one connection
pub struct MarlinRunner {
    parser: MarlinLineParser,
    state: RunnerState,
    emitter: EventEmitter<MarlinEvent>,
    config: RunnerConfig,
}

impl MarlinRunner {
    /// Create a runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            parser: MarlinLineParser::new(),
            state: RunnerState::default(),
            emitter: EventEmitter::with_config(config.emitter.clone()),
            config,
        }
    }

    /// Feed one line received from the controller
    ///
    /// Trailing whitespace is stripped and blank lines are ignored. Listeners
    /// run before this returns.
    pub fn parse(&mut self, line: &str) {
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }

        let response = self.parser.parse(line);
        self.apply(&response);

        match response.into_event() {
            Some(event) => {
                self.emitter.emit(event);
            }
            None => {
                if self.config.log_unrecognized {
                    tracing::trace!("Unrecognized line: {:?}", line);
                }
            }
        }
    }

    /// Feed every line of `reader`; returns the number of lines read
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        self.parse_reader_with(reader, |_| Ok(()))
    }

    /// Feed every line of `reader`, calling `after_line` once each line's
    /// listeners have run
    ///
    /// Invalid UTF-8 is replaced rather than rejected; serial captures are
    /// rarely clean. Stops at the first error from the reader or callback.
    pub fn parse_reader_with<R, F>(&mut self, mut reader: R, mut after_line: F) -> Result<usize>
    where
        R: BufRead,
        F: FnMut(&mut Self) -> Result<()>,
    {
        let mut buf = Vec::new();
        let mut lines = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            self.parse(&line);
            lines += 1;
            after_line(self)?;
        }
        Ok(lines)
    }

    fn apply(&mut self, response: &MarlinResponse) {
        match response {
            MarlinResponse::Firmware(info) => {
                tracing::debug!(
                    "Firmware identified: {} (protocol {})",
                    info.firmware_name,
                    info.protocol_version
                );
                self.state.firmware = Some(info.clone());
            }
            MarlinResponse::Position(report) => {
                for (axis, value) in &report.axes {
                    self.state.position.insert(*axis, value.clone());
                }
            }
            MarlinResponse::Temperature(report) => {
                if let Some(extruder) = &report.extruder {
                    self.state.extruder = Some(extruder.clone());
                }
                if let Some(bed) = &report.heated_bed {
                    self.state.heated_bed = Some(bed.clone());
                }
                if !report.hotend.is_empty() {
                    self.state.hotend = report.hotend.clone();
                }
            }
            MarlinResponse::Start(_) => {
                tracing::debug!("Controller started");
            }
            _ => {}
        }
    }

    /// Subscribe to one event kind
    pub fn on<F>(&self, kind: MarlinEventKind, listener: F) -> ListenerId
    where
        F: Fn(&MarlinEvent) + Send + Sync + 'static,
    {
        self.emitter.on(kind, listener)
    }

    /// Unsubscribe; returns true if the listener was registered
    pub fn off(&self, id: ListenerId) -> bool {
        self.emitter.off(id)
    }

    /// Receiver that sees every emitted event, for async relays
    ///
    /// A receiver that falls more than the broadcast capacity behind lags and
    /// loses the oldest events; emitting never blocks on it.
    pub fn subscribe_all(&self) -> broadcast::Receiver<MarlinEvent> {
        self.emitter.receiver()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count()
    }

    /// Recent events, oldest first; empty unless history is enabled
    pub fn history(&self) -> Vec<MarlinEvent> {
        self.emitter.history()
    }

    /// Current hold status
    pub fn hold_status(&self) -> HoldStatus {
        HoldStatus {
            hold: self.state.hold,
            hold_reason: self.state.hold_reason.clone(),
        }
    }

    /// Apply a status update from the feeder
    ///
    /// The reason is dropped when the feeder is not holding.
    pub fn update_feeder_status(&mut self, status: HoldStatus) {
        let hold_reason = if status.hold {
            status.hold_reason
        } else {
            None
        };

        if status.hold != self.state.hold {
            tracing::debug!(
                "Feeder {}: {:?}",
                if status.hold { "holding" } else { "released" },
                hold_reason
            );
        }

        self.state.hold = status.hold;
        self.state.hold_reason = hold_reason;
    }

    /// Last firmware identification
    pub fn firmware_info(&self) -> Option<&FirmwareInfo> {
        self.state.firmware.as_ref()
    }

    /// Last known position, merged across reports
    pub fn position(&self) -> &BTreeMap<Axis, String> {
        &self.state.position
    }

    /// Last active extruder reading
    pub fn extruder(&self) -> Option<&HeaterReading> {
        self.state.extruder.as_ref()
    }

    /// Last heated bed reading
    pub fn heated_bed(&self) -> Option<&HeaterReading> {
        self.state.heated_bed.as_ref()
    }

    /// Last per-tool readings
    pub fn hotend(&self) -> &BTreeMap<String, HeaterReading> {
        &self.state.hotend
    }
}

impl Default for MarlinRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MarlinRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarlinRunner")
            .field("state", &self.state)
            .field("listener_count", &self.emitter.listener_count())
            .field("config", &self.config)
            .finish()
    }
}
