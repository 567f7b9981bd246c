//! Hold and feeder status
//!
//! The feeder that streams G-code owns the decision to pause; it reports
//! its status back to the runner, and the presentation layer turns that
//! status into a prompt.

use serde::{Deserialize, Serialize};

/// Hold data value meaning "waiting for the controller to catch up"
pub const WAIT: &str = "%wait";

/// Why the feeder is holding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldReason {
    /// Error text; a non-empty value means the hold was caused by an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    /// Code or marker that triggered the hold, e.g. "M0" or "%wait"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Free-form message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl HoldReason {
    /// Reason for a program code such as M0 or M6
    pub fn code(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    /// Reason for an error
    pub fn error(err: impl Into<String>) -> Self {
        Self {
            err: Some(err.into()),
            ..Self::default()
        }
    }

    /// Attach a message
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    /// Check whether the hold was caused by an error
    pub fn is_error(&self) -> bool {
        self.err.as_deref().is_some_and(|err| !err.is_empty())
    }

    /// Check whether this is a wait hold
    pub fn is_wait(&self) -> bool {
        self.data.as_deref() == Some(WAIT)
    }
}

/// Feeder status as reported to the runner (`feeder:status`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldStatus {
    /// Feeder is holding
    pub hold: bool,
    /// Reason; only meaningful while `hold` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_reason: Option<HoldReason>,
}

impl HoldStatus {
    /// Status of a feeder that is streaming
    pub fn running() -> Self {
        Self::default()
    }

    /// Status of a feeder holding for `reason`
    pub fn held(reason: HoldReason) -> Self {
        Self {
            hold: true,
            hold_reason: Some(reason),
        }
    }
}

/// What kind of prompt a hold calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldKind {
    /// Hold caused by an error
    Error,
    /// Waiting for the controller; resumes by itself
    Wait,
    /// Program pause, end or tool change
    Paused,
}

/// Prompt to show while the feeder holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldPrompt {
    /// Prompt kind
    pub kind: HoldKind,
    /// Title
    pub title: String,
    /// Body text, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HoldPrompt {
    /// Decide the prompt for a status; `None` while not holding
    pub fn from_status(status: &HoldStatus) -> Option<Self> {
        if !status.hold {
            return None;
        }

        let reason = status.hold_reason.clone().unwrap_or_default();

        if reason.is_error() {
            return Some(Self {
                kind: HoldKind::Error,
                title: "Error".to_string(),
                message: reason.msg,
            });
        }

        if reason.is_wait() {
            return Some(Self {
                kind: HoldKind::Wait,
                title: WAIT.to_string(),
                message: reason.msg,
            });
        }

        let data = reason.data.unwrap_or_default();
        let title = hold_title(&data)
            .map(str::to_string)
            .unwrap_or(data);
        Some(Self {
            kind: HoldKind::Paused,
            title,
            message: reason.msg,
        })
    }

    /// Whether the user may dismiss the prompt; wait prompts clear themselves
    pub fn is_dismissable(&self) -> bool {
        self.kind != HoldKind::Wait
    }
}

/// Title for a program code that holds the feeder
pub fn hold_title(code: &str) -> Option<&'static str> {
    match code {
        "M0" => Some("M0 Program Pause"),
        "M1" => Some("M1 Program Pause"),
        "M2" => Some("M2 Program End"),
        "M30" => Some("M30 Program End"),
        "M6" => Some("M6 Tool Change"),
        "M109" => Some("M109 Set Extruder Temperature"),
        "M190" => Some("M190 Set Heated Bed Temperature"),
        _ => None,
    }
}
