//! Engine event vocabulary

use crate::models::{Command, RunOutcome, ScreenTag};
use serde::Serialize;
use serde_json::Value;

pub const STATE_CHANGED: &str = "state_changed";
pub const SCREEN_DETECTED: &str = "screen_detected";
pub const DETECTION_TIMEOUT: &str = "detection_timeout";
pub const ACTION_EXECUTING: &str = "action_executing";
pub const ACTION_EXECUTED: &str = "action_executed";
pub const ACTION_FAILED: &str = "action_failed";
pub const PROCESS_STARTED: &str = "process_started";
pub const PROCESS_COMPLETED: &str = "process_completed";
pub const PROCESS_FAILED: &str = "process_failed";
/// Bus diagnostic: a listener panicked while handling another event
pub const LISTENER_PANICKED: &str = "listener_panicked";

/// Every standard event name, in lifecycle order
pub const STANDARD_EVENTS: [&str; 9] = [
    PROCESS_STARTED,
    STATE_CHANGED,
    SCREEN_DETECTED,
    DETECTION_TIMEOUT,
    ACTION_EXECUTING,
    ACTION_EXECUTED,
    ACTION_FAILED,
    PROCESS_COMPLETED,
    PROCESS_FAILED,
];

/// Event published on the [`EventBus`](super::EventBus)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    StateChanged {
        from: String,
        to: String,
    },
    ScreenDetected {
        screen: ScreenTag,
    },
    DetectionTimeout {
        expected: Vec<ScreenTag>,
    },
    ActionExecuting {
        command: Command,
    },
    ActionExecuted {
        command: Command,
    },
    ActionFailed {
        command: Command,
        error: String,
    },
    ProcessStarted {
        process: String,
    },
    ProcessCompleted {
        process: String,
        outcome: RunOutcome,
    },
    ProcessFailed {
        process: String,
        error: String,
    },
    ListenerPanicked {
        /// Name of the event whose listener panicked
        source_event: String,
        message: String,
    },
    /// Application-defined event
    Custom {
        name: String,
        payload: Value,
    },
}

impl EngineEvent {
    /// Name listeners subscribe to
    pub fn name(&self) -> &str {
        match self {
            EngineEvent::StateChanged { .. } => STATE_CHANGED,
            EngineEvent::ScreenDetected { .. } => SCREEN_DETECTED,
            EngineEvent::DetectionTimeout { .. } => DETECTION_TIMEOUT,
            EngineEvent::ActionExecuting { .. } => ACTION_EXECUTING,
            EngineEvent::ActionExecuted { .. } => ACTION_EXECUTED,
            EngineEvent::ActionFailed { .. } => ACTION_FAILED,
            EngineEvent::ProcessStarted { .. } => PROCESS_STARTED,
            EngineEvent::ProcessCompleted { .. } => PROCESS_COMPLETED,
            EngineEvent::ProcessFailed { .. } => PROCESS_FAILED,
            EngineEvent::ListenerPanicked { .. } => LISTENER_PANICKED,
            EngineEvent::Custom { name, .. } => name,
        }
    }

    pub fn custom(name: impl Into<String>, payload: Value) -> Self {
        EngineEvent::Custom {
            name: name.into(),
            payload,
        }
    }
}
