//! Engine error taxonomy

use crate::models::{Command, ScreenTag};
use crate::target::CapabilityError;
use std::time::Duration;

/// Errors surfaced by the detector, executor and run loop.
///
/// Only [`EngineError::DetectionTimeout`] is recoverable inside a run: the
/// runner routes it to the current state's `on_detection_failed`. Everything
/// else ends the run with a `process_failed` event.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("no screen detected within {timeout:?} (expected {expected:?})")]
    DetectionTimeout {
        expected: Vec<ScreenTag>,
        timeout: Duration,
    },

    #[error("no handler registered for detected screen '{0}'")]
    HandlerNotFound(ScreenTag),

    #[error("action '{command}' failed: {source}")]
    ActionFailed {
        command: Command,
        #[source]
        source: CapabilityError,
    },

    #[error("state '{0}' did not request a transition after detection failed")]
    StuckState(String),

    #[error("run stopped by caller")]
    StoppedByCaller,

    #[error("target session is unusable: {0}")]
    CapabilityFatal(#[source] CapabilityError),

    #[error("no descriptor registered for screen '{0}'")]
    UnknownScreen(ScreenTag),

    #[error("workflow '{0}' is not registered")]
    UnknownWorkflow(String),

    #[error("workflow '{0}' is already registered")]
    WorkflowAlreadyRegistered(String),

    #[error("invalid workflow '{name}': {}", errors.join("; "))]
    InvalidWorkflow { name: String, errors: Vec<String> },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    /// Whether the run loop may recover from this error by itself.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::DetectionTimeout { .. })
    }
}
