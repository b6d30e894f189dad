//! Run outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Graceful result of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure,
    /// The caller should invoke the run again
    Retry,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Success => "success",
            RunOutcome::Failure => "failure",
            RunOutcome::Retry => "retry",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a process runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    Success,
    Failure,
    Retry,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl From<RunOutcome> for RunStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Success => RunStatus::Success,
            RunOutcome::Failure => RunStatus::Failure,
            RunOutcome::Retry => RunStatus::Retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&RunOutcome::Retry).unwrap();
        assert_eq!(json, "\"retry\"");
        assert_eq!(RunOutcome::Success.to_string(), "success");
    }

    #[test]
    fn test_status_from_outcome() {
        assert_eq!(RunStatus::from(RunOutcome::Failure), RunStatus::Failure);
        assert!(RunStatus::Retry.is_terminal());
        assert!(!RunStatus::default().is_terminal());
    }
}
