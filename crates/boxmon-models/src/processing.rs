//! Processing lifecycle states.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the detection pipeline, as seen by the dashboard.
///
/// Owned exclusively by the dashboard composer; written only through the
/// lifecycle gate's transition functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    /// Nothing running
    #[default]
    Idle,
    /// Pipeline is running against the selected source
    Processing,
    /// Last run finished successfully
    Completed,
    /// Last run ended in an error
    Error,
}

impl ProcessingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Idle => "idle",
            ProcessingState::Processing => "processing",
            ProcessingState::Completed => "completed",
            ProcessingState::Error => "error",
        }
    }

    /// True while the pipeline is running.
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessingState::Processing)
    }

    /// True for states a new start can re-enter from.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingState::Completed | ProcessingState::Error)
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action requested of the remote pipeline by a toggle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingAction {
    Start,
    Stop,
}

impl ProcessingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingAction::Start => "start",
            ProcessingAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ProcessingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ProcessingState::Processing.is_active());
        assert!(!ProcessingState::Idle.is_active());
        assert!(ProcessingState::Completed.is_terminal());
        assert!(ProcessingState::Error.is_terminal());
        assert!(!ProcessingState::Processing.is_terminal());
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(serde_json::to_string(&ProcessingAction::Start).unwrap(), "\"start\"");
        assert_eq!(serde_json::to_string(&ProcessingAction::Stop).unwrap(), "\"stop\"");
    }
}
