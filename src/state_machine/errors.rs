use crate::error::LifecycleError;
use thiserror::Error;

/// Error types for state machine construction and execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid event {event_kind} for {entity} in state {current_state}")]
    InvalidTransition {
        entity: String,
        current_state: String,
        event_kind: String,
    },

    #[error("Malformed topology: {reason}")]
    MalformedTopology { reason: String },
}

impl StateMachineError {
    /// Whether this error was raised while firing an event (as opposed to building a topology)
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;

/// Helper function to create topology construction errors
pub fn malformed_topology(reason: impl Into<String>) -> StateMachineError {
    StateMachineError::MalformedTopology {
        reason: reason.into(),
    }
}

impl From<StateMachineError> for LifecycleError {
    fn from(err: StateMachineError) -> Self {
        match err {
            StateMachineError::InvalidTransition {
                entity,
                current_state,
                event_kind,
            } => LifecycleError::InvalidTransition {
                entity,
                current_state,
                event_kind,
            },
            StateMachineError::MalformedTopology { reason } => {
                LifecycleError::MalformedTopology(reason)
            }
        }
    }
}
