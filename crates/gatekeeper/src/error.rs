//! Gatekeeper error types.

use thiserror::Error;

/// Gatekeeper error type.
#[derive(Error, Debug)]
pub enum GateError {
    /// Secret store failure
    #[error("Storage error: {0}")]
    Storage(#[from] agent_storage::StorageError),

    /// Invalid state transition in the unlock FSM
    #[error("Invalid unlock state transition: {0}")]
    InvalidStateTransition(String),

    /// Session protocol collaborator failure
    #[error("Session protocol error: {0}")]
    Protocol(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// The agent event loop is no longer running
    #[error("Agent event loop has stopped")]
    AgentStopped,
}

impl GateError {
    /// Returns true if a fresh attempt might succeed.
    ///
    /// Connect attempts are never retried automatically; this only informs
    /// logging and whatever the user decides to do next.
    pub fn is_transient(&self) -> bool {
        matches!(self, GateError::Timeout | GateError::Protocol(_))
    }
}

/// Result type alias using GateError.
pub type GateResult<T> = Result<T, GateError>;
