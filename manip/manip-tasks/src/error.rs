//! Errors for queue misuse.
//!
//! Task failures are not errors of the queue itself: they end the queue in
//! [`QueueState::Failed`](crate::QueueState::Failed) and are reported through
//! [`QueueOutcome`](crate::QueueOutcome).

use thiserror::Error;

use crate::queue::QueueState;

/// Errors raised when a queue is driven in a way its state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum OrchestratorError {
    /// Tasks can only be appended before the queue starts.
    #[error("cannot append to a queue that is {state}")]
    NotIdle {
        /// Current state.
        state: QueueState,
    },

    /// A finished queue cannot be restarted.
    #[error("queue already finished: {state}")]
    AlreadyFinished {
        /// Terminal state.
        state: QueueState,
    },

    /// An answer was supplied while no confirmation gate was waiting.
    #[error("no confirmation is pending")]
    NoPendingConfirmation,
}

impl OrchestratorError {
    /// Returns `true` for attempts to modify a started queue.
    #[must_use]
    pub const fn is_not_idle(&self) -> bool {
        matches!(self, Self::NotIdle { .. })
    }
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_idle_display() {
        let err = OrchestratorError::NotIdle {
            state: QueueState::Running,
        };
        assert_eq!(err.to_string(), "cannot append to a queue that is running");
        assert!(err.is_not_idle());
    }
}
