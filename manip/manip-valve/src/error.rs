//! Error types for planner calls and session operations.

use manip_types::GeometryError;
use thiserror::Error;

use crate::adapter::SolverInfo;

/// Failures reported by the external planners and drivers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SolverError {
    /// The solver finished without a usable solution.
    #[error("no feasible solution (solver info {info})")]
    Infeasible {
        /// Exit code reported by the solver.
        info: SolverInfo,
    },

    /// The service did not answer.
    #[error("planner unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl SolverError {
    /// Creates a rejection with the given reason.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Returns `true` if the solver ran but found no solution.
    #[must_use]
    pub const fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible { .. })
    }
}

/// Errors raised by a [`ValveSession`](crate::ValveSession).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValveError {
    /// Frame derivation or constraint assembly failed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// An external planner or driver failed.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// An operation needs a plan but the history is empty.
    #[error("no plan to {action}")]
    NoPlan {
        /// What was attempted.
        action: &'static str,
    },

    /// Walking was requested before footsteps were planned.
    #[error("no footstep plan")]
    NoFootstepPlan,
}

impl ValveError {
    /// Returns `true` if the object model was not discovered.
    #[must_use]
    pub const fn is_affordance_not_found(&self) -> bool {
        matches!(self, Self::Geometry(e) if e.is_affordance_not_found())
    }

    /// Returns `true` if the error came from an external planner or driver.
    #[must_use]
    pub const fn is_solver(&self) -> bool {
        matches!(self, Self::Solver(_))
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, ValveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use manip_types::ObjectKind;

    #[test]
    fn test_geometry_errors_pass_through() {
        let err = ValveError::from(GeometryError::AffordanceNotFound(ObjectKind::Lever));
        assert!(err.is_affordance_not_found());
        assert_eq!(err.to_string(), "affordance not found: lever");
    }

    #[test]
    fn test_solver_error_display() {
        let err = ValveError::from(SolverError::Infeasible {
            info: SolverInfo::new(13),
        });
        assert!(err.is_solver());
        assert!(!err.is_affordance_not_found());
        assert_eq!(err.to_string(), "no feasible solution (solver info 13)");
    }
}
