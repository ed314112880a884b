//! Error types for frame derivation and constraint assembly.
//!
//! These errors are raised synchronously by the geometry stages and always
//! stop the enclosing planning call before anything is submitted to an
//! external solver.

use crate::affordance::ObjectKind;

/// Errors raised while deriving frames or assembling constraint sets.
///
/// # Example
///
/// ```
/// use manip_types::{GeometryError, ObjectKind};
///
/// let error = GeometryError::AffordanceNotFound(ObjectKind::Valve);
/// assert!(error.is_affordance_not_found());
/// assert!(error.to_string().contains("valve"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum GeometryError {
    /// The object model has not been discovered yet.
    ///
    /// Frames derived from a missing affordance are undefined; planning must
    /// not fall back to values from an earlier discovery.
    #[error("affordance not found: {0}")]
    AffordanceNotFound(ObjectKind),

    /// A turn request that discretizes to zero samples.
    #[error("degenerate turn: {turn_degrees} deg with a {step_degrees} deg step yields no waypoints")]
    DegenerateTurn {
        /// Requested turn angle in degrees.
        turn_degrees: f64,
        /// Angular step in degrees.
        step_degrees: f64,
    },

    /// Axis vectors that cannot form a frame (zero length or collinear).
    #[error("degenerate axis: vectors are zero or collinear")]
    DegenerateAxis,

    /// Unrecognized hand identifier.
    #[error("unknown hand: {0:?} (expected \"left\" or \"right\")")]
    UnknownHand(String),

    /// Unrecognized object kind identifier.
    #[error("unknown object kind: {0:?} (expected \"valve\" or \"lever\")")]
    UnknownObjectKind(String),

    /// An invalid configuration parameter was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GeometryError {
    /// Creates an invalid configuration error with the given message.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns `true` if this is an "affordance not found" error.
    #[must_use]
    pub const fn is_affordance_not_found(&self) -> bool {
        matches!(self, Self::AffordanceNotFound(_))
    }

    /// Returns `true` if this is a degenerate turn request.
    #[must_use]
    pub const fn is_degenerate_turn(&self) -> bool {
        matches!(self, Self::DegenerateTurn { .. })
    }
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_turn_display() {
        let error = GeometryError::DegenerateTurn {
            turn_degrees: 0.0,
            step_degrees: 10.0,
        };
        let msg = error.to_string();
        assert!(msg.contains("degenerate turn"));
        assert!(msg.contains("10"));
        assert!(error.is_degenerate_turn());
        assert!(!error.is_affordance_not_found());
    }

    #[test]
    fn test_unknown_hand_display() {
        let error = GeometryError::UnknownHand("middle".into());
        assert!(error.to_string().contains("\"middle\""));
    }

    #[test]
    fn test_invalid_config_helper() {
        let error = GeometryError::invalid_config("step must be positive");
        assert!(matches!(error, GeometryError::InvalidConfig(msg) if msg == "step must be positive"));
    }
}
