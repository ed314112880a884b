//! Core types for rotary-object manipulation: frames, affordances, grasp
//! configuration and solver constraints.
//!
//! This crate provides the vocabulary shared by the geometry solver, the
//! turn assembler and the session layer.
//!
//! # Overview
//!
//! - **Frames**: rigid poses and the two composition orders ([`Frame`])
//! - **Affordances**: valve and lever models ([`Affordance`], [`ObjectKind`], [`Hand`])
//! - **Configuration**: mutable session settings with hand mirroring ([`GraspConfig`])
//! - **Constraints**: solver requests ([`WaypointConstraintSet`], [`PoseConstraintSet`])
//! - **Poses**: whole-body joint configurations ([`JointPose`])
//!
//! # Example
//!
//! ```
//! use manip_types::{Affordance, Frame, GraspConfig, Hand, ObjectKind};
//!
//! let valve = Affordance::spawn_valve(&Frame::identity());
//! let config = GraspConfig::new(Hand::Left, ObjectKind::Valve);
//!
//! assert_eq!(valve.kind(), config.object);
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization/deserialization for all types

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod affordance;
pub mod config;
pub mod constraint;
pub mod error;
pub mod frame;
pub mod pose;

pub use affordance::{Affordance, Hand, ObjectKind};
pub use config::{
    ClenchOffset, GraspConfig, SpeedProfile, StanceDefaults, StanceOffset, Standoff, TurnDirection,
};
pub use constraint::{
    BackMode, BodyConstraints, Bounds3, Constraint, FootMode, GazeConstraint, JointBound, KneeRange,
    OrientationConstraint, PoseConstraintSet, PositionConstraint, PostureConstraint, TimeSpan,
    Waypoint, WaypointConstraintSet, DEFAULT_TOLERANCE,
};
pub use error::{GeometryError, Result};
pub use frame::{axes, compose, orthonormal_axes, Frame};
pub use pose::{JointPose, BASE_DOF};

#[cfg(all(test, feature = "serde"))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod serde_tests {
    use super::*;

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: GraspConfig = serde_json::from_str(r#"{ "lock_back": true }"#).unwrap();
        assert!(config.lock_back);
        assert_eq!(config.hand, Hand::Left);
        assert!((config.scribe_angle_deg + 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_joint_pose_json_checks_length() {
        let pose: JointPose = serde_json::from_str("[1.0, 2.0, 0.0, 0.0, 0.0, 0.3, 0.1]").unwrap();
        assert_eq!(pose.base_xy_yaw(), (1.0, 2.0, 0.3));
        assert_eq!(serde_json::to_string(&pose).unwrap(), "[1.0,2.0,0.0,0.0,0.0,0.3,0.1]");

        let err = serde_json::from_str::<JointPose>("[]").unwrap_err();
        assert!(err.to_string().contains("expected at least 6"));
    }

    #[test]
    fn test_hand_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Hand::Right).unwrap(), "\"right\"");
    }
}
