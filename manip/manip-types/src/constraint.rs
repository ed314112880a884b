//! Constraint types submitted to an external whole-body solver.
//!
//! This module defines the vocabulary of a planning request:
//!
//! - [`Constraint`]: per-waypoint position, orientation and posture bounds
//! - [`BodyConstraints`]: constraints attached once to a whole request
//! - [`WaypointConstraintSet`]: an ordered, time-indexed trajectory request
//! - [`PoseConstraintSet`]: a single-pose request
//!
//! # Example
//!
//! ```
//! use manip_types::{BodyConstraints, Frame, Hand, WaypointConstraintSet};
//!
//! let mut set = WaypointConstraintSet::new(Hand::Left, BodyConstraints::default(), Frame::identity());
//! let index = set.push(Frame::from_translation(0.0, 0.1, 0.0), Vec::new());
//! assert_eq!(index, 1);
//! assert_eq!(set.indices().collect::<Vec<_>>(), vec![0, 1]);
//! ```

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::affordance::Hand;
use crate::frame::Frame;

/// Default tolerance for waypoint bounds, in meters and radians.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Time interval over which a constraint is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeSpan {
    /// Active over the whole motion.
    #[default]
    Always,
    /// Pinned to a single waypoint index (a zero-width span `[i, i]`).
    At(usize),
}

impl TimeSpan {
    /// Returns `true` if the span covers waypoint `index`.
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        match self {
            Self::Always => true,
            Self::At(i) => *i == index,
        }
    }
}

/// Per-axis lower and upper bounds, expressed in a reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds3 {
    /// Lower bound per axis.
    pub lower: Vector3<f64>,
    /// Upper bound per axis.
    pub upper: Vector3<f64>,
}

impl Bounds3 {
    /// Creates bounds from explicit corners.
    #[must_use]
    pub const fn new(lower: Vector3<f64>, upper: Vector3<f64>) -> Self {
        Self { lower, upper }
    }

    /// `[-tol, tol]` on every axis.
    #[must_use]
    pub fn symmetric(tol: f64) -> Self {
        Self::new(Vector3::repeat(-tol), Vector3::repeat(tol))
    }

    /// `[-tol, tol]` on X and Z, the Y axis pinned to zero.
    #[must_use]
    pub fn pinned_y(tol: f64) -> Self {
        Self::new(Vector3::new(-tol, 0.0, -tol), Vector3::new(tol, 0.0, tol))
    }

    /// X and Z held at `tol`, Y unbounded: a point kept on a line parallel
    /// to the reference Y axis.
    #[must_use]
    pub fn on_y_axis(tol: f64) -> Self {
        Self::new(
            Vector3::new(tol, f64::NEG_INFINITY, tol),
            Vector3::new(tol, f64::INFINITY, tol),
        )
    }

    /// Returns `true` if `point` lies within the bounds.
    #[must_use]
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.lower[i] && point[i] <= self.upper[i])
    }
}

/// Keeps a link origin inside bounds expressed in a reference frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionConstraint {
    /// Constrained link.
    pub link: String,
    /// Frame the bounds are expressed in.
    pub reference: Frame,
    /// Allowed offset from the reference origin.
    pub bounds: Bounds3,
    /// Active interval.
    pub tspan: TimeSpan,
}

/// Keeps a link orientation within an angle of a target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientationConstraint {
    /// Constrained link.
    pub link: String,
    /// Target orientation.
    pub target: Frame,
    /// Allowed angle in radians.
    pub tolerance: f64,
    /// Active interval.
    pub tspan: TimeSpan,
}

/// Bounds on a single joint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointBound {
    /// Joint name.
    pub joint: String,
    /// Lower bound in radians.
    pub lower: f64,
    /// Upper bound in radians.
    pub upper: f64,
}

impl JointBound {
    /// Creates a bound.
    #[must_use]
    pub fn new(joint: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            joint: joint.into(),
            lower,
            upper,
        }
    }

    /// Pins a joint to one value.
    #[must_use]
    pub fn locked(joint: impl Into<String>, value: f64) -> Self {
        Self::new(joint, value, value)
    }
}

/// Joint-space bounds over a set of joints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PostureConstraint {
    /// Bounded joints.
    pub joints: Vec<JointBound>,
    /// Active interval.
    pub tspan: TimeSpan,
}

impl PostureConstraint {
    /// Posture constraint active over the whole motion.
    #[must_use]
    pub fn always(joints: Vec<JointBound>) -> Self {
        Self {
            joints,
            tspan: TimeSpan::Always,
        }
    }
}

/// A constraint attached to one waypoint or to a single-pose goal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constraint {
    /// Link position bounds.
    Position(PositionConstraint),
    /// Link orientation bounds.
    Orientation(OrientationConstraint),
    /// Joint bounds.
    Posture(PostureConstraint),
}

impl Constraint {
    /// Active interval of the constraint.
    #[must_use]
    pub const fn tspan(&self) -> TimeSpan {
        match self {
            Self::Position(c) => c.tspan,
            Self::Orientation(c) => c.tspan,
            Self::Posture(c) => c.tspan,
        }
    }
}

/// Foot handling during a planned motion. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FootMode {
    /// Feet fixed at the start pose; only the pelvis height may change.
    #[default]
    Locked,
    /// Feet may slide on the ground; the base moves freely in XYZ.
    Free,
}

/// Back joint handling during a planned motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BackMode {
    /// Back joints held at the start pose.
    Locked,
    /// Back joints free within reduced limits.
    #[default]
    Bounded,
}

/// Allowed knee flexion in radians, applied to both knees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KneeRange {
    /// Minimum flexion.
    pub min: f64,
    /// Maximum flexion.
    pub max: f64,
}

impl KneeRange {
    /// Creates a knee range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Default for KneeRange {
    fn default() -> Self {
        Self::new(0.6, 2.5)
    }
}

/// Keeps a hand's approach axis inside a cone around a target frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GazeConstraint {
    /// Hand whose approach axis is constrained.
    pub hand: Hand,
    /// Target frame.
    pub target: Frame,
    /// Cone half-angle in degrees.
    pub cone_degrees: f64,
}

/// Constraints attached once to a whole request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyConstraints {
    /// Foot mode.
    pub feet: FootMode,
    /// Back mode.
    pub back: BackMode,
    /// Arm held at its start posture (the non-grasping arm).
    pub locked_arm: Option<Hand>,
    /// Knee flexion range.
    pub knee: KneeRange,
    /// Keep the center of mass over the support polygon.
    pub quasi_static: bool,
    /// Approach cone toward the grasp.
    pub gaze: Option<GazeConstraint>,
}

impl Default for BodyConstraints {
    fn default() -> Self {
        Self {
            feet: FootMode::default(),
            back: BackMode::default(),
            locked_arm: None,
            knee: KneeRange::default(),
            quasi_static: true,
            gaze: None,
        }
    }
}

/// One time-indexed waypoint of a trajectory request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    /// Time index.
    pub index: usize,
    /// Target frame of the grasp point.
    pub frame: Frame,
    /// Constraints pinned to this waypoint.
    pub constraints: Vec<Constraint>,
}

/// An ordered trajectory request.
///
/// Waypoint indices are assigned on insertion and always run `0..=N` with
/// no gaps. Index 0 is the anchor: the frame the motion starts from, with
/// no constraints of its own.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaypointConstraintSet {
    hand: Hand,
    body: BodyConstraints,
    waypoints: Vec<Waypoint>,
}

impl WaypointConstraintSet {
    /// Creates a set holding only the anchor waypoint.
    #[must_use]
    pub fn new(hand: Hand, body: BodyConstraints, anchor: Frame) -> Self {
        Self {
            hand,
            body,
            waypoints: vec![Waypoint {
                index: 0,
                frame: anchor,
                constraints: Vec::new(),
            }],
        }
    }

    /// Appends a waypoint and returns its index.
    pub fn push(&mut self, frame: Frame, constraints: Vec<Constraint>) -> usize {
        let index = self.waypoints.len();
        self.waypoints.push(Waypoint {
            index,
            frame,
            constraints,
        });
        index
    }

    /// Grasping hand.
    #[must_use]
    pub const fn hand(&self) -> Hand {
        self.hand
    }

    /// Whole-request constraints.
    #[must_use]
    pub const fn body(&self) -> &BodyConstraints {
        &self.body
    }

    /// All waypoints, anchor first.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// The anchor waypoint.
    #[must_use]
    pub fn anchor(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    /// Number of waypoints after the anchor.
    #[must_use]
    pub fn motion_len(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Waypoint time indices in order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.waypoints.iter().map(|w| w.index)
    }

    /// Target frames in order, anchor first.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        self.waypoints.iter().map(|w| w.frame).collect()
    }
}

/// A single-pose request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseConstraintSet {
    /// Grasping hand.
    pub hand: Hand,
    /// Whole-request constraints.
    pub body: BodyConstraints,
    /// Goal frame of the grasp point.
    pub goal: Frame,
    /// Goal and auxiliary constraints.
    pub constraints: Vec<Constraint>,
    /// Base yaw of the nominal pose the solver is pulled toward, if any.
    pub nominal_yaw: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_contiguous() {
        let mut set = WaypointConstraintSet::new(Hand::Right, BodyConstraints::default(), Frame::identity());
        for _ in 0..5 {
            set.push(Frame::identity(), Vec::new());
        }
        assert_eq!(set.indices().collect::<Vec<_>>(), (0..=5).collect::<Vec<_>>());
        assert_eq!(set.motion_len(), 5);
        assert!(set.anchor().constraints.is_empty());
    }

    #[test]
    fn test_time_span_contains() {
        assert!(TimeSpan::Always.contains(42));
        assert!(TimeSpan::At(3).contains(3));
        assert!(!TimeSpan::At(3).contains(4));
    }

    #[test]
    fn test_bounds_on_axis() {
        let bounds = Bounds3::on_y_axis(0.01);
        assert!(bounds.contains(&Vector3::new(0.01, 100.0, 0.01)));
        assert!(!bounds.contains(&Vector3::new(0.0, 0.0, 0.01)));
    }

    #[test]
    fn test_pinned_y_bounds() {
        let bounds = Bounds3::pinned_y(0.01);
        assert!(bounds.contains(&Vector3::new(-0.005, 0.0, 0.01)));
        assert!(!bounds.contains(&Vector3::new(0.0, 0.001, 0.0)));
    }

    #[test]
    fn test_default_body_constraints() {
        let body = BodyConstraints::default();
        assert_eq!(body.feet, FootMode::Locked);
        assert!(body.quasi_static);
        assert_eq!(body.knee, KneeRange::new(0.6, 2.5));
    }
}
