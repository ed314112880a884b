//! Boundary to the external robot services.
//!
//! The session never computes inverse kinematics, footstep plans or object
//! fits itself. It hands constraint sets to a [`MotionPlanner`], reads the
//! robot through a [`RobotStateSource`], discovers objects through an
//! [`AffordanceSource`] and drives the hand through a [`GripperDriver`].
//! Anything implementing all four is a [`Robot`].

use std::fmt;
use std::time::Duration;

use manip_geometry::FootContacts;
use manip_types::{Affordance, Frame, Hand, JointPose, ObjectKind, PoseConstraintSet, WaypointConstraintSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SolverError;

// ============================================================================
// Value types
// ============================================================================

/// Exit code reported by the pose solver.
///
/// Codes below 10 mean the solver converged, possibly to a pose that only
/// meets the constraints loosely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverInfo(u32);

impl SolverInfo {
    /// Converged with every constraint met.
    pub const SUCCESS: Self = Self(1);

    /// Wraps a raw exit code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Raw exit code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the solver converged.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 < 10
    }
}

impl fmt::Display for SolverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behavior the robot controller is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum ControllerStatus {
    /// No behavior active.
    #[default]
    Idle,
    /// Balancing in place.
    Standing,
    /// Executing a footstep plan.
    Walking,
    /// Executing a manipulation plan.
    Manipulating,
}

impl ControllerStatus {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Standing => "standing",
            Self::Walking => "walking",
            Self::Manipulating => "manipulating",
        }
    }
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored postures the planner can merge onto a pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedPosture {
    /// Grasping arm raised in front of the chest.
    ArmUpPregrasp(Hand),
    /// Both arms tucked, standing tall.
    SafeNominal,
}

impl NamedPosture {
    /// Posture name in the planner's database.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ArmUpPregrasp(_) => "arm up pregrasp",
            Self::SafeNominal => "safe nominal",
        }
    }
}

/// Finger closure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GripMode {
    /// All fingers close together.
    Basic,
    /// Thumb opposes the index finger only.
    Pinch,
}

/// Command for a hand driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GripperCommand {
    /// Closure in percent (0 open, 100 closed).
    pub position: f64,
    /// Finger force in percent.
    pub force: f64,
    /// Finger speed in percent.
    pub velocity: f64,
    /// Closure mode.
    pub mode: GripMode,
}

impl GripperCommand {
    /// Fully open.
    pub const OPEN: Self = Self::full(0.0, GripMode::Basic);
    /// Fully closed around the object.
    pub const CLOSE: Self = Self::full(100.0, GripMode::Basic);
    /// Slightly closed in pinch mode.
    pub const PINCH: Self = Self::full(20.0, GripMode::Pinch);

    const fn full(position: f64, mode: GripMode) -> Self {
        Self {
            position,
            force: 100.0,
            velocity: 100.0,
            mode,
        }
    }
}

/// Receipt for a committed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionHandle(pub u64);

/// A plan returned by the planner.
///
/// The session treats plans as opaque; it only needs the final pose to
/// chain offline plans together.
pub trait PlanArtifact: Clone + fmt::Debug {
    /// Whole-body pose at the end of the plan.
    fn end_pose(&self) -> &JointPose;
}

// ============================================================================
// Service traits
// ============================================================================

/// Object discovery.
pub trait AffordanceSource {
    /// Number of completed sensor sweeps. Polled; may advance between calls.
    fn sweep_count(&mut self) -> u64;

    /// Fits an object model to the latest sweep and registers it.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if no object of `kind` could be fitted.
    fn fit_affordance(&mut self, kind: ObjectKind, expected_radius: f64) -> Result<(), SolverError>;

    /// The registered object of `kind`, if any.
    fn resolve_affordance(&self, kind: ObjectKind) -> Option<Affordance>;
}

/// Estimated robot state.
pub trait RobotStateSource {
    /// Current foot and pelvis frames.
    fn foot_contacts(&self) -> FootContacts;

    /// Current whole-body pose.
    fn estimated_pose(&self) -> JointPose;

    /// Overwrites the estimated pose. Used to teleport the robot when the
    /// footstep planner is bypassed.
    fn set_estimated_pose(&mut self, pose: JointPose);

    /// Current controller behavior. Polled; may advance between calls.
    fn controller_status(&mut self) -> ControllerStatus;
}

/// Pose solver, trajectory planner and plan execution.
pub trait MotionPlanner {
    /// Manipulation or walking plan.
    type Plan: PlanArtifact;
    /// Footstep sequence.
    type Footsteps: Clone + fmt::Debug;

    /// Solves a single whole-body pose.
    ///
    /// # Arguments
    ///
    /// * `set` - Goal and constraints
    /// * `start` - Pose the robot starts from
    /// * `seed` - Initial guess and nominal pose
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the service fails.
    fn solve_pose(
        &mut self,
        set: &PoseConstraintSet,
        start: &JointPose,
        seed: &JointPose,
    ) -> Result<(JointPose, SolverInfo), SolverError>;

    /// Plans a trajectory through time-indexed waypoint constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if no trajectory is found.
    fn plan_trajectory(
        &mut self,
        set: &WaypointConstraintSet,
        start: &JointPose,
        speed_deg_per_sec: f64,
    ) -> Result<Self::Plan, SolverError>;

    /// Plans a trajectory that ends on a single pose goal.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if no trajectory is found.
    fn plan_pose_trajectory(
        &mut self,
        set: &PoseConstraintSet,
        start: &JointPose,
        speed_deg_per_sec: f64,
    ) -> Result<Self::Plan, SolverError>;

    /// Plans a joint-space move between two poses.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the move cannot be planned.
    fn plan_posture(
        &mut self,
        start: &JointPose,
        end: &JointPose,
        speed_deg_per_sec: f64,
    ) -> Result<Self::Plan, SolverError>;

    /// Merges a stored posture onto `base`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the posture is unknown.
    fn named_posture(&self, base: &JointPose, posture: NamedPosture) -> Result<JointPose, SolverError>;

    /// Plans footsteps from `start` to a stance goal.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if no footstep plan is found.
    fn plan_footsteps(&mut self, start: &JointPose, goal: &Frame) -> Result<Self::Footsteps, SolverError>;

    /// Plans whole-body walking along `footsteps`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if walking cannot be planned.
    fn plan_walking(&mut self, footsteps: &Self::Footsteps, start: &JointPose) -> Result<Self::Plan, SolverError>;

    /// Sends footsteps to the walking controller.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the controller refuses them.
    fn commit_footsteps(&mut self, footsteps: &Self::Footsteps) -> Result<(), SolverError>;

    /// Starts an on-screen preview and returns how long it plays.
    fn preview(&mut self, plan: &Self::Plan) -> Duration;

    /// Sends a plan to the manipulation controller.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the controller refuses the plan.
    fn commit(&mut self, plan: &Self::Plan) -> Result<ExecutionHandle, SolverError>;

    /// Plays a list of plans back to back on screen.
    fn playback(&mut self, plans: &[Self::Plan]);
}

/// Hand drivers.
pub trait GripperDriver {
    /// Sends a command to the hand on `side`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the driver is unavailable.
    fn send_gripper(&mut self, side: Hand, command: GripperCommand) -> Result<(), SolverError>;
}

/// Everything a session needs from the robot.
pub trait Robot: AffordanceSource + RobotStateSource + MotionPlanner + GripperDriver {}

impl<T> Robot for T where T: AffordanceSource + RobotStateSource + MotionPlanner + GripperDriver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_info_success_range() {
        assert!(SolverInfo::SUCCESS.is_success());
        assert!(SolverInfo::new(4).is_success());
        assert!(!SolverInfo::new(13).is_success());
    }

    #[test]
    fn test_gripper_presets() {
        assert_eq!(GripperCommand::OPEN.position, 0.0);
        assert_eq!(GripperCommand::CLOSE.position, 100.0);
        assert_eq!(GripperCommand::PINCH.mode, GripMode::Pinch);
        assert_eq!(NamedPosture::ArmUpPregrasp(Hand::Left).name(), "arm up pregrasp");
    }
}
