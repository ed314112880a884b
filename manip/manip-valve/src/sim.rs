//! In-process robot for demos and tests.
//!
//! [`SimulatedRobot`] answers every adapter call without a solver. Plans are
//! kinematic placeholders whose durations follow the requested speed, the
//! controller runs a committed plan for a fixed number of status polls, and
//! each sweep-counter poll completes one sensor sweep.

// Step counts convert to and from seconds and meters.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::time::Duration;

use manip_geometry::{ground_frame, FootContacts};
use manip_types::{
    Affordance, Frame, GeometryError, Hand, JointPose, ObjectKind, PoseConstraintSet,
    WaypointConstraintSet, BASE_DOF,
};
use tracing::debug;

use crate::adapter::{
    AffordanceSource, ControllerStatus, ExecutionHandle, GripperCommand, GripperDriver,
    MotionPlanner, NamedPosture, PlanArtifact, RobotStateSource, SolverInfo,
};
use crate::error::SolverError;

/// Actuated joints per arm.
pub const ARM_DOF: usize = 7;

/// Coordinates in a simulated pose: base, left arm, right arm.
pub const POSE_LEN: usize = BASE_DOF + 2 * ARM_DOF;

/// Status polls a committed plan or footstep sequence stays active for.
pub const EXECUTION_POLLS: u32 = 3;

/// Distance covered by one footstep, in meters.
pub const STEP_LENGTH: f64 = 0.25;

/// Time per footstep, in seconds.
pub const STEP_SECONDS: f64 = 0.8;

const STANCE_WIDTH: f64 = 0.26;
const PREGRASP_ARM: [f64; ARM_DOF] = [0.3, -1.2, 1.6, 1.4, 0.0, 0.5, 0.0];

fn arm_range(hand: Hand) -> std::ops::Range<usize> {
    let start = BASE_DOF + if hand.is_right() { ARM_DOF } else { 0 };
    start..start + ARM_DOF
}

/// A plan produced by [`SimulatedRobot`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimPlan {
    /// Sequential identifier.
    pub id: u64,
    /// What was planned.
    pub label: &'static str,
    /// Number of knot points.
    pub knots: usize,
    /// Playback duration.
    pub duration: Duration,
    /// Final pose.
    pub end_pose: JointPose,
}

impl PlanArtifact for SimPlan {
    fn end_pose(&self) -> &JointPose {
        &self.end_pose
    }
}

/// Footsteps produced by [`SimulatedRobot`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimFootsteps {
    /// Stance goal.
    pub goal: Frame,
    /// Number of steps.
    pub steps: usize,
}

#[derive(Debug, Clone)]
enum Effect {
    Pose(JointPose),
    Walk(Frame),
}

#[derive(Debug, Clone)]
struct Execution {
    status: ControllerStatus,
    polls_left: u32,
    effect: Effect,
}

/// Simulated robot standing at the origin with one object in front of it.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    contacts: FootContacts,
    pose: JointPose,
    world: Option<Affordance>,
    registered: Option<Affordance>,
    sweeps: u64,
    next_id: u64,
    execution: Option<Execution>,
    grippers: [Option<GripperCommand>; 2],
    committed: Vec<u64>,
    previewed: Vec<u64>,
    played_back: usize,
}

impl SimulatedRobot {
    /// Robot at the origin with an object of `kind` spawned in front of it.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateAxis`] if the ground frame cannot be
    /// derived, which does not happen for the default stance.
    pub fn new(kind: ObjectKind) -> Result<Self, GeometryError> {
        let contacts = FootContacts::standing(0.0, 0.0, 0.0, STANCE_WIDTH, 0.0);
        let ground = ground_frame(&contacts)?;
        let object = match kind {
            ObjectKind::Valve => Affordance::spawn_valve(&ground),
            ObjectKind::Lever => Affordance::spawn_lever(&ground),
        };
        Ok(Self::with_world(contacts, Some(object)))
    }

    /// Robot at the origin with nothing to find.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_world(FootContacts::standing(0.0, 0.0, 0.0, STANCE_WIDTH, 0.0), None)
    }

    fn with_world(contacts: FootContacts, world: Option<Affordance>) -> Self {
        Self {
            contacts,
            pose: JointPose::zeros(POSE_LEN),
            world,
            registered: None,
            sweeps: 0,
            next_id: 0,
            execution: None,
            grippers: [None; 2],
            committed: Vec::new(),
            previewed: Vec::new(),
            played_back: 0,
        }
    }

    /// Registers the world object as if it had been fitted.
    #[must_use]
    pub fn with_registered_object(mut self) -> Self {
        self.registered = self.world;
        self
    }

    /// The object placed in the world.
    #[must_use]
    pub const fn world_object(&self) -> Option<&Affordance> {
        self.world.as_ref()
    }

    /// Last command sent to the hand on `side`.
    #[must_use]
    pub const fn gripper(&self, side: Hand) -> Option<GripperCommand> {
        self.grippers[side.is_right() as usize]
    }

    /// Identifiers of committed plans, in order.
    #[must_use]
    pub fn committed(&self) -> &[u64] {
        &self.committed
    }

    /// Identifiers of previewed plans, in order.
    #[must_use]
    pub fn previewed(&self) -> &[u64] {
        &self.previewed
    }

    /// Number of plans passed to the last playback.
    #[must_use]
    pub const fn played_back(&self) -> usize {
        self.played_back
    }

    /// Returns `true` while a committed plan or walk is running.
    #[must_use]
    pub const fn is_executing(&self) -> bool {
        self.execution.is_some()
    }

    fn plan(&mut self, label: &'static str, knots: usize, duration: Duration, end_pose: JointPose) -> SimPlan {
        self.next_id += 1;
        debug!(id = self.next_id, label, knots, "Simulated plan");
        SimPlan {
            id: self.next_id,
            label,
            knots,
            duration,
            end_pose,
        }
    }

    fn start(&mut self, status: ControllerStatus, effect: Effect) -> Result<(), SolverError> {
        if self.execution.is_some() {
            return Err(SolverError::rejected("controller is busy"));
        }
        self.execution = Some(Execution {
            status,
            polls_left: EXECUTION_POLLS,
            effect,
        });
        Ok(())
    }
}

fn joint_move_duration(start: &JointPose, end: &JointPose, speed_deg_per_sec: f64) -> Duration {
    let degrees = start.max_abs_diff(end).to_degrees();
    Duration::from_secs_f64((degrees / speed_deg_per_sec).max(0.5))
}

impl AffordanceSource for SimulatedRobot {
    fn sweep_count(&mut self) -> u64 {
        self.sweeps += 1;
        self.sweeps
    }

    fn fit_affordance(&mut self, kind: ObjectKind, expected_radius: f64) -> Result<(), SolverError> {
        match self.world {
            Some(object) if object.kind() == kind => {
                debug!(%kind, expected_radius, "Fitted affordance");
                self.registered = Some(object);
                Ok(())
            }
            _ => Err(SolverError::rejected(format!("no {kind} in view"))),
        }
    }

    fn resolve_affordance(&self, kind: ObjectKind) -> Option<Affordance> {
        self.registered.filter(|a| a.kind() == kind)
    }
}

impl RobotStateSource for SimulatedRobot {
    fn foot_contacts(&self) -> FootContacts {
        self.contacts
    }

    fn estimated_pose(&self) -> JointPose {
        self.pose.clone()
    }

    fn set_estimated_pose(&mut self, pose: JointPose) {
        let (x, y, yaw) = pose.base_xy_yaw();
        self.contacts = FootContacts::standing(x, y, yaw, STANCE_WIDTH, 0.0);
        self.pose = pose;
    }

    fn controller_status(&mut self) -> ControllerStatus {
        let Some(execution) = self.execution.as_mut() else {
            return ControllerStatus::Standing;
        };
        if execution.polls_left > 0 {
            execution.polls_left -= 1;
            return execution.status;
        }

        let effect = execution.effect.clone();
        self.execution = None;
        match effect {
            Effect::Pose(pose) => self.pose = pose,
            Effect::Walk(goal) => {
                let position = goal.position();
                let pose = self.pose.clone().with_base_xy_yaw(position.x, position.y, goal.yaw());
                self.set_estimated_pose(pose);
            }
        }
        ControllerStatus::Standing
    }
}

impl MotionPlanner for SimulatedRobot {
    type Plan = SimPlan;
    type Footsteps = SimFootsteps;

    fn solve_pose(
        &mut self,
        set: &PoseConstraintSet,
        _start: &JointPose,
        seed: &JointPose,
    ) -> Result<(JointPose, SolverInfo), SolverError> {
        if !set.goal.is_finite() {
            return Err(SolverError::Infeasible {
                info: SolverInfo::new(13),
            });
        }
        let pose = match set.nominal_yaw {
            Some(yaw) => seed.clone().with_base_yaw(yaw),
            None => seed.clone(),
        };
        Ok((pose, SolverInfo::SUCCESS))
    }

    fn plan_trajectory(
        &mut self,
        set: &WaypointConstraintSet,
        start: &JointPose,
        speed_deg_per_sec: f64,
    ) -> Result<SimPlan, SolverError> {
        let frames = set.frames();
        let swept: f64 = frames.windows(2).map(|w| w[0].angle_to(&w[1]).to_degrees()).sum();
        let duration = Duration::from_secs_f64(swept / speed_deg_per_sec);
        Ok(self.plan("trajectory", frames.len(), duration, start.clone()))
    }

    fn plan_pose_trajectory(
        &mut self,
        set: &PoseConstraintSet,
        start: &JointPose,
        speed_deg_per_sec: f64,
    ) -> Result<SimPlan, SolverError> {
        let (end, _) = self.solve_pose(set, start, start)?;
        let end = self.named_posture(&end, NamedPosture::ArmUpPregrasp(set.hand))?;
        let duration = joint_move_duration(start, &end, speed_deg_per_sec);
        Ok(self.plan("end effector", 2, duration, end))
    }

    fn plan_posture(
        &mut self,
        start: &JointPose,
        end: &JointPose,
        speed_deg_per_sec: f64,
    ) -> Result<SimPlan, SolverError> {
        if start.len() != end.len() {
            return Err(SolverError::rejected("pose sizes differ"));
        }
        let duration = joint_move_duration(start, end, speed_deg_per_sec);
        Ok(self.plan("posture", 2, duration, end.clone()))
    }

    fn named_posture(&self, base: &JointPose, posture: NamedPosture) -> Result<JointPose, SolverError> {
        let mut positions = base.positions().to_vec();
        if positions.len() < POSE_LEN {
            return Err(SolverError::rejected(format!("unknown joint layout for {}", posture.name())));
        }
        match posture {
            NamedPosture::ArmUpPregrasp(hand) => {
                positions[arm_range(hand)].copy_from_slice(&PREGRASP_ARM);
            }
            NamedPosture::SafeNominal => {
                positions[BASE_DOF..POSE_LEN].fill(0.0);
            }
        }
        Ok(JointPose::new(positions))
    }

    fn plan_footsteps(&mut self, start: &JointPose, goal: &Frame) -> Result<SimFootsteps, SolverError> {
        let (x, y, _) = start.base_xy_yaw();
        let position = goal.position();
        let distance = (position.x - x).hypot(position.y - y);
        // Always at least one step to square up the feet.
        let steps = (distance / STEP_LENGTH).ceil().max(1.0) as usize;
        Ok(SimFootsteps { goal: *goal, steps })
    }

    fn plan_walking(&mut self, footsteps: &SimFootsteps, start: &JointPose) -> Result<SimPlan, SolverError> {
        let position = footsteps.goal.position();
        let end = start
            .clone()
            .with_base_xy_yaw(position.x, position.y, footsteps.goal.yaw());
        let duration = Duration::from_secs_f64(footsteps.steps as f64 * STEP_SECONDS);
        Ok(self.plan("walking", footsteps.steps, duration, end))
    }

    fn commit_footsteps(&mut self, footsteps: &SimFootsteps) -> Result<(), SolverError> {
        self.start(ControllerStatus::Walking, Effect::Walk(footsteps.goal))
    }

    fn preview(&mut self, plan: &SimPlan) -> Duration {
        self.previewed.push(plan.id);
        plan.duration
    }

    fn commit(&mut self, plan: &SimPlan) -> Result<ExecutionHandle, SolverError> {
        self.start(ControllerStatus::Manipulating, Effect::Pose(plan.end_pose.clone()))?;
        self.committed.push(plan.id);
        Ok(ExecutionHandle(plan.id))
    }

    fn playback(&mut self, plans: &[SimPlan]) {
        self.played_back = plans.len();
    }
}

impl GripperDriver for SimulatedRobot {
    fn send_gripper(&mut self, side: Hand, command: GripperCommand) -> Result<(), SolverError> {
        self.grippers[side.is_right() as usize] = Some(command);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_registers_only_matching_kind() {
        let mut robot = SimulatedRobot::new(ObjectKind::Valve).unwrap();
        assert!(robot.resolve_affordance(ObjectKind::Valve).is_none());

        assert!(robot.fit_affordance(ObjectKind::Lever, 0.23).is_err());
        robot.fit_affordance(ObjectKind::Valve, 0.23).unwrap();
        assert!(robot.resolve_affordance(ObjectKind::Valve).is_some());
        assert!(robot.resolve_affordance(ObjectKind::Lever).is_none());
    }

    #[test]
    fn test_commit_runs_for_fixed_polls() {
        let mut robot = SimulatedRobot::empty();
        let start = robot.estimated_pose();
        let end = robot
            .named_posture(&start, NamedPosture::ArmUpPregrasp(Hand::Left))
            .unwrap();
        let plan = robot.plan_posture(&start, &end, 30.0).unwrap();

        robot.commit(&plan).unwrap();
        assert!(robot.commit(&plan).is_err());
        for _ in 0..EXECUTION_POLLS {
            assert_eq!(robot.controller_status(), ControllerStatus::Manipulating);
        }
        assert_eq!(robot.controller_status(), ControllerStatus::Standing);
        assert_eq!(robot.estimated_pose(), end);
        assert_eq!(robot.committed(), [plan.id]);
    }

    #[test]
    fn test_walk_moves_feet() {
        let mut robot = SimulatedRobot::empty();
        let goal = Frame::from_position_rpy([-0.4, 0.3, 0.0], [0.0, 0.0, 10.0]);
        let footsteps = robot.plan_footsteps(&robot.estimated_pose(), &goal).unwrap();
        assert_eq!(footsteps.steps, 2);

        robot.commit_footsteps(&footsteps).unwrap();
        while robot.controller_status() == ControllerStatus::Walking {}

        let (x, y, yaw) = robot.estimated_pose().base_xy_yaw();
        assert_relative_eq!(x, -0.4, epsilon = 1e-12);
        assert_relative_eq!(y, 0.3, epsilon = 1e-12);
        assert_relative_eq!(yaw, 10f64.to_radians(), epsilon = 1e-12);
        let ground = ground_frame(&robot.foot_contacts()).unwrap();
        assert_relative_eq!(ground.position().x, -0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_named_postures_touch_one_arm() {
        let robot = SimulatedRobot::empty();
        let base = robot.estimated_pose();
        let right = robot
            .named_posture(&base, NamedPosture::ArmUpPregrasp(Hand::Right))
            .unwrap();
        assert!(right.positions()[arm_range(Hand::Left)].iter().all(|q| *q == 0.0));
        assert_eq!(&right.positions()[arm_range(Hand::Right)], &PREGRASP_ARM);

        let nominal = robot.named_posture(&right, NamedPosture::SafeNominal).unwrap();
        assert_eq!(nominal, base);
    }

    #[test]
    fn test_gripper_commands_are_per_side() {
        let mut robot = SimulatedRobot::empty();
        robot.send_gripper(Hand::Right, GripperCommand::CLOSE).unwrap();
        assert_eq!(robot.gripper(Hand::Right), Some(GripperCommand::CLOSE));
        assert_eq!(robot.gripper(Hand::Left), None);
    }
}
