//! Planning session for one grasping task.
//!
//! A [`ValveSession`] is the single writer of the grasp configuration and
//! the plan history. Each planning call derives frames from the most
//! recently discovered affordance, submits one request to the robot's
//! planner and records the returned plan.

use std::time::Duration;

use manip_geometry::{
    coaxial_pose_set, ground_frame, reach_goal, CoaxialPhase, CoaxialRequest, GraspGeometry,
    TurnAssembler, TurnPhase, TurnPlan,
};
use manip_types::{Frame, GeometryError, GraspConfig, JointPose, Standoff};
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::adapter::{ControllerStatus, ExecutionHandle, GripperCommand, NamedPosture, Robot};
use crate::error::{Result, ValveError};
use crate::history::PlanHistory;

/// Operating switches for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionOptions {
    /// Preview plans on screen instead of executing them.
    pub vis_only: bool,
    /// Start every plan from the estimated state rather than from the end
    /// of the previous plan.
    pub plan_from_current_state: bool,
    /// Walk to the stance with the footstep planner; otherwise the robot is
    /// repositioned directly.
    pub use_footstep_planner: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            vis_only: true,
            plan_from_current_state: true,
            use_footstep_planner: true,
        }
    }
}

impl SessionOptions {
    /// Options for executing on the robot.
    #[must_use]
    pub const fn live() -> Self {
        Self {
            vis_only: false,
            plan_from_current_state: true,
            use_footstep_planner: true,
        }
    }

    /// Options for chaining plans offline.
    #[must_use]
    pub const fn offline() -> Self {
        Self {
            vis_only: true,
            plan_from_current_state: false,
            use_footstep_planner: true,
        }
    }

    /// Sets preview-only mode.
    #[must_use]
    pub const fn with_vis_only(mut self, vis_only: bool) -> Self {
        self.vis_only = vis_only;
        self
    }

    /// Sets whether plans start from the estimated state.
    #[must_use]
    pub const fn with_plan_from_current_state(mut self, current: bool) -> Self {
        self.plan_from_current_state = current;
        self
    }

    /// Sets whether the footstep planner is used.
    #[must_use]
    pub const fn with_footstep_planner(mut self, enabled: bool) -> Self {
        self.use_footstep_planner = enabled;
        self
    }
}

/// What happened to the most recent plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// Previewed on screen for the given duration.
    Preview(Duration),
    /// Sent to the controller.
    Committed(ExecutionHandle),
}

/// Frames derived from the latest affordance discovery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discovery {
    /// Clench and reference frames.
    pub geometry: GraspGeometry,
    /// Support-surface frame at discovery time.
    pub ground: Frame,
    /// Where the robot should stand.
    pub stance: Frame,
}

/// Grasp-and-turn planning session over a robot.
pub struct ValveSession<R: Robot> {
    robot: R,
    config: GraspConfig,
    options: SessionOptions,
    assembler: TurnAssembler,
    discovery: Option<Discovery>,
    last_turn: Option<TurnPlan>,
    plans: PlanHistory<R::Plan>,
    footsteps: Option<R::Footsteps>,
}

impl<R: Robot> std::fmt::Debug for ValveSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValveSession")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("discovery", &self.discovery)
            .field("plans", &self.plans.len())
            .finish_non_exhaustive()
    }
}

impl<R: Robot> ValveSession<R> {
    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidConfig`] if `config` is invalid.
    pub fn new(robot: R, config: GraspConfig, options: SessionOptions) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            robot,
            config,
            options,
            assembler: TurnAssembler::default(),
            discovery: None,
            last_turn: None,
            plans: PlanHistory::new(),
            footsteps: None,
        })
    }

    /// Replaces the turn assembler.
    #[must_use]
    pub fn with_assembler(mut self, assembler: TurnAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// The robot.
    #[must_use]
    pub const fn robot(&self) -> &R {
        &self.robot
    }

    /// Mutable access to the robot.
    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    /// Consumes the session and returns the robot.
    #[must_use]
    pub fn into_robot(self) -> R {
        self.robot
    }

    /// Current grasp configuration.
    #[must_use]
    pub const fn config(&self) -> &GraspConfig {
        &self.config
    }

    /// Replaces the grasp configuration.
    ///
    /// Frames from an earlier discovery are dropped; call
    /// [`find_affordance`](Self::find_affordance) again before planning.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidConfig`] if `config` is invalid; the
    /// session is unchanged in that case.
    pub fn set_config(&mut self, config: GraspConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.discovery = None;
        Ok(())
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Mutable access to the options.
    pub fn options_mut(&mut self) -> &mut SessionOptions {
        &mut self.options
    }

    /// Frames from the latest discovery.
    #[must_use]
    pub const fn discovery(&self) -> Option<&Discovery> {
        self.discovery.as_ref()
    }

    /// Stance frame from the latest discovery.
    #[must_use]
    pub fn stance_frame(&self) -> Option<Frame> {
        self.discovery.map(|d| d.stance)
    }

    /// The most recent turn, with its intermediate touch frames.
    #[must_use]
    pub const fn last_turn(&self) -> Option<&TurnPlan> {
        self.last_turn.as_ref()
    }

    /// Plans produced so far.
    #[must_use]
    pub const fn plans(&self) -> &PlanHistory<R::Plan> {
        &self.plans
    }

    /// Sets the scribe angle for the next reach, grasp or turn.
    pub fn set_scribe_angle(&mut self, degrees: f64) {
        debug!(degrees, "Scribe angle set");
        self.config.scribe_angle_deg = degrees;
    }

    /// Forgets the intermediate frames of the last turn.
    pub fn reset_turn_path(&mut self) {
        self.last_turn = None;
    }

    /// Forgets the footstep plan.
    pub fn clear_footsteps(&mut self) {
        self.footsteps = None;
    }

    /// Forgets every recorded plan.
    pub fn clear_plans(&mut self) {
        self.plans.clear();
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Fits the configured object kind to the latest sensor sweep.
    ///
    /// # Errors
    ///
    /// Returns [`ValveError::Solver`] if the fit fails.
    pub fn fit_affordance(&mut self, expected_radius: f64) -> Result<()> {
        self.robot.fit_affordance(self.config.object, expected_radius)?;
        Ok(())
    }

    /// Looks up the affordance and derives clench, ground and stance frames.
    ///
    /// The handed defaults (scribe angle, turn direction, stance offset) are
    /// reset and mirrored once here, so every discovery starts from the same
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] if the object is not
    /// registered. Frames from an earlier discovery are dropped either way.
    pub fn find_affordance(&mut self) -> Result<&Discovery> {
        self.discovery = None;
        self.config.reset_for_affordance();

        let affordance = self.robot.resolve_affordance(self.config.object);
        let geometry = GraspGeometry::resolve(affordance, &self.config)?;
        let ground = ground_frame(&self.robot.foot_contacts())?;
        let stance = geometry.stance_frame(&ground, &self.config.stance)?;

        let position = stance.position();
        info!(
            object = %self.config.object,
            hand = %self.config.hand,
            stance_x = position.x,
            stance_y = position.y,
            "Affordance found"
        );
        Ok(self.discovery.insert(Discovery {
            geometry,
            ground,
            stance,
        }))
    }

    fn geometry(&self) -> Result<GraspGeometry> {
        self.discovery
            .map(|d| d.geometry)
            .ok_or_else(|| GeometryError::AffordanceNotFound(self.config.object).into())
    }

    fn stance(&self) -> Result<Frame> {
        self.discovery
            .map(|d| d.stance)
            .ok_or_else(|| GeometryError::AffordanceNotFound(self.config.object).into())
    }

    // ========================================================================
    // Planning
    // ========================================================================

    /// Pose the next plan starts from.
    ///
    /// The estimated state when planning live, otherwise the end of the most
    /// recent plan (falling back to the estimated state).
    #[must_use]
    pub fn planning_start_pose(&self) -> JointPose {
        if !self.options.plan_from_current_state {
            if let Some(pose) = self.plans.last_end_pose() {
                return pose.clone();
            }
        }
        self.robot.estimated_pose()
    }

    fn record(&mut self, plan: R::Plan, label: &'static str) -> &R::Plan {
        info!(plan = label, history = self.plans.len() + 1, "Plan recorded");
        self.plans.push(plan)
    }

    /// Plans footsteps to the stance frame.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] before discovery, or the
    /// planner's error.
    pub fn plan_footsteps_to_stance(&mut self) -> Result<&R::Footsteps> {
        let goal = self.stance()?;
        let start = self.planning_start_pose();
        let footsteps = self.robot.plan_footsteps(&start, &goal)?;
        Ok(self.footsteps.insert(footsteps))
    }

    /// Plans walking along the footstep plan.
    ///
    /// # Errors
    ///
    /// Returns [`ValveError::NoFootstepPlan`] if no footsteps were planned.
    pub fn plan_walking(&mut self) -> Result<&R::Plan> {
        let footsteps = self.footsteps.as_ref().ok_or(ValveError::NoFootstepPlan)?;
        let start = self.planning_start_pose();
        let plan = self.robot.plan_walking(footsteps, &start)?;
        Ok(self.record(plan, "walking"))
    }

    /// Sends the footstep plan to the walking controller.
    ///
    /// # Errors
    ///
    /// Returns [`ValveError::NoFootstepPlan`] if no footsteps were planned.
    pub fn commit_footsteps(&mut self) -> Result<()> {
        let footsteps = self.footsteps.as_ref().ok_or(ValveError::NoFootstepPlan)?;
        self.robot.commit_footsteps(footsteps)?;
        info!("Footsteps committed");
        Ok(())
    }

    /// Places the robot on the stance frame without walking.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] before discovery.
    pub fn move_to_stance(&mut self) -> Result<()> {
        let stance = self.stance()?;
        let position = stance.position();
        let pose = self
            .robot
            .estimated_pose()
            .with_base_xy_yaw(position.x, position.y, stance.yaw());
        self.robot.set_estimated_pose(pose);
        info!(x = position.x, y = position.y, yaw = stance.yaw(), "Moved to stance");
        Ok(())
    }

    fn plan_named_posture(&mut self, posture: NamedPosture, label: &'static str) -> Result<&R::Plan> {
        let start = self.planning_start_pose();
        let end = self.robot.named_posture(&start, posture)?;
        let plan = self
            .robot
            .plan_posture(&start, &end, self.config.speed.fast_deg_per_sec)?;
        Ok(self.record(plan, label))
    }

    /// Raises the grasping arm.
    ///
    /// # Errors
    ///
    /// Returns the planner's error.
    pub fn plan_pregrasp(&mut self) -> Result<&R::Plan> {
        self.plan_named_posture(NamedPosture::ArmUpPregrasp(self.config.hand), "pregrasp")
    }

    /// Returns both arms to the safe nominal posture.
    ///
    /// # Errors
    ///
    /// Returns the planner's error.
    pub fn plan_nominal(&mut self) -> Result<&R::Plan> {
        self.plan_named_posture(NamedPosture::SafeNominal, "nominal")
    }

    /// Moves the palm to the reaching standoff at the current scribe angle.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] before discovery, or the
    /// planner's error.
    pub fn plan_reach(&mut self) -> Result<&R::Plan> {
        self.plan_touch(Standoff::Reaching, "reach")
    }

    /// Moves the palm onto the object at the current scribe angle.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] before discovery, or the
    /// planner's error.
    pub fn plan_grasp(&mut self) -> Result<&R::Plan> {
        self.plan_touch(Standoff::Touching, "grasp")
    }

    fn plan_touch(&mut self, standoff: Standoff, label: &'static str) -> Result<&R::Plan> {
        let geometry = self.geometry()?;
        let touch = geometry.touch_frame(&self.config, self.config.scribe_angle_deg, standoff);
        let set = reach_goal(&touch, &self.config);

        let start = self.planning_start_pose();
        let seed = self
            .robot
            .named_posture(&start, NamedPosture::ArmUpPregrasp(self.config.hand))?;
        let (_, info) = self.robot.solve_pose(&set, &start, &seed)?;
        if !info.is_success() {
            warn!(%info, plan = label, "Pose solve did not converge, planning anyway");
        }

        let plan = self
            .robot
            .plan_pose_trajectory(&set, &start, self.config.speed.slow_deg_per_sec)?;
        Ok(self.record(plan, label))
    }

    /// Plans a turn of `turn_degrees` from the current scribe angle.
    ///
    /// On success the scribe angle advances to the end of the turn.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] before discovery,
    /// [`GeometryError::DegenerateTurn`] if the turn yields no waypoints, or
    /// the planner's error. The scribe angle is unchanged on error.
    pub fn plan_turn(&mut self, turn_degrees: f64) -> Result<&R::Plan> {
        let geometry = self.geometry()?;
        let turn = self
            .assembler
            .assemble(&geometry, &self.config, turn_degrees, TurnPhase::Turn)?;

        let start = self.planning_start_pose();
        let plan = self
            .robot
            .plan_trajectory(&turn.set, &start, self.config.speed.slow_deg_per_sec)?;

        self.config.scribe_angle_deg = turn.final_scribe_angle_deg;
        self.last_turn = Some(turn);
        Ok(self.record(plan, "turn"))
    }

    /// Solves a coaxial pose for `request` and plans a posture move to it.
    ///
    /// Returns the solved pose.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] before discovery, or the
    /// planner's error.
    pub fn plan_coaxial(&mut self, request: &CoaxialRequest) -> Result<JointPose> {
        let geometry = self.geometry()?;
        let set = coaxial_pose_set(&geometry, &self.config, request)?;
        let start = self.planning_start_pose();
        let (pose, info) = self.robot.solve_pose(&set, &start, &start)?;
        debug!(%info, depth = request.depth, "Coaxial pose solved");

        let plan = self
            .robot
            .plan_posture(&start, &pose, self.config.speed.fast_deg_per_sec)?;
        self.record(plan, "coaxial");
        Ok(pose)
    }

    /// [`plan_coaxial`](Self::plan_coaxial) with the locks of a named phase.
    ///
    /// # Errors
    ///
    /// See [`plan_coaxial`](Self::plan_coaxial).
    pub fn plan_coaxial_phase(&mut self, phase: CoaxialPhase) -> Result<JointPose> {
        self.plan_coaxial(&CoaxialRequest::for_phase(phase))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Previews or commits the most recent plan, depending on
    /// [`SessionOptions::vis_only`].
    ///
    /// # Errors
    ///
    /// Returns [`ValveError::NoPlan`] if nothing was planned yet.
    pub fn animate_last_plan(&mut self) -> Result<Animation> {
        let plan = self
            .plans
            .last()
            .ok_or(ValveError::NoPlan { action: "animate" })?;
        if self.options.vis_only {
            let duration = self.robot.preview(plan);
            info!(seconds = duration.as_secs_f64(), "Previewing plan");
            Ok(Animation::Preview(duration))
        } else {
            let handle = self.robot.commit(plan)?;
            info!(handle = handle.0, "Plan committed");
            Ok(Animation::Committed(handle))
        }
    }

    /// Plays every recorded plan back to back.
    ///
    /// # Errors
    ///
    /// Returns [`ValveError::NoPlan`] if nothing was planned yet.
    pub fn play_sequence(&mut self) -> Result<()> {
        if self.plans.is_empty() {
            return Err(ValveError::NoPlan { action: "play back" });
        }
        self.robot.playback(self.plans.as_slice());
        Ok(())
    }

    /// Polls the controller behavior.
    pub fn controller_status(&mut self) -> ControllerStatus {
        self.robot.controller_status()
    }

    /// Polls the sensor sweep counter.
    pub fn sweep_count(&mut self) -> u64 {
        self.robot.sweep_count()
    }

    // ========================================================================
    // Hand
    // ========================================================================

    fn send_gripper(&mut self, command: GripperCommand) -> Result<()> {
        let hand = self.config.hand;
        debug!(%hand, position = command.position, "Gripper command");
        self.robot.send_gripper(hand, command)?;
        Ok(())
    }

    /// Opens the grasping hand.
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub fn open_hand(&mut self) -> Result<()> {
        self.send_gripper(GripperCommand::OPEN)
    }

    /// Closes the grasping hand.
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub fn close_hand(&mut self) -> Result<()> {
        self.send_gripper(GripperCommand::CLOSE)
    }

    /// Opens the grasping hand in pinch mode.
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub fn open_pinch(&mut self) -> Result<()> {
        self.send_gripper(GripperCommand::PINCH)
    }
}
