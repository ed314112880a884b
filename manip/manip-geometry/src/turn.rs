//! Turn constraint assembly.
//!
//! Converts "turn the object by θ degrees from the current scribe angle" into
//! a time-indexed [`WaypointConstraintSet`]:
//!
//! 1. `n = round(|θ| / step)` samples, each `θ / n` degrees, so the total is
//!    exactly θ whatever the step.
//! 2. Waypoint 0 is the touch frame at the current scribe angle.
//! 3. Waypoint `i` is the touch frame after `i` steps in the turn direction,
//!    with position and orientation bounds pinned to `[i, i]`.
//! 4. During the pre-turn and turn phases each waypoint also keeps the
//!    forearm on the rotation axis and locks the wrist roll.
//!
//! Body constraints (feet, back, knees, balance, gaze) are attached once.

// Sample counts are small positive integers
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use std::f64::consts::PI;

use manip_types::{
    BackMode, BodyConstraints, Bounds3, Constraint, FootMode, GazeConstraint, GeometryError,
    GraspConfig, Hand, JointBound, KneeRange, OrientationConstraint, PositionConstraint,
    PostureConstraint, Result, TimeSpan, WaypointConstraintSet, DEFAULT_TOLERANCE,
};
use tracing::{debug, info};

use crate::grasp::GraspGeometry;
use crate::touch::TouchFrame;

/// Distance kept from the wrist-roll joint limits, in radians.
pub const WRIST_LIMIT_MARGIN: f64 = 0.01;

/// Wrist-roll lock angle, indexed by `[hand][pre_turn]`.
///
/// The left and right arms use opposite conventions before the turn. This is
/// a mechanical property of the arms and is kept as data.
const WRIST_ROLL_LOCK: [[f64; 2]; 2] = [
    // left: [after turn, before turn]
    [PI - WRIST_LIMIT_MARGIN, WRIST_LIMIT_MARGIN],
    // right: [after turn, before turn]
    [WRIST_LIMIT_MARGIN, PI - WRIST_LIMIT_MARGIN],
];

/// Wrist-roll lock angle for a hand, before or after the turn.
///
/// # Example
///
/// ```
/// use manip_geometry::wrist_roll_lock;
/// use manip_types::Hand;
///
/// assert!(wrist_roll_lock(Hand::Left, true) < 0.1);
/// assert!(wrist_roll_lock(Hand::Right, true) > 3.0);
/// ```
#[must_use]
pub const fn wrist_roll_lock(hand: Hand, pre_turn: bool) -> f64 {
    let row = match hand {
        Hand::Left => 0,
        Hand::Right => 1,
    };
    WRIST_ROLL_LOCK[row][pre_turn as usize]
}

/// Motion phase a turn request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TurnPhase {
    /// Moving onto the object before turning.
    PreTurn,
    /// Turning the object.
    #[default]
    Turn,
    /// Leaving the object.
    Retract,
}

impl TurnPhase {
    /// Returns `true` if waypoints carry the forearm and wrist locks.
    #[must_use]
    pub const fn locks_forearm(&self) -> bool {
        matches!(self, Self::PreTurn | Self::Turn)
    }

    /// Returns `true` before the turn starts.
    #[must_use]
    pub const fn is_pre_turn(&self) -> bool {
        matches!(self, Self::PreTurn)
    }
}

/// Tolerances and body limits used by the assembler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblerConfig {
    /// Waypoint tolerance in meters and radians.
    pub tolerance: f64,
    /// Knee flexion range.
    pub knee: KneeRange,
    /// Gaze cone half-angle toward the clench frame, in degrees.
    pub gaze_cone_degrees: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            knee: KneeRange::new(0.6, 2.5),
            gaze_cone_degrees: 4.0,
        }
    }
}

impl AssemblerConfig {
    /// Sets the waypoint tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the knee range.
    #[must_use]
    pub const fn with_knee(mut self, knee: KneeRange) -> Self {
        self.knee = knee;
        self
    }

    /// Sets the gaze cone half-angle.
    #[must_use]
    pub const fn with_gaze_cone(mut self, degrees: f64) -> Self {
        self.gaze_cone_degrees = degrees;
        self
    }
}

/// Output of [`TurnAssembler::assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPlan {
    /// The trajectory request.
    pub set: WaypointConstraintSet,
    /// Touch frame of every waypoint, anchor first.
    pub touch_frames: Vec<TouchFrame>,
    /// Scribe angle after the last waypoint, in degrees.
    pub final_scribe_angle_deg: f64,
}

impl TurnPlan {
    /// Number of waypoints after the anchor.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.set.motion_len()
    }

    /// Scribe angle of every waypoint, anchor first.
    pub fn scribe_angles(&self) -> impl Iterator<Item = f64> + '_ {
        self.touch_frames.iter().map(|t| t.scribe_angle_deg)
    }

    /// Angle change between consecutive waypoints.
    #[must_use]
    pub fn step_deltas(&self) -> Vec<f64> {
        self.touch_frames
            .windows(2)
            .map(|w| w[1].scribe_angle_deg - w[0].scribe_angle_deg)
            .collect()
    }
}

/// Builds turn trajectory requests.
///
/// # Example
///
/// ```
/// use manip_geometry::{GraspGeometry, TurnAssembler, TurnPhase};
/// use manip_types::{Affordance, Frame, GraspConfig};
///
/// let config = GraspConfig::default();
/// let geometry = GraspGeometry::new(Affordance::spawn_valve(&Frame::identity()), &config);
///
/// let plan = TurnAssembler::default()
///     .assemble(&geometry, &config, 60.0, TurnPhase::Turn)
///     .unwrap();
/// assert_eq!(plan.sample_count(), 6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnAssembler {
    config: AssemblerConfig,
}

impl TurnAssembler {
    /// Creates an assembler.
    #[must_use]
    pub const fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// The assembler configuration.
    #[must_use]
    pub const fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Number of waypoints after the anchor for a turn.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateTurn`] if the turn rounds to zero
    /// samples or either angle is not finite, and
    /// [`GeometryError::InvalidConfig`] if the step is not positive.
    pub fn sample_count(turn_degrees: f64, step_degrees: f64) -> Result<usize> {
        if !(step_degrees.is_finite() && step_degrees > 0.0) {
            return Err(GeometryError::invalid_config(format!(
                "turn step must be positive, got {step_degrees}"
            )));
        }
        let samples = (turn_degrees.abs() / step_degrees).round();
        if !samples.is_finite() || samples < 1.0 {
            return Err(GeometryError::DegenerateTurn {
                turn_degrees,
                step_degrees,
            });
        }
        Ok(samples as usize)
    }

    /// Whole-request constraints for the grasping hand.
    #[must_use]
    pub fn body_constraints(&self, geometry: &GraspGeometry, grasp: &GraspConfig) -> BodyConstraints {
        BodyConstraints {
            feet: if grasp.lock_base { FootMode::Locked } else { FootMode::Free },
            back: if grasp.lock_back { BackMode::Locked } else { BackMode::Bounded },
            locked_arm: Some(grasp.hand.opposite()),
            knee: self.config.knee,
            quasi_static: true,
            gaze: Some(GazeConstraint {
                hand: grasp.hand,
                target: geometry.clench_frame(),
                cone_degrees: self.config.gaze_cone_degrees,
            }),
        }
    }

    /// Assembles a turn of `turn_degrees` starting at the configured scribe
    /// angle.
    ///
    /// The configuration is not modified; callers store
    /// [`TurnPlan::final_scribe_angle_deg`] back once the plan is accepted.
    ///
    /// # Errors
    ///
    /// See [`TurnAssembler::sample_count`]. Nothing is assembled on error.
    pub fn assemble(
        &self,
        geometry: &GraspGeometry,
        grasp: &GraspConfig,
        turn_degrees: f64,
        phase: TurnPhase,
    ) -> Result<TurnPlan> {
        let samples = Self::sample_count(turn_degrees, grasp.turn_step_deg)?;
        let standoff = grasp.turn_standoff();
        let start = grasp.scribe_angle_deg;
        let sweep = grasp.direction.sign() * turn_degrees;

        let anchor = geometry.touch_frame(grasp, start, standoff);
        let mut set = WaypointConstraintSet::new(
            grasp.hand,
            self.body_constraints(geometry, grasp),
            anchor.world,
        );
        let mut touch_frames = Vec::with_capacity(samples + 1);
        touch_frames.push(anchor);

        for i in 1..=samples {
            // i / samples is exactly 1.0 on the last sample.
            let angle = sweep.mul_add(i as f64 / samples as f64, start);
            let touch = geometry.touch_frame(grasp, angle, standoff);
            let constraints = self.waypoint_constraints(geometry, grasp.hand, &touch, i, phase);
            let index = set.push(touch.world, constraints);
            debug_assert_eq!(index, i);
            touch_frames.push(touch);
        }

        let final_scribe_angle_deg = sweep.mul_add(1.0, start);
        info!(
            hand = %grasp.hand,
            samples,
            start_deg = start,
            end_deg = final_scribe_angle_deg,
            "Assembled turn constraints"
        );

        Ok(TurnPlan {
            set,
            touch_frames,
            final_scribe_angle_deg,
        })
    }

    fn waypoint_constraints(
        &self,
        geometry: &GraspGeometry,
        hand: Hand,
        touch: &TouchFrame,
        index: usize,
        phase: TurnPhase,
    ) -> Vec<Constraint> {
        let tol = self.config.tolerance;
        let tspan = TimeSpan::At(index);
        let mut constraints = vec![
            Constraint::Position(PositionConstraint {
                link: hand.hand_link().to_string(),
                reference: touch.world,
                bounds: Bounds3::symmetric(tol),
                tspan,
            }),
            Constraint::Orientation(OrientationConstraint {
                link: hand.hand_link().to_string(),
                target: touch.world,
                tolerance: tol,
                tspan,
            }),
        ];

        if phase.locks_forearm() {
            let roll = wrist_roll_lock(hand, phase.is_pre_turn());
            debug!(index, roll, "Locking forearm on axis");
            constraints.push(Constraint::Position(PositionConstraint {
                link: hand.forearm_link().to_string(),
                reference: geometry.clench_frame(),
                bounds: Bounds3::on_y_axis(tol),
                tspan,
            }));
            constraints.push(Constraint::Posture(PostureConstraint {
                joints: vec![JointBound::locked(hand.wrist_roll_joint(), roll)],
                tspan,
            }));
        }

        constraints
    }
}
