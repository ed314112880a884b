//! Single-pose requests that keep the forearm coaxial with the object.
//!
//! Used for the pre-touch, touch, turn and retract postures. The hand goal
//! sits on the clench frame's Y axis at a signed depth; positive depths are
//! in contact and additionally pin the forearm to the rotation axis.

use manip_types::{
    BackMode, BodyConstraints, Bounds3, Constraint, FootMode, Frame, GazeConstraint, GraspConfig,
    JointBound, KneeRange, PoseConstraintSet, PositionConstraint, PostureConstraint, Result,
    TimeSpan, DEFAULT_TOLERANCE,
};
use nalgebra::Vector3;
use tracing::debug;

use crate::grasp::GraspGeometry;
use crate::turn::wrist_roll_lock;

/// Named coaxial postures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoaxialPhase {
    /// Hand held back from the object.
    PreTouch,
    /// Hand on the object, wrist in the pre-turn position.
    Touch,
    /// Hand on the object, wrist in the post-turn position.
    Turn,
    /// Hand held back, wrist in the post-turn position.
    Retract,
}

impl CoaxialPhase {
    /// Signed hand depth along the clench Y axis, in meters.
    #[must_use]
    pub const fn depth(&self) -> f64 {
        match self {
            Self::PreTouch | Self::Retract => -0.1,
            Self::Touch | Self::Turn => 0.05,
        }
    }

    /// Returns `true` if the wrist uses the pre-turn convention.
    #[must_use]
    pub const fn is_pre_turn(&self) -> bool {
        matches!(self, Self::PreTouch | Self::Touch)
    }
}

/// Parameters of a coaxial request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoaxialRequest {
    /// Signed hand depth along the clench Y axis.
    pub depth: f64,
    /// Wrist convention.
    pub pre_turn: bool,
    /// Keep the feet fixed; otherwise they may slide.
    pub lock_feet: bool,
    /// Keep the back fixed; otherwise it moves within limits.
    pub lock_back: bool,
}

impl CoaxialRequest {
    /// Request for a named posture with feet and back locked.
    #[must_use]
    pub const fn for_phase(phase: CoaxialPhase) -> Self {
        Self {
            depth: phase.depth(),
            pre_turn: phase.is_pre_turn(),
            lock_feet: true,
            lock_back: true,
        }
    }

    /// Sets whether the feet are locked.
    #[must_use]
    pub const fn with_lock_feet(mut self, lock: bool) -> Self {
        self.lock_feet = lock;
        self
    }

    /// Sets whether the back is locked.
    #[must_use]
    pub const fn with_lock_back(mut self, lock: bool) -> Self {
        self.lock_back = lock;
        self
    }
}

/// Knee range used for coaxial postures.
pub const COAXIAL_KNEE: KneeRange = KneeRange::new(0.7, 2.5);

/// Gaze cone half-angle toward the clench frame, in degrees.
pub const COAXIAL_GAZE_CONE_DEGREES: f64 = 4.0;

/// Builds a coaxial single-pose request.
///
/// The nominal pose is turned to face along the object axis. Only the goal
/// position is bound; the Y offset is pinned and X/Z get the default
/// tolerance.
///
/// # Errors
///
/// Returns [`manip_types::GeometryError::DegenerateAxis`] if the reference
/// frame is not a proper rotation.
pub fn coaxial_pose_set(
    geometry: &GraspGeometry,
    grasp: &GraspConfig,
    request: &CoaxialRequest,
) -> Result<PoseConstraintSet> {
    let tol = DEFAULT_TOLERANCE;
    let hand = grasp.hand;
    let clench = geometry.clench_frame();
    let (_, _, axis) = geometry.reference_frame().axes()?;
    let nominal_yaw = axis.y.atan2(axis.x);

    let body = BodyConstraints {
        feet: if request.lock_feet { FootMode::Locked } else { FootMode::Free },
        back: if request.lock_back { BackMode::Locked } else { BackMode::Bounded },
        locked_arm: Some(hand.opposite()),
        knee: COAXIAL_KNEE,
        quasi_static: true,
        gaze: Some(GazeConstraint {
            hand,
            target: clench,
            cone_degrees: COAXIAL_GAZE_CONE_DEGREES,
        }),
    };

    let mut constraints = Vec::new();
    if request.depth >= 0.0 {
        constraints.push(Constraint::Position(PositionConstraint {
            link: hand.forearm_link().to_string(),
            reference: clench,
            bounds: Bounds3::on_y_axis(tol),
            tspan: TimeSpan::Always,
        }));
        constraints.push(Constraint::Posture(PostureConstraint::always(vec![
            JointBound::locked(hand.wrist_flex_joint(), 0.0),
        ])));
    }
    constraints.push(Constraint::Posture(PostureConstraint::always(vec![
        JointBound::locked(hand.wrist_roll_joint(), wrist_roll_lock(hand, request.pre_turn)),
    ])));

    let goal = clench.compose(&Frame::from_translation(0.0, request.depth, 0.0));
    constraints.push(Constraint::Position(PositionConstraint {
        link: hand.hand_link().to_string(),
        reference: goal,
        bounds: Bounds3::pinned_y(tol),
        tspan: TimeSpan::Always,
    }));

    debug!(
        depth = request.depth,
        pre_turn = request.pre_turn,
        constraints = constraints.len(),
        "Built coaxial request"
    );

    Ok(PoseConstraintSet {
        hand,
        body,
        goal,
        constraints,
        nominal_yaw: Some(nominal_yaw),
    })
}

/// Distance of a point from the clench Y axis.
#[must_use]
pub fn distance_from_axis(geometry: &GraspGeometry, point: &nalgebra::Point3<f64>) -> f64 {
    let clench = geometry.clench_frame();
    let local = clench.inverse().transform_point(point);
    Vector3::new(local.x, 0.0, local.z).norm()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use manip_types::{Affordance, Hand, ObjectKind};

    fn setup() -> (GraspGeometry, GraspConfig) {
        let config = GraspConfig::new(Hand::Left, ObjectKind::Valve);
        let geometry = GraspGeometry::new(Affordance::spawn_valve(&Frame::identity()), &config);
        (geometry, config)
    }

    #[test]
    fn test_phase_depths() {
        assert_eq!(CoaxialPhase::PreTouch.depth(), -0.1);
        assert_eq!(CoaxialPhase::Turn.depth(), 0.05);
        assert!(CoaxialPhase::Touch.is_pre_turn());
        assert!(!CoaxialPhase::Retract.is_pre_turn());
    }

    #[test]
    fn test_contact_adds_forearm_locks() {
        let (geometry, config) = setup();
        let touch = coaxial_pose_set(&geometry, &config, &CoaxialRequest::for_phase(CoaxialPhase::Touch)).unwrap();
        let pre = coaxial_pose_set(&geometry, &config, &CoaxialRequest::for_phase(CoaxialPhase::PreTouch)).unwrap();

        assert_eq!(touch.constraints.len(), 4);
        assert_eq!(pre.constraints.len(), 2);
    }

    #[test]
    fn test_goal_on_clench_axis() {
        let (geometry, config) = setup();
        let set = coaxial_pose_set(&geometry, &config, &CoaxialRequest::for_phase(CoaxialPhase::Retract)).unwrap();
        assert_relative_eq!(distance_from_axis(&geometry, &set.goal.position()), 0.0, epsilon = 1e-12);
        let offset = set.goal.position() - geometry.clench_frame().position();
        assert_relative_eq!(offset.norm(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_nominal_yaw_faces_axis() {
        let (geometry, config) = setup();
        let set = coaxial_pose_set(&geometry, &config, &CoaxialRequest::for_phase(CoaxialPhase::Touch)).unwrap();
        // Spawned valve axis points along world X.
        assert_relative_eq!(set.nominal_yaw.unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(set.body.knee, COAXIAL_KNEE);
        assert_eq!(set.body.feet, FootMode::Locked);
    }

    #[test]
    fn test_free_feet_request() {
        let (geometry, config) = setup();
        let request = CoaxialRequest::for_phase(CoaxialPhase::Touch)
            .with_lock_feet(false)
            .with_lock_back(false);
        let set = coaxial_pose_set(&geometry, &config, &request).unwrap();
        assert_eq!(set.body.feet, FootMode::Free);
        assert_eq!(set.body.back, BackMode::Bounded);
    }
}
