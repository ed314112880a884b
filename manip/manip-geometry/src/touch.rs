//! Touch frames on the scribe circle.
//!
//! A touch frame places the palm on the circle traced while turning, at a
//! given scribe angle, held off the face by a standoff depth along the palm
//! normal. Orientation rolls the palm toward the rotation axis and yaws it so
//! the thumb tracks the tangent.

use manip_types::{
    BackMode, BodyConstraints, Bounds3, Constraint, FootMode, Frame, GraspConfig, Hand, ObjectKind,
    OrientationConstraint, PoseConstraintSet, PositionConstraint, Standoff, TimeSpan,
    DEFAULT_TOLERANCE,
};

use crate::grasp::GraspGeometry;

/// A touch frame in both object-local and world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchFrame {
    /// Pose relative to the object reference frame.
    pub local: Frame,
    /// Pose in the world.
    pub world: Frame,
    /// Scribe angle the frame was computed at, in degrees.
    pub scribe_angle_deg: f64,
}

/// Touch pose relative to the object reference frame.
///
/// `local = circle_point(angle) * translation(0, depth, 0)`, where the circle
/// point has radius `scribe_radius` in the reference XY plane.
#[must_use]
pub fn touch_offset(
    kind: ObjectKind,
    hand: Hand,
    scribe_radius: f64,
    scribe_angle_deg: f64,
    depth: f64,
    palm_in_deg: f64,
) -> Frame {
    let a = scribe_angle_deg.to_radians();
    let position = [scribe_radius * a.cos(), scribe_radius * a.sin(), 0.0];
    let rpy = match (kind, hand) {
        (ObjectKind::Valve, _) => [90.0 + palm_in_deg, 0.0, 270.0 + scribe_angle_deg],
        (ObjectKind::Lever, Hand::Left) => [90.0, 0.0, 180.0 + scribe_angle_deg],
        (ObjectKind::Lever, Hand::Right) => [90.0, 0.0, scribe_angle_deg],
    };
    Frame::from_position_rpy(position, rpy).compose(&Frame::from_translation(0.0, depth, 0.0))
}

/// Single-pose request that puts the hand on a touch frame.
///
/// Position and orientation are both bound to the touch frame. The base and
/// back follow the configured locks and the other arm is held still.
#[must_use]
pub fn reach_goal(touch: &TouchFrame, config: &GraspConfig) -> PoseConstraintSet {
    let hand = config.hand;
    let body = BodyConstraints {
        feet: if config.lock_base { FootMode::Locked } else { FootMode::Free },
        back: if config.lock_back { BackMode::Locked } else { BackMode::Bounded },
        locked_arm: Some(hand.opposite()),
        ..BodyConstraints::default()
    };
    let constraints = vec![
        Constraint::Position(PositionConstraint {
            link: hand.hand_link().to_string(),
            reference: touch.world,
            bounds: Bounds3::symmetric(DEFAULT_TOLERANCE),
            tspan: TimeSpan::Always,
        }),
        Constraint::Orientation(OrientationConstraint {
            link: hand.hand_link().to_string(),
            target: touch.world,
            tolerance: DEFAULT_TOLERANCE,
            tspan: TimeSpan::Always,
        }),
    ];
    PoseConstraintSet {
        hand,
        body,
        goal: touch.world,
        constraints,
        nominal_yaw: None,
    }
}

impl GraspGeometry {
    /// Touch frame at `scribe_angle_deg` with the standoff depth of `standoff`.
    #[must_use]
    pub fn touch_frame(&self, config: &GraspConfig, scribe_angle_deg: f64, standoff: Standoff) -> TouchFrame {
        let local = touch_offset(
            self.affordance().kind(),
            config.hand,
            self.scribe_radius(),
            scribe_angle_deg,
            config.depth(standoff),
            config.palm_in_angle_deg,
        );
        TouchFrame {
            local,
            world: self.reference_frame().compose(&local),
            scribe_angle_deg,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use manip_types::Affordance;

    #[test]
    fn test_touch_point_on_circle_without_depth() {
        let local = touch_offset(ObjectKind::Valve, Hand::Left, 0.2, 30.0, 0.0, 30.0);
        let p = local.position();
        assert_relative_eq!(p.coords.norm(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y.atan2(p.x), 30f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_depth_moves_along_palm_normal() {
        let base = touch_offset(ObjectKind::Valve, Hand::Left, 0.2, -60.0, 0.0, 30.0);
        let deep = touch_offset(ObjectKind::Valve, Hand::Left, 0.2, -60.0, -0.06, 30.0);
        let normal = base.transform_vector(&nalgebra::Vector3::y());
        let moved = deep.position() - base.position();

        assert_relative_eq!(moved, normal * -0.06, epsilon = 1e-12);
        assert!(base.angle_to(&deep) < 1e-12);
    }

    #[test]
    fn test_lever_hands_face_opposite_ways() {
        let left = touch_offset(ObjectKind::Lever, Hand::Left, 0.23, 0.0, 0.0, 0.0);
        let right = touch_offset(ObjectKind::Lever, Hand::Right, 0.23, 0.0, 0.0, 0.0);
        assert_relative_eq!(left.angle_to(&right), std::f64::consts::PI, epsilon = 1e-6);
    }

    #[test]
    fn test_reach_goal_binds_hand_link() {
        let config = GraspConfig::default();
        let geometry = GraspGeometry::new(Affordance::spawn_valve(&Frame::identity()), &config);
        let touch = geometry.touch_frame(&config, config.scribe_angle_deg, Standoff::Reaching);
        let goal = reach_goal(&touch, &config);

        assert_eq!(goal.constraints.len(), 2);
        assert_eq!(goal.body.locked_arm, Some(Hand::Right));
        assert!(matches!(
            &goal.constraints[0],
            Constraint::Position(c) if c.link == "l_hand"
        ));
    }
}
