//! Rotary object models and the closed hand/object enumerations.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::frame::Frame;

/// The hand that grasps the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Hand {
    /// Left hand. Canonical defaults are expressed for this side.
    #[default]
    Left,
    /// Right hand. Uses the mirror image of the left-hand defaults.
    Right,
}

impl Hand {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// The other hand.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Returns `true` for the right hand.
    #[must_use]
    pub const fn is_right(&self) -> bool {
        matches!(self, Self::Right)
    }

    /// `+1` for the left hand, `-1` for the right.
    #[must_use]
    pub const fn mirror_sign(&self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }

    /// Forearm link constrained onto the object axis.
    #[must_use]
    pub const fn forearm_link(&self) -> &'static str {
        match self {
            Self::Left => "l_larm",
            Self::Right => "r_larm",
        }
    }

    /// End-effector link.
    #[must_use]
    pub const fn hand_link(&self) -> &'static str {
        match self {
            Self::Left => "l_hand",
            Self::Right => "r_hand",
        }
    }

    /// Wrist-roll joint (upper wrist yaw).
    #[must_use]
    pub const fn wrist_roll_joint(&self) -> &'static str {
        match self {
            Self::Left => "l_arm_uwy",
            Self::Right => "r_arm_uwy",
        }
    }

    /// Wrist-flex joint (middle wrist x).
    #[must_use]
    pub const fn wrist_flex_joint(&self) -> &'static str {
        match self {
            Self::Left => "l_arm_mwx",
            Self::Right => "r_arm_mwx",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hand {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            _ => Err(GeometryError::UnknownHand(s.to_string())),
        }
    }
}

/// Kind of rotary object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ObjectKind {
    /// A hand wheel turned by its rim.
    #[default]
    Valve,
    /// A straight lever turned by its free end.
    Lever,
}

impl ObjectKind {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valve => "valve",
            Self::Lever => "lever",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "valve" => Ok(Self::Valve),
            "lever" => Ok(Self::Lever),
            _ => Err(GeometryError::UnknownObjectKind(s.to_string())),
        }
    }
}

/// Distance from the lever tip to the grip point, in meters.
pub const LEVER_GRIP_INSET: f64 = 0.10;

/// Nominal valve radius used when spawning a model (7.7 in wheel).
pub const NOMINAL_VALVE_RADIUS: f64 = 0.195_58;

/// Nominal valve center height above ground (4 ft).
pub const NOMINAL_VALVE_HEIGHT: f64 = 1.2192;

/// Nominal lever length.
pub const NOMINAL_LEVER_LENGTH: f64 = 0.33;

/// Nominal lever pivot height above ground (3.5 ft).
pub const NOMINAL_LEVER_HEIGHT: f64 = 1.06;

/// Rotation taking an X-axis model frame to a Z-axis frame: the valve
/// model-to-reference correction, also used to stand a lever up.
const MODEL_TO_REFERENCE_RPY: [f64; 3] = [180.0, -90.0, 0.0];

/// Geometric model of a rotary object.
///
/// The child frame is the pose reported by the object registry. The
/// reference frame used for planning is derived from it by
/// [`Affordance::reference_frame`]: its Z axis is the rotation axis and its
/// XY plane is the turning plane.
///
/// # Example
///
/// ```
/// use manip_types::{Affordance, Frame, ObjectKind};
///
/// let valve = Affordance::valve(Frame::identity(), 0.2);
/// assert_eq!(valve.kind(), ObjectKind::Valve);
/// assert!((valve.scribe_radius() - 0.2).abs() < 1e-12);
///
/// let lever = Affordance::lever(Frame::identity(), 0.33);
/// assert!((lever.scribe_radius() - 0.23).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Affordance {
    kind: ObjectKind,
    child_frame: Frame,
    radius: f64,
    length: f64,
}

impl Affordance {
    /// Creates a valve model from its child frame and wheel radius.
    #[must_use]
    pub const fn valve(child_frame: Frame, radius: f64) -> Self {
        Self {
            kind: ObjectKind::Valve,
            child_frame,
            radius,
            length: 0.0,
        }
    }

    /// Creates a lever model from its child frame and length.
    #[must_use]
    pub const fn lever(child_frame: Frame, length: f64) -> Self {
        Self {
            kind: ObjectKind::Lever,
            child_frame,
            radius: 0.0,
            length,
        }
    }

    /// Spawns a nominal valve in front of a ground frame, its axis pointing
    /// away from the robot.
    #[must_use]
    pub fn spawn_valve(ground: &Frame) -> Self {
        Self::valve(
            spawn_frame(ground, NOMINAL_VALVE_HEIGHT, [0.0; 3]),
            NOMINAL_VALVE_RADIUS,
        )
    }

    /// Spawns a nominal lever in front of a ground frame, pointing up.
    #[must_use]
    pub fn spawn_lever(ground: &Frame) -> Self {
        Self::lever(
            spawn_frame(ground, NOMINAL_LEVER_HEIGHT, MODEL_TO_REFERENCE_RPY),
            NOMINAL_LEVER_LENGTH,
        )
    }

    /// Object kind.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Pose reported by the object registry.
    #[must_use]
    pub const fn child_frame(&self) -> Frame {
        self.child_frame
    }

    /// Wheel radius (valves) or zero.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Lever length (levers) or zero.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Planning frame: Z along the rotation axis, XY in the turning plane.
    ///
    /// A valve's model frame has its axis along X, so it is re-aligned by
    /// rolling 180° and pitching −90° in the model frame. A lever's model
    /// frame is used as is.
    #[must_use]
    pub fn reference_frame(&self) -> Frame {
        match self.kind {
            ObjectKind::Valve => self
                .child_frame
                .compose(&Frame::from_position_rpy([0.0; 3], MODEL_TO_REFERENCE_RPY)),
            ObjectKind::Lever => self.child_frame,
        }
    }

    /// Radius of the circle traced by the hand while turning.
    #[must_use]
    pub fn scribe_radius(&self) -> f64 {
        match self.kind {
            ObjectKind::Valve => self.radius,
            ObjectKind::Lever => self.length - LEVER_GRIP_INSET,
        }
    }
}

fn spawn_frame(ground: &Frame, height: f64, rpy_degrees: [f64; 3]) -> Frame {
    ground.compose(&Frame::from_position_rpy([0.7, 0.22, height], rpy_degrees))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_hand_parse() {
        assert_eq!("left".parse::<Hand>().unwrap(), Hand::Left);
        assert_eq!(" Right ".parse::<Hand>().unwrap(), Hand::Right);
        assert!(matches!(
            "both".parse::<Hand>(),
            Err(GeometryError::UnknownHand(s)) if s == "both"
        ));
    }

    #[test]
    fn test_object_kind_parse() {
        assert_eq!("VALVE".parse::<ObjectKind>().unwrap(), ObjectKind::Valve);
        assert_eq!("lever".parse::<ObjectKind>().unwrap(), ObjectKind::Lever);
        assert!("door".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn test_hand_joint_names() {
        assert_eq!(Hand::Left.wrist_roll_joint(), "l_arm_uwy");
        assert_eq!(Hand::Right.wrist_roll_joint(), "r_arm_uwy");
        assert_eq!(Hand::Right.forearm_link(), "r_larm");
        assert_eq!(Hand::Left.opposite(), Hand::Right);
    }

    #[test]
    fn test_valve_reference_axis() {
        // Identity model frame: the valve axis is the model X axis, which
        // becomes the reference Z axis (up to sign).
        let valve = Affordance::valve(Frame::identity(), 0.2);
        let (_, _, z) = valve.reference_frame().axes().unwrap();
        assert_relative_eq!(z.dot(&Vector3::x()).abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lever_reference_is_child() {
        let child = Frame::from_position_rpy([1.0, 0.0, 1.0], [0.0, 0.0, 30.0]);
        let lever = Affordance::lever(child, 0.33);
        assert_eq!(lever.reference_frame(), child);
    }

    #[test]
    fn test_spawned_axes_are_horizontal() {
        // Both spawned objects turn about an axis pointing away from the robot.
        for object in [
            Affordance::spawn_valve(&Frame::identity()),
            Affordance::spawn_lever(&Frame::identity()),
        ] {
            let (_, _, z) = object.reference_frame().axes().unwrap();
            assert_relative_eq!(z, Vector3::x(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spawn_valve_height() {
        let ground = Frame::from_translation(0.0, 0.0, 0.1);
        let valve = Affordance::spawn_valve(&ground);
        assert_relative_eq!(
            valve.child_frame().position().z,
            NOMINAL_VALVE_HEIGHT + 0.1,
            epsilon = 1e-12
        );
        assert_relative_eq!(valve.scribe_radius(), NOMINAL_VALVE_RADIUS);
    }
}
