//! Grasp session configuration.
//!
//! [`GraspConfig`] is the single mutable configuration of a manipulation
//! session. It is passed by reference to every geometry and assembly call
//! and written only by the session that owns it.
//!
//! # Hand mirroring
//!
//! Defaults are authored for the left hand. For the right hand the stance
//! Y offset, stance yaw, initial scribe angle and turn direction are negated.
//! [`GraspConfig::reset_for_affordance`] always starts again from the
//! canonical left-handed values, so mirroring happens once per discovery and
//! never accumulates across replans.
//!
//! # Example
//!
//! ```
//! use manip_types::{GraspConfig, Hand, ObjectKind};
//!
//! let config = GraspConfig::new(Hand::Right, ObjectKind::Valve);
//! assert!((config.stance.xyz[1] + 0.27).abs() < 1e-12);
//! assert!((config.scribe_angle_deg - 60.0).abs() < 1e-12);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::affordance::{Hand, ObjectKind};
use crate::error::{GeometryError, Result};
use crate::frame::Frame;

/// Direction the object is turned, seen along its reference Z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TurnDirection {
    /// Scribe angle increases (`+1`).
    Clockwise,
    /// Scribe angle decreases (`-1`).
    CounterClockwise,
}

impl TurnDirection {
    /// Default direction for a hand: counter-clockwise for the left hand,
    /// clockwise for the right.
    #[must_use]
    pub const fn for_hand(hand: Hand) -> Self {
        match hand {
            Hand::Left => Self::CounterClockwise,
            Hand::Right => Self::Clockwise,
        }
    }

    /// `+1.0` or `-1.0`.
    #[must_use]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::Clockwise => 1.0,
            Self::CounterClockwise => -1.0,
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

impl Default for TurnDirection {
    fn default() -> Self {
        Self::for_hand(Hand::Left)
    }
}

/// Robot base placement relative to the grasp point, on the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StanceOffset {
    /// Translation in meters (x forward from the object plane, y lateral).
    pub xyz: [f64; 3],
    /// Roll, pitch, yaw in degrees. Only yaw is normally non-zero.
    pub rpy_degrees: [f64; 3],
}

impl StanceOffset {
    /// Creates a stance offset.
    #[must_use]
    pub const fn new(xyz: [f64; 3], rpy_degrees: [f64; 3]) -> Self {
        Self { xyz, rpy_degrees }
    }

    /// Mirror image across the object's vertical plane: Y and yaw negated.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let [x, y, z] = self.xyz;
        let [roll, pitch, yaw] = self.rpy_degrees;
        Self::new([x, -y, z], [roll, pitch, -yaw])
    }

    /// The offset as a frame.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        Frame::from_position_rpy(self.xyz, self.rpy_degrees)
    }
}

/// Fixed hand-closing pose relative to the object reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClenchOffset {
    /// Translation in meters.
    pub xyz: [f64; 3],
    /// Roll, pitch, yaw in degrees.
    pub rpy_degrees: [f64; 3],
}

impl Default for ClenchOffset {
    fn default() -> Self {
        Self {
            xyz: [0.0, 0.0, -0.1],
            rpy_degrees: [90.0, 0.0, 180.0],
        }
    }
}

impl ClenchOffset {
    /// The offset as a frame.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        Frame::from_position_rpy(self.xyz, self.rpy_degrees)
    }
}

/// Joint speed limits, in degrees per second.
///
/// Contact motions (touching and turning) use the slow limit; everything
/// else the fast one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedProfile {
    /// Limit for motions in contact with the object.
    pub slow_deg_per_sec: f64,
    /// Limit for free-space motions.
    pub fast_deg_per_sec: f64,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            slow_deg_per_sec: 5.0,
            fast_deg_per_sec: 30.0,
        }
    }
}

impl SpeedProfile {
    /// Uniform fast profile for simulated development.
    #[must_use]
    pub const fn development() -> Self {
        Self {
            slow_deg_per_sec: 60.0,
            fast_deg_per_sec: 60.0,
        }
    }
}

/// Standoff used when computing a touch frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Standoff {
    /// Palm held back from the object for the approach.
    Reaching,
    /// Palm in contact with the object.
    Touching,
}

/// Canonical left-handed values for one object kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StanceDefaults {
    /// Scribe angle where the first touch happens, in degrees.
    pub scribe_angle_deg: f64,
    /// Turn angle per cycle, in degrees.
    pub turn_angle_deg: f64,
    /// Stance offset.
    pub stance: StanceOffset,
}

impl StanceDefaults {
    /// Left-handed defaults for an object kind.
    ///
    /// Valves are approached 60° to the left of the spoke; levers straight
    /// into the axis, from further away when scribing in the air.
    #[must_use]
    pub fn for_object(kind: ObjectKind, scribe_in_air: bool) -> Self {
        match kind {
            ObjectKind::Valve => Self {
                scribe_angle_deg: -60.0,
                turn_angle_deg: 60.0,
                stance: StanceOffset::new([-1.05, 0.27, 0.0], [0.0, 0.0, 0.1]),
            },
            ObjectKind::Lever => {
                let x = if scribe_in_air { -0.6 } else { -0.48 };
                Self {
                    scribe_angle_deg: 0.0,
                    turn_angle_deg: 90.0,
                    stance: StanceOffset::new([x, -0.4, 0.0], [0.0, 0.0, 16.0]),
                }
            }
        }
    }
}

/// Mutable session configuration for grasping and turning.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraspConfig {
    /// Grasping hand.
    pub hand: Hand,
    /// Object being turned.
    pub object: ObjectKind,
    /// Current scribe angle in degrees.
    pub scribe_angle_deg: f64,
    /// Turn angle per cycle in degrees.
    pub turn_angle_deg: f64,
    /// Turn direction.
    pub direction: TurnDirection,
    /// Angular spacing of turn waypoints in degrees.
    pub turn_step_deg: f64,
    /// Stance offset relative to the grasp point.
    pub stance: StanceOffset,
    /// Hand-closing pose relative to the object.
    pub clench: ClenchOffset,
    /// Keep the feet and pelvis fixed while planning arm motions.
    pub lock_base: bool,
    /// Keep the back joints fixed while planning arm motions.
    pub lock_back: bool,
    /// Joint speed limits.
    pub speed: SpeedProfile,
    /// Palm offset along the face normal on approach, in meters.
    pub reach_depth: f64,
    /// Palm offset along the face normal when touching, in meters.
    pub touch_depth: f64,
    /// How far the palm tilts towards the rotation axis (0 none, 90 fully).
    pub palm_in_angle_deg: f64,
    /// Trace the turn with the palm off the object.
    pub scribe_in_air: bool,
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self::new(Hand::Left, ObjectKind::Valve)
    }
}

impl GraspConfig {
    /// Creates a configuration with the defaults for `hand` and `object`.
    #[must_use]
    pub fn new(hand: Hand, object: ObjectKind) -> Self {
        let mut config = Self {
            hand,
            object,
            scribe_angle_deg: 0.0,
            turn_angle_deg: 0.0,
            direction: TurnDirection::for_hand(hand),
            turn_step_deg: 10.0,
            stance: StanceOffset::new([0.0; 3], [0.0; 3]),
            clench: ClenchOffset::default(),
            lock_base: false,
            lock_back: false,
            speed: SpeedProfile::default(),
            reach_depth: -0.12,
            touch_depth: -0.06,
            palm_in_angle_deg: 30.0,
            scribe_in_air: false,
        };
        config.reset_for_affordance();
        config
    }

    /// Sets the grasping hand and re-derives the handed values.
    #[must_use]
    pub fn with_hand(mut self, hand: Hand) -> Self {
        self.hand = hand;
        self.reset_for_affordance();
        self
    }

    /// Sets the object kind and re-derives the handed values.
    #[must_use]
    pub fn with_object(mut self, object: ObjectKind) -> Self {
        self.object = object;
        self.reset_for_affordance();
        self
    }

    /// Sets whether the base is locked.
    #[must_use]
    pub const fn with_lock_base(mut self, lock: bool) -> Self {
        self.lock_base = lock;
        self
    }

    /// Sets whether the back is locked.
    #[must_use]
    pub const fn with_lock_back(mut self, lock: bool) -> Self {
        self.lock_back = lock;
        self
    }

    /// Sets the speed profile.
    #[must_use]
    pub const fn with_speed(mut self, speed: SpeedProfile) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the angular spacing of turn waypoints.
    #[must_use]
    pub const fn with_turn_step(mut self, step_deg: f64) -> Self {
        self.turn_step_deg = step_deg;
        self
    }

    /// Sets the reach standoff depth.
    #[must_use]
    pub const fn with_reach_depth(mut self, depth: f64) -> Self {
        self.reach_depth = depth;
        self
    }

    /// Sets whether the turn is traced in the air.
    #[must_use]
    pub fn with_scribe_in_air(mut self, in_air: bool) -> Self {
        self.scribe_in_air = in_air;
        self.reset_for_affordance();
        self
    }

    /// Re-derives scribe angle, turn angle, stance and direction from the
    /// canonical left-handed defaults, mirroring once for the right hand.
    ///
    /// Call when an affordance is (re)discovered. Repeated calls give the
    /// same result.
    pub fn reset_for_affordance(&mut self) {
        let defaults = StanceDefaults::for_object(self.object, self.scribe_in_air);
        let hand = self.hand;

        self.hand = Hand::Left;
        self.direction = TurnDirection::for_hand(Hand::Left);
        self.scribe_angle_deg = defaults.scribe_angle_deg;
        self.turn_angle_deg = defaults.turn_angle_deg;
        self.stance = defaults.stance;

        if hand.is_right() {
            *self = self.mirrored();
        }
    }

    /// The hand mirror image of this configuration.
    ///
    /// Swaps the hand and turn direction and negates the stance Y offset,
    /// stance yaw and scribe angle. Applying it twice yields the original.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            hand: self.hand.opposite(),
            direction: self.direction.reversed(),
            scribe_angle_deg: -self.scribe_angle_deg,
            stance: self.stance.mirrored(),
            ..self.clone()
        }
    }

    /// Palm standoff depth for the given mode.
    #[must_use]
    pub const fn depth(&self, standoff: Standoff) -> f64 {
        match standoff {
            Standoff::Reaching => self.reach_depth,
            Standoff::Touching => self.touch_depth,
        }
    }

    /// Standoff used for turning: touching unless scribing in the air.
    #[must_use]
    pub const fn turn_standoff(&self) -> Standoff {
        if self.scribe_in_air {
            Standoff::Reaching
        } else {
            Standoff::Touching
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.turn_step_deg.is_finite() && self.turn_step_deg > 0.0) {
            return Err(GeometryError::invalid_config(format!(
                "turn step must be positive, got {}",
                self.turn_step_deg
            )));
        }
        if !(self.speed.slow_deg_per_sec > 0.0 && self.speed.fast_deg_per_sec > 0.0) {
            return Err(GeometryError::invalid_config("speed limits must be positive"));
        }
        let finite = [
            self.scribe_angle_deg,
            self.turn_angle_deg,
            self.reach_depth,
            self.touch_depth,
            self.palm_in_angle_deg,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::invalid_config("non-finite angle or depth"));
        }
        Ok(())
    }
}
