//! Ground frame from foot contacts.

use manip_types::{Frame, Result};
use nalgebra::{Point3, Vector3};

/// Height of the foot frame origin above the sole, in meters.
pub const FOOT_HEIGHT: f64 = 0.0811;

/// Link frames sampled from the estimated robot state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootContacts {
    /// Left foot link frame.
    pub left_foot: Frame,
    /// Right foot link frame.
    pub right_foot: Frame,
    /// Pelvis link frame.
    pub pelvis: Frame,
}

impl FootContacts {
    /// Contacts of a robot standing at `(x, y)` with heading `yaw` (radians),
    /// feet `stance_width` apart on flat ground at `ground_z`.
    #[must_use]
    pub fn standing(x: f64, y: f64, yaw: f64, stance_width: f64, ground_z: f64) -> Self {
        let base = Frame::from_position_rpy([x, y, ground_z], [0.0, 0.0, yaw.to_degrees()]);
        let half = stance_width / 2.0;
        Self {
            left_foot: base.compose(&Frame::from_translation(0.0, half, FOOT_HEIGHT)),
            right_foot: base.compose(&Frame::from_translation(0.0, -half, FOOT_HEIGHT)),
            pelvis: base.compose(&Frame::from_translation(0.0, 0.0, 0.85)),
        }
    }
}

/// Level frame between the feet on the support surface.
///
/// The origin is the foot midpoint lowered by [`FOOT_HEIGHT`]; Z is up and X
/// follows the pelvis heading.
///
/// # Errors
///
/// Returns [`manip_types::GeometryError::DegenerateAxis`] if the pelvis X axis
/// points straight up or down.
pub fn ground_frame(contacts: &FootContacts) -> Result<Frame> {
    let heading = contacts.pelvis.transform_vector(&Vector3::x());
    let mid = nalgebra::center(&contacts.left_foot.position(), &contacts.right_foot.position());
    Frame::level(heading, Point3::new(mid.x, mid.y, mid.z - FOOT_HEIGHT))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ground_frame_on_flat_floor() {
        let contacts = FootContacts::standing(1.0, -2.0, 0.5, 0.26, 0.0);
        let ground = ground_frame(&contacts).unwrap();

        assert_relative_eq!(ground.position().z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ground.position().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ground.yaw(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_ground_frame_ignores_pelvis_pitch() {
        let mut contacts = FootContacts::standing(0.0, 0.0, 0.0, 0.26, 0.2);
        contacts.pelvis = Frame::from_position_rpy([0.0, 0.0, 1.0], [0.0, 20.0, 0.0]);
        let ground = ground_frame(&contacts).unwrap();
        let (_, _, z) = ground.axes().unwrap();

        assert_relative_eq!(z, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(ground.position().z, 0.2, epsilon = 1e-12);
    }
}
