//! Whole-body joint configurations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Number of floating-base coordinates at the head of a [`JointPose`].
pub const BASE_DOF: usize = 6;

/// A whole-body configuration: six floating-base coordinates
/// (x, y, z, roll, pitch, yaw) followed by the actuated joints.
///
/// The joint ordering past the base is owned by the planner; this type only
/// interprets the base block.
///
/// # Example
///
/// ```
/// use manip_types::{JointPose, BASE_DOF};
///
/// let pose = JointPose::zeros(30).with_base_xy_yaw(1.0, -0.5, 0.3);
/// assert_eq!(pose.base_xy_yaw(), (1.0, -0.5, 0.3));
/// assert_eq!(JointPose::default().len(), BASE_DOF);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct JointPose {
    positions: Vec<f64>,
}

impl Default for JointPose {
    fn default() -> Self {
        Self::zeros(BASE_DOF)
    }
}

impl TryFrom<Vec<f64>> for JointPose {
    type Error = GeometryError;

    /// Unlike [`JointPose::new`], rejects vectors without a full base block.
    fn try_from(positions: Vec<f64>) -> Result<Self, Self::Error> {
        if positions.len() < BASE_DOF {
            return Err(GeometryError::invalid_config(format!(
                "joint pose has {} coordinates, expected at least {BASE_DOF}",
                positions.len()
            )));
        }
        Ok(Self { positions })
    }
}

impl From<JointPose> for Vec<f64> {
    fn from(pose: JointPose) -> Self {
        pose.positions
    }
}

impl JointPose {
    /// Creates a pose from raw positions. Shorter vectors are padded to
    /// include the base block.
    #[must_use]
    pub fn new(mut positions: Vec<f64>) -> Self {
        if positions.len() < BASE_DOF {
            positions.resize(BASE_DOF, 0.0);
        }
        Self { positions }
    }

    /// All-zero pose with `len` coordinates (at least the base block).
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0.0; len.max(BASE_DOF)])
    }

    /// Raw positions.
    #[must_use]
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Number of coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always `false`: a pose carries at least the base block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Base x, y and yaw.
    #[must_use]
    pub fn base_xy_yaw(&self) -> (f64, f64, f64) {
        (self.positions[0], self.positions[1], self.positions[5])
    }

    /// Replaces base x, y and yaw.
    #[must_use]
    pub fn with_base_xy_yaw(mut self, x: f64, y: f64, yaw: f64) -> Self {
        self.positions[0] = x;
        self.positions[1] = y;
        self.positions[5] = yaw;
        self
    }

    /// Replaces the base yaw only.
    #[must_use]
    pub fn with_base_yaw(mut self, yaw: f64) -> Self {
        self.positions[5] = yaw;
        self
    }

    /// Largest absolute coordinate difference to `other` over the shared
    /// prefix.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.positions
            .iter()
            .zip(&other.positions)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_is_padded() {
        let pose = JointPose::new(vec![1.0, 2.0]);
        assert_eq!(pose.len(), BASE_DOF);
        assert_eq!(pose.base_xy_yaw(), (1.0, 2.0, 0.0));
    }

    #[test]
    fn test_default_has_base_block() {
        let pose = JointPose::default();
        assert_eq!(pose.len(), BASE_DOF);
        assert_eq!(pose.base_xy_yaw(), (0.0, 0.0, 0.0));
        assert_eq!(pose.with_base_yaw(0.2).base_xy_yaw().2, 0.2);
    }

    #[test]
    fn test_try_from_rejects_short_vectors() {
        let err = JointPose::try_from(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidConfig(_)));

        let pose = JointPose::try_from(vec![0.5; BASE_DOF + 2]).unwrap();
        assert_eq!(pose.len(), BASE_DOF + 2);
        assert_eq!(Vec::from(pose), vec![0.5; BASE_DOF + 2]);
    }

    #[test]
    fn test_max_abs_diff() {
        let a = JointPose::zeros(8);
        let b = a.clone().with_base_yaw(-0.4);
        assert_eq!(a.max_abs_diff(&b), 0.4);
        assert!(!a.is_empty());
    }
}
