//! Rigid frames and the composition rules used by every planning stage.
//!
//! A [`Frame`] is an immutable 6-DOF pose. Two composition orders appear
//! throughout the planners and each call site names the one it uses:
//!
//! - [`Frame::compose`] (right-multiplication): `parent * local`, the local
//!   frame expressed relative to `self`.
//! - [`Frame::transformed_by`] (left-multiplication): `world * self`, `self`
//!   moved by a transform expressed in the world.
//!
//! # Axis convention
//!
//! Z is up. Frames built from a heading hint ([`Frame::level`]) keep their Z
//! axis vertical and derive the forward axis by cross product rather than
//! reusing the hint directly.

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};

/// Norm below which an axis is considered degenerate.
const AXIS_EPSILON: f64 = 1e-10;

/// A rigid 6-DOF pose: position plus orientation.
///
/// # Example
///
/// ```
/// use manip_types::Frame;
///
/// let parent = Frame::from_position_rpy([1.0, 0.0, 0.0], [0.0, 0.0, 90.0]);
/// let local = Frame::from_position_rpy([1.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
///
/// // The local x offset is rotated by the parent's yaw.
/// let world = parent.compose(&local);
/// assert!((world.position().y - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    position: Point3<f64>,
    rotation: UnitQuaternion<f64>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    /// The identity frame (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Creates a frame from a position and rotation.
    #[must_use]
    pub const fn new(position: Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Creates a pure translation.
    #[must_use]
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Creates a frame from a position and roll/pitch/yaw angles in degrees.
    ///
    /// The rotation applies roll about X, then pitch about Y, then yaw about
    /// Z, all about the fixed axes (`Rz * Ry * Rx`).
    #[must_use]
    pub fn from_position_rpy(position: [f64; 3], rpy_degrees: [f64; 3]) -> Self {
        let [roll, pitch, yaw] = rpy_degrees;
        Self::new(
            Point3::from(position),
            UnitQuaternion::from_euler_angles(
                roll.to_radians(),
                pitch.to_radians(),
                yaw.to_radians(),
            ),
        )
    }

    /// Creates a frame from an isometry.
    #[must_use]
    pub fn from_isometry(iso: Isometry3<f64>) -> Self {
        Self::new(Point3::from(iso.translation.vector), iso.rotation)
    }

    /// Creates a frame from three axis directions and an origin.
    ///
    /// The axes are re-orthonormalized (see [`orthonormal_axes`]) so slightly
    /// skewed input still yields a proper rotation.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateAxis`] if the axes are zero or
    /// collinear.
    pub fn from_axes(
        x: Vector3<f64>,
        y: Vector3<f64>,
        z: Vector3<f64>,
        position: Point3<f64>,
    ) -> Result<Self> {
        let (x, y, z) = orthonormal_axes(x, y, z)?;
        let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
        Ok(Self::new(position, UnitQuaternion::from_rotation_matrix(&rotation)))
    }

    /// Creates a level frame: Z straight up, X along `heading` projected onto
    /// the horizontal plane.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateAxis`] if `heading` is vertical.
    pub fn level(heading: Vector3<f64>, position: Point3<f64>) -> Result<Self> {
        let z = Vector3::z();
        let y = z.cross(&heading);
        let norm = y.norm();
        if norm < AXIS_EPSILON {
            return Err(GeometryError::DegenerateAxis);
        }
        let y = y / norm;
        let x = y.cross(&z);
        Self::from_axes(x, y, z, position)
    }

    /// Position of the frame origin.
    #[must_use]
    pub const fn position(&self) -> Point3<f64> {
        self.position
    }

    /// Orientation of the frame.
    #[must_use]
    pub const fn rotation(&self) -> UnitQuaternion<f64> {
        self.rotation
    }

    /// Converts to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.rotation)
    }

    /// Right-multiplication: `self * local`.
    ///
    /// Use when `local` is expressed relative to this frame.
    #[must_use]
    pub fn compose(&self, local: &Self) -> Self {
        Self {
            position: self.transform_point(&local.position),
            rotation: self.rotation * local.rotation,
        }
    }

    /// Left-multiplication: `world * self`.
    ///
    /// Use when `world` is a transform expressed in the world frame.
    #[must_use]
    pub fn transformed_by(&self, world: &Self) -> Self {
        world.compose(self)
    }

    /// Inverse frame.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Maps a local point to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Maps a local direction to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Orthonormal unit axes `(x, y, z)` of this frame in world coordinates.
    ///
    /// # Errors
    ///
    /// Only fails if the stored rotation is not finite.
    pub fn axes(&self) -> Result<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
        let m = self.rotation.to_rotation_matrix();
        let m = m.matrix();
        orthonormal_axes(
            m.column(0).into_owned(),
            m.column(1).into_owned(),
            m.column(2).into_owned(),
        )
    }

    /// Roll, pitch and yaw in degrees.
    #[must_use]
    pub fn rpy_degrees(&self) -> [f64; 3] {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        [roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()]
    }

    /// Heading of the X axis about world Z, in radians.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        let x = self.transform_vector(&Vector3::x());
        x.y.atan2(x.x)
    }

    /// Returns `true` when both position and orientation agree within `tol`
    /// (meters and radians respectively).
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (self.position - other.position).norm() <= tol && self.angle_to(other) <= tol
    }

    /// Rotation angle between the two orientations, in radians.
    ///
    /// Computed from the sine of the half angle, which stays well conditioned
    /// for nearly identical rotations.
    #[must_use]
    pub fn angle_to(&self, other: &Self) -> f64 {
        let delta = self.rotation.inverse() * other.rotation;
        2.0 * delta.imag().norm().min(1.0).asin()
    }

    /// Returns `true` if no component is `NaN` or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|v| v.is_finite())
            && self.rotation.coords.iter().all(|v| v.is_finite())
    }
}

/// `parent * local`. See [`Frame::compose`].
#[must_use]
pub fn compose(parent: &Frame, local: &Frame) -> Frame {
    parent.compose(local)
}

/// Orthonormal axes of `frame`. See [`Frame::axes`].
///
/// # Errors
///
/// See [`Frame::axes`].
pub fn axes(frame: &Frame) -> Result<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
    frame.axes()
}

/// Gram-Schmidt with Z as the anchor axis.
///
/// Z is normalized as given, Y has its Z component removed, and X is
/// rebuilt as `y × z`; the incoming X only matters through Y.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateAxis`] if Z is zero or Y is parallel
/// to Z.
pub fn orthonormal_axes(
    _x: Vector3<f64>,
    y: Vector3<f64>,
    z: Vector3<f64>,
) -> Result<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
    let z_norm = z.norm();
    if !z_norm.is_finite() || z_norm < AXIS_EPSILON {
        return Err(GeometryError::DegenerateAxis);
    }
    let z = z / z_norm;

    let y = y - z * z.dot(&y);
    let y_norm = y.norm();
    if !y_norm.is_finite() || y_norm < AXIS_EPSILON {
        return Err(GeometryError::DegenerateAxis);
    }
    let y = y / y_norm;

    Ok((y.cross(&z), y, z))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_composition() {
        let f = Frame::from_position_rpy([0.3, -1.2, 0.8], [12.0, -40.0, 170.0]);
        let id = Frame::identity();

        assert!(compose(&id, &f).approx_eq(&f, 1e-9));
        assert!(compose(&f, &id).approx_eq(&f, 1e-9));
    }

    #[test]
    fn test_rpy_order_is_fixed_axis_xyz() {
        // Roll 90 then yaw 90, against the explicit product Rz * Rx.
        let f = Frame::from_position_rpy([0.0; 3], [90.0, 0.0, 90.0]);
        let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert!(f.approx_eq(&Frame::new(Point3::origin(), rz * rx), 1e-12));
    }

    #[test]
    fn test_compose_vs_transformed_by() {
        let a = Frame::from_position_rpy([1.0, 2.0, 3.0], [0.0, 0.0, 45.0]);
        let b = Frame::from_position_rpy([0.5, 0.0, 0.0], [30.0, 0.0, 0.0]);

        assert!(a.compose(&b).approx_eq(&b.transformed_by(&a), 1e-12));
        assert!(!a.compose(&b).approx_eq(&b.compose(&a), 1e-6));
    }

    #[test]
    fn test_inverse_round_trip() {
        let f = Frame::from_position_rpy([0.4, 0.1, -2.0], [5.0, 60.0, -20.0]);
        assert!(f.compose(&f.inverse()).approx_eq(&Frame::identity(), 1e-12));
    }

    #[test]
    fn test_axes_are_orthonormal() {
        let f = Frame::from_position_rpy([0.0; 3], [33.0, -71.0, 128.0]);
        let (x, y, z) = f.axes().unwrap();

        assert_relative_eq!(x.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(y.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(z.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(x.dot(&y), 0.0, epsilon = 1e-12);
        assert_relative_eq!(y.dot(&z), 0.0, epsilon = 1e-12);
        assert_relative_eq!(x.cross(&y), z, epsilon = 1e-12);
    }

    #[test]
    fn test_orthonormal_axes_repairs_skew() {
        let (x, y, z) = orthonormal_axes(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.05, 1.0, 0.02),
            Vector3::new(0.0, 0.0, 2.0),
        )
        .unwrap();

        assert_relative_eq!(z, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(y.dot(&z), 0.0, epsilon = 1e-12);
        assert_relative_eq!(x, y.cross(&z), epsilon = 1e-12);
    }

    #[test]
    fn test_orthonormal_axes_rejects_parallel() {
        let result = orthonormal_axes(Vector3::x(), Vector3::z(), Vector3::z());
        assert!(matches!(result, Err(GeometryError::DegenerateAxis)));
    }

    #[test]
    fn test_level_frame_keeps_z_up() {
        let f = Frame::level(Vector3::new(1.0, 1.0, 0.7), Point3::new(1.0, 2.0, 0.0)).unwrap();
        let (x, _, z) = f.axes().unwrap();

        assert_relative_eq!(z, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(x.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(f.yaw(), std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
    }

    #[test]
    fn test_level_frame_rejects_vertical_heading() {
        assert!(Frame::level(Vector3::z(), Point3::origin()).is_err());
    }

    #[test]
    fn test_rpy_degrees_round_trip() {
        let f = Frame::from_position_rpy([0.0; 3], [10.0, 20.0, 30.0]);
        let [r, p, y] = f.rpy_degrees();
        assert_relative_eq!(r, 10.0, epsilon = 1e-9);
        assert_relative_eq!(p, 20.0, epsilon = 1e-9);
        assert_relative_eq!(y, 30.0, epsilon = 1e-9);
    }
}
