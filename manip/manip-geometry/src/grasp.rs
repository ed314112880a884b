//! Clench and stance frames for a discovered affordance.

use manip_types::{Affordance, Frame, GeometryError, GraspConfig, Result, StanceOffset};
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Frames derived once per affordance discovery.
///
/// Holds the object reference frame, the clench frame and the scribe radius.
/// A new value must be built whenever the affordance is rediscovered or the
/// clench offset changes; nothing here is updated in place.
///
/// # Example
///
/// ```
/// use manip_geometry::GraspGeometry;
/// use manip_types::{Affordance, Frame, GraspConfig};
///
/// let config = GraspConfig::default();
/// let valve = Affordance::spawn_valve(&Frame::identity());
/// let geometry = GraspGeometry::new(valve, &config);
///
/// assert!((geometry.scribe_radius() - valve.radius()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspGeometry {
    affordance: Affordance,
    reference: Frame,
    clench: Frame,
    scribe_radius: f64,
}

impl GraspGeometry {
    /// Derives the frames for `affordance`.
    #[must_use]
    pub fn new(affordance: Affordance, config: &GraspConfig) -> Self {
        let reference = affordance.reference_frame();
        let clench = reference.compose(&config.clench.to_frame());
        let scribe_radius = affordance.scribe_radius();
        debug!(
            kind = %affordance.kind(),
            scribe_radius,
            "Derived clench frame"
        );
        Self {
            affordance,
            reference,
            clench,
            scribe_radius,
        }
    }

    /// Derives the frames from a registry lookup.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AffordanceNotFound`] if `affordance` is `None`.
    pub fn resolve(affordance: Option<Affordance>, config: &GraspConfig) -> Result<Self> {
        affordance
            .map(|a| Self::new(a, config))
            .ok_or(GeometryError::AffordanceNotFound(config.object))
    }

    /// The affordance the frames were derived from.
    #[must_use]
    pub const fn affordance(&self) -> &Affordance {
        &self.affordance
    }

    /// Planning frame of the object.
    #[must_use]
    pub const fn reference_frame(&self) -> Frame {
        self.reference
    }

    /// Where the hand closes around the object.
    #[must_use]
    pub const fn clench_frame(&self) -> Frame {
        self.clench
    }

    /// Radius of the circle traced while turning.
    #[must_use]
    pub const fn scribe_radius(&self) -> f64 {
        self.scribe_radius
    }

    /// Robot base placement for approaching the object.
    ///
    /// A level frame is built at the clench point's XY and the ground height,
    /// facing along the clench Y axis projected onto the floor. The stance
    /// offset is then composed onto it.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateAxis`] if the clench Y axis is
    /// vertical.
    pub fn stance_frame(&self, ground: &Frame, offset: &StanceOffset) -> Result<Frame> {
        let heading = self.clench.transform_vector(&Vector3::y());
        let grasp = self.clench.position();
        let grasp_ground =
            Frame::level(heading, Point3::new(grasp.x, grasp.y, ground.position().z))?;
        let stance = grasp_ground.compose(&offset.to_frame());
        debug!(
            x = stance.position().x,
            y = stance.position().y,
            yaw_deg = stance.yaw().to_degrees(),
            "Computed stance frame"
        );
        Ok(stance)
    }
}
