//! Grasp geometry and turn constraint assembly for rotary objects.
//!
//! Given a discovered [`Affordance`](manip_types::Affordance) and a
//! [`GraspConfig`](manip_types::GraspConfig), this crate derives:
//!
//! - the ground frame between the feet ([`ground_frame`])
//! - the clench and stance frames ([`GraspGeometry`])
//! - touch frames on the scribe circle ([`TouchFrame`], [`reach_goal`])
//! - time-indexed turn requests ([`TurnAssembler`])
//! - coaxial single-pose requests ([`coaxial_pose_set`])
//!
//! Everything here is a pure function of its inputs. Errors are raised
//! before any request reaches a solver.
//!
//! # Example
//!
//! ```
//! use manip_geometry::{ground_frame, FootContacts, GraspGeometry, TurnAssembler, TurnPhase};
//! use manip_types::{Affordance, GraspConfig, Hand, ObjectKind};
//!
//! let contacts = FootContacts::standing(0.0, 0.0, 0.0, 0.26, 0.0);
//! let ground = ground_frame(&contacts).unwrap();
//!
//! let config = GraspConfig::new(Hand::Right, ObjectKind::Valve);
//! let geometry = GraspGeometry::new(Affordance::spawn_valve(&ground), &config);
//! let stance = geometry.stance_frame(&ground, &config.stance).unwrap();
//!
//! let plan = TurnAssembler::default()
//!     .assemble(&geometry, &config, config.turn_angle_deg, TurnPhase::Turn)
//!     .unwrap();
//! assert_eq!(plan.sample_count(), 6);
//! assert!(stance.position().x < geometry.clench_frame().position().x);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod coaxial;
pub mod grasp;
pub mod ground;
pub mod touch;
pub mod turn;

pub use coaxial::{
    coaxial_pose_set, distance_from_axis, CoaxialPhase, CoaxialRequest, COAXIAL_GAZE_CONE_DEGREES,
    COAXIAL_KNEE,
};
pub use grasp::GraspGeometry;
pub use ground::{ground_frame, FootContacts, FOOT_HEIGHT};
pub use touch::{reach_goal, touch_offset, TouchFrame};
pub use turn::{
    wrist_roll_lock, AssemblerConfig, TurnAssembler, TurnPhase, TurnPlan, WRIST_LIMIT_MARGIN,
};
