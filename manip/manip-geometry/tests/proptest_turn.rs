//! Property-based tests for turn assembly.
//!
//! These tests use proptest to generate random turn requests and verify the
//! sampling and indexing invariants.
//!
//! Run with: cargo test -p manip-geometry -- proptest

#![allow(clippy::unwrap_used)]

use manip_geometry::{GraspGeometry, TurnAssembler, TurnPhase};
use manip_types::{Affordance, Frame, GraspConfig, Hand, ObjectKind};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_hand() -> impl Strategy<Value = Hand> {
    prop_oneof![Just(Hand::Left), Just(Hand::Right)]
}

fn arb_object() -> impl Strategy<Value = ObjectKind> {
    prop_oneof![Just(ObjectKind::Valve), Just(ObjectKind::Lever)]
}

fn arb_phase() -> impl Strategy<Value = TurnPhase> {
    prop_oneof![
        Just(TurnPhase::PreTurn),
        Just(TurnPhase::Turn),
        Just(TurnPhase::Retract)
    ]
}

/// A turn that discretizes to at least one sample.
fn arb_turn() -> impl Strategy<Value = (f64, f64)> {
    (1.0..30.0f64, -720.0..720.0f64)
        .prop_filter("turn rounds to zero samples", |(step, turn)| {
            (turn.abs() / step).round() >= 1.0
        })
}

fn arb_ground() -> impl Strategy<Value = Frame> {
    (prop::array::uniform2(-5.0..5.0f64), -180.0..180.0f64)
        .prop_map(|([x, y], yaw)| Frame::from_position_rpy([x, y, 0.0], [0.0, 0.0, yaw]))
}

fn setup(hand: Hand, object: ObjectKind, ground: &Frame, step: f64) -> (GraspGeometry, GraspConfig) {
    let config = GraspConfig::new(hand, object).with_turn_step(step);
    let affordance = match object {
        ObjectKind::Valve => Affordance::spawn_valve(ground),
        ObjectKind::Lever => Affordance::spawn_lever(ground),
    };
    (GraspGeometry::new(affordance, &config), config)
}

// =============================================================================
// Property Tests: Sampling
// =============================================================================

proptest! {
    /// The sample count is round(|θ| / step).
    #[test]
    fn sample_count_matches_rounding(
        (step, turn) in arb_turn(),
        hand in arb_hand(),
        object in arb_object(),
    ) {
        let (geometry, config) = setup(hand, object, &Frame::identity(), step);
        let plan = TurnAssembler::default()
            .assemble(&geometry, &config, turn, TurnPhase::Turn)
            .unwrap();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected = (turn.abs() / step).round() as usize;
        prop_assert_eq!(plan.sample_count(), expected);
    }

    /// The final scribe angle is the start plus the full signed turn.
    #[test]
    fn total_turn_is_preserved(
        (step, turn) in arb_turn(),
        hand in arb_hand(),
    ) {
        let (geometry, config) = setup(hand, ObjectKind::Valve, &Frame::identity(), step);
        let plan = TurnAssembler::default()
            .assemble(&geometry, &config, turn, TurnPhase::Turn)
            .unwrap();

        let sweep = config.direction.sign() * turn;
        prop_assert_eq!(plan.final_scribe_angle_deg, config.scribe_angle_deg + sweep);

        let deltas = plan.step_deltas();
        let total: f64 = deltas.iter().sum();
        prop_assert!((total - sweep).abs() < 1e-9, "sum {} != {}", total, sweep);

        #[allow(clippy::cast_precision_loss)]
        let step_size = sweep / deltas.len() as f64;
        for delta in deltas {
            prop_assert!((delta - step_size).abs() < 1e-9);
        }
    }

    /// Waypoint indices run 0..=N without gaps.
    #[test]
    fn indices_are_contiguous(
        (step, turn) in arb_turn(),
        hand in arb_hand(),
        phase in arb_phase(),
    ) {
        let (geometry, config) = setup(hand, ObjectKind::Lever, &Frame::identity(), step);
        let plan = TurnAssembler::default()
            .assemble(&geometry, &config, turn, phase)
            .unwrap();

        let indices: Vec<usize> = plan.set.indices().collect();
        let expected: Vec<usize> = (0..=plan.sample_count()).collect();
        prop_assert_eq!(indices, expected);
        prop_assert_eq!(plan.touch_frames.len(), plan.sample_count() + 1);
    }

    /// Every touch frame of a touching turn stays at the scribe radius from
    /// the object axis.
    #[test]
    fn touch_frames_stay_near_object(
        (step, turn) in arb_turn(),
        hand in arb_hand(),
        ground in arb_ground(),
    ) {
        let (geometry, config) = setup(hand, ObjectKind::Valve, &ground, step);
        let plan = TurnAssembler::default()
            .assemble(&geometry, &config, turn, TurnPhase::Turn)
            .unwrap();

        let reach = geometry.scribe_radius() + config.touch_depth.abs();
        for touch in &plan.touch_frames {
            prop_assert!(touch.world.is_finite());
            let offset = touch.world.position() - geometry.reference_frame().position();
            prop_assert!(offset.norm() <= reach + 1e-9);
        }
    }
}

// =============================================================================
// Property Tests: Configuration
// =============================================================================

proptest! {
    /// Mirroring twice restores the configuration.
    #[test]
    fn mirroring_is_an_involution(
        hand in arb_hand(),
        object in arb_object(),
        scribe in -180.0..180.0f64,
        lock_base in any::<bool>(),
    ) {
        let mut config = GraspConfig::new(hand, object).with_lock_base(lock_base);
        config.scribe_angle_deg = scribe;
        prop_assert_eq!(config.mirrored().mirrored(), config);
    }

    /// Zero-sample turns are rejected for every step size.
    #[test]
    fn tiny_turns_are_degenerate(step in 1.0..30.0f64, fraction in 0.0..0.49f64) {
        let (geometry, config) = setup(Hand::Left, ObjectKind::Valve, &Frame::identity(), step);
        let err = TurnAssembler::default()
            .assemble(&geometry, &config, step * fraction, TurnPhase::Turn)
            .unwrap_err();
        prop_assert!(err.is_degenerate_turn());
    }
}
