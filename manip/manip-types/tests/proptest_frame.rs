//! Property-based tests for frame algebra.
//!
//! Run with: cargo test -p manip-types -- proptest

#![allow(clippy::unwrap_used)]

use manip_types::{axes, compose, Frame};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_frame() -> impl Strategy<Value = Frame> {
    (
        prop::array::uniform3(-10.0..10.0f64),
        prop::array::uniform3(-180.0..180.0f64),
    )
        .prop_map(|(position, rpy)| Frame::from_position_rpy(position, rpy))
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Composing with the identity on either side is a no-op.
    #[test]
    fn identity_composition_is_noop(f in arb_frame()) {
        let id = Frame::identity();
        prop_assert!(compose(&id, &f).approx_eq(&f, 1e-9));
        prop_assert!(compose(&f, &id).approx_eq(&f, 1e-9));
    }

    /// Extracted axes are orthonormal and right-handed.
    #[test]
    fn axes_are_orthonormal(f in arb_frame()) {
        let (x, y, z) = axes(&f).unwrap();
        prop_assert!((x.norm() - 1.0).abs() < 1e-12);
        prop_assert!((y.norm() - 1.0).abs() < 1e-12);
        prop_assert!((z.norm() - 1.0).abs() < 1e-12);
        prop_assert!(x.dot(&y).abs() < 1e-12);
        prop_assert!((x.cross(&y) - z).norm() < 1e-12);
    }

    /// Composition is associative.
    #[test]
    fn composition_is_associative(a in arb_frame(), b in arb_frame(), c in arb_frame()) {
        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));
        prop_assert!(left.approx_eq(&right, 1e-9));
    }

    /// A frame composed with its inverse is the identity.
    #[test]
    fn inverse_cancels(f in arb_frame()) {
        prop_assert!(f.inverse().compose(&f).approx_eq(&Frame::identity(), 1e-9));
    }
}
