//! Ordered record of the plans produced in a session.

use manip_types::JointPose;

use crate::adapter::PlanArtifact;

/// Plans in the order they were produced.
///
/// Only the most recent plan is executed or previewed; the full list is
/// replayed when a whole sequence is planned offline.
#[derive(Debug, Clone)]
pub struct PlanHistory<P> {
    plans: Vec<P>,
}

impl<P> Default for PlanHistory<P> {
    fn default() -> Self {
        Self { plans: Vec::new() }
    }
}

impl<P: PlanArtifact> PlanHistory<P> {
    /// Empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plan and returns a reference to it.
    pub fn push(&mut self, plan: P) -> &P {
        self.plans.push(plan);
        &self.plans[self.plans.len() - 1]
    }

    /// The most recent plan.
    #[must_use]
    pub fn last(&self) -> Option<&P> {
        self.plans.last()
    }

    /// Final pose of the most recent plan.
    #[must_use]
    pub fn last_end_pose(&self) -> Option<&JointPose> {
        self.last().map(PlanArtifact::end_pose)
    }

    /// All plans, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[P] {
        &self.plans
    }

    /// Number of plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Returns `true` if no plan was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Forgets every plan.
    pub fn clear(&mut self) {
        self.plans.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Stub(JointPose);

    impl PlanArtifact for Stub {
        fn end_pose(&self) -> &JointPose {
            &self.0
        }
    }

    #[test]
    fn test_last_end_pose_tracks_newest() {
        let mut history = PlanHistory::new();
        assert!(history.last_end_pose().is_none());

        history.push(Stub(JointPose::zeros(6)));
        history.push(Stub(JointPose::zeros(6).with_base_yaw(1.0)));

        assert_eq!(history.len(), 2);
        assert_eq!(history.last_end_pose().unwrap().base_xy_yaw().2, 1.0);

        history.clear();
        assert!(history.is_empty());
    }
}
