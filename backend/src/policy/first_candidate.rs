//! Baseline edge policy: dispatch every pending request to the region's
//! first candidate point.
//!
//! This reproduces the reference heuristic: no distance reasoning, just the
//! first listed candidate for each queue entry, and `Hold` for every entry
//! when the region has no candidates at all. A learned policy replaces this
//! through the [`EdgePolicy`] trait.

use std::any::Any;

use crate::edge::{DispatchDecision, EdgeObservation};
use crate::policy::{EdgePolicy, EdgeTransition, PolicyError, PolicyMetrics};

/// Stateless first-candidate dispatch baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidatePolicy;

impl EdgePolicy for FirstCandidatePolicy {
    fn act(
        &mut self,
        observation: &EdgeObservation,
    ) -> Result<Vec<DispatchDecision>, PolicyError> {
        let decision = if observation.candidate_points.is_empty() {
            DispatchDecision::Hold
        } else {
            DispatchDecision::Dispatch { point_index: 0 }
        };
        Ok(vec![decision; observation.pending_requests])
    }

    fn update(&mut self, _batch: &[EdgeTransition]) -> Result<PolicyMetrics, PolicyError> {
        Ok(PolicyMetrics::from([("loss".to_string(), 0.0)]))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
