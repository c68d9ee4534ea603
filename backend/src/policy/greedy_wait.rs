//! Baseline cloud policy: greedy-by-wait reallocation.
//!
//! Mirrors [`CloudEnv::greedy_action`]: one unit flows from the lowest-wait
//! region to the highest-wait region each allocation window.
//!
//! [`CloudEnv::greedy_action`]: crate::cloud::CloudEnv::greedy_action

use std::any::Any;

use crate::cloud::{greedy_rebalance, AllocationAction, CloudConfig, CloudObservation};
use crate::policy::{CloudPolicy, CloudTransition, PolicyError, PolicyMetrics};

/// Stateless greedy reallocation baseline.
#[derive(Debug, Clone)]
pub struct GreedyWaitPolicy {
    config: CloudConfig,
}

impl GreedyWaitPolicy {
    /// Create a policy bound to the cloud configuration.
    pub fn new(config: CloudConfig) -> Self {
        Self { config }
    }
}

impl CloudPolicy for GreedyWaitPolicy {
    fn act(&mut self, observation: &CloudObservation) -> Result<AllocationAction, PolicyError> {
        Ok(greedy_rebalance(
            &observation.summaries,
            self.config.max_transfer_per_interval,
        ))
    }

    fn update(&mut self, _batch: &[CloudTransition]) -> Result<PolicyMetrics, PolicyError> {
        Ok(PolicyMetrics::from([("loss".to_string(), 0.0)]))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionSummary;

    fn summary(region_id: &str, average_wait: f64) -> RegionSummary {
        RegionSummary::new(region_id.to_string(), 0.0, average_wait, 0.0, 1, 0)
    }

    #[test]
    fn test_act_matches_environment_greedy_action() {
        let mut policy = GreedyWaitPolicy::new(CloudConfig::default());
        let obs = CloudObservation {
            summaries: vec![summary("A", 10.0), summary("B", 1.0), summary("C", 5.0)],
        };

        let action = policy.act(&obs).unwrap();

        assert_eq!(action.get("A"), Some(&1));
        assert_eq!(action.get("B"), Some(&-1));
        assert_eq!(action.get("C"), None);
    }

    #[test]
    fn test_act_on_empty_observation() {
        let mut policy = GreedyWaitPolicy::new(CloudConfig::default());
        let obs = CloudObservation { summaries: vec![] };
        assert!(policy.act(&obs).unwrap().is_empty());
    }

    #[test]
    fn test_update_reports_zero_loss() {
        let mut policy = GreedyWaitPolicy::new(CloudConfig::default());
        let metrics = policy.update(&[]).unwrap();
        assert_eq!(metrics.get("loss"), Some(&0.0));
    }
}
