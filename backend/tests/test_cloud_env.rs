//! Integration and property tests for the cloud allocation environment.

use dispatch_simulator_core_rs::cloud::{AllocationAction, CloudConfig, CloudEnv};
use dispatch_simulator_core_rs::models::RegionSummary;
use proptest::prelude::*;

fn summary(region_id: &str, success_rate: f64, average_wait: f64) -> RegionSummary {
    RegionSummary::new(region_id.to_string(), success_rate, average_wait, 0.0, 1, 0)
}

#[test]
fn test_regions_absent_from_action_untouched() {
    let ids = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let mut env = CloudEnv::new(CloudConfig::default(), &ids);

    env.step(&AllocationAction::from([("B".to_string(), 2)]), &[]);

    assert_eq!(env.allocation("A"), 1);
    assert_eq!(env.allocation("B"), 3);
    assert_eq!(env.allocation("C"), 1);
}

#[test]
fn test_step_combines_transfer_cost_and_summary_score() {
    let ids = vec!["A".to_string(), "B".to_string()];
    let mut env = CloudEnv::new(CloudConfig::default(), &ids);

    let action = AllocationAction::from([("A".to_string(), 1), ("B".to_string(), -1)]);
    let summaries = vec![summary("A", 0.0, 8.0), summary("B", 0.0, 2.0)];

    let outcome = env.step(&action, &summaries);

    // transfer cost 0.2, wait penalties 0.4 and 0.1
    assert!((outcome.reward + 0.7).abs() < 1e-12);
    assert_eq!(outcome.info.len(), 2);
    assert_eq!(outcome.observation.summaries, summaries);
    assert!(!outcome.done);
}

#[test]
fn test_greedy_action_reference_scenario() {
    // waits {A: 10, B: 1, C: 5} move one unit from B to A
    let ids = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let env = CloudEnv::new(CloudConfig::default(), &ids);
    let summaries = vec![
        summary("A", 0.0, 10.0),
        summary("B", 0.0, 1.0),
        summary("C", 0.0, 5.0),
    ];

    let action = env.greedy_action(&summaries);

    assert_eq!(
        action,
        AllocationAction::from([("A".to_string(), 1), ("B".to_string(), -1)])
    );
}

proptest! {
    #[test]
    fn prop_allocations_never_negative(deltas in prop::collection::vec(-10i64..10, 0..50)) {
        let ids = vec!["A".to_string()];
        let mut env = CloudEnv::new(CloudConfig::default(), &ids);

        for delta in deltas {
            env.step(&AllocationAction::from([("A".to_string(), delta)]), &[]);
            prop_assert!(env.allocation("A") >= 0);
        }
    }

    #[test]
    fn prop_transfer_cost_scales_with_delta(delta in -20i64..20) {
        let ids = vec!["A".to_string()];
        let mut env = CloudEnv::new(CloudConfig::default(), &ids);

        let outcome = env.step(&AllocationAction::from([("A".to_string(), delta)]), &[]);

        prop_assert!((outcome.reward + delta.abs() as f64 * 0.1).abs() < 1e-9);
    }
}
