//! Integration and property tests for the edge environment's queue dynamics.

use dispatch_simulator_core_rs::edge::{DispatchDecision, EdgeConfig, EdgeEnv};
use dispatch_simulator_core_rs::geo::GeoPoint;
use dispatch_simulator_core_rs::models::ChargeRequest;
use proptest::prelude::*;

fn request_at(lon: f64, lat: f64) -> ChargeRequest {
    ChargeRequest::new(
        "veh".to_string(),
        GeoPoint::new(lon, lat),
        Some("R1".to_string()),
        "t0".to_string(),
        0.1,
    )
}

#[test]
fn test_partial_decision_list_holds_unmatched_entries() {
    let point = GeoPoint::new(0.0, 0.0);
    let mut env = EdgeEnv::new("R1", EdgeConfig::default(), vec![point]).unwrap();
    env.add_request(request_at(0.0, 0.0));
    env.add_request(request_at(0.0, 0.0));
    env.add_request(request_at(0.0, 0.0));

    // only the first entry gets a decision; the rest keep waiting
    let outcome = env.step(&[DispatchDecision::Dispatch { point_index: 0 }]);

    assert!((outcome.reward - 0.99).abs() < 1e-12);
    assert_eq!(env.queue().len(), 2);
    assert!(env.queue().iter().all(|e| e.wait_time() == 1));
}

#[test]
fn test_surplus_decisions_ignored() {
    let point = GeoPoint::new(0.0, 0.0);
    let mut env = EdgeEnv::new("R1", EdgeConfig::default(), vec![point]).unwrap();
    env.add_request(request_at(0.0, 0.0));

    let decisions = vec![DispatchDecision::Dispatch { point_index: 0 }; 5];
    let outcome = env.step(&decisions);

    // one entry, one reward; the four surplus decisions do nothing
    assert!((outcome.reward - 0.99).abs() < 1e-12);
    assert!(env.queue().is_empty());
}

#[test]
fn test_second_entry_served_while_first_waits() {
    let point = GeoPoint::new(0.0, 0.0);
    let mut env = EdgeEnv::new("R1", EdgeConfig::default(), vec![point]).unwrap();
    env.add_request(request_at(0.0, 0.0));
    env.add_request(request_at(0.0, 0.0));

    let outcome = env.step(&[
        DispatchDecision::Hold,
        DispatchDecision::Dispatch { point_index: 0 },
    ]);

    assert!((outcome.reward - 0.99).abs() < 1e-12);
    assert_eq!(env.queue().len(), 1);
    assert_eq!(env.queue()[0].wait_time(), 1);
}

#[test]
fn test_queue_drains_over_repeated_steps() {
    let point = GeoPoint::new(0.0, 0.0);
    let mut env = EdgeEnv::new("R1", EdgeConfig::default(), vec![point]).unwrap();
    for _ in 0..4 {
        env.add_request(request_at(0.0, 0.0));
    }

    // serve the head of the queue each step
    for expected_len in [3, 2, 1, 0] {
        env.step(&[DispatchDecision::Dispatch { point_index: 0 }]);
        assert_eq!(env.queue().len(), expected_len);
    }
}

proptest! {
    #[test]
    fn prop_queue_never_exceeds_bound(burst in 0usize..200, max_queue_size in 1usize..60) {
        let config = EdgeConfig {
            max_queue_size,
            ..EdgeConfig::default()
        };
        let mut env = EdgeEnv::new("R1", config, vec![]).unwrap();

        for _ in 0..burst {
            env.add_request(request_at(0.0, 0.0));
        }

        prop_assert!(env.queue().len() <= max_queue_size);
        // dropped arrivals never inflate the counter
        prop_assert_eq!(env.arrivals_in_window(), burst.min(max_queue_size));
    }

    #[test]
    fn prop_wait_times_age_uniformly_without_assignments(
        entries in 1usize..20,
        steps in 1usize..30,
    ) {
        let mut env = EdgeEnv::new("R1", EdgeConfig::default(), vec![]).unwrap();
        for _ in 0..entries {
            env.add_request(request_at(0.0, 0.0));
        }

        for _ in 0..steps {
            env.step(&[]);
        }

        prop_assert_eq!(env.queue().len(), entries);
        prop_assert!(env.queue().iter().all(|e| e.wait_time() == steps));
    }
}
