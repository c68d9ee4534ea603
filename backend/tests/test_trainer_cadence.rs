//! Integration tests for the trainer's multi-cadence round loop.

use dispatch_simulator_core_rs::edge::{DispatchDecision, EdgeConfig, EdgeEnv, EdgeObservation};
use dispatch_simulator_core_rs::models::{EventLog, EventSink};
use dispatch_simulator_core_rs::orchestrator::{
    SimulationConfig, SimulationError, Trainer, TrainingSchedule,
};
use dispatch_simulator_core_rs::policy::{
    EdgePolicy, EdgeTransition, FirstCandidatePolicy, GreedyWaitPolicy, PolicyError, PolicyMetrics,
};

/// Helper to build a trainer with the given cadences and one empty region.
fn trainer_with(
    allocation_interval: usize,
    schedule: TrainingSchedule,
    region_ids: &[&str],
) -> Trainer {
    let mut config = SimulationConfig::default();
    config.cloud.allocation_interval = allocation_interval;

    let cloud_policy = Box::new(GreedyWaitPolicy::new(config.cloud.clone()));
    let mut trainer =
        Trainer::new(config, schedule, cloud_policy, Box::new(EventLog::new())).unwrap();

    for region_id in region_ids {
        let env = EdgeEnv::new(*region_id, EdgeConfig::default(), vec![]).unwrap();
        trainer
            .register_region(env, Box::new(FirstCandidatePolicy))
            .unwrap();
    }
    trainer
}

fn event_log(trainer: &Trainer) -> &EventLog {
    trainer
        .sink()
        .as_any()
        .downcast_ref::<EventLog>()
        .expect("trainer was built with an EventLog sink")
}

fn rounds_of(log: &EventLog, event_type: &str) -> Vec<usize> {
    log.events_of_type(event_type)
        .iter()
        .map(|e| e.round())
        .collect()
}

#[test]
fn test_cloud_update_cadence_never_fires_at_round_zero() {
    let schedule = TrainingSchedule {
        cloud_update_every: 50,
        max_iterations: 151,
        ..TrainingSchedule::default()
    };
    let mut trainer = trainer_with(12, schedule, &["R1"]);

    trainer.run().unwrap();

    let log = event_log(&trainer);
    assert_eq!(rounds_of(log, "CloudPolicyUpdate"), vec![50, 100, 150]);
}

#[test]
fn test_round_zero_cloud_rollout_for_any_allocation_interval() {
    for allocation_interval in [1, 3, 12, 999] {
        let schedule = TrainingSchedule {
            max_iterations: 1,
            ..TrainingSchedule::default()
        };
        let mut trainer = trainer_with(allocation_interval, schedule, &["R1"]);

        let result = trainer.run_round().unwrap();

        assert!(
            result.cloud_reward.is_some(),
            "no cloud rollout at round 0 with allocation_interval {}",
            allocation_interval
        );
        assert_eq!(trainer.cloud_buffer_len(), 1);
        assert_eq!(rounds_of(event_log(&trainer), "CloudRollout"), vec![0]);
    }
}

#[test]
fn test_cloud_rollouts_follow_allocation_interval() {
    let schedule = TrainingSchedule {
        max_iterations: 10,
        ..TrainingSchedule::default()
    };
    let mut trainer = trainer_with(4, schedule, &["R1"]);

    trainer.run().unwrap();

    assert_eq!(
        rounds_of(event_log(&trainer), "CloudRollout"),
        vec![0, 4, 8]
    );
    assert_eq!(trainer.cloud_buffer_len(), 3);
}

#[test]
fn test_edge_sync_updates_and_clears_buffers() {
    let schedule = TrainingSchedule {
        edge_sync_every: 4,
        max_iterations: 9,
        ..TrainingSchedule::default()
    };
    let mut trainer = trainer_with(12, schedule, &["R1", "R2"]);

    trainer.run().unwrap();

    let log = event_log(&trainer);
    assert_eq!(rounds_of(log, "EdgePolicyUpdate"), vec![4, 4, 8, 8]);
    assert_eq!(trainer.edge_buffer_len("R1"), 0);
    assert_eq!(trainer.edge_buffer_len("R2"), 0);
}

#[test]
fn test_edge_buffers_accumulate_between_syncs() {
    let schedule = TrainingSchedule {
        max_iterations: 5,
        ..TrainingSchedule::default()
    };
    let mut trainer = trainer_with(12, schedule, &["R1"]);

    trainer.run().unwrap();

    // default edge_sync_every of 500 never fires in 5 rounds
    assert_eq!(trainer.edge_buffer_len("R1"), 5);
}

#[test]
fn test_evaluation_and_save_markers() {
    let schedule = TrainingSchedule {
        evaluation_interval: 3,
        save_interval: 5,
        max_iterations: 7,
        ..TrainingSchedule::default()
    };
    let mut trainer = trainer_with(12, schedule, &["R1"]);

    trainer.run().unwrap();

    let log = event_log(&trainer);
    assert_eq!(rounds_of(log, "EvaluationCheckpoint"), vec![3, 6]);
    assert_eq!(rounds_of(log, "SaveCheckpoint"), vec![5]);
}

#[test]
fn test_window_reset_follows_every_cloud_rollout() {
    let schedule = TrainingSchedule {
        max_iterations: 3,
        ..TrainingSchedule::default()
    };
    let mut trainer = trainer_with(1, schedule, &["R1"]);

    // seed some arrivals so the reset is observable
    let requests = vec![dispatch_request("R1"), dispatch_request("R1")];
    assert_eq!(trainer.ingest_requests(requests), 2);
    assert_eq!(trainer.edge_env("R1").unwrap().arrivals_in_window(), 2);

    trainer.run().unwrap();

    assert_eq!(trainer.edge_env("R1").unwrap().arrivals_in_window(), 0);
    assert_eq!(
        rounds_of(event_log(&trainer), "WindowReset"),
        vec![0, 1, 2]
    );
}

#[test]
fn test_rollout_order_is_registration_order() {
    let schedule = TrainingSchedule {
        max_iterations: 1,
        ..TrainingSchedule::default()
    };
    let mut trainer = trainer_with(12, schedule, &["ZULU", "ALPHA", "MIKE"]);

    trainer.run().unwrap();

    let log = event_log(&trainer);
    let order: Vec<&str> = log
        .events_of_type("EdgeRollout")
        .iter()
        .filter_map(|e| e.region_id())
        .collect();
    assert_eq!(order, vec!["ZULU", "ALPHA", "MIKE"]);
}

// ============================================================================
// Fail-fast behavior
// ============================================================================

struct FailingEdgePolicy;

impl EdgePolicy for FailingEdgePolicy {
    fn act(&mut self, _obs: &EdgeObservation) -> Result<Vec<DispatchDecision>, PolicyError> {
        Err(PolicyError::ActFailed("model backend unavailable".to_string()))
    }

    fn update(&mut self, _batch: &[EdgeTransition]) -> Result<PolicyMetrics, PolicyError> {
        Ok(PolicyMetrics::new())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[test]
fn test_failing_policy_aborts_the_run() {
    let config = SimulationConfig::default();
    let schedule = TrainingSchedule {
        max_iterations: 10,
        ..TrainingSchedule::default()
    };
    let cloud_policy = Box::new(GreedyWaitPolicy::new(config.cloud.clone()));
    let mut trainer =
        Trainer::new(config, schedule, cloud_policy, Box::new(EventLog::new())).unwrap();

    let env = EdgeEnv::new("R1", EdgeConfig::default(), vec![]).unwrap();
    trainer
        .register_region(env, Box::new(FailingEdgePolicy))
        .unwrap();

    let result = trainer.run();

    assert!(matches!(
        result,
        Err(SimulationError::Policy(PolicyError::ActFailed(_)))
    ));
    // no round completed
    assert_eq!(trainer.current_round(), 0);
}

// ============================================================================
// Helpers
// ============================================================================

fn dispatch_request(region_id: &str) -> dispatch_simulator_core_rs::models::ChargeRequest {
    dispatch_simulator_core_rs::models::ChargeRequest::new(
        "veh".to_string(),
        dispatch_simulator_core_rs::geo::GeoPoint::new(0.0, 0.0),
        Some(region_id.to_string()),
        "t0".to_string(),
        0.1,
    )
}
