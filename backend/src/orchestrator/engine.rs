//! Trainer engine: the multi-cadence rollout/update loop.
//!
//! The trainer drives both tiers at independent cadences. Each round:
//!
//! ```text
//! For each round r (starting at 0):
//! 1. Edge rollouts: every registered region, in registration order
//! 2. Cloud rollout when r % allocation_interval == 0 (round 0 included),
//!    then reset every region's arrival window
//! 3. Cloud policy update when r % cloud_update_every == 0 and r > 0
//! 4. Edge policy updates when r % edge_sync_every == 0 and r > 0
//! 5. Evaluation checkpoint marker when r % evaluation_interval == 0, r > 0
//! 6. Save checkpoint marker when r % save_interval == 0, r > 0
//! ```
//!
//! The cloud rollout consumes a fresh summary from every region produced in
//! the same round; edge rollouts of one round are independent of each other
//! but all precede the cloud rollout. There is no early stopping: `run`
//! executes exactly `max_iterations` rounds unless a policy call fails, which
//! aborts immediately (fail-fast, no retry).
//!
//! # Example
//!
//! ```rust
//! use dispatch_simulator_core_rs::edge::{EdgeConfig, EdgeEnv};
//! use dispatch_simulator_core_rs::models::EventLog;
//! use dispatch_simulator_core_rs::orchestrator::{
//!     SimulationConfig, Trainer, TrainingSchedule,
//! };
//! use dispatch_simulator_core_rs::policy::{FirstCandidatePolicy, GreedyWaitPolicy};
//!
//! let config = SimulationConfig::default();
//! let schedule = TrainingSchedule {
//!     max_iterations: 10,
//!     ..TrainingSchedule::default()
//! };
//!
//! let cloud_policy = Box::new(GreedyWaitPolicy::new(config.cloud.clone()));
//! let mut trainer =
//!     Trainer::new(config, schedule, cloud_policy, Box::new(EventLog::new())).unwrap();
//!
//! let env = EdgeEnv::new("R1", EdgeConfig::default(), vec![]).unwrap();
//! trainer
//!     .register_region(env, Box::new(FirstCandidatePolicy))
//!     .unwrap();
//!
//! trainer.run().unwrap();
//! assert_eq!(trainer.current_round(), 10);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cloud::{CloudConfig, CloudEnv};
use crate::edge::{EdgeConfig, EdgeEnv};
use crate::ev::EvConfig;
use crate::models::{ChargeRequest, Event, EventSink};
use crate::orchestrator::buffer::RolloutBuffer;
use crate::policy::{
    CloudPolicy, CloudTransition, EdgePolicy, EdgeTransition, PolicyError, Transition,
};

// ============================================================================
// Configuration Types
// ============================================================================

/// Knobs for orchestrating a multi-region simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Regions expected to participate; registration may extend this set
    pub region_ids: Vec<String>,

    /// Seed handed through to external learners
    pub random_seed: u64,

    /// Region-level environment parameters
    pub edge: EdgeConfig,

    /// Cloud-level coordination parameters
    pub cloud: CloudConfig,

    /// EV energy model parameters
    pub ev: EvConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            region_ids: Vec::new(),
            random_seed: 42,
            edge: EdgeConfig::default(),
            cloud: CloudConfig::default(),
            ev: EvConfig::default(),
        }
    }
}

/// High-level training schedule for cloud-edge coordination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSchedule {
    /// Rounds between cloud policy updates
    pub cloud_update_every: usize,

    /// Rounds between edge policy updates
    pub edge_sync_every: usize,

    /// Rounds between evaluation checkpoint markers
    pub evaluation_interval: usize,

    /// Rounds between save checkpoint markers
    pub save_interval: usize,

    /// Total rounds `run` executes
    pub max_iterations: usize,

    /// Where the external persister should write checkpoints
    pub checkpoint_dir: PathBuf,
}

impl Default for TrainingSchedule {
    fn default() -> Self {
        Self {
            cloud_update_every: 50,
            edge_sync_every: 500,
            evaluation_interval: 1000,
            save_interval: 2000,
            max_iterations: 10_000,
            checkpoint_dir: PathBuf::from("checkpoints"),
        }
    }
}

/// Simulation error types
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("region already registered: {0}")]
    DuplicateRegion(String),

    #[error("region not registered: {0}")]
    UnknownRegion(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("snapshot validation failed: {0}")]
    StateValidationError(String),
}

/// Result of a single training round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    /// Round number this result describes
    pub round: usize,

    /// Sum of edge rewards across all regions this round
    pub edge_reward_total: f64,

    /// Cloud reward when a cloud rollout ran this round
    pub cloud_reward: Option<f64>,

    /// Whether the cloud policy consumed its buffer this round
    pub cloud_updated: bool,

    /// Whether the edge policies consumed their buffers this round
    pub edges_updated: bool,
}

// ============================================================================
// Trainer
// ============================================================================

/// Coordinates edge and cloud sampling and policy updates.
///
/// Owns every environment, policy, and rollout buffer; events go to the sink
/// injected at construction. Single logical thread: edge rollouts within a
/// round carry no data dependency on each other, but the cloud rollout
/// requires every region's summary from the same round first.
pub struct Trainer {
    config: SimulationConfig,
    schedule: TrainingSchedule,

    /// Registration order; also the per-round rollout order
    region_order: Vec<String>,
    edge_envs: HashMap<String, EdgeEnv>,
    edge_policies: HashMap<String, Box<dyn EdgePolicy>>,
    edge_buffers: HashMap<String, RolloutBuffer<EdgeTransition>>,

    cloud_env: CloudEnv,
    cloud_policy: Box<dyn CloudPolicy>,
    cloud_buffer: RolloutBuffer<CloudTransition>,

    /// Rounds completed so far; the next round runs under this number
    round: usize,

    sink: Box<dyn EventSink>,
}

impl Trainer {
    /// Create a trainer from configuration.
    ///
    /// # Errors
    ///
    /// `SimulationError::InvalidConfig` when any cadence is zero or
    /// `max_iterations` is zero.
    pub fn new(
        config: SimulationConfig,
        schedule: TrainingSchedule,
        cloud_policy: Box<dyn CloudPolicy>,
        sink: Box<dyn EventSink>,
    ) -> Result<Self, SimulationError> {
        Self::validate(&config, &schedule)?;

        let cloud_env = CloudEnv::new(config.cloud.clone(), &config.region_ids);

        Ok(Self {
            config,
            schedule,
            region_order: Vec::new(),
            edge_envs: HashMap::new(),
            edge_policies: HashMap::new(),
            edge_buffers: HashMap::new(),
            cloud_env,
            cloud_policy,
            cloud_buffer: RolloutBuffer::new(),
            round: 0,
            sink,
        })
    }

    fn validate(
        config: &SimulationConfig,
        schedule: &TrainingSchedule,
    ) -> Result<(), SimulationError> {
        if config.cloud.allocation_interval == 0 {
            return Err(SimulationError::InvalidConfig(
                "allocation_interval must be > 0".to_string(),
            ));
        }
        if schedule.cloud_update_every == 0 {
            return Err(SimulationError::InvalidConfig(
                "cloud_update_every must be > 0".to_string(),
            ));
        }
        if schedule.edge_sync_every == 0 {
            return Err(SimulationError::InvalidConfig(
                "edge_sync_every must be > 0".to_string(),
            ));
        }
        if schedule.evaluation_interval == 0 {
            return Err(SimulationError::InvalidConfig(
                "evaluation_interval must be > 0".to_string(),
            ));
        }
        if schedule.save_interval == 0 {
            return Err(SimulationError::InvalidConfig(
                "save_interval must be > 0".to_string(),
            ));
        }
        if schedule.max_iterations == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_iterations must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the number of rounds completed
    pub fn current_round(&self) -> usize {
        self.round
    }

    /// Get the simulation configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Get the training schedule
    pub fn schedule(&self) -> &TrainingSchedule {
        &self.schedule
    }

    /// Get the registered region ids in registration order
    pub fn region_ids(&self) -> &[String] {
        &self.region_order
    }

    /// Get a region's environment
    pub fn edge_env(&self, region_id: &str) -> Option<&EdgeEnv> {
        self.edge_envs.get(region_id)
    }

    /// Get the cloud environment
    pub fn cloud_env(&self) -> &CloudEnv {
        &self.cloud_env
    }

    /// Get the number of transitions buffered for a region's policy
    pub fn edge_buffer_len(&self, region_id: &str) -> usize {
        self.edge_buffers.get(region_id).map_or(0, |b| b.len())
    }

    /// Get the number of transitions buffered for the cloud policy
    pub fn cloud_buffer_len(&self) -> usize {
        self.cloud_buffer.len()
    }

    /// Get the injected event sink (downcast via `as_any` to inspect it)
    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    /// Capture a snapshot of the current state for an external persister.
    pub fn snapshot(&self) -> Result<crate::orchestrator::TrainerSnapshot, SimulationError> {
        crate::orchestrator::TrainerSnapshot::capture(self)
    }

    // ========================================================================
    // Registration and Routing
    // ========================================================================

    /// Register a region's environment and edge policy.
    ///
    /// Registration order becomes the per-round rollout order. The cloud
    /// environment seeds the region's allocation at 1 if it has none yet.
    pub fn register_region(
        &mut self,
        env: EdgeEnv,
        policy: Box<dyn EdgePolicy>,
    ) -> Result<(), SimulationError> {
        let region_id = env.region_id().to_string();
        if self.edge_envs.contains_key(&region_id) {
            return Err(SimulationError::DuplicateRegion(region_id));
        }

        self.cloud_env.ensure_region(&region_id);
        self.region_order.push(region_id.clone());
        self.edge_buffers
            .insert(region_id.clone(), RolloutBuffer::new());
        self.edge_policies.insert(region_id.clone(), policy);
        self.edge_envs.insert(region_id, env);
        Ok(())
    }

    /// Route charge requests into their regions' queues.
    ///
    /// A request without a resolved region, or whose region is not
    /// registered, is discarded without a counter or an event. Returns the
    /// number of requests that reached a queue.
    pub fn ingest_requests(
        &mut self,
        requests: impl IntoIterator<Item = ChargeRequest>,
    ) -> usize {
        let mut routed = 0;
        for request in requests {
            let env = match request.region_id() {
                Some(region_id) => self.edge_envs.get_mut(region_id),
                None => None,
            };
            if let Some(env) = env {
                self.sink.record(Event::RequestRouted {
                    round: self.round,
                    region_id: env.region_id().to_string(),
                    request_id: request.id().to_string(),
                });
                env.add_request(request);
                routed += 1;
            }
        }
        routed
    }

    // ========================================================================
    // Round Loop
    // ========================================================================

    /// Run the full schedule: exactly `max_iterations` rounds.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        while self.round < self.schedule.max_iterations {
            self.run_round()?;
        }
        Ok(())
    }

    /// Execute one training round.
    pub fn run_round(&mut self) -> Result<RoundResult, SimulationError> {
        let round = self.round;

        // STEP 1: EDGE ROLLOUTS
        // Disjoint per region; registration order keeps runs reproducible.
        let regions: Vec<String> = self.region_order.clone();
        let mut edge_reward_total = 0.0;
        for region_id in &regions {
            edge_reward_total += self.edge_rollout(region_id)?;
        }

        // STEP 2: CLOUD ROLLOUT
        // Requires this round's summary from every region; fires at round 0.
        let cloud_reward = if round % self.config.cloud.allocation_interval == 0 {
            let reward = self.cloud_rollout()?;
            self.reset_windows();
            Some(reward)
        } else {
            None
        };

        // STEP 3: CLOUD POLICY UPDATE
        let cloud_updated = round % self.schedule.cloud_update_every == 0 && round > 0;
        if cloud_updated {
            self.update_cloud()?;
        }

        // STEP 4: EDGE POLICY UPDATES
        let edges_updated = round % self.schedule.edge_sync_every == 0 && round > 0;
        if edges_updated {
            self.update_edges()?;
        }

        // STEP 5: CHECKPOINT MARKERS
        // Numeric evaluation and persistence live with external collaborators.
        if round % self.schedule.evaluation_interval == 0 && round > 0 {
            self.sink.record(Event::EvaluationCheckpoint { round });
        }
        if round % self.schedule.save_interval == 0 && round > 0 {
            self.sink.record(Event::SaveCheckpoint { round });
        }

        self.round += 1;

        Ok(RoundResult {
            round,
            edge_reward_total,
            cloud_reward,
            cloud_updated,
            edges_updated,
        })
    }

    fn edge_rollout(&mut self, region_id: &str) -> Result<f64, SimulationError> {
        let env = self
            .edge_envs
            .get_mut(region_id)
            .ok_or_else(|| SimulationError::UnknownRegion(region_id.to_string()))?;
        let policy = self
            .edge_policies
            .get_mut(region_id)
            .ok_or_else(|| SimulationError::UnknownRegion(region_id.to_string()))?;

        let observation = env.observe();
        let action = policy.act(&observation)?;
        let outcome = env.step(&action);
        let reward = outcome.reward;

        self.sink.record(Event::EdgeRollout {
            round: self.round,
            region_id: region_id.to_string(),
            reward,
            queue_length: outcome.observation.pending_requests,
        });

        let buffer = self
            .edge_buffers
            .get_mut(region_id)
            .ok_or_else(|| SimulationError::UnknownRegion(region_id.to_string()))?;
        buffer.add(Transition {
            observation,
            action,
            reward,
            next_observation: outcome.observation,
            done: outcome.done,
            info: outcome.info,
        });

        Ok(reward)
    }

    fn cloud_rollout(&mut self) -> Result<f64, SimulationError> {
        // barrier: every region's summary for this round before the cloud acts
        let summaries: Vec<_> = self
            .region_order
            .iter()
            .filter_map(|rid| self.edge_envs.get(rid))
            .map(|env| env.build_summary())
            .collect();

        for summary in &summaries {
            self.sink.record(Event::SummaryReported {
                round: self.round,
                summary: summary.clone(),
            });
        }

        let observation = self.cloud_env.observe(&summaries);
        let action = self.cloud_policy.act(&observation)?;
        let outcome = self.cloud_env.step(&action, &summaries);
        let reward = outcome.reward;

        self.sink.record(Event::CloudRollout {
            round: self.round,
            reward,
            regions: summaries.len(),
        });

        self.cloud_buffer.add(Transition {
            observation,
            action,
            reward,
            next_observation: outcome.observation,
            done: outcome.done,
            info: outcome.info,
        });

        Ok(reward)
    }

    fn reset_windows(&mut self) {
        for env in self.edge_envs.values_mut() {
            env.reset_window();
        }
        self.sink.record(Event::WindowReset {
            round: self.round,
            regions: self.region_order.len(),
        });
    }

    fn update_cloud(&mut self) -> Result<(), SimulationError> {
        let metrics = self.cloud_policy.update(self.cloud_buffer.transitions())?;
        self.cloud_buffer.clear();
        self.sink.record(Event::CloudPolicyUpdate {
            round: self.round,
            metrics,
        });
        Ok(())
    }

    fn update_edges(&mut self) -> Result<(), SimulationError> {
        let regions: Vec<String> = self.region_order.clone();
        for region_id in &regions {
            let buffer = self
                .edge_buffers
                .get_mut(region_id)
                .ok_or_else(|| SimulationError::UnknownRegion(region_id.to_string()))?;
            let policy = self
                .edge_policies
                .get_mut(region_id)
                .ok_or_else(|| SimulationError::UnknownRegion(region_id.to_string()))?;

            let metrics = policy.update(buffer.transitions())?;
            buffer.clear();
            self.sink.record(Event::EdgePolicyUpdate {
                round: self.round,
                region_id: region_id.clone(),
                metrics,
            });
        }
        Ok(())
    }
}
