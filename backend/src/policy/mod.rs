//! Policy interface for edge dispatch and cloud reallocation decisions.
//!
//! Both tiers share one capability shape: `act` maps the current observation
//! to an action, `update` consumes a batch of buffered transitions and
//! returns named metrics. Edge and cloud policies differ only in their
//! observation and action types.
//!
//! The trainer holds policies as trait objects, so an externally supplied
//! learner slots in beside the baselines here without any trainer change.
//! Policy calls are fail-fast: an error aborts the run, nothing retries.
//!
//! # Example Implementation
//!
//! ```
//! use dispatch_simulator_core_rs::edge::{DispatchDecision, EdgeObservation};
//! use dispatch_simulator_core_rs::policy::{EdgePolicy, EdgeTransition, PolicyError, PolicyMetrics};
//!
//! struct HoldEverything;
//!
//! impl EdgePolicy for HoldEverything {
//!     fn act(&mut self, obs: &EdgeObservation) -> Result<Vec<DispatchDecision>, PolicyError> {
//!         Ok(vec![DispatchDecision::Hold; obs.pending_requests])
//!     }
//!
//!     fn update(&mut self, _batch: &[EdgeTransition]) -> Result<PolicyMetrics, PolicyError> {
//!         Ok(PolicyMetrics::new())
//!     }
//!
//!     fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
//!         self
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;

use thiserror::Error;

use crate::cloud::{AllocationAction, CloudObservation};
use crate::edge::{DispatchDecision, EdgeObservation};

mod first_candidate;
mod greedy_wait;

pub use first_candidate::FirstCandidatePolicy;
pub use greedy_wait::GreedyWaitPolicy;

/// Named scalar metrics returned by a policy update.
pub type PolicyMetrics = HashMap<String, f64>;

/// Errors surfaced by policy calls. The trainer treats any of these as fatal.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("policy act failed: {0}")]
    ActFailed(String),

    #[error("policy update failed: {0}")]
    UpdateFailed(String),
}

/// One buffered rollout: observation, action, and the step's outcome.
#[derive(Debug, Clone)]
pub struct Transition<O, A> {
    /// Observation the action was chosen from
    pub observation: O,
    /// Action taken
    pub action: A,
    /// Reward the environment returned
    pub reward: f64,
    /// Observation after the step
    pub next_observation: O,
    /// Whether the episode ended at this step
    pub done: bool,
    /// Auxiliary metrics from the step
    pub info: HashMap<String, f64>,
}

/// Buffered transition of an edge rollout.
pub type EdgeTransition = Transition<EdgeObservation, Vec<DispatchDecision>>;

/// Buffered transition of a cloud rollout.
pub type CloudTransition = Transition<CloudObservation, AllocationAction>;

/// Decision-maker for one region's dispatch queue.
pub trait EdgePolicy: Send + Sync {
    /// Choose one dispatch decision per pending request, by queue position.
    fn act(&mut self, observation: &EdgeObservation)
        -> Result<Vec<DispatchDecision>, PolicyError>;

    /// Consume a batch of buffered transitions and report metrics.
    fn update(&mut self, batch: &[EdgeTransition]) -> Result<PolicyMetrics, PolicyError>;

    /// Enable downcasting to the concrete policy type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Decision-maker for cross-region allocation deltas.
pub trait CloudPolicy: Send + Sync {
    /// Choose reallocation deltas from the latest region summaries.
    fn act(&mut self, observation: &CloudObservation) -> Result<AllocationAction, PolicyError>;

    /// Consume a batch of buffered transitions and report metrics.
    fn update(&mut self, batch: &[CloudTransition]) -> Result<PolicyMetrics, PolicyError>;

    /// Enable downcasting to the concrete policy type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
