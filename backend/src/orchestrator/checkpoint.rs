//! Checkpoint interface: snapshot structures and validation.
//!
//! Persistence itself belongs to an external collaborator (the trainer only
//! emits save markers at the configured cadence). This module defines what
//! such a collaborator captures: serializable snapshots of the trainer's
//! environments, a canonical config hash so a checkpoint can only be restored
//! against the configuration that produced it, and invariant validation for
//! loaded snapshots.
//!
//! # Critical Invariants
//!
//! - **Config matching**: snapshots carry a SHA-256 hash of the config
//! - **Allocation bounds**: no region's allocation count is negative
//! - **Queue bounds**: no region's queue exceeds its configured maximum

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cloud::{CloudConfig, CloudEnv};
use crate::edge::{EdgeConfig, EdgeEnv, QueueEntry};
use crate::geo::GeoPoint;
use crate::models::{ChargeRequest, McsUnit};
use crate::orchestrator::engine::{SimulationError, Trainer};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete trainer state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerSnapshot {
    /// Rounds completed at capture time
    pub round: usize,

    /// SHA-256 hash of the simulation config (for restore validation)
    pub config_hash: String,

    /// Edge environment states in registration order
    pub edges: Vec<EdgeEnvSnapshot>,

    /// Cloud environment state
    pub cloud: CloudSnapshot,
}

impl TrainerSnapshot {
    /// Capture a snapshot of the trainer's current state.
    pub fn capture(trainer: &Trainer) -> Result<Self, SimulationError> {
        let edges = trainer
            .region_ids()
            .iter()
            .filter_map(|rid| trainer.edge_env(rid))
            .map(EdgeEnvSnapshot::from)
            .collect();

        Ok(Self {
            round: trainer.current_round(),
            config_hash: compute_config_hash(trainer.config())?,
            edges,
            cloud: CloudSnapshot::from(trainer.cloud_env()),
        })
    }
}

/// One queued entry's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntrySnapshot {
    pub request: ChargeRequest,
    pub wait_time: usize,
}

/// One MCS unit's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McsUnitSnapshot {
    pub location: GeoPoint,
    pub available: bool,
}

/// Edge environment state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEnvSnapshot {
    pub region_id: String,
    pub step: usize,
    pub arrivals_in_window: usize,
    pub candidate_points: Vec<GeoPoint>,
    pub queue: Vec<QueueEntrySnapshot>,
    pub mcs_pool: Vec<McsUnitSnapshot>,
}

impl From<&EdgeEnv> for EdgeEnvSnapshot {
    fn from(env: &EdgeEnv) -> Self {
        Self {
            region_id: env.region_id().to_string(),
            step: env.current_step(),
            arrivals_in_window: env.arrivals_in_window(),
            candidate_points: env.candidate_points().to_vec(),
            queue: env
                .queue()
                .iter()
                .map(|entry| QueueEntrySnapshot {
                    request: entry.request().clone(),
                    wait_time: entry.wait_time(),
                })
                .collect(),
            mcs_pool: env
                .mcs_pool()
                .iter()
                .map(|unit| McsUnitSnapshot {
                    location: unit.location(),
                    available: unit.is_available(),
                })
                .collect(),
        }
    }
}

impl EdgeEnvSnapshot {
    /// Rebuild the environment this snapshot was captured from.
    pub fn restore(self, config: EdgeConfig) -> EdgeEnv {
        let queue = self
            .queue
            .into_iter()
            .map(|entry| QueueEntry::with_wait(entry.request, entry.wait_time))
            .collect();
        let mcs_pool = self
            .mcs_pool
            .into_iter()
            .map(|unit| McsUnit::with_availability(unit.location, unit.available))
            .collect();

        EdgeEnv::from_parts(
            self.region_id,
            config,
            self.candidate_points,
            queue,
            mcs_pool,
            self.step,
            self.arrivals_in_window,
        )
    }
}

/// Cloud environment state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSnapshot {
    pub step: usize,
    pub allocations: HashMap<String, i64>,
}

impl From<&CloudEnv> for CloudSnapshot {
    fn from(env: &CloudEnv) -> Self {
        Self {
            step: env.current_step(),
            allocations: env.allocations().clone(),
        }
    }
}

impl CloudSnapshot {
    /// Rebuild the environment this snapshot was captured from.
    pub fn restore(self, config: CloudConfig) -> CloudEnv {
        CloudEnv::from_parts(config, self.allocations, self.step)
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute a deterministic SHA-256 hash of a serializable config.
///
/// Serializes through `serde_json::Value` with recursively sorted object keys
/// so the hash does not depend on map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    fn canonicalize(value: serde_json::Value) -> serde_json::Value {
        use serde_json::Value;
        match value {
            Value::Object(map) => {
                let sorted: std::collections::BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let value = serde_json::to_value(config)
        .map_err(|e| SimulationError::SerializationError(e.to_string()))?;
    let canonical = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SimulationError::SerializationError(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate a loaded snapshot against the core invariants.
///
/// Checks region uniqueness, queue bounds against `max_queue_size`, and
/// allocation non-negativity.
pub fn validate_snapshot(
    snapshot: &TrainerSnapshot,
    max_queue_size: usize,
) -> Result<(), SimulationError> {
    let mut seen = HashSet::new();
    for edge in &snapshot.edges {
        if !seen.insert(&edge.region_id) {
            return Err(SimulationError::StateValidationError(format!(
                "duplicate region in snapshot: {}",
                edge.region_id
            )));
        }
        if edge.queue.len() > max_queue_size {
            return Err(SimulationError::StateValidationError(format!(
                "region {} queue length {} exceeds bound {}",
                edge.region_id,
                edge.queue.len(),
                max_queue_size
            )));
        }
    }

    for (region_id, count) in &snapshot.cloud.allocations {
        if *count < 0 {
            return Err(SimulationError::StateValidationError(format!(
                "negative allocation for region {}: {}",
                region_id, count
            )));
        }
    }

    Ok(())
}
