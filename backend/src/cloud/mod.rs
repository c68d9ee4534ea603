//! Cloud-level environment coordinating MCS allocation across regions.
//!
//! The cloud tier holds one allocation count per registered region and
//! advances one step per invocation: it applies signed reallocation deltas
//! (clamped so counts never go negative), charges a transfer cost, and scores
//! the latest region summaries. Summaries flow in from the edge tier each
//! allocation window; the observation is a pass-through view of them.
//!
//! # Critical Invariants
//!
//! 1. Allocation counts are never negative, for any delta sequence
//! 2. Regions absent from an action are left untouched
//! 3. Every supplied summary contributes to the reward, delta or not

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::RegionSummary;

/// Cost charged per unit of allocation moved.
const TRANSFER_COST_PER_UNIT: f64 = 0.1;
/// Reward weight on a region's success rate.
const SUCCESS_RATE_WEIGHT: f64 = 2.0;
/// Reward penalty weight on a region's average wait.
const AVERAGE_WAIT_WEIGHT: f64 = 0.05;

/// Configuration for cloud-level coordination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Edge rounds between cloud rollouts (hourly at 5-minute edge steps)
    pub allocation_interval: usize,

    /// Upper bound on units moved toward one region per interval
    pub max_transfer_per_interval: i64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            allocation_interval: 12,
            max_transfer_per_interval: 5,
        }
    }
}

/// Reallocation deltas keyed by region id.
pub type AllocationAction = HashMap<String, i64>;

/// Pass-through view of the summaries a cloud step consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudObservation {
    /// Latest summary from every registered region
    pub summaries: Vec<RegionSummary>,
}

/// Result of one cloud environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudStepOutcome {
    /// Observation over the summaries this step consumed
    pub observation: CloudObservation,
    /// Reward: transfer costs plus summary scores
    pub reward: f64,
    /// Whether the episode ended (always false; episodes are externally bounded)
    pub done: bool,
    /// Per-region average waits, keyed `wait_<region_id>`
    pub info: HashMap<String, f64>,
}

/// Environment allocating MCS counts across regions.
#[derive(Debug, Clone)]
pub struct CloudEnv {
    config: CloudConfig,
    allocations: HashMap<String, i64>,
    time_step: usize,
}

impl CloudEnv {
    /// Create an environment with one allocated unit per registered region.
    pub fn new(config: CloudConfig, region_ids: &[String]) -> Self {
        let allocations = region_ids.iter().map(|rid| (rid.clone(), 1)).collect();
        Self {
            config,
            allocations,
            time_step: 0,
        }
    }

    /// Restore an environment from snapshot parts.
    pub fn from_parts(
        config: CloudConfig,
        allocations: HashMap<String, i64>,
        time_step: usize,
    ) -> Self {
        Self {
            config,
            allocations,
            time_step,
        }
    }

    /// Get the environment configuration
    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Get all allocation counts
    pub fn allocations(&self) -> &HashMap<String, i64> {
        &self.allocations
    }

    /// Get one region's allocation count (0 if never touched)
    pub fn allocation(&self, region_id: &str) -> i64 {
        self.allocations.get(region_id).copied().unwrap_or(0)
    }

    /// Get the total steps taken
    pub fn current_step(&self) -> usize {
        self.time_step
    }

    /// Register a region, seeding its allocation at 1 if not yet present.
    pub fn ensure_region(&mut self, region_id: &str) {
        self.allocations.entry(region_id.to_string()).or_insert(1);
    }

    /// Wrap the given summaries as an observation.
    pub fn observe(&self, summaries: &[RegionSummary]) -> CloudObservation {
        CloudObservation {
            summaries: summaries.to_vec(),
        }
    }

    /// Apply allocation deltas and score the summaries.
    ///
    /// Each action entry moves a region's count to `max(0, old + delta)` and
    /// charges `|delta| × 0.1`. Every summary then contributes
    /// `success_rate × 2.0 − average_wait × 0.05` and records its wait under
    /// `wait_<region_id>` in the info map.
    pub fn step(
        &mut self,
        action: &AllocationAction,
        summaries: &[RegionSummary],
    ) -> CloudStepOutcome {
        let mut reward = 0.0;
        let mut info = HashMap::new();

        for (region_id, delta) in action {
            let old = self.allocations.get(region_id).copied().unwrap_or(0);
            self.allocations.insert(region_id.clone(), (old + delta).max(0));
            reward -= delta.abs() as f64 * TRANSFER_COST_PER_UNIT;
        }

        for summary in summaries {
            reward += summary.success_rate * SUCCESS_RATE_WEIGHT
                - summary.average_wait * AVERAGE_WAIT_WEIGHT;
            info.insert(format!("wait_{}", summary.region_id), summary.average_wait);
        }

        self.time_step += 1;

        CloudStepOutcome {
            observation: self.observe(summaries),
            reward,
            done: false,
            info,
        }
    }

    /// Baseline heuristic: move one unit from the lowest-wait region to the
    /// highest-wait region.
    ///
    /// Regions sort by descending average wait (stable, so ties keep their
    /// input order). The first gets `min(max_transfer_per_interval, 1)`, the
    /// last (when distinct) gets −1, everything between gets no entry.
    pub fn greedy_action(&self, summaries: &[RegionSummary]) -> AllocationAction {
        greedy_rebalance(summaries, self.config.max_transfer_per_interval)
    }
}

/// Greedy-by-wait reallocation shared by [`CloudEnv::greedy_action`] and the
/// baseline cloud policy.
pub(crate) fn greedy_rebalance(
    summaries: &[RegionSummary],
    max_transfer_per_interval: i64,
) -> AllocationAction {
    if summaries.is_empty() {
        return AllocationAction::new();
    }

    let mut sorted: Vec<&RegionSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| {
        b.average_wait
            .partial_cmp(&a.average_wait)
            .unwrap_or(Ordering::Equal)
    });

    let mut action = AllocationAction::new();
    action.insert(sorted[0].region_id.clone(), max_transfer_per_interval.min(1));
    if sorted.len() > 1 {
        action.insert(sorted[sorted.len() - 1].region_id.clone(), -1);
    }
    action
}
