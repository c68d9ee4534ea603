//! Region-level queueing environment for MCS dispatch decisions.
//!
//! Each region owns a bounded queue of pending charge requests and a pool of
//! MCS units seeded from the region's candidate dispatch points. One `step`
//! advances the region by a single discrete time step:
//!
//! ```text
//! For each step:
//! 1. Age every queued entry by exactly one step
//! 2. Pair entries with dispatch decisions by position and apply rewards
//! 3. Remove entries whose wait was reset to 0 (served last assignment pass)
//! 4. Advance the step clock
//! ```
//!
//! Aging runs before assignment, so an entry served this step carries a wait
//! of at least 1 into the reward term; the removal pass then drops it in the
//! same step. A never-serviced entry always sits at wait ≥ 1 after aging and
//! survives the filter.
//!
//! # Critical Invariants
//!
//! 1. Queue length never exceeds `max_queue_size`; excess arrivals are
//!    dropped silently and do not count as arrivals
//! 2. Wait times move only by +1 per step or reset to exactly 0
//! 3. MCS units are never created or destroyed after construction

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::time::StepClock;
use crate::geo::{haversine_km, GeoPoint};
use crate::models::{ChargeRequest, McsUnit, RegionSummary};

/// Steps per coarse observation time bin (2-hour bins at 5-minute steps).
const STEPS_PER_BIN: usize = 12;
/// Number of coarse bins before the bin index wraps.
const BINS_PER_DAY: usize = 24;

/// Reward granted for a served request before the wait discount.
const SERVE_REWARD: f64 = 1.0;
/// Reward discount per step the served request waited.
const WAIT_DISCOUNT_PER_STEP: f64 = 0.01;
/// Penalty when no MCS unit is free for an in-radius dispatch.
const NO_UNIT_PENALTY: f64 = 0.1;
/// Penalty when the chosen dispatch point is outside the region radius.
const OUT_OF_RADIUS_PENALTY: f64 = 0.2;

/// Hyperparameters for region-level environments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Maximum distance (km) between a dispatch point and the request it serves
    pub region_radius_km: f64,

    /// Queue capacity; arrivals beyond it are dropped
    pub max_queue_size: usize,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            region_radius_km: 2.0,
            max_queue_size: 50,
        }
    }
}

/// Errors raised while constructing an edge environment.
#[derive(Debug, Error, PartialEq)]
pub enum EdgeError {
    #[error("candidate point {index} has a non-finite coordinate")]
    NonFiniteCandidate { index: usize },
}

/// A queued charge request with its accumulated wait.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    request: ChargeRequest,
    wait_time: usize,
}

impl QueueEntry {
    fn new(request: ChargeRequest) -> Self {
        Self {
            request,
            wait_time: 0,
        }
    }

    /// Restore an entry with an explicit wait (snapshot loading).
    pub fn with_wait(request: ChargeRequest, wait_time: usize) -> Self {
        Self { request, wait_time }
    }

    /// Get the queued request
    pub fn request(&self) -> &ChargeRequest {
        &self.request
    }

    /// Get the steps this entry has waited since enqueue
    pub fn wait_time(&self) -> usize {
        self.wait_time
    }
}

/// One dispatch decision for one queue entry, paired by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchDecision {
    /// Send the first available MCS unit to the candidate point at this index
    Dispatch { point_index: usize },

    /// Leave the entry waiting this step
    Hold,
}

/// Snapshot of a region's observable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeObservation {
    /// Region identifier
    pub region_id: String,
    /// Number of entries currently queued
    pub pending_requests: usize,
    /// Mean wait over the current queue (0 when empty)
    pub mean_wait: f64,
    /// Maximum wait over the current queue (0 when empty)
    pub max_wait: f64,
    /// MCS units currently available
    pub available_mcs: usize,
    /// Coarse time bin, `(step / 12) % 24`
    pub time_bin: usize,
    /// Arrivals in the current window over max(1, step count)
    pub arrival_rate: f64,
    /// Candidate dispatch point coordinates for this region
    pub candidate_points: Vec<GeoPoint>,
}

/// Result of one edge environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStepOutcome {
    /// Observation taken after the step completed
    pub observation: EdgeObservation,
    /// Reward accumulated across this step's assignments
    pub reward: f64,
    /// Whether the episode ended (always false; episodes are externally bounded)
    pub done: bool,
    /// Auxiliary metrics (empty for edge steps)
    pub info: HashMap<String, f64>,
}

/// Queueing environment for a single region.
#[derive(Debug, Clone)]
pub struct EdgeEnv {
    region_id: String,
    config: EdgeConfig,
    candidate_points: Vec<GeoPoint>,
    queue: Vec<QueueEntry>,
    mcs_pool: Vec<McsUnit>,
    clock: StepClock,
    arrivals_in_window: usize,
}

impl EdgeEnv {
    /// Create an environment for one region.
    ///
    /// The MCS pool starts with one available unit parked at every candidate
    /// dispatch point.
    ///
    /// # Errors
    ///
    /// `EdgeError::NonFiniteCandidate` if any candidate coordinate is NaN or
    /// infinite.
    pub fn new(
        region_id: impl Into<String>,
        config: EdgeConfig,
        candidate_points: Vec<GeoPoint>,
    ) -> Result<Self, EdgeError> {
        for (index, point) in candidate_points.iter().enumerate() {
            if !point.is_finite() {
                return Err(EdgeError::NonFiniteCandidate { index });
            }
        }

        let mcs_pool = candidate_points.iter().map(|&p| McsUnit::new(p)).collect();

        Ok(Self {
            region_id: region_id.into(),
            config,
            candidate_points,
            queue: Vec::new(),
            mcs_pool,
            clock: StepClock::new(STEPS_PER_BIN, BINS_PER_DAY),
            arrivals_in_window: 0,
        })
    }

    /// Restore an environment from snapshot parts.
    pub fn from_parts(
        region_id: impl Into<String>,
        config: EdgeConfig,
        candidate_points: Vec<GeoPoint>,
        queue: Vec<QueueEntry>,
        mcs_pool: Vec<McsUnit>,
        step: usize,
        arrivals_in_window: usize,
    ) -> Self {
        Self {
            region_id: region_id.into(),
            config,
            candidate_points,
            queue,
            mcs_pool,
            clock: StepClock::at_step(step, STEPS_PER_BIN, BINS_PER_DAY),
            arrivals_in_window,
        }
    }

    /// Get the region identifier
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Get the environment configuration
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Get the current queue contents in arrival order
    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    /// Get the MCS pool in stored order
    pub fn mcs_pool(&self) -> &[McsUnit] {
        &self.mcs_pool
    }

    /// Get the candidate dispatch points
    pub fn candidate_points(&self) -> &[GeoPoint] {
        &self.candidate_points
    }

    /// Get the total steps taken
    pub fn current_step(&self) -> usize {
        self.clock.current_step()
    }

    /// Get the arrivals counted in the current window
    pub fn arrivals_in_window(&self) -> usize {
        self.arrivals_in_window
    }

    /// Enqueue a charge request.
    ///
    /// A full queue drops the request silently: no error, no backpressure,
    /// and the arrivals counter stays untouched.
    pub fn add_request(&mut self, request: ChargeRequest) {
        if self.queue.len() >= self.config.max_queue_size {
            return;
        }
        self.queue.push(QueueEntry::new(request));
        self.arrivals_in_window += 1;
    }

    /// Observe the region's current state.
    pub fn observe(&self) -> EdgeObservation {
        let (mean_wait, max_wait) = self.wait_stats();
        EdgeObservation {
            region_id: self.region_id.clone(),
            pending_requests: self.queue.len(),
            mean_wait,
            max_wait,
            available_mcs: self.available_mcs(),
            time_bin: self.clock.time_bin(),
            arrival_rate: self.arrival_rate(),
            candidate_points: self.candidate_points.clone(),
        }
    }

    /// Advance the region by one step, applying the given dispatch decisions.
    ///
    /// `decisions` pairs with the current queue by position; surplus decisions
    /// are ignored and unmatched entries are held. A `Dispatch` whose index is
    /// out of range is skipped without any reward change.
    pub fn step(&mut self, decisions: &[DispatchDecision]) -> EdgeStepOutcome {
        let mut reward = 0.0;

        // STEP 1: AGING
        // Every queued entry waits one more step before assignment logic runs.
        for entry in &mut self.queue {
            entry.wait_time += 1;
        }

        // STEP 2: ASSIGNMENTS
        for (entry, decision) in self.queue.iter_mut().zip(decisions.iter()) {
            let point_index = match decision {
                DispatchDecision::Hold => continue,
                DispatchDecision::Dispatch { point_index } => *point_index,
            };
            let target = match self.candidate_points.get(point_index) {
                Some(&target) => target,
                None => continue, // invalid index: skipped, no reward change
            };

            // distance is measured to where the request was raised, not to
            // wherever the vehicle has moved since
            if haversine_km(target, entry.request.location()) > self.config.region_radius_km {
                reward -= OUT_OF_RADIUS_PENALTY;
                continue;
            }

            match self.mcs_pool.iter_mut().find(|unit| unit.is_available()) {
                Some(unit) => {
                    unit.relocate(target);
                    reward += SERVE_REWARD - WAIT_DISCOUNT_PER_STEP * entry.wait_time as f64;
                    entry.wait_time = 0;
                }
                None => reward -= NO_UNIT_PENALTY,
            }
        }

        // STEP 3: REMOVAL
        // Entries reset to wait 0 were served and leave the queue.
        self.queue.retain(|entry| entry.wait_time > 0);

        // STEP 4: ADVANCE TIME
        self.clock.advance();

        EdgeStepOutcome {
            observation: self.observe(),
            reward,
            done: false,
            info: HashMap::new(),
        }
    }

    /// Build the summary this region uploads to the cloud tier.
    pub fn build_summary(&self) -> RegionSummary {
        // service ratio not tracked yet
        let success_rate = 0.0;
        let (average_wait, _) = self.wait_stats();
        RegionSummary::new(
            self.region_id.clone(),
            success_rate,
            average_wait,
            self.arrival_rate(),
            self.available_mcs(),
            self.queue.len(),
        )
    }

    /// Zero the arrivals-in-window counter.
    ///
    /// Called by the orchestrator at window boundaries; the environment never
    /// resets itself.
    pub fn reset_window(&mut self) {
        self.arrivals_in_window = 0;
    }

    fn wait_stats(&self) -> (f64, f64) {
        if self.queue.is_empty() {
            return (0.0, 0.0);
        }
        let total: usize = self.queue.iter().map(|e| e.wait_time).sum();
        let max = self.queue.iter().map(|e| e.wait_time).max().unwrap_or(0);
        (total as f64 / self.queue.len() as f64, max as f64)
    }

    fn available_mcs(&self) -> usize {
        self.mcs_pool.iter().filter(|m| m.is_available()).count()
    }

    fn arrival_rate(&self) -> f64 {
        self.arrivals_in_window as f64 / self.clock.current_step().max(1) as f64
    }
}
