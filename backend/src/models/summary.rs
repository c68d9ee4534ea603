//! Region summary model
//!
//! Summaries are derived views recomputed from current environment state on
//! every request; they are not persisted across windows. The cloud tier
//! consumes them when deciding capacity reallocation, and they are surfaced
//! verbatim to the observability sink.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Statistics a region reports up to the cloud tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Region identifier
    pub region_id: String,

    /// Service success rate. Fixed placeholder of 0.0 in the current
    /// implementation; kept for wire compatibility.
    pub success_rate: f64,

    /// Mean wait time over the entries currently queued (0 when empty)
    pub average_wait: f64,

    /// Arrivals in the current window divided by max(1, step count)
    pub arrival_rate: f64,

    /// Number of MCS units currently available
    pub available_mcs: usize,

    /// Number of entries currently queued
    pub queue_length: usize,

    /// Optional additional metrics
    #[serde(default)]
    pub extra_metrics: HashMap<String, f64>,
}

impl RegionSummary {
    /// Create a summary with no extra metrics.
    pub fn new(
        region_id: String,
        success_rate: f64,
        average_wait: f64,
        arrival_rate: f64,
        available_mcs: usize,
        queue_length: usize,
    ) -> Self {
        Self {
            region_id,
            success_rate,
            average_wait,
            arrival_rate,
            available_mcs,
            queue_length,
            extra_metrics: HashMap::new(),
        }
    }
}
