//! Event recording for training-run observability.
//!
//! The trainer does not log through a global logger. It records structured
//! [`Event`] values into an [`EventSink`] injected at construction. The
//! default sink is the in-memory [`EventLog`], which supports querying by
//! round, region, and event type; external collaborators can supply their own
//! sink to forward events elsewhere.
//!
//! # Event Types
//!
//! - **RequestRouted**: a charge request reached its region's queue
//! - **EdgeRollout / CloudRollout**: one observe → act → step cycle completed
//! - **SummaryReported**: a region summary was uploaded to the cloud tier
//! - **EdgePolicyUpdate / CloudPolicyUpdate**: a policy consumed its buffer
//! - **WindowReset**: arrival windows were reset after a cloud rollout
//! - **EvaluationCheckpoint / SaveCheckpoint**: cadence markers for external
//!   evaluators and persisters

use std::any::Any;
use std::collections::HashMap;

use crate::models::summary::RegionSummary;

/// Training-run event capturing one observable state change.
///
/// All events include the round counter for temporal ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A charge request was enqueued into its region's environment
    RequestRouted {
        round: usize,
        region_id: String,
        request_id: String,
    },

    /// One edge rollout completed for a region
    EdgeRollout {
        round: usize,
        region_id: String,
        reward: f64,
        queue_length: usize,
    },

    /// One cloud rollout completed
    CloudRollout {
        round: usize,
        reward: f64,
        regions: usize,
    },

    /// A region summary was uploaded for a cloud rollout
    SummaryReported {
        round: usize,
        summary: RegionSummary,
    },

    /// An edge policy consumed its rollout buffer
    EdgePolicyUpdate {
        round: usize,
        region_id: String,
        metrics: HashMap<String, f64>,
    },

    /// The cloud policy consumed its rollout buffer
    CloudPolicyUpdate {
        round: usize,
        metrics: HashMap<String, f64>,
    },

    /// Arrival windows were reset across all regions
    WindowReset { round: usize, regions: usize },

    /// Cadence marker for the external evaluator
    EvaluationCheckpoint { round: usize },

    /// Cadence marker for the external checkpoint persister
    SaveCheckpoint { round: usize },
}

impl Event {
    /// Get the round counter at which this event occurred
    pub fn round(&self) -> usize {
        match self {
            Event::RequestRouted { round, .. } => *round,
            Event::EdgeRollout { round, .. } => *round,
            Event::CloudRollout { round, .. } => *round,
            Event::SummaryReported { round, .. } => *round,
            Event::EdgePolicyUpdate { round, .. } => *round,
            Event::CloudPolicyUpdate { round, .. } => *round,
            Event::WindowReset { round, .. } => *round,
            Event::EvaluationCheckpoint { round } => *round,
            Event::SaveCheckpoint { round } => *round,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::RequestRouted { .. } => "RequestRouted",
            Event::EdgeRollout { .. } => "EdgeRollout",
            Event::CloudRollout { .. } => "CloudRollout",
            Event::SummaryReported { .. } => "SummaryReported",
            Event::EdgePolicyUpdate { .. } => "EdgePolicyUpdate",
            Event::CloudPolicyUpdate { .. } => "CloudPolicyUpdate",
            Event::WindowReset { .. } => "WindowReset",
            Event::EvaluationCheckpoint { .. } => "EvaluationCheckpoint",
            Event::SaveCheckpoint { .. } => "SaveCheckpoint",
        }
    }

    /// Get the region ID if the event relates to a specific region
    pub fn region_id(&self) -> Option<&str> {
        match self {
            Event::RequestRouted { region_id, .. } => Some(region_id),
            Event::EdgeRollout { region_id, .. } => Some(region_id),
            Event::SummaryReported { summary, .. } => Some(&summary.region_id),
            Event::EdgePolicyUpdate { region_id, .. } => Some(region_id),
            _ => None,
        }
    }
}

/// Destination for trainer events.
///
/// `as_any` enables downcasting a boxed sink back to its concrete type, the
/// usual way to reach an [`EventLog`] owned by a trainer.
pub trait EventSink {
    /// Record one event
    fn record(&mut self, event: Event);

    /// Enable downcasting to the concrete sink type
    fn as_any(&self) -> &dyn Any;
}

/// Event sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: Event) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory event log with simple query helpers.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events recorded at a specific round
    pub fn events_at_round(&self, round: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.round() == round).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific region
    pub fn events_for_region(&self, region_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.region_id() == Some(region_id))
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
