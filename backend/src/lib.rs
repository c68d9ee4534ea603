//! Dispatch Simulator Core - Rust Engine
//!
//! Two-tier simulator for mobile charging station (MCS) dispatch: per-region
//! edge environments make queue/dispatch decisions, a cloud environment
//! reallocates MCS capacity across regions, and a trainer drives rollout and
//! update cycles for both tiers at independent cadences.
//!
//! # Architecture
//!
//! - **core**: Discrete step clock and time-bin derivation
//! - **geo**: Haversine distance and ordered point-in-polygon region lookup
//! - **models**: Domain types (ChargeRequest, McsUnit, RegionSummary, events)
//! - **data**: Parsed input record shapes and validation
//! - **ev**: EV energy state machine producing charge request streams
//! - **edge**: Per-region queueing/dispatch environment
//! - **cloud**: Cross-region allocation environment
//! - **policy**: Edge/cloud decision capability traits plus baselines
//! - **orchestrator**: Multi-cadence trainer, rollout buffers, checkpoints
//!
//! # Critical Invariants
//!
//! 1. Region lookups are deterministic; boundary order breaks overlap ties
//! 2. Per-region queues never exceed their configured bound
//! 3. Allocation counts never go negative
//! 4. Wait times move by exactly +1 per step or reset to exactly 0

// Module declarations
pub mod cloud;
pub mod core;
pub mod data;
pub mod edge;
pub mod ev;
pub mod geo;
pub mod models;
pub mod orchestrator;
pub mod policy;

// Re-exports for convenience
pub use cloud::{AllocationAction, CloudConfig, CloudEnv, CloudObservation};
pub use edge::{DispatchDecision, EdgeConfig, EdgeEnv, EdgeObservation};
pub use ev::{EvConfig, EvEngine, RequestStream};
pub use geo::{haversine_km, GeoIndex, GeoPoint, RegionBoundary};
pub use models::{ChargeRequest, Event, EventLog, EventSink, RegionSummary, Trajectory};
pub use orchestrator::{
    RoundResult, SimulationConfig, SimulationError, Trainer, TrainerSnapshot, TrainingSchedule,
};
pub use policy::{CloudPolicy, EdgePolicy, FirstCandidatePolicy, GreedyWaitPolicy};
