//! Training orchestration: multi-cadence rollout/update loop.

pub mod buffer;
pub mod checkpoint;
pub mod engine;

pub use buffer::RolloutBuffer;
pub use checkpoint::{
    compute_config_hash, validate_snapshot, CloudSnapshot, EdgeEnvSnapshot, TrainerSnapshot,
};
pub use engine::{RoundResult, SimulationConfig, SimulationError, Trainer, TrainingSchedule};
