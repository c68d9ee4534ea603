//! Domain types shared across the simulation tiers.

pub mod event;
pub mod request;
pub mod station;
pub mod summary;
pub mod trajectory;

pub use event::{Event, EventLog, EventSink, NullSink};
pub use request::ChargeRequest;
pub use station::McsUnit;
pub use summary::RegionSummary;
pub use trajectory::{Trajectory, TrajectoryPoint};
