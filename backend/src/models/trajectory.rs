//! Vehicle trajectory shapes
//!
//! Trajectories arrive from external storage; only their in-memory shape is
//! owned here. Points are ordered by time and consecutive pairs represent one
//! movement segment at the trajectory's sampling resolution.

use serde::{Deserialize, Serialize};

/// A single timestamped position sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Sample timestamp, carried through opaquely
    pub timestamp: String,
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl TrajectoryPoint {
    /// Create a new trajectory point.
    pub fn new(timestamp: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            lon,
            lat,
        }
    }
}

/// An ordered sequence of position samples for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Vehicle identifier
    pub vehicle_id: String,
    /// Position samples in time order
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    /// Create a new trajectory.
    pub fn new(vehicle_id: impl Into<String>, points: Vec<TrajectoryPoint>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            points,
        }
    }
}
