//! Mobile charging station model
//!
//! One unit exists per candidate dispatch point of a region, created at
//! environment construction and never destroyed. Assignment is the only
//! operation that mutates a unit: it relocates the unit to the target point.
//! No cooldown or busy period is modeled, so units stay available.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A mobile charging station unit owned by one region's environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McsUnit {
    location: GeoPoint,
    available: bool,
}

impl McsUnit {
    /// Create a unit at the given location, available for assignment.
    pub fn new(location: GeoPoint) -> Self {
        Self {
            location,
            available: true,
        }
    }

    /// Restore a unit with an explicit availability flag (snapshot loading).
    pub fn with_availability(location: GeoPoint, available: bool) -> Self {
        Self {
            location,
            available,
        }
    }

    /// Get the unit's current location
    pub fn location(&self) -> GeoPoint {
        self.location
    }

    /// Check whether the unit can take an assignment
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Move the unit to a dispatch target. The unit remains available.
    pub fn relocate(&mut self, target: GeoPoint) {
        self.location = target;
    }
}
