//! Charge request model
//!
//! A charge request is produced by the EV engine when a vehicle's state of
//! charge drops to the configured threshold, and consumed once by being
//! enqueued into the owning region's environment. Requests are immutable
//! after creation.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A request for mobile charging service at a fixed location.
///
/// # Example
/// ```
/// use dispatch_simulator_core_rs::geo::GeoPoint;
/// use dispatch_simulator_core_rs::models::ChargeRequest;
///
/// let request = ChargeRequest::new(
///     "veh_042".to_string(),
///     GeoPoint::new(116.39, 39.91),
///     Some("R1".to_string()),
///     "2023-04-01T08:05:00".to_string(),
///     0.18,
/// );
///
/// assert_eq!(request.vehicle_id(), "veh_042");
/// assert_eq!(request.region_id(), Some("R1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Unique request identifier (UUID)
    id: String,

    /// Vehicle that raised the request
    vehicle_id: String,

    /// Location of the vehicle when the request was raised
    location: GeoPoint,

    /// Region resolved for the location, if any boundary contained it
    region_id: Option<String>,

    /// Trajectory timestamp at which the request was raised
    timestamp: String,

    /// State of charge at creation, normalized to [0, 1]
    soc: f64,
}

impl ChargeRequest {
    /// Create a new charge request.
    ///
    /// # Panics
    /// Panics if `soc` is not a finite number.
    pub fn new(
        vehicle_id: String,
        location: GeoPoint,
        region_id: Option<String>,
        timestamp: String,
        soc: f64,
    ) -> Self {
        assert!(soc.is_finite(), "soc must be finite");
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vehicle_id,
            location,
            region_id,
            timestamp,
            soc,
        }
    }

    /// Get the request identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the vehicle identifier
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    /// Get the request location
    pub fn location(&self) -> GeoPoint {
        self.location
    }

    /// Get the resolved region identifier, if any
    pub fn region_id(&self) -> Option<&str> {
        self.region_id.as_deref()
    }

    /// Get the trajectory timestamp
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Get the state of charge at creation
    pub fn soc(&self) -> f64 {
        self.soc
    }
}
