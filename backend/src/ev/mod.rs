//! EV energy state machine and charge request generation.
//!
//! The engine walks a vehicle's trajectory segment by segment, depleting the
//! state of charge (SoC) by distance travelled, and raises a [`ChargeRequest`]
//! at every segment end where SoC sits at or below the configured threshold.
//! There is no suppression: a vehicle that stays below threshold keeps raising
//! requests until its trajectory ends.
//!
//! Requests come out of a [`RequestStream`]: a lazy, finite, single-pass
//! iterator. It cannot be rewound; rebuilding it from the same trajectory
//! input is the only way to replay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{haversine_km, GeoIndex, GeoPoint};
use crate::models::{ChargeRequest, Trajectory, TrajectoryPoint};

/// Configuration for EV energy consumption and charge request rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvConfig {
    /// Energy drawn per kilometer travelled (kWh/km)
    pub energy_kwh_per_km: f64,

    /// SoC at or below which a segment end raises a charge request
    pub soc_threshold: f64,

    /// Usable battery capacity (kWh)
    pub battery_capacity_kwh: f64,

    /// Trajectory sampling resolution in minutes
    pub timestep_minutes: u32,
}

impl Default for EvConfig {
    fn default() -> Self {
        Self {
            energy_kwh_per_km: 0.18,
            soc_threshold: 0.2,
            battery_capacity_kwh: 80.0,
            timestep_minutes: 5,
        }
    }
}

/// Errors raised when building a request stream.
#[derive(Debug, Error, PartialEq)]
pub enum EvError {
    #[error("invalid EV config: {0}")]
    InvalidConfig(String),

    #[error("trajectory {vehicle_id} point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { vehicle_id: String, index: usize },
}

/// Approximate energy needed to travel the polyline connecting the points.
pub fn estimate_energy_kwh(points: &[TrajectoryPoint], energy_per_km: f64) -> f64 {
    points
        .windows(2)
        .map(|pair| {
            haversine_km(
                GeoPoint::new(pair[0].lon, pair[0].lat),
                GeoPoint::new(pair[1].lon, pair[1].lat),
            ) * energy_per_km
        })
        .sum()
}

/// Drives vehicles along their trajectories and emits charge requests.
///
/// # Example
/// ```
/// use dispatch_simulator_core_rs::ev::{EvConfig, EvEngine};
/// use dispatch_simulator_core_rs::geo::GeoIndex;
/// use dispatch_simulator_core_rs::models::Trajectory;
///
/// let engine = EvEngine::new(EvConfig::default());
/// let geo = GeoIndex::new(vec![]);
/// let trajectories: Vec<Trajectory> = vec![];
///
/// let stream = engine.stream(&trajectories, &geo).unwrap();
/// assert_eq!(stream.count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct EvEngine {
    config: EvConfig,
}

impl EvEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EvConfig) -> Self {
        Self { config }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EvConfig {
        &self.config
    }

    /// Build the lazy request stream over a batch of trajectories.
    ///
    /// Vehicles are consumed in input order; vehicles without points yield
    /// nothing. All coordinates and the configuration are validated eagerly
    /// so the lazy walk never feeds a non-finite value into a distance or
    /// SoC computation.
    ///
    /// # Errors
    ///
    /// * `EvError::InvalidConfig` for non-positive battery capacity or
    ///   non-finite consumption/threshold values
    /// * `EvError::NonFiniteCoordinate` for any NaN or infinite sample
    pub fn stream<'a>(
        &self,
        trajectories: &'a [Trajectory],
        geo: &'a GeoIndex,
    ) -> Result<RequestStream<'a>, EvError> {
        self.validate()?;
        for trajectory in trajectories {
            for (index, point) in trajectory.points.iter().enumerate() {
                if !point.lon.is_finite() || !point.lat.is_finite() {
                    return Err(EvError::NonFiniteCoordinate {
                        vehicle_id: trajectory.vehicle_id.clone(),
                        index,
                    });
                }
            }
        }

        Ok(RequestStream {
            config: self.config.clone(),
            geo,
            trajectories,
            vehicle_idx: 0,
            point_idx: 1,
            soc: FULL_SOC,
        })
    }

    fn validate(&self) -> Result<(), EvError> {
        if !self.config.battery_capacity_kwh.is_finite() || self.config.battery_capacity_kwh <= 0.0
        {
            return Err(EvError::InvalidConfig(format!(
                "battery_capacity_kwh must be positive, got {}",
                self.config.battery_capacity_kwh
            )));
        }
        if !self.config.energy_kwh_per_km.is_finite() || self.config.energy_kwh_per_km < 0.0 {
            return Err(EvError::InvalidConfig(format!(
                "energy_kwh_per_km must be non-negative, got {}",
                self.config.energy_kwh_per_km
            )));
        }
        if !self.config.soc_threshold.is_finite() {
            return Err(EvError::InvalidConfig(
                "soc_threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

const FULL_SOC: f64 = 1.0;

/// Lazy single-pass iterator over the charge requests of a trajectory batch.
///
/// Finite by construction: each trajectory segment is visited exactly once.
#[derive(Debug)]
pub struct RequestStream<'a> {
    config: EvConfig,
    geo: &'a GeoIndex,
    trajectories: &'a [Trajectory],
    /// Index of the vehicle currently being walked
    vehicle_idx: usize,
    /// Index of the next segment-end point within the current trajectory
    point_idx: usize,
    /// SoC of the current vehicle, normalized to [0, 1]
    soc: f64,
}

impl Iterator for RequestStream<'_> {
    type Item = ChargeRequest;

    fn next(&mut self) -> Option<ChargeRequest> {
        while self.vehicle_idx < self.trajectories.len() {
            let trajectory = &self.trajectories[self.vehicle_idx];
            if self.point_idx >= trajectory.points.len() {
                // current vehicle exhausted (or had no segments): next one,
                // fresh battery
                self.vehicle_idx += 1;
                self.point_idx = 1;
                self.soc = FULL_SOC;
                continue;
            }

            let prev = &trajectory.points[self.point_idx - 1];
            let end = &trajectory.points[self.point_idx];
            self.point_idx += 1;

            let distance = haversine_km(
                GeoPoint::new(prev.lon, prev.lat),
                GeoPoint::new(end.lon, end.lat),
            );
            let energy_used = distance * self.config.energy_kwh_per_km;
            self.soc = (self.soc - energy_used / self.config.battery_capacity_kwh).max(0.0);

            if self.soc <= self.config.soc_threshold {
                let location = GeoPoint::new(end.lon, end.lat);
                let region_id = self.geo.locate(location).map(str::to_string);
                return Some(ChargeRequest::new(
                    trajectory.vehicle_id.clone(),
                    location,
                    region_id,
                    end.timestamp.clone(),
                    self.soc,
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::RegionBoundary;

    // Points one degree of longitude apart on the equator are ~111.19 km
    // apart; with the default config each segment costs ~0.25 SoC.
    fn equator_trajectory(vehicle_id: &str, num_points: usize) -> Trajectory {
        let points = (0..num_points)
            .map(|i| TrajectoryPoint::new(format!("t{}", i), i as f64, 0.0))
            .collect();
        Trajectory::new(vehicle_id, points)
    }

    fn empty_geo() -> GeoIndex {
        GeoIndex::new(vec![])
    }

    #[test]
    fn test_request_emitted_when_soc_crosses_threshold() {
        let engine = EvEngine::new(EvConfig::default());
        let trajectories = vec![equator_trajectory("v1", 5)];
        let geo = empty_geo();

        let requests: Vec<_> = engine.stream(&trajectories, &geo).unwrap().collect();

        // Segments 1-3 leave SoC at ~0.75 / ~0.50 / ~0.25; segment 4 clamps
        // to 0.0 and is the only emission.
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].vehicle_id(), "v1");
        assert_eq!(requests[0].timestamp(), "t4");
        assert_eq!(requests[0].soc(), 0.0);
    }

    #[test]
    fn test_repeated_emission_below_threshold() {
        let engine = EvEngine::new(EvConfig::default());
        let trajectories = vec![equator_trajectory("v1", 7)];
        let geo = empty_geo();

        let requests: Vec<_> = engine.stream(&trajectories, &geo).unwrap().collect();

        // SoC reaches 0 on segment 4 and every later segment end re-emits.
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.soc() == 0.0));
    }

    #[test]
    fn test_no_emission_above_threshold() {
        let engine = EvEngine::new(EvConfig::default());
        let trajectories = vec![equator_trajectory("v1", 3)];
        let geo = empty_geo();

        assert_eq!(engine.stream(&trajectories, &geo).unwrap().count(), 0);
    }

    #[test]
    fn test_soc_floor_at_zero() {
        let config = EvConfig {
            soc_threshold: 1.0,
            ..EvConfig::default()
        };
        let engine = EvEngine::new(config);
        let trajectories = vec![equator_trajectory("v1", 8)];
        let geo = empty_geo();

        let requests: Vec<_> = engine.stream(&trajectories, &geo).unwrap().collect();
        assert_eq!(requests.len(), 7);
        for pair in requests.windows(2) {
            assert!(pair[1].soc() <= pair[0].soc(), "SoC must be non-increasing");
        }
        assert!(requests.iter().all(|r| r.soc() >= 0.0));
    }

    #[test]
    fn test_vehicles_concatenated_and_empty_skipped() {
        let engine = EvEngine::new(EvConfig::default());
        let trajectories = vec![
            equator_trajectory("v1", 5),
            Trajectory::new("empty", vec![]),
            equator_trajectory("v3", 5),
        ];
        let geo = empty_geo();

        let requests: Vec<_> = engine.stream(&trajectories, &geo).unwrap().collect();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].vehicle_id(), "v1");
        assert_eq!(requests[1].vehicle_id(), "v3");
    }

    #[test]
    fn test_region_resolved_at_segment_end() {
        let boundary = RegionBoundary::new(
            "R4",
            vec![
                GeoPoint::new(3.5, -0.5),
                GeoPoint::new(4.5, -0.5),
                GeoPoint::new(4.5, 0.5),
                GeoPoint::new(3.5, 0.5),
            ],
        )
        .unwrap();
        let geo = GeoIndex::new(vec![boundary]);
        let engine = EvEngine::new(EvConfig::default());
        let trajectories = vec![equator_trajectory("v1", 5)];

        let requests: Vec<_> = engine.stream(&trajectories, &geo).unwrap().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].region_id(), Some("R4"));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let engine = EvEngine::new(EvConfig::default());
        let trajectories = vec![Trajectory::new(
            "v1",
            vec![
                TrajectoryPoint::new("t0", 0.0, 0.0),
                TrajectoryPoint::new("t1", f64::NAN, 0.0),
            ],
        )];
        let geo = empty_geo();

        assert_eq!(
            engine.stream(&trajectories, &geo).unwrap_err(),
            EvError::NonFiniteCoordinate {
                vehicle_id: "v1".to_string(),
                index: 1
            }
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = EvConfig {
            battery_capacity_kwh: 0.0,
            ..EvConfig::default()
        };
        let engine = EvEngine::new(config);
        let geo = empty_geo();

        assert!(matches!(
            engine.stream(&[], &geo),
            Err(EvError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_estimate_energy_matches_segment_sum() {
        let trajectory = equator_trajectory("v1", 3);
        let energy = estimate_energy_kwh(&trajectory.points, 0.18);
        // two ~111.19 km segments at 0.18 kWh/km
        assert!((energy - 2.0 * 111.19 * 0.18).abs() < 0.1, "got {}", energy);
    }
}
