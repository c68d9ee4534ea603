//! Input record shapes for dispatch points.
//!
//! Reading files is an external collaborator's job; this module owns the
//! parsed record shape and the pure shaping steps that follow: filtering a
//! region's candidate points and validating coordinates before they reach
//! any distance computation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoPoint;

/// Errors raised while validating parsed input records.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("dispatch point {index} has a non-finite coordinate")]
    NonFiniteDispatchPoint { index: usize },
}

/// One dispatch point row: a location plus an optional region tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPointRecord {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Region tag; `None` means the point serves any region
    #[serde(default)]
    pub region: Option<String>,
}

impl DispatchPointRecord {
    /// Create a new record.
    pub fn new(lon: f64, lat: f64, region: Option<String>) -> Self {
        Self { lon, lat, region }
    }
}

/// Validate that every record carries finite coordinates.
///
/// Called once at ingestion so downstream reward and distance computations
/// never see NaN or infinite values.
pub fn validate_dispatch_points(records: &[DispatchPointRecord]) -> Result<(), DataError> {
    for (index, record) in records.iter().enumerate() {
        if !record.lon.is_finite() || !record.lat.is_finite() {
            return Err(DataError::NonFiniteDispatchPoint { index });
        }
    }
    Ok(())
}

/// Select a region's candidate points: records tagged with the region id or
/// carrying no tag at all, in input order.
pub fn region_candidates(records: &[DispatchPointRecord], region_id: &str) -> Vec<GeoPoint> {
    records
        .iter()
        .filter(|r| match r.region.as_deref() {
            None | Some("") => true,
            Some(tag) => tag == region_id,
        })
        .map(|r| GeoPoint::new(r.lon, r.lat))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_candidates_matches_tag_or_untagged() {
        let records = vec![
            DispatchPointRecord::new(0.1, 0.1, Some("A".to_string())),
            DispatchPointRecord::new(0.2, 0.2, Some("B".to_string())),
            DispatchPointRecord::new(0.3, 0.3, None),
            DispatchPointRecord::new(0.4, 0.4, Some(String::new())),
        ];

        let candidates = region_candidates(&records, "A");
        assert_eq!(
            candidates,
            vec![
                GeoPoint::new(0.1, 0.1),
                GeoPoint::new(0.3, 0.3),
                GeoPoint::new(0.4, 0.4),
            ]
        );
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let records = vec![
            DispatchPointRecord::new(0.1, 0.1, None),
            DispatchPointRecord::new(f64::INFINITY, 0.2, None),
        ];

        assert_eq!(
            validate_dispatch_points(&records),
            Err(DataError::NonFiniteDispatchPoint { index: 1 })
        );
    }

    #[test]
    fn test_validate_accepts_finite() {
        let records = vec![DispatchPointRecord::new(0.1, 0.1, None)];
        assert_eq!(validate_dispatch_points(&records), Ok(()));
    }
}
