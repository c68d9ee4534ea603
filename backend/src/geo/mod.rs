//! Geographic primitives: great-circle distance and region resolution.
//!
//! Regions are simple polygons held in a fixed order by [`GeoIndex`]. The
//! order matters: when boundaries overlap, [`GeoIndex::locate`] returns the
//! first match in stored order, so lookups are deterministic by construction.
//!
//! # Critical Invariants
//!
//! 1. All coordinates entering the index are finite (validated at construction)
//! 2. Repeated `locate` calls with an unchanged index return the same result
//! 3. Containment ties are broken by stored region order, never arbitrarily

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometers, as used by the haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A (longitude, latitude) pair in degrees.
///
/// # Example
/// ```
/// use dispatch_simulator_core_rs::geo::GeoPoint;
///
/// let p = GeoPoint::new(116.39, 39.91);
/// assert!(p.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl GeoPoint {
    /// Create a new point from longitude and latitude in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

/// Errors raised while building geographic inputs.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("region {region_id} has a non-finite coordinate")]
    NonFiniteCoordinate { region_id: String },

    #[error("region {region_id} ring has {vertices} vertices, need at least 3")]
    DegenerateRing { region_id: String, vertices: usize },

    #[error("feature is missing an 'id' or 'region' property")]
    MissingRegionId,

    #[error("unsupported geometry type: {found}")]
    UnsupportedGeometry { found: String },

    #[error("malformed GeoJSON: {0}")]
    MalformedGeoJson(String),
}

/// Great-circle distance between two points in kilometers.
///
/// Standard haversine:
/// `6371 × 2·asin(√(sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)))`
///
/// # Example
/// ```
/// use dispatch_simulator_core_rs::geo::{haversine_km, GeoPoint};
///
/// let a = GeoPoint::new(0.0, 0.0);
/// assert_eq!(haversine_km(a, a), 0.0);
/// ```
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().asin()
}

/// A region identifier with its polygon boundary.
///
/// The boundary is an exterior ring of at least 3 vertices. A closing vertex
/// equal to the first (as GeoJSON rings carry) is accepted and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBoundary {
    region_id: String,
    ring: Vec<GeoPoint>,
}

impl RegionBoundary {
    /// Create a boundary, validating the ring.
    ///
    /// # Errors
    ///
    /// * `GeoError::NonFiniteCoordinate` if any vertex is NaN or infinite
    /// * `GeoError::DegenerateRing` if fewer than 3 distinct vertices remain
    pub fn new(region_id: impl Into<String>, mut ring: Vec<GeoPoint>) -> Result<Self, GeoError> {
        let region_id = region_id.into();

        // GeoJSON rings repeat the first vertex at the end
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        if ring.iter().any(|p| !p.is_finite()) {
            return Err(GeoError::NonFiniteCoordinate { region_id });
        }
        if ring.len() < 3 {
            return Err(GeoError::DegenerateRing {
                region_id,
                vertices: ring.len(),
            });
        }

        Ok(Self { region_id, ring })
    }

    /// Get the region identifier
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Get the exterior ring vertices
    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// Test whether the point lies inside the ring (even-odd rule).
    ///
    /// Ray casting against each edge; points exactly on an edge may resolve
    /// to either side, which callers accept for boundary-partition lookups.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let mut inside = false;
        let n = self.ring.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = self.ring[i];
            let b = self.ring[j];
            if (a.lat > point.lat) != (b.lat > point.lat)
                && point.lon < (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Ordered set of region boundaries with first-match point lookup.
///
/// # Example
/// ```
/// use dispatch_simulator_core_rs::geo::{GeoIndex, GeoPoint, RegionBoundary};
///
/// let square = vec![
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(1.0, 0.0),
///     GeoPoint::new(1.0, 1.0),
///     GeoPoint::new(0.0, 1.0),
/// ];
/// let index = GeoIndex::new(vec![RegionBoundary::new("R1", square).unwrap()]);
///
/// assert_eq!(index.locate(GeoPoint::new(0.5, 0.5)), Some("R1"));
/// assert_eq!(index.locate(GeoPoint::new(2.0, 2.0)), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeoIndex {
    regions: Vec<RegionBoundary>,
}

impl GeoIndex {
    /// Build an index from boundaries, preserving their order.
    pub fn new(regions: Vec<RegionBoundary>) -> Self {
        Self { regions }
    }

    /// Resolve a point to the first containing region in stored order.
    ///
    /// Returns `None` when no region contains the point.
    pub fn locate(&self, point: GeoPoint) -> Option<&str> {
        self.regions
            .iter()
            .find(|region| region.contains(point))
            .map(|region| region.region_id())
    }

    /// Region identifiers in stored order.
    pub fn region_ids(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.region_id()).collect()
    }

    /// Get all boundaries in stored order
    pub fn regions(&self) -> &[RegionBoundary] {
        &self.regions
    }

    /// Get the number of regions in the index
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if the index holds no regions
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Parse a GeoJSON FeatureCollection of polygons into an index.
    ///
    /// Each feature needs a Polygon geometry and an `id` property (falling
    /// back to `region`); string and numeric property values are accepted.
    /// Feature order in the file becomes the containment tie-break order.
    ///
    /// # Errors
    ///
    /// * `GeoError::MalformedGeoJson` if the document is not a FeatureCollection
    /// * `GeoError::MissingRegionId` if a feature has neither property
    /// * `GeoError::UnsupportedGeometry` for non-Polygon geometries
    /// * ring validation errors from [`RegionBoundary::new`]
    pub fn from_geojson_str(geojson: &str) -> Result<Self, GeoError> {
        let doc: serde_json::Value = serde_json::from_str(geojson)
            .map_err(|e| GeoError::MalformedGeoJson(e.to_string()))?;

        let features = doc
            .get("features")
            .and_then(|f| f.as_array())
            .ok_or_else(|| GeoError::MalformedGeoJson("missing 'features' array".to_string()))?;

        let mut regions = Vec::with_capacity(features.len());
        for feature in features {
            let properties = feature.get("properties");
            let region_id = properties
                .and_then(|p| p.get("id").or_else(|| p.get("region")))
                .and_then(property_as_string)
                .ok_or(GeoError::MissingRegionId)?;

            let geometry = feature
                .get("geometry")
                .ok_or_else(|| GeoError::MalformedGeoJson("feature without geometry".to_string()))?;
            let geometry_type = geometry
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("<missing>");
            if geometry_type != "Polygon" {
                return Err(GeoError::UnsupportedGeometry {
                    found: geometry_type.to_string(),
                });
            }

            let exterior = geometry
                .get("coordinates")
                .and_then(|c| c.as_array())
                .and_then(|rings| rings.first())
                .and_then(|ring| ring.as_array())
                .ok_or_else(|| {
                    GeoError::MalformedGeoJson("polygon without exterior ring".to_string())
                })?;

            let mut ring = Vec::with_capacity(exterior.len());
            for position in exterior {
                let pair = position.as_array().ok_or_else(|| {
                    GeoError::MalformedGeoJson("ring position is not an array".to_string())
                })?;
                let lon = pair.first().and_then(|v| v.as_f64());
                let lat = pair.get(1).and_then(|v| v.as_f64());
                match (lon, lat) {
                    (Some(lon), Some(lat)) => ring.push(GeoPoint::new(lon, lat)),
                    _ => {
                        return Err(GeoError::MalformedGeoJson(
                            "ring position is not a numeric pair".to_string(),
                        ))
                    }
                }
            }

            regions.push(RegionBoundary::new(region_id, ring)?);
        }

        Ok(Self::new(regions))
    }
}

fn property_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
