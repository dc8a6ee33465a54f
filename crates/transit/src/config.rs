//! Tunable thresholds for one analysis pass.
//!
//! Every value can be overridden per invocation. With the `serde` feature a
//! partial document only overrides the fields it names.

use crate::models::types::{Result, TransitError};
use crate::spatial::queries::{meters_to_degrees, DEFAULT_METERS_PER_DEGREE};

/// Formula used for point-to-point distances on the Earth's surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GreatCircleMethod {
    /// Spherical haversine distance.
    #[default]
    Haversine,
    /// Ellipsoidal (WGS-84) geodesic distance.
    Geodesic,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Maximum stop-to-route distance for a match, in meters.
    pub proximity_threshold_m: f64,
    /// Maximum endpoint separation for a route to count as a loop, in meters.
    pub loop_distance_threshold_m: f64,
    /// Turn angles strictly below this count as sharp turns, in degrees.
    pub zigzag_angle_threshold_deg: f64,
    /// Number of sharp turns that makes a route a zigzag.
    pub zigzag_count_threshold: usize,
    /// Conversion factor from planar degree distances to meters.
    pub meters_per_degree: f64,
    /// Containment percentage at which a route pair is flagged duplicate.
    pub duplicate_threshold_percent: f64,
    pub great_circle: GreatCircleMethod,
    /// Upper edges of the route length bands, in kilometers.
    pub length_band_edges_km: Vec<f64>,
    /// Upper edges of the stop spacing bands, in meters.
    pub spacing_band_edges_m: Vec<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: 50.0,
            loop_distance_threshold_m: 500.0,
            zigzag_angle_threshold_deg: 60.0,
            zigzag_count_threshold: 5,
            meters_per_degree: DEFAULT_METERS_PER_DEGREE,
            duplicate_threshold_percent: 50.0,
            great_circle: GreatCircleMethod::Haversine,
            length_band_edges_km: vec![10.0, 25.0, 35.0, 50.0],
            spacing_band_edges_m: vec![300.0, 500.0],
        }
    }
}

impl AnalysisConfig {
    /// Reject thresholds that would make the pass meaningless.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("proximity_threshold_m", self.proximity_threshold_m),
            ("loop_distance_threshold_m", self.loop_distance_threshold_m),
            ("zigzag_angle_threshold_deg", self.zigzag_angle_threshold_deg),
            ("meters_per_degree", self.meters_per_degree),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TransitError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.zigzag_angle_threshold_deg > 180.0 {
            return Err(TransitError::InvalidConfig(format!(
                "zigzag_angle_threshold_deg must not exceed 180, got {}",
                self.zigzag_angle_threshold_deg
            )));
        }

        if !(0.0..=100.0).contains(&self.duplicate_threshold_percent) {
            return Err(TransitError::InvalidConfig(format!(
                "duplicate_threshold_percent must be within [0, 100], got {}",
                self.duplicate_threshold_percent
            )));
        }

        check_band_edges("length_band_edges_km", &self.length_band_edges_km)?;
        check_band_edges("spacing_band_edges_m", &self.spacing_band_edges_m)?;

        Ok(())
    }

    /// Proximity threshold expressed in planar degrees.
    pub fn proximity_threshold_deg(&self) -> f64 {
        meters_to_degrees(self.proximity_threshold_m, self.meters_per_degree)
    }
}

fn check_band_edges(name: &str, edges: &[f64]) -> Result<()> {
    if edges.iter().any(|edge| !edge.is_finite()) {
        return Err(TransitError::InvalidConfig(format!(
            "{} contains a non-finite edge",
            name
        )));
    }
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(TransitError::InvalidConfig(format!(
            "{} must be strictly increasing",
            name
        )));
    }
    Ok(())
}
