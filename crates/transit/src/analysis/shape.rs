//! Route shape classification from raw waypoint geometry.
//!
//! Rules are evaluated in order and the first one that applies wins:
//! 1. fewer than three waypoints: insufficient data
//! 2. endpoints within the loop threshold: loop
//! 3. at least the configured number of sharp turns: zigzag
//! 4. otherwise: linear
//!
//! A sharp turn is an interior waypoint whose turn angle is strictly below
//! the angle threshold. The angle is measured between the incoming and
//! outgoing arms, so 180 degrees is straight travel and smaller is sharper.

use std::fmt;

use geo::Point;
use itertools::Itertools;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::identifiers::*;
use crate::models::types::*;
use crate::provider::TransitNetwork;
use crate::spatial::queries::{great_circle_distance, turn_angle};

/// Minimum number of waypoints needed to classify a shape.
pub const MIN_SHAPE_POINTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShapeClass {
    Loop,
    Zigzag,
    Linear,
    InsufficientData,
}

impl fmt::Display for ShapeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loop => "loop",
            Self::Zigzag => "zigzag",
            Self::Linear => "linear",
            Self::InsufficientData => "insufficient data",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShapeClassification {
    pub route_id: RouteIdentifier,
    pub direction: Direction,
    pub class: ShapeClass,
    /// Human-readable account of the measurements behind `class`
    pub comment: String,
    /// Great-circle distance between first and last waypoint, in meters
    pub endpoint_distance_m: Option<f64>,
    /// Only counted when the loop rule did not already apply
    pub sharp_turns: Option<usize>,
}

/// Classify every route variant of `network`, in network order.
pub fn classify_shapes(network: &TransitNetwork, config: &AnalysisConfig) -> Vec<ShapeClassification> {
    #[cfg(feature = "parallel")]
    let routes = network.routes().par_iter();
    #[cfg(not(feature = "parallel"))]
    let routes = network.routes().iter();

    routes.map(|route| classify_route(route, config)).collect()
}

/// Classify one route variant from its waypoints.
pub fn classify_route(route: &Route, config: &AnalysisConfig) -> ShapeClassification {
    let points: Vec<Point> = route.points().collect();

    let classification = |class, comment, endpoint_distance_m, sharp_turns| ShapeClassification {
        route_id: route.id.clone(),
        direction: route.direction,
        class,
        comment,
        endpoint_distance_m,
        sharp_turns,
    };

    if let Err(reason) = require_points(route, MIN_SHAPE_POINTS) {
        log::warn!("Cannot classify shape of route {}: {}", route.key(), reason);
        return classification(
            ShapeClass::InsufficientData,
            format!("fewer than {} points ({} given)", MIN_SHAPE_POINTS, points.len()),
            None,
            None,
        );
    }

    let (first, last) = (points[0], points[points.len() - 1]);
    let endpoint_distance = great_circle_distance(first, last, config.great_circle);

    if endpoint_distance <= config.loop_distance_threshold_m {
        return classification(
            ShapeClass::Loop,
            format!("endpoint distance {} m", endpoint_distance as u64),
            Some(endpoint_distance),
            None,
        );
    }

    let sharp_turns = count_sharp_turns(&points, config.zigzag_angle_threshold_deg);

    let (class, comment) = if sharp_turns >= config.zigzag_count_threshold {
        (
            ShapeClass::Zigzag,
            format!(
                "{} sharp turns < {}° (threshold {})",
                sharp_turns, config.zigzag_angle_threshold_deg, config.zigzag_count_threshold
            ),
        )
    } else {
        (
            ShapeClass::Linear,
            format!(
                "{} sharp turns, endpoint distance {} m",
                sharp_turns, endpoint_distance as u64
            ),
        )
    };

    log::debug!("Route {}: {} ({})", route.key(), class, comment);
    classification(class, comment, Some(endpoint_distance), Some(sharp_turns))
}

/// Number of interior waypoints with a turn angle below `angle_threshold_deg`.
pub fn count_sharp_turns(points: &[Point], angle_threshold_deg: f64) -> usize {
    points
        .iter()
        .tuple_windows()
        .filter(|&(&p1, &p2, &p3)| turn_angle(p1, p2, p3) < angle_threshold_deg)
        .count()
}
