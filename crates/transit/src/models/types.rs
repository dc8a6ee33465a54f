//! Core data types and enums for transit network analysis.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use geo::{Coord, LineString, Point};

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Travel direction of a route variant.
///
/// Loaders default a missing direction to [`Direction::Forward`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            other => Err(TransitError::InvalidData(format!(
                "Unknown direction '{}', expected 'forward' or 'backward'",
                other
            ))),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Key of one route variant: a route identifier travelled in one direction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteKey {
    pub route_id: RouteIdentifier,
    pub direction: Direction,
}

impl RouteKey {
    pub fn new(route_id: RouteIdentifier, direction: Direction) -> Self {
        Self {
            route_id,
            direction,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.route_id, self.direction)
    }
}

/// One direction of a route as an ordered waypoint path.
///
/// Coordinates are `x = longitude`, `y = latitude`. The order of the
/// waypoints is the physical order of travel and is never re-sorted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub id: RouteIdentifier,
    #[cfg_attr(feature = "serde", serde(default))]
    pub direction: Direction,
    pub geometry: LineString,
}

impl Route {
    pub fn new(
        id: impl Into<RouteIdentifier>,
        direction: Direction,
        points: impl IntoIterator<Item = Point>,
    ) -> Self {
        Self {
            id: id.into(),
            direction,
            geometry: points.into_iter().map(Coord::from).collect(),
        }
    }

    /// Build a route from `(latitude, longitude)` pairs, the order tabular
    /// sources usually list them in.
    pub fn from_lat_lon(
        id: impl Into<RouteIdentifier>,
        direction: Direction,
        waypoints: &[(f64, f64)],
    ) -> Self {
        Self::new(
            id,
            direction,
            waypoints.iter().map(|&(lat, lon)| Point::new(lon, lat)),
        )
    }

    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.id.clone(), self.direction)
    }

    pub fn point_count(&self) -> usize {
        self.geometry.0.len()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.geometry.points()
    }
}

/// A boarding location.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    pub id: StopIdentifier,
    pub name: Arc<str>,
    pub location: Point,
}

impl Stop {
    pub fn new(id: impl Into<StopIdentifier>, name: impl AsRef<str>, location: Point) -> Self {
        Self {
            id: id.into(),
            name: name.as_ref().into(),
            location,
        }
    }

    pub fn from_lat_lon(
        id: impl Into<StopIdentifier>,
        name: impl AsRef<str>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self::new(id, name, Point::new(longitude, latitude))
    }
}

/// Analysis stage a unit of work belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Stage {
    Matching,
    Sequencing,
    ShapeClassification,
}

/// A route variant a stage could not process, with the reason.
///
/// Skipping is local to the unit; the rest of the pass still completes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkippedUnit {
    pub route_id: RouteIdentifier,
    pub direction: Direction,
    pub stage: Stage,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_display"))]
    pub reason: TransitError,
}

#[cfg(feature = "serde")]
fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TransitError {
    #[error("Route {route} ({direction}) has {points} points, at least {required} required")]
    MalformedInput {
        route: RouteIdentifier,
        direction: Direction,
        points: usize,
        required: usize,
    },

    #[error("Duplicate stop identifier: {0}")]
    DuplicateStop(StopIdentifier),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;

/// Check that a route variant has at least `required` waypoints.
pub(crate) fn require_points(route: &Route, required: usize) -> Result<()> {
    let points = route.point_count();
    if points < required {
        return Err(TransitError::MalformedInput {
            route: route.id.clone(),
            direction: route.direction,
            points,
            required,
        });
    }
    Ok(())
}
