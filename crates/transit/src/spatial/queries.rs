//! Geometry primitives for distance, projection and turn-angle calculations.
//!
//! Two families of distance live here and must not be mixed up:
//! - planar distances measured directly in degrees of the `(longitude,
//!   latitude)` plane, converted to meters with a single fixed factor. This
//!   is only accurate near the equator and is used for stop-to-route
//!   proximity.
//! - great-circle distances between two points in meters, used for endpoint
//!   separation and stop-to-stop segment lengths.

use geo::{Coord, GeodesicDistance, HaversineDistance, Line, LineString, Point};

use crate::config::GreatCircleMethod;

/// Meters per degree derived from the Earth's mean radius.
pub const DEFAULT_METERS_PER_DEGREE: f64 = 111_139.0;

/// Closest approach of a point to a polyline, in planar degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolylineProjection {
    /// Minimum distance from the point to the polyline.
    pub distance_deg: f64,
    /// Arc length from the polyline start to the closest point.
    pub position: f64,
}

/// Project a point onto a polyline given in `(longitude, latitude)` order.
///
/// Returns `None` for an empty polyline. A single-vertex polyline degrades to
/// the distance to that vertex. Zero-length segments project onto their start.
/// When several segments are equally close the earliest one wins.
pub fn project_onto_polyline(point: Point, polyline: &LineString) -> Option<PolylineProjection> {
    let first = *polyline.0.first()?;

    let mut best = PolylineProjection {
        distance_deg: planar_distance(point.0, first),
        position: 0.0,
    };
    let mut travelled = 0.0;

    for segment in polyline.lines() {
        let (t, length) = segment_parameter(point.0, segment);
        let closest = Coord {
            x: segment.start.x + t * (segment.end.x - segment.start.x),
            y: segment.start.y + t * (segment.end.y - segment.start.y),
        };
        let distance = planar_distance(point.0, closest);

        if distance < best.distance_deg {
            best = PolylineProjection {
                distance_deg: distance,
                position: travelled + t * length,
            };
        }
        travelled += length;
    }

    Some(best)
}

/// Parameter in `[0, 1]` of the closest point on `segment`, and its length.
fn segment_parameter(p: Coord, segment: Line) -> (f64, f64) {
    let ab = segment.end - segment.start;
    let ap = p - segment.start;

    let ab_ab = ab.x * ab.x + ab.y * ab.y;
    if ab_ab == 0.0 {
        // Segment is actually a point
        return (0.0, 0.0);
    }

    let t = ((ab.x * ap.x + ab.y * ap.y) / ab_ab).clamp(0.0, 1.0);
    (t, ab_ab.sqrt())
}

fn planar_distance(a: Coord, b: Coord) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Convert a planar degree distance to approximate meters.
pub fn degrees_to_meters(degrees: f64, meters_per_degree: f64) -> f64 {
    degrees * meters_per_degree
}

/// Convert meters to approximate planar degrees.
pub fn meters_to_degrees(meters: f64, meters_per_degree: f64) -> f64 {
    meters / meters_per_degree
}

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Calculate WGS-84 geodesic distance between two points in meters
pub fn geodesic_distance(p1: Point, p2: Point) -> f64 {
    p1.geodesic_distance(&p2)
}

/// Distance in meters between two points along the Earth's surface.
pub fn great_circle_distance(p1: Point, p2: Point, method: GreatCircleMethod) -> f64 {
    match method {
        GreatCircleMethod::Haversine => haversine_distance(p1, p2),
        GreatCircleMethod::Geodesic => geodesic_distance(p1, p2),
    }
}

/// Angle in degrees at vertex `p2` between `p1 - p2` and `p3 - p2`.
///
/// 180 means straight travel through `p2`, 0 a full reversal. The result is
/// always within `[0, 180]`. An arm of zero length has no direction and is
/// reported as 180 so it never counts as a turn.
pub fn turn_angle(p1: Point, p2: Point, p3: Point) -> f64 {
    let incoming = p1.0 - p2.0;
    let outgoing = p3.0 - p2.0;

    let norms = incoming.x.hypot(incoming.y) * outgoing.x.hypot(outgoing.y);
    if norms == 0.0 {
        return 180.0;
    }

    let cosine = (incoming.x * outgoing.x + incoming.y * outgoing.y) / norms;
    if !cosine.is_finite() {
        return 180.0;
    }

    cosine.clamp(-1.0, 1.0).acos().to_degrees()
}
