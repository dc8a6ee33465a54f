//! Spatial indexing and geometry primitives.

pub mod index;
pub mod queries;

pub use queries::{
    degrees_to_meters, great_circle_distance, haversine_distance, project_onto_polyline,
    turn_angle, PolylineProjection,
};
