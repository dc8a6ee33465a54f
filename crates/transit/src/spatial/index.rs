//! R-tree nodes for pruning stop candidates before exact matching.
//!
//! ## Two-Stage Filtering
//!
//! Stop-to-route matching uses a two-stage filter:
//! 1. **Envelope filter**: the route's bounding box, grown by the proximity
//!    threshold in degrees, selects candidate stops from the R-tree
//! 2. **Exact filter**: the point-to-polyline distance decides the match
//!
//! Any stop within the threshold of a polyline lies inside its grown bounding
//! box, so the first stage never drops a true match.

use std::sync::Arc;

use geo::{BoundingRect, LineString, Point};
use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::types::Stop;

// ============================================================================
// Stop Spatial Node
// ============================================================================

#[derive(Clone, Debug)]
pub struct StopNode {
    pub stop: Arc<Stop>,
    /// Position of the stop in the network's input order
    pub index: usize,
    point: [f64; 2],
}

impl StopNode {
    pub fn new(location: Point, stop: Arc<Stop>, index: usize) -> Self {
        Self {
            stop,
            index,
            point: [location.x(), location.y()],
        }
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ============================================================================
// Search Envelopes
// ============================================================================

/// Bounding box of `polyline` grown by `margin_deg` on every side.
///
/// Returns `None` for an empty polyline.
pub fn search_envelope(polyline: &LineString, margin_deg: f64) -> Option<AABB<[f64; 2]>> {
    let rect = polyline.bounding_rect()?;
    // Absorb rounding between the degree and meter thresholds
    let margin = margin_deg * (1.0 + 1e-9) + f64::EPSILON;

    Some(AABB::from_corners(
        [rect.min().x - margin, rect.min().y - margin],
        [rect.max().x + margin, rect.max().y + margin],
    ))
}
