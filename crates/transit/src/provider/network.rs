//! In-memory transit network: the immutable input snapshot of one pass.
//!
//! Routes are grouped by (identifier, direction) and stops are indexed both by
//! identifier and spatially, so every analysis can read the same snapshot
//! without mutating it.

use std::collections::{btree_map, BTreeMap, HashMap};
use std::sync::Arc;

use geo::{Coord, LineString};
use rstar::{RTree, AABB};

use crate::identifiers::*;
use crate::models::types::*;
use crate::spatial::index::StopNode;

/// In-memory transit network with a spatial index over stops.
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone)]
pub struct TransitNetwork {
    // Core data
    routes: Vec<Arc<Route>>,
    stops: Vec<Arc<Stop>>,

    // Lookup maps
    route_map: HashMap<RouteKey, Arc<Route>>,
    stop_map: HashMap<StopIdentifier, Arc<Stop>>,

    // Spatial index
    stop_tree: RTree<StopNode>,
}

impl TransitNetwork {
    /// Create a new empty network
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            stops: Vec::new(),
            route_map: HashMap::new(),
            stop_map: HashMap::new(),
            stop_tree: RTree::new(),
        }
    }

    /// Build a network from loader output.
    ///
    /// Route records sharing an identifier and direction are merged into one
    /// variant, their waypoints concatenated in input order. Route variants
    /// end up ordered by (identifier, direction); stops keep their input
    /// order. Fails if two stops share an identifier.
    pub fn from_data(routes: Vec<Route>, stops: Vec<Stop>) -> Result<Self> {
        let mut stop_map = HashMap::with_capacity(stops.len());
        let stops: Vec<Arc<Stop>> = stops.into_iter().map(Arc::new).collect();
        for stop in &stops {
            if stop_map.insert(stop.id.clone(), stop.clone()).is_some() {
                return Err(TransitError::DuplicateStop(stop.id.clone()));
            }
        }

        // Group route records by variant
        let mut grouped: BTreeMap<RouteKey, Vec<Coord>> = BTreeMap::new();
        for route in routes {
            match grouped.entry(route.key()) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(route.geometry.0);
                }
                btree_map::Entry::Occupied(mut entry) => {
                    log::debug!("Merging additional waypoints into route {}", entry.key());
                    entry.get_mut().extend(route.geometry.0);
                }
            }
        }

        let routes: Vec<Arc<Route>> = grouped
            .into_iter()
            .map(|(key, coords)| {
                Arc::new(Route {
                    id: key.route_id,
                    direction: key.direction,
                    geometry: LineString::new(coords),
                })
            })
            .collect();

        let route_map: HashMap<_, _> = routes.iter().map(|r| (r.key(), r.clone())).collect();

        // Build spatial index
        let stop_tree = RTree::bulk_load(
            stops
                .iter()
                .enumerate()
                .map(|(index, s)| StopNode::new(s.location, s.clone(), index))
                .collect(),
        );

        log::debug!(
            "Built network with {} route variants and {} stops",
            routes.len(),
            stops.len()
        );

        Ok(Self {
            routes,
            stops,
            route_map,
            stop_map,
            stop_tree,
        })
    }

    /// Route variants ordered by (identifier, direction)
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Stops in input order
    pub fn stops(&self) -> &[Arc<Stop>] {
        &self.stops
    }

    pub fn get_route(&self, key: &RouteKey) -> Option<&Arc<Route>> {
        self.route_map.get(key)
    }

    pub fn get_stop(&self, id: &StopIdentifier) -> Option<&Arc<Stop>> {
        self.stop_map.get(id)
    }

    /// Distinct route identifiers in ascending order
    pub fn route_ids(&self) -> Vec<RouteIdentifier> {
        let mut ids: Vec<RouteIdentifier> = self.routes.iter().map(|r| r.id.clone()).collect();
        ids.dedup();
        ids
    }

    /// Stops whose location lies inside `envelope`, in input order.
    pub fn stops_in_envelope(&self, envelope: &AABB<[f64; 2]>) -> Vec<&StopNode> {
        let mut found: Vec<&StopNode> = self.stop_tree.locate_in_envelope(envelope).collect();
        found.sort_by_key(|node| node.index);
        found
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.stops.is_empty()
    }
}

impl Default for TransitNetwork {
    fn default() -> Self {
        Self::new()
    }
}
