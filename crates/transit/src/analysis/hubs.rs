//! Transfer hubs: how many distinct routes serve each matched stop.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::analysis::matcher::MatchedStop;
use crate::identifiers::*;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Hub {
    pub stop_id: StopIdentifier,
    pub stop_name: Arc<str>,
    pub route_count: usize,
    /// Distinct routes serving the stop, ascending
    pub route_ids: Vec<RouteIdentifier>,
}

impl Hub {
    /// Whether passengers can change between routes here
    pub fn is_transfer(&self) -> bool {
        self.route_count > 1
    }
}

/// Aggregate matches by stop.
///
/// Both directions of a route count once. Hubs are ordered by route count
/// descending, ties by stop identifier ascending.
pub fn detect_hubs(matches: &[MatchedStop]) -> Vec<Hub> {
    let by_stop: BTreeMap<&StopIdentifier, (&Arc<str>, BTreeSet<&RouteIdentifier>)> =
        matches.iter().fold(BTreeMap::new(), |mut acc, m| {
            acc.entry(&m.stop_id)
                .or_insert_with(|| (&m.stop_name, BTreeSet::new()))
                .1
                .insert(&m.route_id);
            acc
        });

    let mut hubs: Vec<Hub> = by_stop
        .into_iter()
        .map(|(stop_id, (stop_name, routes))| Hub {
            stop_id: stop_id.clone(),
            stop_name: stop_name.clone(),
            route_count: routes.len(),
            route_ids: routes.into_iter().cloned().collect(),
        })
        .collect();

    // Stable sort keeps the ascending stop order among equal counts
    hubs.sort_by(|a, b| b.route_count.cmp(&a.route_count));

    log::info!("Found {} stops served by at least one route", hubs.len());
    hubs
}

/// Hubs whose route count equals the highest count observed.
pub fn top_hubs(hubs: &[Hub]) -> Vec<Hub> {
    let Some(max) = hubs.iter().map(|h| h.route_count).max() else {
        return Vec::new();
    };

    hubs.iter().filter(|h| h.route_count == max).cloned().collect()
}
