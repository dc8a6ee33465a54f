//! Duplicate route detection from shared stops.
//!
//! Overlap is containment, not similarity: each route of a pair gets its own
//! percentage of stops shared with the other. A short route that runs
//! entirely along a long one is a duplicate even though the long route's own
//! percentage stays low.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::analysis::matcher::MatchedStop;
use crate::identifiers::*;

/// Stop-set comparison of two routes, `route_a < route_b`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OverlapPair {
    pub route_a: RouteIdentifier,
    pub route_b: RouteIdentifier,
    pub common_stops: usize,
    /// Share of `route_a`'s stops also served by `route_b`, rounded to 0.1
    pub percent_of_a: f64,
    /// Share of `route_b`'s stops also served by `route_a`, rounded to 0.1
    pub percent_of_b: f64,
    pub is_duplicate: bool,
}

pub type RouteStopSets = BTreeMap<RouteIdentifier, BTreeSet<StopIdentifier>>;

/// Distinct stops per route, both directions merged.
pub fn route_stop_sets(matches: &[MatchedStop]) -> RouteStopSets {
    matches.iter().fold(BTreeMap::new(), |mut acc, m| {
        acc.entry(m.route_id.clone())
            .or_insert_with(BTreeSet::new)
            .insert(m.stop_id.clone());
        acc
    })
}

/// Compare every pair of routes that served at least one matched stop.
pub fn detect_overlaps(matches: &[MatchedStop], duplicate_threshold_percent: f64) -> Vec<OverlapPair> {
    overlaps_from_stop_sets(&route_stop_sets(matches), duplicate_threshold_percent)
}

/// Compare every unordered pair of routes in `sets`.
///
/// Routes with an empty stop set take no part in any pair. Pairs come out in
/// ascending `(route_a, route_b)` order.
pub fn overlaps_from_stop_sets(sets: &RouteStopSets, duplicate_threshold_percent: f64) -> Vec<OverlapPair> {
    let pairs: Vec<_> = sets
        .iter()
        .filter(|(_, stops)| !stops.is_empty())
        .tuple_combinations()
        .collect();

    #[cfg(feature = "parallel")]
    let pairs = pairs.into_par_iter();
    #[cfg(not(feature = "parallel"))]
    let pairs = pairs.into_iter();

    let overlaps: Vec<OverlapPair> = pairs
        .map(|((route_a, stops_a), (route_b, stops_b))| {
            compare_stop_sets(route_a, stops_a, route_b, stops_b, duplicate_threshold_percent)
        })
        .collect();

    log::info!(
        "Compared {} route pairs, {} duplicates",
        overlaps.len(),
        overlaps.iter().filter(|o| o.is_duplicate).count()
    );
    overlaps
}

fn compare_stop_sets(
    route_a: &RouteIdentifier,
    stops_a: &BTreeSet<StopIdentifier>,
    route_b: &RouteIdentifier,
    stops_b: &BTreeSet<StopIdentifier>,
    duplicate_threshold_percent: f64,
) -> OverlapPair {
    let common_stops = stops_a.intersection(stops_b).count();
    let percent_of_a = round_percent(100.0 * common_stops as f64 / stops_a.len() as f64);
    let percent_of_b = round_percent(100.0 * common_stops as f64 / stops_b.len() as f64);

    OverlapPair {
        route_a: route_a.clone(),
        route_b: route_b.clone(),
        common_stops,
        percent_of_a,
        percent_of_b,
        is_duplicate: percent_of_a >= duplicate_threshold_percent
            || percent_of_b >= duplicate_threshold_percent,
    }
}

/// Round to one decimal place, halves away from zero.
pub fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_set(ids: impl IntoIterator<Item = usize>) -> BTreeSet<StopIdentifier> {
        ids.into_iter().map(|i| StopIdentifier::new(format!("s{}", i))).collect()
    }

    #[test]
    fn test_containment_percentages() {
        // A has 10 stops, B has 20, they share 8
        let mut sets = RouteStopSets::new();
        sets.insert("A".into(), stop_set(0..10));
        sets.insert("B".into(), stop_set((2..10).chain(100..112)));

        let overlaps = overlaps_from_stop_sets(&sets, 50.0);

        assert_eq!(overlaps.len(), 1);
        let pair = &overlaps[0];
        assert_eq!(pair.route_a.as_str(), "A");
        assert_eq!(pair.route_b.as_str(), "B");
        assert_eq!(pair.common_stops, 8);
        assert_eq!(pair.percent_of_a, 80.0);
        assert_eq!(pair.percent_of_b, 40.0);
        assert!(pair.is_duplicate);
    }

    #[test]
    fn test_exactly_half_shared_is_duplicate() {
        let mut sets = RouteStopSets::new();
        sets.insert("A".into(), stop_set(0..10));
        sets.insert("B".into(), stop_set((5..10).chain(100..115)));

        let pair = &overlaps_from_stop_sets(&sets, 50.0)[0];
        assert_eq!(pair.common_stops, 5);
        assert_eq!(pair.percent_of_a, 50.0);
        assert_eq!(pair.percent_of_b, 25.0);
        assert!(pair.is_duplicate);
    }

    #[test]
    fn test_below_threshold_is_not_duplicate() {
        let mut sets = RouteStopSets::new();
        sets.insert("A".into(), stop_set(0..10));
        sets.insert("B".into(), stop_set((0..4).chain(50..60)));

        let pair = &overlaps_from_stop_sets(&sets, 50.0)[0];
        assert_eq!(pair.percent_of_a, 40.0);
        assert_eq!(pair.percent_of_b, 28.6);
        assert!(!pair.is_duplicate);
    }

    #[test]
    fn test_empty_sets_are_skipped() {
        let mut sets = RouteStopSets::new();
        sets.insert("A".into(), stop_set(0..3));
        sets.insert("B".into(), BTreeSet::new());
        sets.insert("C".into(), stop_set(5..6));

        let overlaps = overlaps_from_stop_sets(&sets, 50.0);

        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].route_a.as_str(), "A");
        assert_eq!(overlaps[0].route_b.as_str(), "C");
        assert_eq!(overlaps[0].common_stops, 0);
        assert!(!overlaps[0].is_duplicate);
    }

    #[test]
    fn test_pair_invariants() {
        let mut sets = RouteStopSets::new();
        sets.insert("1".into(), stop_set(0..7));
        sets.insert("2".into(), stop_set(3..9));
        sets.insert("3".into(), stop_set(0..1));
        sets.insert("4".into(), stop_set(20..33));

        let overlaps = overlaps_from_stop_sets(&sets, 50.0);
        assert_eq!(overlaps.len(), 6);

        for pair in &overlaps {
            let a = sets[&pair.route_a].len();
            let b = sets[&pair.route_b].len();
            assert!(pair.common_stops <= a.min(b));
            assert!((0.0..=100.0).contains(&pair.percent_of_a));
            assert!((0.0..=100.0).contains(&pair.percent_of_b));
            assert_eq!(
                pair.is_duplicate,
                pair.percent_of_a >= 50.0 || pair.percent_of_b >= 50.0
            );
            assert!(pair.route_a < pair.route_b);
        }
    }

    #[test]
    fn test_stop_sets_merge_directions() {
        use crate::models::types::Direction;
        use geo::Point;
        use std::sync::Arc;

        let matched = |route: &str, direction, stop: &str| MatchedStop {
            route_id: route.into(),
            direction,
            stop_id: stop.into(),
            stop_name: Arc::from(stop),
            location: Point::new(0.0, 0.0),
            distance_m: 0.0,
            position: 0.0,
        };
        let matches = vec![
            matched("1", Direction::Forward, "a"),
            matched("1", Direction::Backward, "a"),
            matched("1", Direction::Backward, "b"),
        ];

        let sets = route_stop_sets(&matches);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[&RouteIdentifier::new("1")].len(), 2);
        assert!(detect_overlaps(&matches, 50.0).is_empty());
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(28.571428), 28.6);
        assert_eq!(round_percent(33.333333), 33.3);
        assert_eq!(round_percent(100.0), 100.0);
        assert_eq!(round_percent(0.25), 0.3);
    }
}
