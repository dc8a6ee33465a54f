//! Ordering matched stops along each route variant and measuring the gaps.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;

use crate::analysis::matcher::{MatchedStop, MIN_MATCH_POINTS};
use crate::config::{AnalysisConfig, GreatCircleMethod};
use crate::identifiers::*;
use crate::models::types::*;
use crate::provider::TransitNetwork;
use crate::spatial::queries::great_circle_distance;

/// Matched stops of one route variant in travel order, with the distances
/// between consecutive stops.
///
/// A variant with fewer than two matched stops has no segments and a total
/// length of zero; `stops.len()` tells that case apart from a real zero.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteSequence {
    pub route_id: RouteIdentifier,
    pub direction: Direction,
    pub stops: Vec<MatchedStop>,
    /// Great-circle distance between consecutive stops, in meters
    pub segment_lengths_m: Vec<f64>,
    pub total_length_m: f64,
    pub mean_segment_m: Option<f64>,
    pub median_segment_m: Option<f64>,
}

impl RouteSequence {
    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.route_id.clone(), self.direction)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn has_segments(&self) -> bool {
        !self.segment_lengths_m.is_empty()
    }

    pub fn first_stop_name(&self) -> Option<&str> {
        self.stops.first().map(|s| &*s.stop_name)
    }

    pub fn last_stop_name(&self) -> Option<&str> {
        self.stops.last().map(|s| &*s.stop_name)
    }
}

/// Stop-to-stop length of a route in both directions.
///
/// A direction is `None` when it had no matched stops at all.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteLength {
    pub route_id: RouteIdentifier,
    pub forward_length_m: Option<f64>,
    pub backward_length_m: Option<f64>,
    /// Forward plus backward, a missing direction counting as zero
    pub full_loop_length_m: f64,
}

/// Sequences for every route variant plus the variants that were skipped.
#[derive(Clone, Debug, Default)]
pub struct SequenceOutcome {
    pub sequences: Vec<RouteSequence>,
    pub skipped: Vec<SkippedUnit>,
}

/// Sequence the matches of every route variant in `network`.
///
/// Variants too short to be matched are reported as skipped. Variants that
/// are valid but matched no stop still get an (empty) sequence.
pub fn sequence_network(
    network: &TransitNetwork,
    matches: &[MatchedStop],
    config: &AnalysisConfig,
) -> SequenceOutcome {
    let mut groups = group_by_variant(matches);
    let mut outcome = SequenceOutcome::default();

    for route in network.routes() {
        if let Err(reason) = require_points(route, MIN_MATCH_POINTS) {
            log::warn!("Skipping route {} for sequencing: {}", route.key(), reason);
            outcome.skipped.push(SkippedUnit {
                route_id: route.id.clone(),
                direction: route.direction,
                stage: Stage::Sequencing,
                reason,
            });
            continue;
        }

        let stops = groups.remove(&route.key()).unwrap_or_default();
        outcome.sequences.push(sequence_stops(
            route.id.clone(),
            route.direction,
            stops,
            config.great_circle,
        ));
    }

    outcome
}

/// Order the matched stops of one variant by projected position and measure
/// the segments between them.
pub fn sequence_stops(
    route_id: RouteIdentifier,
    direction: Direction,
    mut stops: Vec<MatchedStop>,
    method: GreatCircleMethod,
) -> RouteSequence {
    stops.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then_with(|| a.stop_id.cmp(&b.stop_id))
    });

    let segment_lengths_m: Vec<f64> = stops
        .iter()
        .tuple_windows()
        .map(|(a, b)| great_circle_distance(a.location, b.location, method))
        .collect();

    let total_length_m: f64 = segment_lengths_m.iter().sum();
    let mean_segment_m = mean(&segment_lengths_m);
    let median_segment_m = median(&segment_lengths_m);

    log::debug!(
        "Route {} ({}): {} stops, {:.0} m",
        route_id,
        direction,
        stops.len(),
        total_length_m
    );

    RouteSequence {
        route_id,
        direction,
        stops,
        segment_lengths_m,
        total_length_m,
        mean_segment_m,
        median_segment_m,
    }
}

/// Combine the directions of each route into one length record.
///
/// Only variants with at least one matched stop contribute; routes with no
/// such variant are left out. Output is ordered by route identifier.
pub fn route_lengths(sequences: &[RouteSequence]) -> Vec<RouteLength> {
    let mut by_route: BTreeMap<RouteIdentifier, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for sequence in sequences.iter().filter(|s| s.stop_count() > 0) {
        let entry = by_route.entry(sequence.route_id.clone()).or_default();
        match sequence.direction {
            Direction::Forward => entry.0 = Some(sequence.total_length_m),
            Direction::Backward => entry.1 = Some(sequence.total_length_m),
        }
    }

    by_route
        .into_iter()
        .map(|(route_id, (forward, backward))| RouteLength {
            route_id,
            forward_length_m: forward,
            backward_length_m: backward,
            full_loop_length_m: forward.unwrap_or(0.0) + backward.unwrap_or(0.0),
        })
        .collect()
}

fn group_by_variant(matches: &[MatchedStop]) -> HashMap<RouteKey, Vec<MatchedStop>> {
    matches.iter().map(|m| (m.key(), m.clone())).into_group_map()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
