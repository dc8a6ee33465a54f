//! Grouping routes into distance bands.
//!
//! Two groupings are produced: by full-loop length in kilometers, and by mean
//! forward stop spacing in meters. Band edges come from the configuration.

use std::collections::BTreeMap;

use crate::analysis::sequencer::{RouteLength, RouteSequence};
use crate::identifiers::*;
use crate::models::types::Direction;

/// How a value sitting exactly on an edge is assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeRule {
    /// A band holds values strictly below its upper edge
    Below,
    /// A band holds values up to and including its upper edge
    UpTo,
}

/// Routes falling into one band.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BandGroup {
    pub label: String,
    /// `None` for the lowest band and for the no-data group
    pub lower: Option<f64>,
    /// `None` for the highest band and for the no-data group
    pub upper: Option<f64>,
    pub route_ids: Vec<RouteIdentifier>,
}

impl BandGroup {
    pub fn route_count(&self) -> usize {
        self.route_ids.len()
    }
}

pub const NO_DATA_LABEL: &str = "no data";

/// Index of the band `value` falls into, `0..=edges.len()`.
pub fn band_index(value: f64, edges: &[f64], rule: EdgeRule) -> usize {
    edges
        .iter()
        .position(|&edge| match rule {
            EdgeRule::Below => value < edge,
            EdgeRule::UpTo => value <= edge,
        })
        .unwrap_or(edges.len())
}

/// Group routes by full-loop length, with edges in kilometers.
pub fn length_bands(lengths: &[RouteLength], edges_km: &[f64]) -> Vec<BandGroup> {
    let values = lengths
        .iter()
        .map(|l| (l.route_id.clone(), Some(l.full_loop_length_m / 1000.0)));

    group_into_bands(values, edges_km, EdgeRule::Below, "km")
}

/// Group routes by mean stop spacing in the forward direction, with edges in
/// meters.
///
/// Every route with at least one measured segment in either direction takes
/// part; routes without forward segments land in the no-data group.
pub fn spacing_bands(sequences: &[RouteSequence], edges_m: &[f64]) -> Vec<BandGroup> {
    let mut forward_mean: BTreeMap<RouteIdentifier, Option<f64>> = BTreeMap::new();

    for sequence in sequences.iter().filter(|s| s.has_segments()) {
        let entry = forward_mean.entry(sequence.route_id.clone()).or_default();
        if sequence.direction == Direction::Forward {
            *entry = sequence.mean_segment_m;
        }
    }

    group_into_bands(forward_mean, edges_m, EdgeRule::UpTo, "m")
}

fn group_into_bands(
    values: impl IntoIterator<Item = (RouteIdentifier, Option<f64>)>,
    edges: &[f64],
    rule: EdgeRule,
    unit: &str,
) -> Vec<BandGroup> {
    let mut banded: BTreeMap<usize, Vec<RouteIdentifier>> = BTreeMap::new();
    let mut no_data = Vec::new();

    for (route_id, value) in values {
        match value {
            Some(value) if value.is_finite() => banded
                .entry(band_index(value, edges, rule))
                .or_default()
                .push(route_id),
            _ => no_data.push(route_id),
        }
    }

    let mut groups: Vec<BandGroup> = banded
        .into_iter()
        .map(|(index, mut route_ids)| {
            route_ids.sort();
            let lower = index.checked_sub(1).map(|i| edges[i]);
            let upper = edges.get(index).copied();
            BandGroup {
                label: band_label(lower, upper, rule, unit),
                lower,
                upper,
                route_ids,
            }
        })
        .collect();

    if !no_data.is_empty() {
        no_data.sort();
        groups.push(BandGroup {
            label: NO_DATA_LABEL.to_string(),
            lower: None,
            upper: None,
            route_ids: no_data,
        });
    }

    groups
}

fn band_label(lower: Option<f64>, upper: Option<f64>, rule: EdgeRule, unit: &str) -> String {
    match (lower, upper, rule) {
        (None, Some(upper), EdgeRule::Below) => format!("under {} {}", upper, unit),
        (None, Some(upper), EdgeRule::UpTo) => format!("up to {} {}", upper, unit),
        (Some(lower), Some(upper), _) => format!("{}-{} {}", lower, upper, unit),
        (Some(lower), None, EdgeRule::Below) => format!("{} {} and over", lower, unit),
        (Some(lower), None, EdgeRule::UpTo) => format!("over {} {}", lower, unit),
        (None, None, _) => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::matcher::MatchedStop;
    use geo::Point;
    use std::sync::Arc;

    fn length(route: &str, km: f64) -> RouteLength {
        RouteLength {
            route_id: route.into(),
            forward_length_m: Some(km * 1000.0),
            backward_length_m: None,
            full_loop_length_m: km * 1000.0,
        }
    }

    fn sequence(route: &str, direction: Direction, segments: &[f64]) -> RouteSequence {
        let stop = MatchedStop {
            route_id: route.into(),
            direction,
            stop_id: "s".into(),
            stop_name: Arc::from("S"),
            location: Point::new(0.0, 0.0),
            distance_m: 0.0,
            position: 0.0,
        };
        let mean = if segments.is_empty() {
            None
        } else {
            Some(segments.iter().sum::<f64>() / segments.len() as f64)
        };
        RouteSequence {
            route_id: route.into(),
            direction,
            stops: vec![stop; segments.len() + 1],
            segment_lengths_m: segments.to_vec(),
            total_length_m: segments.iter().sum(),
            mean_segment_m: mean,
            median_segment_m: mean,
        }
    }

    #[test]
    fn test_band_index_rules() {
        let edges = [10.0, 25.0];
        assert_eq!(band_index(9.99, &edges, EdgeRule::Below), 0);
        assert_eq!(band_index(10.0, &edges, EdgeRule::Below), 1);
        assert_eq!(band_index(10.0, &edges, EdgeRule::UpTo), 0);
        assert_eq!(band_index(30.0, &edges, EdgeRule::UpTo), 2);
        assert_eq!(band_index(1.0, &[], EdgeRule::Below), 0);
    }

    #[test]
    fn test_length_bands() {
        let lengths = vec![
            length("7", 8.0),
            length("3", 12.5),
            length("1", 10.0),
            length("9", 51.0),
        ];

        let groups = length_bands(&lengths, &[10.0, 25.0, 35.0, 50.0]);

        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["under 10 km", "10-25 km", "50 km and over"]);
        let middle: Vec<&str> = groups[1].route_ids.iter().map(|r| r.as_str()).collect();
        assert_eq!(middle, vec!["1", "3"]);
        assert_eq!(groups[1].route_count(), 2);
    }

    #[test]
    fn test_spacing_bands_use_forward_mean() {
        let sequences = vec![
            sequence("a", Direction::Forward, &[200.0, 500.0]),
            sequence("a", Direction::Backward, &[900.0]),
            sequence("b", Direction::Forward, &[500.0]),
            sequence("c", Direction::Backward, &[250.0]),
            sequence("d", Direction::Forward, &[]),
            sequence("e", Direction::Forward, &[800.0, 700.0]),
        ];

        let groups = spacing_bands(&sequences, &[300.0, 500.0]);

        let summary: Vec<(String, Vec<String>)> = groups
            .iter()
            .map(|g| (g.label.clone(), g.route_ids.iter().map(|r| r.to_string()).collect()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("300-500 m".to_string(), vec!["a".to_string(), "b".to_string()]),
                ("over 500 m".to_string(), vec!["e".to_string()]),
                ("no data".to_string(), vec!["c".to_string()]),
            ]
        );
    }
}
