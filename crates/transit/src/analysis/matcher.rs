//! Stop-to-route matching by point-to-polyline proximity.

use std::sync::Arc;

use geo::Point;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::identifiers::*;
use crate::models::types::*;
use crate::provider::TransitNetwork;
use crate::spatial::index::search_envelope;
use crate::spatial::queries::{degrees_to_meters, project_onto_polyline};

/// Minimum number of waypoints a route variant needs to be matched against.
pub const MIN_MATCH_POINTS: usize = 2;

/// A stop lying within the proximity threshold of a route variant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatchedStop {
    pub route_id: RouteIdentifier,
    pub direction: Direction,
    pub stop_id: StopIdentifier,
    pub stop_name: Arc<str>,
    pub location: Point,
    /// Perpendicular distance to the route, in meters
    pub distance_m: f64,
    /// Progress along the route in planar degrees; only meaningful for ordering
    pub position: f64,
}

impl MatchedStop {
    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.route_id.clone(), self.direction)
    }
}

/// Matches of a whole network plus the route variants that could not be used.
#[derive(Clone, Debug, Default)]
pub struct MatchOutcome {
    pub matches: Vec<MatchedStop>,
    pub skipped: Vec<SkippedUnit>,
}

/// Match every stop of `network` against every route variant.
///
/// Matches are ordered by route variant, then by stop input order. Variants
/// with fewer than [`MIN_MATCH_POINTS`] waypoints are reported as skipped.
pub fn match_stops(network: &TransitNetwork, config: &AnalysisConfig) -> MatchOutcome {
    #[cfg(feature = "parallel")]
    let routes = network.routes().par_iter();
    #[cfg(not(feature = "parallel"))]
    let routes = network.routes().iter();

    let per_route: Vec<(&Arc<Route>, Result<Vec<MatchedStop>>)> = routes
        .map(|route| (route, match_route(route, network, config)))
        .collect();

    let mut outcome = MatchOutcome::default();
    for (route, result) in per_route {
        match result {
            Ok(matches) => {
                log::debug!("Route {}: {} stops matched", route.key(), matches.len());
                outcome.matches.extend(matches);
            }
            Err(reason) => {
                log::warn!("Skipping route {} for matching: {}", route.key(), reason);
                outcome.skipped.push(SkippedUnit {
                    route_id: route.id.clone(),
                    direction: route.direction,
                    stage: Stage::Matching,
                    reason,
                });
            }
        }
    }

    if outcome.matches.is_empty() {
        log::warn!("No stops matched any route");
    }

    outcome
}

/// Match the stops of `network` against a single route variant.
pub fn match_route(
    route: &Route,
    network: &TransitNetwork,
    config: &AnalysisConfig,
) -> Result<Vec<MatchedStop>> {
    require_points(route, MIN_MATCH_POINTS)?;

    let margin_deg = config.proximity_threshold_deg();
    let Some(envelope) = search_envelope(&route.geometry, margin_deg) else {
        return Ok(Vec::new());
    };

    let matches = network
        .stops_in_envelope(&envelope)
        .into_iter()
        .filter_map(|node| {
            let stop = &node.stop;
            let projection = project_onto_polyline(stop.location, &route.geometry)?;
            let distance_m = degrees_to_meters(projection.distance_deg, config.meters_per_degree);

            (distance_m <= config.proximity_threshold_m).then(|| MatchedStop {
                route_id: route.id.clone(),
                direction: route.direction,
                stop_id: stop.id.clone(),
                stop_name: stop.name.clone(),
                location: stop.location,
                distance_m,
                position: projection.position,
            })
        })
        .collect();

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::queries::DEFAULT_METERS_PER_DEGREE;
    use approx::assert_abs_diff_eq;

    /// Latitude offset in degrees that lies `meters` away under the degree approximation.
    fn offset(meters: f64) -> f64 {
        meters / DEFAULT_METERS_PER_DEGREE
    }

    fn east_west_route(id: &str, lat: f64) -> Route {
        Route::from_lat_lon(id, Direction::Forward, &[(lat, 0.0), (lat, 0.01)])
    }

    #[test]
    fn test_stop_within_threshold_of_two_routes() {
        // Routes 40 m north, 45 m south and 60 m north of the stop
        let routes = vec![
            east_west_route("A", offset(40.0)),
            east_west_route("B", -offset(45.0)),
            east_west_route("C", offset(60.0)),
        ];
        let stops = vec![Stop::from_lat_lon("hub", "Hub", 0.0, 0.005)];
        let network = TransitNetwork::from_data(routes, stops).unwrap();

        let outcome = match_stops(&network, &AnalysisConfig::default());

        let routes: Vec<&str> = outcome.matches.iter().map(|m| m.route_id.as_str()).collect();
        assert_eq!(routes, vec!["A", "B"]);
        assert_abs_diff_eq!(outcome.matches[0].distance_m, 40.0, epsilon = 1e-6);
        assert_abs_diff_eq!(outcome.matches[1].distance_m, 45.0, epsilon = 1e-6);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let routes = vec![east_west_route("A", offset(49.9))];
        let stops = vec![Stop::from_lat_lon("s", "S", 0.0, 0.005)];
        let network = TransitNetwork::from_data(routes, stops).unwrap();

        let outcome = match_stops(&network, &AnalysisConfig::default());
        assert_eq!(outcome.matches.len(), 1);

        let strict = AnalysisConfig {
            proximity_threshold_m: 30.0,
            ..Default::default()
        };
        assert!(match_stops(&network, &strict).matches.is_empty());
    }

    #[test]
    fn test_search_margin_follows_meters_per_degree() {
        // 0.0009 degrees is 100 m with the default factor, 45 m with this one
        let coarse = AnalysisConfig {
            meters_per_degree: 50_000.0,
            ..Default::default()
        };
        let routes = vec![east_west_route("A", 0.0009)];
        let stops = vec![Stop::from_lat_lon("s", "S", 0.0, 0.005)];
        let network = TransitNetwork::from_data(routes, stops).unwrap();

        assert!(match_stops(&network, &AnalysisConfig::default()).matches.is_empty());

        let outcome = match_stops(&network, &coarse);
        assert_eq!(outcome.matches.len(), 1);
        assert_abs_diff_eq!(outcome.matches[0].distance_m, 45.0, epsilon = 1e-6);
    }

    #[test]
    fn test_short_route_is_skipped_not_fatal() {
        let routes = vec![
            Route::from_lat_lon("lonely", Direction::Backward, &[(0.0, 0.0)]),
            east_west_route("ok", 0.0),
        ];
        let stops = vec![Stop::from_lat_lon("s", "S", 0.0, 0.002)];
        let network = TransitNetwork::from_data(routes, stops).unwrap();

        let outcome = match_stops(&network, &AnalysisConfig::default());

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].route_id.as_str(), "ok");
        assert_eq!(outcome.skipped.len(), 1);
        let skipped = &outcome.skipped[0];
        assert_eq!(skipped.route_id.as_str(), "lonely");
        assert_eq!(skipped.stage, Stage::Matching);
        assert!(matches!(
            skipped.reason,
            TransitError::MalformedInput { points: 1, required: 2, .. }
        ));
    }

    #[test]
    fn test_projected_position_orders_along_route() {
        let route = Route::from_lat_lon(
            "bend",
            Direction::Forward,
            &[(0.0, 0.0), (0.0, 0.01), (0.01, 0.01)],
        );
        let stops = vec![
            Stop::from_lat_lon("late", "Late", 0.008, 0.01),
            Stop::from_lat_lon("early", "Early", 0.0, 0.002),
        ];
        let network = TransitNetwork::from_data(vec![route.clone()], stops).unwrap();

        let matches = match_route(&route, &network, &AnalysisConfig::default()).unwrap();

        assert_eq!(matches.len(), 2);
        let late = matches.iter().find(|m| m.stop_id.as_str() == "late").unwrap();
        let early = matches.iter().find(|m| m.stop_id.as_str() == "early").unwrap();
        assert_abs_diff_eq!(early.position, 0.002, epsilon = 1e-12);
        assert_abs_diff_eq!(late.position, 0.018, epsilon = 1e-12);
    }

    #[test]
    fn test_index_agrees_with_exhaustive_scan() {
        let route = Route::from_lat_lon(
            "zig",
            Direction::Forward,
            &[(0.0, 0.0), (0.003, 0.002), (0.0, 0.004), (0.003, 0.006)],
        );
        let stops: Vec<Stop> = (0..400)
            .map(|i| {
                let lat = -0.001 + (i / 20) as f64 * 0.00025;
                let lon = -0.001 + (i % 20) as f64 * 0.0004;
                Stop::from_lat_lon(format!("s{}", i), "grid", lat, lon)
            })
            .collect();
        let network = TransitNetwork::from_data(vec![route.clone()], stops).unwrap();
        let config = AnalysisConfig::default();

        let indexed: Vec<String> = match_route(&route, &network, &config)
            .unwrap()
            .into_iter()
            .map(|m| m.stop_id.to_string())
            .collect();

        let exhaustive: Vec<String> = network
            .stops()
            .iter()
            .filter(|stop| {
                let projection = project_onto_polyline(stop.location, &route.geometry).unwrap();
                degrees_to_meters(projection.distance_deg, config.meters_per_degree)
                    <= config.proximity_threshold_m
            })
            .map(|stop| stop.id.to_string())
            .collect();

        assert!(!exhaustive.is_empty());
        assert_eq!(indexed, exhaustive);
    }

    #[test]
    fn test_no_matches_is_an_empty_result() {
        let routes = vec![east_west_route("A", 0.0)];
        let stops = vec![Stop::from_lat_lon("far", "Far", 1.0, 1.0)];
        let network = TransitNetwork::from_data(routes, stops).unwrap();

        let outcome = match_stops(&network, &AnalysisConfig::default());
        assert!(outcome.matches.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}
