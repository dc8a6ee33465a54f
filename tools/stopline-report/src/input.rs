use anyhow::{bail, Context, Result};
use geo::Point;
use geojson::{Feature, GeoJson, JsonObject, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use stopline_transit::{AnalysisConfig, Direction, NetworkLoader, Route, Stop, TransitNetwork};

/// Loads routes and stops from two GeoJSON files
pub struct GeoJsonLoader {
    routes_path: PathBuf,
    stops_path: PathBuf,
}

impl GeoJsonLoader {
    pub fn new(routes_path: impl Into<PathBuf>, stops_path: impl Into<PathBuf>) -> Self {
        Self {
            routes_path: routes_path.into(),
            stops_path: stops_path.into(),
        }
    }
}

impl NetworkLoader for GeoJsonLoader {
    type Error = anyhow::Error;

    fn load(&self) -> Result<TransitNetwork> {
        let routes = parse_routes(read_geojson(&self.routes_path)?);
        log::info!("  Read {} route records from {}", routes.len(), self.routes_path.display());

        let stops = parse_stops(read_geojson(&self.stops_path)?);
        log::info!("  Read {} stops from {}", stops.len(), self.stops_path.display());

        TransitNetwork::from_data(routes, stops).context("Failed to build transit network")
    }
}

/// Read a JSON config file; fields it does not name keep their defaults
pub fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config from: {}", path.display()))
}

fn read_geojson(path: &Path) -> Result<GeoJson> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))?;

    content
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON from: {}", path.display()))
}

/// Flatten any GeoJSON document into its features
fn into_features(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    }
}

/// Route records from LineString and MultiLineString features.
///
/// Each part of a MultiLineString becomes its own record; the network merges
/// records sharing an identifier and direction.
pub fn parse_routes(geojson: GeoJson) -> Vec<Route> {
    let mut routes = Vec::new();

    for (index, feature) in into_features(geojson).into_iter().enumerate() {
        match feature_to_routes(&feature) {
            Ok(parsed) => routes.extend(parsed),
            Err(e) => log::warn!("  Dropping route feature {}: {}", index, e),
        }
    }

    routes
}

fn feature_to_routes(feature: &Feature) -> Result<Vec<Route>> {
    let properties = feature.properties.as_ref();

    let Some(route_id) = properties.and_then(|p| id_property(p, "route_id")) else {
        bail!("missing route_id");
    };

    let direction = match properties.and_then(|p| p.get("direction")) {
        None | Some(serde_json::Value::Null) => Direction::default(),
        Some(serde_json::Value::String(s)) => Direction::from_str(s)?,
        Some(other) => bail!("direction must be a string, got {}", other),
    };

    let Some(geometry) = &feature.geometry else {
        bail!("route {} has no geometry", route_id);
    };

    let parts: Vec<&Vec<Vec<f64>>> = match &geometry.value {
        Value::LineString(coords) => vec![coords],
        Value::MultiLineString(lines) => lines.iter().collect(),
        _ => bail!("route {} is not a LineString or MultiLineString", route_id),
    };

    parts
        .into_iter()
        .map(|coords| {
            let points = coords
                .iter()
                .map(|c| position_to_point(c))
                .collect::<Result<Vec<Point>>>()
                .with_context(|| format!("route {}", route_id))?;
            Ok(Route::new(route_id.as_str(), direction, points))
        })
        .collect()
}

/// Stops from Point features
pub fn parse_stops(geojson: GeoJson) -> Vec<Stop> {
    let mut stops = Vec::new();

    for (index, feature) in into_features(geojson).into_iter().enumerate() {
        match feature_to_stop(&feature) {
            Ok(stop) => stops.push(stop),
            Err(e) => log::warn!("  Dropping stop feature {}: {}", index, e),
        }
    }

    stops
}

fn feature_to_stop(feature: &Feature) -> Result<Stop> {
    let properties = feature.properties.as_ref();

    let Some(stop_id) = properties.and_then(|p| id_property(p, "stop_id")) else {
        bail!("missing stop_id");
    };

    let stop_name = properties
        .and_then(|p| p.get("stop_name"))
        .and_then(|v| v.as_str())
        .unwrap_or(stop_id.as_str())
        .to_string();

    let location = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(position)) => {
            position_to_point(position).with_context(|| format!("stop {}", stop_id))?
        }
        Some(_) => bail!("stop {} is not a Point", stop_id),
        None => bail!("stop {} has no geometry", stop_id),
    };

    Ok(Stop::new(stop_id, stop_name, location))
}

/// Identifier property given either as a string or as a number
fn id_property(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// GeoJSON positions are `[longitude, latitude, ...]`
fn position_to_point(position: &[f64]) -> Result<Point> {
    let (lon, lat) = match position {
        [lon, lat, ..] => (*lon, *lat),
        _ => bail!("position has {} coordinates", position.len()),
    };

    if !lon.is_finite() || !lat.is_finite() {
        bail!("non-finite coordinate ({}, {})", lon, lat);
    }

    Ok(Point::new(lon, lat))
}
