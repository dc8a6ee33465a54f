use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use stopline_transit::{
    AnalysisConfig, AnalysisReport, Hub, ReportWriter, Route, RouteKey, Stage, Stop,
    TransitNetwork,
};

/// Counts at the top of the JSON report
#[derive(Debug, Serialize)]
struct ReportSummary {
    routes: usize,
    route_variants: usize,
    stops: usize,
    matched_pairs: usize,
    hubs: usize,
    transfer_stops: usize,
    duplicate_pairs: usize,
    skipped_matching: usize,
    skipped_sequencing: usize,
    skipped_shape: usize,
}

impl ReportSummary {
    fn new(network: &TransitNetwork, report: &AnalysisReport) -> Self {
        Self {
            routes: network.route_ids().len(),
            route_variants: network.routes().len(),
            stops: network.stops().len(),
            matched_pairs: report.matches.len(),
            hubs: report.hubs.len(),
            transfer_stops: report.hubs.iter().filter(|h| h.is_transfer()).count(),
            duplicate_pairs: report.duplicates().count(),
            skipped_matching: report.skipped_in(Stage::Matching).count(),
            skipped_sequencing: report.skipped_in(Stage::Sequencing).count(),
            skipped_shape: report.skipped_in(Stage::ShapeClassification).count(),
        }
    }

    fn log(&self) {
        log::info!("=== Summary ===");
        log::info!("  Routes:              {}", self.routes);
        log::info!("  Route variants:      {}", self.route_variants);
        log::info!("  Stops:               {}", self.stops);
        log::info!("  Matched pairs:       {}", self.matched_pairs);
        log::info!("  Stops served:        {}", self.hubs);
        log::info!("  Transfer stops:      {}", self.transfer_stops);
        log::info!("  Duplicate pairs:     {}", self.duplicate_pairs);
        log::info!(
            "  Skipped units:       {} matching, {} sequencing, {} shape",
            self.skipped_matching,
            self.skipped_sequencing,
            self.skipped_shape
        );
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    summary: ReportSummary,
    config: &'a AnalysisConfig,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

/// Writes the JSON report and, optionally, a GeoJSON map overlay
pub struct FileReportWriter {
    config: AnalysisConfig,
    output: PathBuf,
    map_output: Option<PathBuf>,
}

impl FileReportWriter {
    pub fn new(config: AnalysisConfig, output: PathBuf, map_output: Option<PathBuf>) -> Self {
        Self {
            config,
            output,
            map_output,
        }
    }
}

impl ReportWriter for FileReportWriter {
    type Error = anyhow::Error;

    fn write_report(&mut self, network: &TransitNetwork, report: &AnalysisReport) -> Result<()> {
        let summary = ReportSummary::new(network, report);
        summary.log();

        write_report_json(
            &ReportDocument {
                summary,
                config: &self.config,
                report,
            },
            &self.output,
        )?;
        log::info!("  Wrote report to {}", self.output.display());

        if let Some(map_path) = &self.map_output {
            write_map_geojson(network, report, map_path).context("Failed to write map overlay")?;
            log::info!("  Wrote map overlay to {}", map_path.display());
        }

        Ok(())
    }
}

fn write_report_json(document: &ReportDocument<'_>, output_path: &Path) -> Result<()> {
    let json_string =
        serde_json::to_string_pretty(document).context("Failed to serialize report")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    Ok(())
}

/// Log the highlights a reader looks for first
pub fn log_highlights(network: &TransitNetwork, report: &AnalysisReport) {
    for hub in &report.top_hubs {
        let Some(stop) = network.get_stop(&hub.stop_id) else {
            continue;
        };
        log::info!(
            "  Top hub: {} ({}) at {:.5}, {:.5} served by {} routes",
            stop.name,
            stop.id,
            stop.location.y(),
            stop.location.x(),
            hub.route_count
        );
    }

    for pair in report.duplicates() {
        log::info!(
            "  Duplicate: {} / {} share {} stops ({}% / {}%)",
            pair.route_a,
            pair.route_b,
            pair.common_stops,
            pair.percent_of_a,
            pair.percent_of_b
        );
    }

    for band in report.length_bands.iter().chain(&report.spacing_bands) {
        log::info!("  {}: {} routes", band.label, band.route_count());
    }
}

/// Convert a route's waypoints to a GeoJSON LineString value
fn route_to_geojson(route: &Route) -> Value {
    Value::LineString(route.geometry.0.iter().map(|c| vec![c.x, c.y]).collect())
}

fn route_to_feature(route: &Route, length_m: Option<f64>, shape: Option<&str>) -> Feature {
    let mut properties = serde_json::Map::new();
    properties.insert("feature_type".to_string(), serde_json::json!("route"));
    properties.insert("route_id".to_string(), serde_json::json!(route.id.as_str()));
    properties.insert("direction".to_string(), serde_json::json!(route.direction.as_str()));
    properties.insert("length_m".to_string(), serde_json::json!(length_m));
    properties.insert("shape".to_string(), serde_json::json!(shape));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(route_to_geojson(route))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn stop_to_feature(stop: &Stop, hub: Option<&Hub>) -> Feature {
    let mut properties = serde_json::Map::new();
    properties.insert("feature_type".to_string(), serde_json::json!("stop"));
    properties.insert("stop_id".to_string(), serde_json::json!(stop.id.as_str()));
    properties.insert("stop_name".to_string(), serde_json::json!(&*stop.name));
    properties.insert(
        "route_count".to_string(),
        serde_json::json!(hub.map_or(0, |h| h.route_count)),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![stop.location.x(), stop.location.y()]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Raw route lines and stops, annotated with analysis results
fn map_features(network: &TransitNetwork, report: &AnalysisReport) -> Vec<Feature> {
    let lengths: HashMap<RouteKey, f64> = report
        .sequences
        .iter()
        .map(|s| (s.key(), s.total_length_m))
        .collect();
    let shapes: HashMap<RouteKey, String> = report
        .shapes
        .iter()
        .map(|s| (RouteKey::new(s.route_id.clone(), s.direction), s.class.to_string()))
        .collect();
    let hubs: HashMap<_, &Hub> = report.hubs.iter().map(|h| (&h.stop_id, h)).collect();

    let routes = network.routes().iter().map(|route| {
        let key = route.key();
        route_to_feature(
            route,
            lengths.get(&key).copied(),
            shapes.get(&key).map(String::as_str),
        )
    });
    let stops = network
        .stops()
        .iter()
        .map(|stop| stop_to_feature(stop, hubs.get(&stop.id).copied()));

    routes.chain(stops).collect()
}

/// Write the map overlay as a single FeatureCollection
pub fn write_map_geojson(
    network: &TransitNetwork,
    report: &AnalysisReport,
    output_path: &Path,
) -> Result<()> {
    let features = map_features(network, report);
    log::info!("Writing {} map features to {}", features.len(), output_path.display());

    let feature_collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    let geojson = GeoJson::from(feature_collection);
    let json_string = serde_json::to_string_pretty(&geojson)
        .context("Failed to serialize GeoJSON")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write GeoJSON to {}", output_path.display()))?;

    Ok(())
}
