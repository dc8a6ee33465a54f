use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stopline_transit::{analyze, AnalysisConfig, GreatCircleMethod, NetworkLoader, ReportWriter};

mod input;
mod output;

use input::{read_config, GeoJsonLoader};
use output::{log_highlights, FileReportWriter};

#[derive(Parser, Debug)]
#[command(
    name = "stopline-report",
    author,
    version,
    about = "Match stops to routes and report hubs, duplicate routes and route shapes",
    long_about = "Reads route polylines and stop points from GeoJSON, attaches each stop to \
                  every route passing within the proximity threshold, and writes a JSON \
                  report.\n\n\
                  The report lists stops in travel order per route and direction, the \
                  distances between them, transfer hubs, route pairs sharing most of their \
                  stops, and a loop / zigzag / linear label per route."
)]
struct Args {
    /// Route GeoJSON file (LineString or MultiLineString features with route_id)
    #[arg(short, long)]
    routes: PathBuf,

    /// Stop GeoJSON file (Point features with stop_id and stop_name)
    #[arg(short, long)]
    stops: PathBuf,

    /// Output JSON file for the analysis report
    #[arg(short, long)]
    output: PathBuf,

    /// Also output a GeoJSON overlay of routes and stops to this file
    #[arg(long)]
    map_output: Option<PathBuf>,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum stop-to-route distance for a match, in meters
    #[arg(long)]
    proximity_m: Option<f64>,

    /// Maximum endpoint distance for a loop, in meters
    #[arg(long)]
    loop_m: Option<f64>,

    /// Turn angles below this many degrees count as sharp
    #[arg(long)]
    zigzag_angle: Option<f64>,

    /// Number of sharp turns that makes a route a zigzag
    #[arg(long)]
    zigzag_count: Option<usize>,

    /// Conversion factor from planar degrees to meters
    #[arg(long)]
    meters_per_degree: Option<f64>,

    /// Shared-stop percentage that marks a route pair as duplicate
    #[arg(long)]
    duplicate_percent: Option<f64>,

    /// Use ellipsoidal geodesic distances instead of haversine
    #[arg(long)]
    geodesic: bool,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Defaults, then the config file, then individual flags
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => {
                log::info!("Config: {}", path.display());
                read_config(path)?
            }
            None => AnalysisConfig::default(),
        };

        if let Some(v) = self.proximity_m {
            config.proximity_threshold_m = v;
        }
        if let Some(v) = self.loop_m {
            config.loop_distance_threshold_m = v;
        }
        if let Some(v) = self.zigzag_angle {
            config.zigzag_angle_threshold_deg = v;
        }
        if let Some(v) = self.zigzag_count {
            config.zigzag_count_threshold = v;
        }
        if let Some(v) = self.meters_per_degree {
            config.meters_per_degree = v;
        }
        if let Some(v) = self.duplicate_percent {
            config.duplicate_threshold_percent = v;
        }
        if self.geodesic {
            config.great_circle = GreatCircleMethod::Geodesic;
        }

        config.validate().context("Invalid analysis configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    log::info!("=== Stopline Report ===");
    log::info!("Routes: {}", args.routes.display());
    log::info!("Stops: {}", args.stops.display());
    log::info!("Output: {}", args.output.display());

    for path in [&args.routes, &args.stops] {
        if !path.exists() {
            bail!("Input file does not exist: {}", path.display());
        }
    }

    let config = args.analysis_config()?;

    // Phase 1: Load network
    log::info!("");
    log::info!("Phase 1: Loading network...");
    let network = GeoJsonLoader::new(&args.routes, &args.stops).load()?;
    log::info!(
        "  {} route variants, {} stops",
        network.routes().len(),
        network.stops().len()
    );

    if network.is_empty() {
        log::warn!("  Network is empty; the report will be empty");
    }

    // Phase 2: Analyze
    log::info!("");
    log::info!("Phase 2: Analyzing...");
    let report = analyze(&network, &config).context("Analysis failed")?;
    log_highlights(&network, &report);

    // Phase 3: Write output
    log::info!("");
    log::info!("Phase 3: Writing output...");
    let mut writer = FileReportWriter::new(config, args.output.clone(), args.map_output.clone());
    writer.write_report(&network, &report)?;

    log::info!("");
    log::info!("Done!");

    Ok(())
}
