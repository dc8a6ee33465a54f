//! Analytical passes over a [`TransitNetwork`].
//!
//! The matcher feeds the sequencer and the hub and overlap detectors; the
//! shape classifier reads raw route geometry. Every pass reads the same
//! immutable network and returns new collections.

pub mod bands;
pub mod hubs;
pub mod matcher;
pub mod overlap;
pub mod sequencer;
pub mod shape;

pub use bands::{length_bands, spacing_bands, BandGroup};
pub use hubs::{detect_hubs, top_hubs, Hub};
pub use matcher::{match_route, match_stops, MatchOutcome, MatchedStop};
pub use overlap::{detect_overlaps, route_stop_sets, OverlapPair};
pub use sequencer::{route_lengths, sequence_network, RouteLength, RouteSequence};
pub use shape::{classify_route, classify_shapes, ShapeClass, ShapeClassification};

use crate::config::AnalysisConfig;
use crate::models::types::{require_points, Result, SkippedUnit, Stage};
use crate::provider::TransitNetwork;

/// Every derived structure of one analysis pass.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnalysisReport {
    pub matches: Vec<MatchedStop>,
    /// Units a stage could not process, in stage order
    pub skipped: Vec<SkippedUnit>,
    pub sequences: Vec<RouteSequence>,
    pub route_lengths: Vec<RouteLength>,
    pub hubs: Vec<Hub>,
    pub top_hubs: Vec<Hub>,
    pub overlaps: Vec<OverlapPair>,
    pub shapes: Vec<ShapeClassification>,
    pub length_bands: Vec<BandGroup>,
    pub spacing_bands: Vec<BandGroup>,
}

impl AnalysisReport {
    pub fn duplicates(&self) -> impl Iterator<Item = &OverlapPair> {
        self.overlaps.iter().filter(|o| o.is_duplicate)
    }

    pub fn skipped_in(&self, stage: Stage) -> impl Iterator<Item = &SkippedUnit> {
        self.skipped.iter().filter(move |s| s.stage == stage)
    }
}

/// Run every analysis over `network`.
///
/// Fails only on an invalid configuration. Unusable route variants are
/// recorded in [`AnalysisReport::skipped`] and the rest of the pass proceeds.
pub fn analyze(network: &TransitNetwork, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    log::info!(
        "Analyzing {} route variants against {} stops",
        network.routes().len(),
        network.stops().len()
    );

    let matched = match_stops(network, config);
    log::info!("Matched {} route/stop pairs", matched.matches.len());

    let sequenced = sequence_network(network, &matched.matches, config);
    let route_lengths = route_lengths(&sequenced.sequences);

    let hubs = detect_hubs(&matched.matches);
    let top_hubs = top_hubs(&hubs);

    let overlaps = detect_overlaps(&matched.matches, config.duplicate_threshold_percent);

    let shapes = classify_shapes(network, config);
    let unclassified = network.routes().iter().filter_map(|route| {
        let reason = require_points(route, shape::MIN_SHAPE_POINTS).err()?;
        Some(SkippedUnit {
            route_id: route.id.clone(),
            direction: route.direction,
            stage: Stage::ShapeClassification,
            reason,
        })
    });

    let length_bands = length_bands(&route_lengths, &config.length_band_edges_km);
    let spacing_bands = spacing_bands(&sequenced.sequences, &config.spacing_band_edges_m);

    let skipped: Vec<SkippedUnit> = matched
        .skipped
        .into_iter()
        .chain(sequenced.skipped)
        .chain(unclassified)
        .collect();

    log::info!(
        "Analysis complete: {} hubs, {} duplicate pairs, {} skipped units",
        hubs.len(),
        overlaps.iter().filter(|o| o.is_duplicate).count(),
        skipped.len()
    );

    Ok(AnalysisReport {
        matches: matched.matches,
        skipped,
        sequences: sequenced.sequences,
        route_lengths,
        hubs,
        top_hubs,
        overlaps,
        shapes,
        length_bands,
        spacing_bands,
    })
}
