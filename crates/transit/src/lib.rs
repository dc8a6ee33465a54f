//! # stopline-transit
//!
//! Stop-to-route analysis of a transit network described by raw geometry.
//!
//! ## Features
//!
//! - **Spatial matching**: Attach stops to route polylines with an R-tree prefilter
//! - **Sequencing**: Order matched stops along each route and measure the gaps
//! - **Hubs and duplicates**: Find transfer points and routes sharing most of their stops
//! - **Shape classification**: Label routes as loop, zigzag or linear
//! - **Parallel passes**: Spread per-route work over a thread pool (optional)
//!
//! ## Example
//!
//! ```
//! use stopline_transit::prelude::*;
//!
//! let routes = vec![
//!     Route::from_lat_lon("1", Direction::Forward, &[(52.50, 13.40), (52.50, 13.45)]),
//!     Route::from_lat_lon("2", Direction::Forward, &[(52.48, 13.42), (52.52, 13.42)]),
//! ];
//! let stops = vec![
//!     Stop::from_lat_lon("crossing", "Crossing", 52.5001, 13.4201),
//!     Stop::from_lat_lon("east", "East End", 52.5002, 13.449),
//! ];
//!
//! let network = TransitNetwork::from_data(routes, stops).unwrap();
//! let report = analyze(&network, &AnalysisConfig::default()).unwrap();
//!
//! assert_eq!(report.top_hubs.len(), 1);
//! assert_eq!(report.top_hubs[0].stop_id.as_str(), "crossing");
//! assert_eq!(report.top_hubs[0].route_count, 2);
//! ```

pub mod analysis;
pub mod config;
pub mod identifiers;
pub mod io;
pub mod models;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::analysis::{
        analyze, classify_route, classify_shapes, detect_hubs, detect_overlaps, length_bands,
        match_route, match_stops, route_lengths, route_stop_sets, sequence_network,
        spacing_bands, top_hubs, AnalysisReport, BandGroup, Hub, MatchOutcome, MatchedStop,
        OverlapPair, RouteLength, RouteSequence, ShapeClass, ShapeClassification,
    };
    pub use crate::config::{AnalysisConfig, GreatCircleMethod};
    pub use crate::identifiers::*;
    pub use crate::io::traits::*;
    pub use crate::models::types::*;
    pub use crate::provider::TransitNetwork;
}

pub use prelude::*;
