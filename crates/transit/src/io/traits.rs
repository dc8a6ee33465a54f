//! Pluggable input and output traits.
//!
//! The library never touches files. Binaries implement these to read a
//! network from their own source format and to persist analysis reports.

use crate::analysis::AnalysisReport;
use crate::provider::TransitNetwork;

/// Produce a [`TransitNetwork`] from some external source
pub trait NetworkLoader {
    type Error;

    fn load(&self) -> Result<TransitNetwork, Self::Error>;
}

/// Persist or present a finished analysis
pub trait ReportWriter {
    type Error;

    fn write_report(
        &mut self,
        network: &TransitNetwork,
        report: &AnalysisReport,
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::AnalysisConfig;
    use crate::models::types::{Direction, Route, Stop, TransitError};

    struct InMemory {
        routes: Vec<Route>,
        stops: Vec<Stop>,
    }

    impl NetworkLoader for InMemory {
        type Error = TransitError;

        fn load(&self) -> Result<TransitNetwork, Self::Error> {
            TransitNetwork::from_data(self.routes.clone(), self.stops.clone())
        }
    }

    #[derive(Default)]
    struct HubCounter {
        written: Vec<(usize, usize)>,
    }

    impl ReportWriter for HubCounter {
        type Error = std::convert::Infallible;

        fn write_report(
            &mut self,
            network: &TransitNetwork,
            report: &AnalysisReport,
        ) -> Result<(), Self::Error> {
            self.written.push((network.stops().len(), report.hubs.len()));
            Ok(())
        }
    }

    #[test]
    fn test_load_analyze_write() {
        let loader = InMemory {
            routes: vec![Route::from_lat_lon(
                "1",
                Direction::Forward,
                &[(0.0, 0.0), (0.0, 0.01)],
            )],
            stops: vec![
                Stop::from_lat_lon("a", "A", 0.0, 0.002),
                Stop::from_lat_lon("far", "Far", 1.0, 1.0),
            ],
        };

        let network = loader.load().unwrap();
        let report = analyze(&network, &AnalysisConfig::default()).unwrap();

        let mut writer = HubCounter::default();
        writer.write_report(&network, &report).unwrap();
        assert_eq!(writer.written, vec![(2, 1)]);
    }

    #[test]
    fn test_loader_surfaces_duplicate_stops() {
        let loader = InMemory {
            routes: vec![],
            stops: vec![
                Stop::from_lat_lon("a", "A", 0.0, 0.0),
                Stop::from_lat_lon("a", "Again", 1.0, 1.0),
            ],
        };

        assert!(matches!(loader.load(), Err(TransitError::DuplicateStop(_))));
    }
}
