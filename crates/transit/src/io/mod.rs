pub mod traits;

pub use traits::{NetworkLoader, ReportWriter};
