//! Transit network data model: routes, stops and the error taxonomy.

pub mod types;

// Re-exports for convenience
pub use types::{
    Direction, Result, Route, RouteKey, SkippedUnit, Stage, Stop, TransitError,
};
