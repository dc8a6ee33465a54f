//! Transit network container.

pub mod network;

pub use network::TransitNetwork;
