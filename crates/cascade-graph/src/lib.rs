//! Infrastructure graph store for the cascading risk engine.
//!
//! This crate models a region's infrastructure as a directed weighted
//! graph: facilities as nodes, dependencies as edges carrying a
//! propagation weight and delay. Graphs may contain cycles.
//!
//! # Modules
//!
//! - [`error`] -- Load-time and lookup errors.
//! - [`geo`] -- Great-circle distance between coordinates.
//! - [`graph`] -- [`InfrastructureGraph`] and its on-disk [`GraphConfig`].
//! - [`demo_region`] -- Built-in region used when no graph file is given.

pub mod demo_region;
pub mod error;
pub mod geo;
pub mod graph;

// Re-export primary types at crate root.
pub use demo_region::{create_demo_region, demo_region_config};
pub use error::GraphError;
pub use geo::distance_m;
pub use graph::{GraphConfig, InfrastructureGraph};
