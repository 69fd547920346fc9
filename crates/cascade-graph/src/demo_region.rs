//! Built-in demonstration region.
//!
//! Seven facilities around central Delhi with the dependency web used in
//! field demos: the power grid feeds everything, water and telecom feed
//! the hospital, and reciprocal control links close several cycles.
//! Used when no graph file is configured.

use cascade_types::{DependencyEdge, GeoPoint, InfrastructureNode, NodeId, NodeKind};

use crate::error::GraphError;
use crate::graph::{GraphConfig, InfrastructureGraph};

/// Helper to build an [`InfrastructureNode`].
#[allow(clippy::too_many_arguments)]
fn facility(
    id: &str,
    name: &str,
    kind: NodeKind,
    lat: f64,
    lon: f64,
    capacity: f64,
    current_load: f64,
    base_risk: f64,
) -> InfrastructureNode {
    InfrastructureNode {
        id: NodeId::from(id),
        name: name.to_owned(),
        kind,
        location: GeoPoint::new(lat, lon),
        capacity,
        current_load,
        base_risk,
    }
}

/// Helper to build a [`DependencyEdge`].
fn depends(source: &str, target: &str, weight: f64, delay_minutes: u32) -> DependencyEdge {
    DependencyEdge {
        source: NodeId::from(source),
        target: NodeId::from(target),
        propagation_weight: weight,
        propagation_delay_minutes: delay_minutes,
    }
}

/// Graph description of the demonstration region.
#[allow(clippy::too_many_lines)]
pub fn demo_region_config() -> GraphConfig {
    let nodes = vec![
        facility("power_grid_1", "Power Grid Station A", NodeKind::Power, 28.6139, 77.2090, 1000.0, 720.0, 0.05),
        facility("hospital_1", "City Hospital", NodeKind::Medical, 28.7041, 77.1025, 500.0, 410.0, 0.08),
        facility("water_supply_1", "Water Treatment Plant", NodeKind::Water, 28.5355, 77.3910, 2000.0, 1300.0, 0.06),
        facility("telecom_1", "Telecom Tower", NodeKind::Telecom, 28.5562, 77.1000, 100.0, 65.0, 0.04),
        facility("bridge_yamuna", "Yamuna Crossing Bridge", NodeKind::Bridge, 28.6300, 77.2500, 300.0, 240.0, 0.10),
        facility("transit_hub_1", "Central Transit Hub", NodeKind::Transport, 28.6430, 77.2190, 800.0, 500.0, 0.05),
        facility("eoc_1", "Emergency Operations Center", NodeKind::Other, 28.6280, 77.2170, 200.0, 90.0, 0.03),
    ];

    let edges = vec![
        // Power feeds everything.
        depends("power_grid_1", "hospital_1", 0.95, 15),
        depends("power_grid_1", "water_supply_1", 0.85, 30),
        depends("power_grid_1", "telecom_1", 0.80, 20),
        depends("power_grid_1", "transit_hub_1", 0.75, 10),
        depends("power_grid_1", "eoc_1", 0.85, 5),
        // Water.
        depends("water_supply_1", "hospital_1", 0.70, 60),
        depends("water_supply_1", "telecom_1", 0.50, 45),
        // Communications.
        depends("telecom_1", "hospital_1", 0.60, 120),
        depends("telecom_1", "eoc_1", 0.90, 5),
        depends("eoc_1", "power_grid_1", 0.40, 20),
        // Transport.
        depends("bridge_yamuna", "transit_hub_1", 0.50, 15),
        depends("bridge_yamuna", "hospital_1", 0.60, 30),
        // Load shedding at the hospital feeds back into the grid.
        depends("hospital_1", "power_grid_1", 0.30, 240),
    ];

    GraphConfig {
        region: "Delhi NCR (demo)".to_owned(),
        nodes,
        edges,
    }
}

/// Build the demonstration region.
///
/// # Errors
///
/// Returns [`GraphError`] if the hard-coded data fails validation (should
/// not happen).
pub fn create_demo_region() -> Result<InfrastructureGraph, GraphError> {
    InfrastructureGraph::load(demo_region_config())
}
