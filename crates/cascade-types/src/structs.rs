//! Core entity structs: infrastructure, hazards, risk snapshots, and
//! alert decisions.
//!
//! Every derived value in this module is immutable once built. The engine
//! replaces snapshots and decisions wholesale rather than editing them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{HardwareAction, HazardKind, NodeKind, RiskLevel};
use crate::ids::{HazardEventId, NodeId};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude, `-90..=90`.
    pub lat: f64,
    /// Longitude, `-180..=180`.
    pub lon: f64,
}

impl GeoPoint {
    /// Construct a point without validation.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

// ---------------------------------------------------------------------------
// Infrastructure graph
// ---------------------------------------------------------------------------

/// A single piece of infrastructure in the region's dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InfrastructureNode {
    /// Unique identifier within the region.
    pub id: NodeId,
    /// Human-readable name.
    pub name: String,
    /// Infrastructure category.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Physical location.
    pub location: GeoPoint,
    /// Nominal service capacity (unit depends on the node type).
    pub capacity: f64,
    /// Current service load, same unit as `capacity`.
    pub current_load: f64,
    /// Baseline failure likelihood with no active hazards, `0..=1`.
    pub base_risk: f64,
}

impl InfrastructureNode {
    /// Fraction of capacity in use, or `None` when capacity is zero.
    pub fn utilization(&self) -> Option<f64> {
        (self.capacity > 0.0).then(|| self.current_load / self.capacity)
    }
}

/// Directed dependency: failure of `source` raises the risk of `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DependencyEdge {
    /// The node depended upon.
    pub source: NodeId,
    /// The dependent node.
    pub target: NodeId,
    /// Fraction of the source's risk transmitted to the target, `0..=1`.
    pub propagation_weight: f64,
    /// Minutes before a source failure is felt at the target.
    pub propagation_delay_minutes: u32,
}

// ---------------------------------------------------------------------------
// Hazards
// ---------------------------------------------------------------------------

/// An active hazard event held by the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HazardEvent {
    /// Unique event identifier.
    pub id: HazardEventId,
    /// Hazard type.
    #[serde(rename = "type")]
    pub kind: HazardKind,
    /// Severity at detection, `0..=1`.
    pub severity: f64,
    /// Severity after decay; this is what seeds node risk.
    pub effective_severity: f64,
    /// Center of the affected area.
    pub epicenter: GeoPoint,
    /// Radius of the affected area in meters.
    pub radius_m: f64,
    /// When the event was detected or injected.
    pub detected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Risk snapshot
// ---------------------------------------------------------------------------

/// Risk assessment for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeRisk {
    /// Failure likelihood, `0..=1`.
    pub risk: f64,
    /// Classification of `risk`.
    pub level: RiskLevel,
}

/// One entry of the projected cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CascadeStep {
    /// The node crossing the elevated threshold.
    pub node_id: NodeId,
    /// The node's risk once the cascade settles.
    pub projected_risk: f64,
    /// Minutes after detection at which the crossing happens.
    pub time_offset_minutes: u32,
}

/// The node expected to fail next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FailurePrediction {
    /// The predicted node.
    pub node_id: NodeId,
    /// Probability of failure (the node's risk).
    pub probability: f64,
    /// Estimated minutes until failure.
    pub estimated_time_minutes: u32,
}

/// Complete output of one propagation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RiskSnapshot {
    /// Per-node risk, keyed and therefore ordered by node id.
    pub nodes: BTreeMap<NodeId, NodeRisk>,
    /// Nodes crossing the elevated threshold, ascending by time offset.
    pub cascade_timeline: Vec<CascadeStep>,
    /// Nodes at or above the critical threshold, descending by risk.
    pub critical_nodes: Vec<NodeId>,
    /// The most urgent non-critical node, if any.
    pub next_failure_prediction: Option<FailurePrediction>,
    /// `false` when propagation hit its pass cap and this snapshot holds
    /// seed-only risk.
    pub converged: bool,
    /// Relaxation passes executed.
    pub passes: u32,
}

impl RiskSnapshot {
    /// Snapshot with no nodes.
    pub const fn empty() -> Self {
        Self {
            nodes: BTreeMap::new(),
            cascade_timeline: Vec::new(),
            critical_nodes: Vec::new(),
            next_failure_prediction: None,
            converged: true,
            passes: 0,
        }
    }

    /// Risk of a node, if it exists.
    pub fn risk_of(&self, id: &str) -> Option<f64> {
        self.nodes.get(id).map(|n| n.risk)
    }

    /// Highest node risk, `0.0` for an empty snapshot.
    pub fn max_risk(&self) -> f64 {
        self.nodes.values().map(|n| n.risk).fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Alert decision
// ---------------------------------------------------------------------------

/// Discrete actuation flags for the alert unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HardwareTrigger {
    /// Sound the buzzer.
    pub buzzer: bool,
    /// Light the red LED.
    pub red_led: bool,
    /// Light the green LED.
    pub green_led: bool,
    /// Pulse rather than hold the outputs.
    pub pulse: bool,
    /// Output intensity, `0..=255`.
    pub intensity: u8,
}

/// Decision derived from a [`RiskSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AlertDecision {
    /// Highest node risk in the snapshot.
    pub aggregate_risk_score: f64,
    /// Classification of the aggregate score.
    pub risk_level: RiskLevel,
    /// Actuation intent.
    pub hardware_action: HardwareAction,
    /// Actuation flags.
    pub hardware_trigger: HardwareTrigger,
    /// Operator-facing summary.
    pub message: String,
}

/// A published decision kept in the history ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DecisionRecord {
    /// Publication version that produced this decision.
    pub version: u64,
    /// When the decision was published.
    pub recorded_at: DateTime<Utc>,
    /// The decision itself.
    pub decision: AlertDecision,
    /// Active hazard count at publication.
    pub active_event_count: u32,
}
