//! Request and response payloads exchanged with external collaborators.
//!
//! [`RiskAlertResponse`] is the exact shape polled by the alert unit and
//! pushed over the stream channel; consumers treat anything malformed as
//! "no change", so field names here are part of the contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{HardwareAction, RiskLevel};
use crate::ids::HazardEventId;
use crate::structs::{
    AlertDecision, DecisionRecord, DependencyEdge, GeoPoint, HardwareTrigger, HazardEvent,
    InfrastructureNode, NodeRisk, RiskSnapshot,
};

/// Body of a hazard injection.
///
/// Every field is optional at the serde layer so that missing fields are
/// reported as validation failures naming the field, rather than as
/// opaque deserialization errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InjectHazardRequest {
    /// Hazard type name, e.g. `"flood"`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Severity, `0..=1`.
    pub severity: Option<f64>,
    /// Epicenter.
    pub location: Option<GeoPoint>,
    /// Affected radius in meters. Derived from type and severity when absent.
    pub radius: Option<f64>,
}

/// Response to a successful injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InjectHazardResponse {
    /// Identifier of the new event.
    pub event_id: HazardEventId,
}

/// Response to a clear request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClearResponse {
    /// Number of events removed by this call.
    pub cleared: u32,
    /// Events still active afterwards.
    pub active_event_count: u32,
}

/// Body of a node condition update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeConditionRequest {
    /// New current load, `>= 0`.
    pub current_load: Option<f64>,
    /// New base risk, `0..=1`.
    pub base_risk: Option<f64>,
}

/// Snapshot shape consumed by the polling alert unit and the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RiskAlertResponse {
    /// Aggregate risk rounded to two decimals.
    pub risk_score: f64,
    /// Aggregate classification.
    pub risk_level: RiskLevel,
    /// Actuation intent.
    pub hardware_action: HardwareAction,
    /// Actuation flags.
    pub hardware_trigger: HardwareTrigger,
    /// Operator-facing summary.
    pub message: String,
    /// Number of active hazard events.
    pub active_event_count: u32,
    /// Publication time of the underlying snapshot.
    pub timestamp: DateTime<Utc>,
}

impl RiskAlertResponse {
    /// Project a decision onto the wire shape.
    pub fn from_decision(
        decision: &AlertDecision,
        active_event_count: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            risk_score: (decision.aggregate_risk_score * 100.0).round() / 100.0,
            risk_level: decision.risk_level,
            hardware_action: decision.hardware_action,
            hardware_trigger: decision.hardware_trigger,
            message: decision.message.clone(),
            active_event_count,
            timestamp,
        }
    }
}

/// Recent decisions, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistoryResponse {
    /// Number of records returned.
    pub total: u32,
    /// The records.
    pub alerts: Vec<DecisionRecord>,
    /// Time of the query.
    pub timestamp: DateTime<Utc>,
}

/// Full snapshot query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SnapshotResponse {
    /// Publication version.
    pub version: u64,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// Risk snapshot.
    pub snapshot: RiskSnapshot,
    /// Decision derived from `snapshot`.
    pub decision: AlertDecision,
    /// Active hazard events.
    pub active_events: Vec<HazardEvent>,
}

/// A node together with its current risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeView {
    /// Node definition and current condition.
    #[serde(flatten)]
    pub node: InfrastructureNode,
    /// Current risk; absent only if the node was added after the last
    /// publication.
    pub risk: Option<NodeRisk>,
}

/// The whole region graph with current risk per node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GraphResponse {
    /// Region name.
    pub region: String,
    /// Publication version the risks belong to.
    pub version: u64,
    /// Nodes in id order.
    pub nodes: Vec<NodeView>,
    /// Dependency edges.
    pub edges: Vec<DependencyEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_request_tolerates_missing_fields() {
        let req: Result<InjectHazardRequest, _> = serde_json::from_str(r#"{"type":"flood"}"#);
        let req = req.ok().unwrap_or_default();
        assert_eq!(req.kind.as_deref(), Some("flood"));
        assert!(req.severity.is_none());
        assert!(req.location.is_none());
    }

    #[test]
    fn alert_response_rounds_score() {
        let decision = AlertDecision {
            aggregate_risk_score: 0.856_7,
            risk_level: RiskLevel::High,
            hardware_action: HardwareAction::Alarm,
            hardware_trigger: HardwareTrigger {
                buzzer: true,
                red_led: true,
                green_led: false,
                pulse: true,
                intensity: 218,
            },
            message: String::from("x"),
        };
        let resp = RiskAlertResponse::from_decision(&decision, 1, Utc::now());
        assert!((resp.risk_score - 0.86).abs() < 1e-9);
        let json = serde_json::to_value(&resp).ok();
        let buzzer = json
            .as_ref()
            .and_then(|v| v.pointer("/hardware_trigger/buzzer"))
            .and_then(serde_json::Value::as_bool);
        assert_eq!(buzzer, Some(true));
    }
}
