//! Shared type definitions for the cascading infrastructure risk engine.
//!
//! This crate is the single source of truth for the data model used
//! across the workspace. Types flow downstream to `TypeScript` via `ts-rs`
//! for the situational dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Hazard event UUIDs and config-assigned node identifiers
//! - [`enums`] -- Node kinds, hazard kinds, risk levels, hardware actions
//! - [`structs`] -- Graph entities, hazard events, snapshots, decisions
//! - [`api`] -- Request/response payloads for the gateway

pub mod api;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use api::{
    ClearResponse, GraphResponse, HistoryResponse, InjectHazardRequest, InjectHazardResponse,
    NodeConditionRequest, NodeView, RiskAlertResponse, SnapshotResponse,
};
pub use enums::{
    CRITICAL_RISK, HIGH_RISK, HardwareAction, HazardKind, LOW_RISK, MEDIUM_RISK, NodeKind,
    RiskLevel, UnknownHazardKind,
};
pub use ids::{HazardEventId, NodeId};
pub use structs::{
    AlertDecision, CascadeStep, DecisionRecord, DependencyEdge, FailurePrediction, GeoPoint,
    HardwareTrigger, HazardEvent, InfrastructureNode, NodeRisk, RiskSnapshot,
};
