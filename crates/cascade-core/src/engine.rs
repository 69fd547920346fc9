//! The risk engine session: one writer, many lock-free readers.
//!
//! Every mutation (inject, clear, decay tick, node condition update) goes
//! through [`RiskEngine`]'s session mutex, which serializes writers. A
//! successful mutation recomputes the snapshot and decision inside the
//! same call and publishes an immutable [`PublishedState`] two ways:
//!
//! - a `watch` channel holding the latest state, read by queries without
//!   touching the session lock, and
//! - a bounded `broadcast` channel feeding stream subscribers. A
//!   subscriber that falls behind loses its oldest notifications and
//!   resumes at the newest.
//!
//! Mutations that change nothing (clearing an unknown id, an update that
//! writes the current values) publish nothing.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};

use cascade_graph::{InfrastructureGraph, distance_m};
use cascade_types::{
    AlertDecision, ClearResponse, DecisionRecord, GraphResponse, HIGH_RISK, HazardEvent,
    HazardEventId, HazardKind, InjectHazardRequest, NodeConditionRequest, NodeView,
    RiskAlertResponse, RiskSnapshot, SnapshotResponse,
};

use crate::config::{DecayConfig, EngineConfig, PropagationConfig};
use crate::decision;
use crate::error::SessionError;
use crate::event_store::{ClearTarget, DecayOutcome, EventStore};
use crate::propagation;

/// Severity of the hardware test hazard, inside the high band.
const TEST_SEVERITY: f64 = HIGH_RISK + 0.05;

/// One published, immutable view of the engine.
#[derive(Debug, Clone)]
pub struct PublishedState {
    /// Monotonic publication counter, starting at 0 for the initial state.
    pub version: u64,
    /// When this state was published.
    pub published_at: DateTime<Utc>,
    /// Graph as of publication, including node condition updates.
    pub graph: Arc<InfrastructureGraph>,
    /// Active events in injection order.
    pub active_events: Vec<HazardEvent>,
    /// Propagation result.
    pub snapshot: RiskSnapshot,
    /// Decision derived from `snapshot`.
    pub decision: AlertDecision,
    /// Recent decisions, newest first, ending with this one.
    pub history: Vec<DecisionRecord>,
}

impl PublishedState {
    /// Number of active events, saturating.
    pub fn active_event_count(&self) -> u32 {
        u32::try_from(self.active_events.len()).unwrap_or(u32::MAX)
    }

    /// The polled/pushed hardware shape.
    pub fn alert(&self) -> RiskAlertResponse {
        RiskAlertResponse::from_decision(
            &self.decision,
            self.active_event_count(),
            self.published_at,
        )
    }

    /// Full snapshot query payload.
    pub fn snapshot_response(&self) -> SnapshotResponse {
        SnapshotResponse {
            version: self.version,
            published_at: self.published_at,
            snapshot: self.snapshot.clone(),
            decision: self.decision.clone(),
            active_events: self.active_events.clone(),
        }
    }

    /// A node with its published risk.
    pub fn node_view(&self, id: &str) -> Option<NodeView> {
        let node = self.graph.get_node(id)?;
        Some(NodeView {
            node: node.clone(),
            risk: self.snapshot.nodes.get(id).copied(),
        })
    }

    /// The whole graph with published risk.
    pub fn graph_response(&self) -> GraphResponse {
        GraphResponse {
            region: self.graph.region().to_owned(),
            version: self.version,
            nodes: self
                .graph
                .iterate_nodes()
                .map(|node| NodeView {
                    node: node.clone(),
                    risk: self.snapshot.nodes.get(&node.id).copied(),
                })
                .collect(),
            edges: self.graph.edges().cloned().collect(),
        }
    }
}

/// Writer-owned mutable state.
#[derive(Debug)]
struct Session {
    graph: Arc<InfrastructureGraph>,
    events: EventStore,
    history: VecDeque<DecisionRecord>,
    next_version: u64,
}

/// The engine: serialized mutations, atomically published results.
#[derive(Debug)]
pub struct RiskEngine {
    propagation: PropagationConfig,
    decay: DecayConfig,
    history_capacity: usize,
    session: Mutex<Session>,
    latest: watch::Sender<Arc<PublishedState>>,
    notifications: broadcast::Sender<Arc<PublishedState>>,
}

impl RiskEngine {
    /// Start a session over `graph` and publish its initial state
    /// (version 0, no events).
    pub fn new(graph: InfrastructureGraph, config: &EngineConfig) -> Self {
        let history_capacity = config.gateway.history_capacity.max(1);
        let (notifications, _) = broadcast::channel(config.gateway.stream_buffer.max(1));

        let mut session = Session {
            graph: Arc::new(graph),
            events: EventStore::new(),
            history: VecDeque::with_capacity(history_capacity),
            next_version: 0,
        };
        let initial = compute(
            &mut session,
            &config.propagation,
            history_capacity,
            Utc::now(),
        );
        let (latest, _) = watch::channel(initial);

        tracing::info!(
            region = session.graph.region(),
            nodes = session.graph.node_count(),
            edges = session.graph.edge_count(),
            "Risk engine session started"
        );

        Self {
            propagation: config.propagation.clone(),
            decay: config.decay.clone(),
            history_capacity,
            session: Mutex::new(session),
            latest,
            notifications,
        }
    }

    // -------------------------------------------------------------------
    // Mutations (single writer)
    // -------------------------------------------------------------------

    /// Validate and register a hazard event, then publish.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] for a malformed request; the
    /// published state is unchanged.
    pub async fn inject(
        &self,
        request: &InjectHazardRequest,
    ) -> Result<HazardEventId, SessionError> {
        let mut session = self.session.lock().await;
        let now = Utc::now();
        let id = session.events.inject(request, now)?;
        self.publish(&mut session, now);
        Ok(id)
    }

    /// Inject a `test` hazard over the whole region so the alert unit can
    /// be exercised without a real event.
    ///
    /// The epicenter sits on the first node in id order, which is seeded
    /// at [`TEST_SEVERITY`]; the radius reaches every other node.
    ///
    /// # Errors
    ///
    /// [`SessionError::Validation`] if the graph has no nodes.
    pub async fn trigger_test(&self) -> Result<HazardEventId, SessionError> {
        let mut session = self.session.lock().await;
        let request = test_hazard(&session.graph)
            .ok_or_else(|| SessionError::validation("graph", "region has no nodes"))?;
        let now = Utc::now();
        let id = session.events.inject(&request, now)?;
        self.publish(&mut session, now);
        tracing::info!(event_id = %id, severity = TEST_SEVERITY, "Test hazard injected");
        Ok(id)
    }

    /// Clear one event (by id) or every event (`"all"`).
    ///
    /// Idempotent: an unknown or already-cleared target removes nothing
    /// and publishes nothing.
    pub async fn clear(&self, target: &str) -> ClearResponse {
        let target = ClearTarget::parse(target);
        let mut session = self.session.lock().await;
        let cleared = session.events.clear(&target);
        if cleared > 0 {
            self.publish(&mut session, Utc::now());
        }
        ClearResponse {
            cleared: u32::try_from(cleared).unwrap_or(u32::MAX),
            active_event_count: u32::try_from(session.events.len()).unwrap_or(u32::MAX),
        }
    }

    /// Run one decay tick as of now.
    pub async fn tick(&self) -> DecayOutcome {
        self.tick_at(Utc::now()).await
    }

    /// Run one decay tick as of `now`, publishing if anything changed.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> DecayOutcome {
        let mut session = self.session.lock().await;
        let outcome = session.events.tick_at(now, &self.decay);
        if outcome.changed() {
            self.publish(&mut session, now);
        }
        outcome
    }

    /// Apply an externally observed load and/or base risk to a node.
    ///
    /// The graph is copy-on-write: readers holding an earlier publication
    /// keep seeing the earlier values.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotFound`] for an unknown node,
    /// [`SessionError::Validation`] for out-of-range values or an empty
    /// request.
    pub async fn update_node_condition(
        &self,
        id: &str,
        request: &NodeConditionRequest,
    ) -> Result<NodeView, SessionError> {
        if request.current_load.is_none() && request.base_risk.is_none() {
            return Err(SessionError::validation(
                "body",
                "expected current_load and/or base_risk",
            ));
        }

        let mut session = self.session.lock().await;
        let node = session.graph.node(id)?;

        let mut updated = (*session.graph).clone();
        let changed = updated.update_condition(id, request.current_load, request.base_risk)?;
        if changed {
            tracing::info!(
                node_id = %node.id,
                current_load = ?request.current_load,
                base_risk = ?request.base_risk,
                "Node condition updated"
            );
            session.graph = Arc::new(updated);
            self.publish(&mut session, Utc::now());
        }

        self.latest
            .borrow()
            .node_view(id)
            .ok_or_else(|| SessionError::not_found("node", id))
    }

    fn publish(&self, session: &mut Session, now: DateTime<Utc>) {
        let state = compute(session, &self.propagation, self.history_capacity, now);

        tracing::debug!(
            version = state.version,
            risk_score = state.decision.aggregate_risk_score,
            risk_level = %state.decision.risk_level,
            active_events = state.active_events.len(),
            converged = state.snapshot.converged,
            "Risk state published"
        );

        self.latest.send_replace(Arc::clone(&state));
        // Err only means nobody is subscribed.
        let _ = self.notifications.send(state);
    }

    // -------------------------------------------------------------------
    // Queries (lock-free against the latest publication)
    // -------------------------------------------------------------------

    /// Latest published state.
    pub fn get_snapshot(&self) -> Arc<PublishedState> {
        Arc::clone(&self.latest.borrow())
    }

    /// Up to `limit` most recent decisions, newest first.
    pub fn get_history(&self, limit: usize) -> Vec<DecisionRecord> {
        self.latest
            .borrow()
            .history
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Active events in injection order.
    pub fn active_events(&self) -> Vec<HazardEvent> {
        self.latest.borrow().active_events.clone()
    }

    /// One active event.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotFound`] if no active event has this id.
    pub fn get_event(&self, id: &str) -> Result<HazardEvent, SessionError> {
        let not_found = || SessionError::not_found("event", id);
        let Ok(event_id) = id.trim().parse::<HazardEventId>() else {
            return Err(not_found());
        };
        self.latest
            .borrow()
            .active_events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(not_found)
    }

    /// One node with its current risk.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotFound`] for an unknown node.
    pub fn get_node(&self, id: &str) -> Result<NodeView, SessionError> {
        self.latest
            .borrow()
            .node_view(id)
            .ok_or_else(|| SessionError::not_found("node", id))
    }

    /// Stream of publications. Dropping the receiver cancels it.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PublishedState>> {
        self.notifications.subscribe()
    }

    /// Watch handle on the latest publication.
    pub fn watch(&self) -> watch::Receiver<Arc<PublishedState>> {
        self.latest.subscribe()
    }

    /// Decay settings in effect.
    pub const fn decay_config(&self) -> &DecayConfig {
        &self.decay
    }
}

/// Test hazard anchored on the first node, twice as wide as the region.
fn test_hazard(graph: &InfrastructureGraph) -> Option<InjectHazardRequest> {
    let anchor = graph.iterate_nodes().next()?.location;
    let reach = graph
        .iterate_nodes()
        .map(|node| distance_m(anchor, node.location))
        .fold(0.0_f64, f64::max);
    Some(InjectHazardRequest {
        kind: Some(HazardKind::Test.as_str().to_owned()),
        severity: Some(TEST_SEVERITY),
        location: Some(anchor),
        radius: Some((reach * 2.0).max(HazardKind::Test.base_radius_m())),
    })
}

/// Recompute snapshot and decision, bump the version, and record history.
fn compute(
    session: &mut Session,
    config: &PropagationConfig,
    history_capacity: usize,
    now: DateTime<Utc>,
) -> Arc<PublishedState> {
    let snapshot = propagation::assess(&session.graph, session.events.active(), config);
    let decision = decision::derive(&snapshot);

    let version = session.next_version;
    session.next_version = version.saturating_add(1);

    let active_events = session.events.active().to_vec();
    session.history.push_front(DecisionRecord {
        version,
        recorded_at: now,
        decision: decision.clone(),
        active_event_count: u32::try_from(active_events.len()).unwrap_or(u32::MAX),
    });
    session.history.truncate(history_capacity);

    Arc::new(PublishedState {
        version,
        published_at: now,
        graph: Arc::clone(&session.graph),
        active_events,
        snapshot,
        decision,
        history: session.history.iter().cloned().collect(),
    })
}
