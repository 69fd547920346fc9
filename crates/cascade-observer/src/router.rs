//! Axum router construction for the gateway.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/risk` -- `WebSocket` risk alert stream
/// - `GET|POST /api/risk-alert` -- alert unit snapshot
/// - `POST /api/risk-alert/trigger-test` -- region-wide test hazard
/// - `GET /api/risk-alert/history` -- recent decisions
/// - `GET /api/snapshot` -- full snapshot
/// - `GET|POST /api/events` -- list / inject hazard events
/// - `GET|DELETE /api/events/{id}` -- single event / clear (`all` clears every event)
/// - `GET /api/graph` -- graph with risk
/// - `GET /api/nodes/{id}` -- single node
/// - `PUT /api/nodes/{id}/condition` -- node condition update
///
/// CORS allows any origin; the dashboard and alert unit are served from
/// other hosts.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/risk", get(ws::ws_risk))
        // Alert unit contract
        .route(
            "/api/risk-alert",
            get(handlers::get_risk_alert).post(handlers::get_risk_alert),
        )
        .route(
            "/api/risk-alert/trigger-test",
            post(handlers::trigger_test),
        )
        .route("/api/risk-alert/history", get(handlers::get_history))
        .route("/api/snapshot", get(handlers::get_snapshot))
        // Hazard events
        .route(
            "/api/events",
            get(handlers::list_events).post(handlers::inject_event),
        )
        .route(
            "/api/events/{id}",
            get(handlers::get_event).delete(handlers::clear_events),
        )
        // Graph
        .route("/api/graph", get(handlers::get_graph))
        .route("/api/nodes/{id}", get(handlers::get_node))
        .route(
            "/api/nodes/{id}/condition",
            put(handlers::update_node_condition),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
