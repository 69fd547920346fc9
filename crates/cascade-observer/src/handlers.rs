//! REST endpoint handlers for the gateway.
//!
//! Read handlers serve the engine's latest publication; write handlers
//! forward to the engine and return once the resulting state has been
//! published.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET`, `POST` | `/api/risk-alert` | Alert unit snapshot |
//! | `POST` | `/api/risk-alert/trigger-test` | Inject a region-wide test hazard |
//! | `GET` | `/api/risk-alert/history` | Recent decisions, newest first |
//! | `GET` | `/api/snapshot` | Full snapshot, decision, and events |
//! | `POST` | `/api/events` | Inject a hazard event |
//! | `GET` | `/api/events` | List active events |
//! | `GET` | `/api/events/{id}` | Single event |
//! | `DELETE` | `/api/events/{target}` | Clear an event or `all` |
//! | `GET` | `/api/graph` | Nodes with risk, plus edges |
//! | `GET` | `/api/nodes/{id}` | Single node with risk |
//! | `PUT` | `/api/nodes/{id}/condition` | Update node load/base risk |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use cascade_types::{
    HistoryResponse, InjectHazardRequest, InjectHazardResponse, NodeConditionRequest,
};
use chrono::Utc;

use crate::error::ObserverError;
use crate::state::AppState;

/// Default number of decisions returned by the history endpoint.
const DEFAULT_HISTORY_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/risk-alert/history`.
#[derive(Debug, serde::Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of decisions to return (default 20).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the current risk state and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest();
    let region = latest.graph.region().to_owned();
    let level = latest.decision.risk_level;
    let score = latest.decision.aggregate_risk_score;
    let message = &latest.decision.message;
    let events = latest.active_events.len();
    let critical = latest.snapshot.critical_nodes.len();
    let version = latest.version;
    let started = state.started_at.format("%Y-%m-%d %H:%M:%S UTC");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Cascade Risk Gateway</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .level-{level} {{ font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Cascade Risk Gateway</h1>
    <p class="subtitle">{region} -- up since {started}</p>

    <p class="level-{level}">{message}</p>

    <div>
        <div class="metric">
            <div class="label">Risk level</div>
            <div class="value">{level}</div>
        </div>
        <div class="metric">
            <div class="label">Score</div>
            <div class="value">{score:.2}</div>
        </div>
        <div class="metric">
            <div class="label">Active events</div>
            <div class="value">{events}</div>
        </div>
        <div class="metric">
            <div class="label">Critical nodes</div>
            <div class="value">{critical}</div>
        </div>
        <div class="metric">
            <div class="label">Version</div>
            <div class="value">{version}</div>
        </div>
    </div>

    <hr>

    <h2>API</h2>
    <ul>
        <li>GET <a href="/api/risk-alert">/api/risk-alert</a></li>
        <li>GET <a href="/api/risk-alert/history">/api/risk-alert/history</a></li>
        <li>GET <a href="/api/snapshot">/api/snapshot</a></li>
        <li>GET <a href="/api/events">/api/events</a></li>
        <li>GET <a href="/api/graph">/api/graph</a></li>
        <li>POST /api/events</li>
        <li>DELETE /api/events/{{id|all}}</li>
        <li>PUT /api/nodes/{{id}}/condition</li>
        <li>WS /ws/risk</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Risk alert (alert unit contract)
// ---------------------------------------------------------------------------

/// `GET|POST /api/risk-alert` -- the shape polled by the alert unit.
pub async fn get_risk_alert(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.latest().alert())
}

/// `POST /api/risk-alert/trigger-test` -- inject a high-severity `test`
/// hazard over the region so the alert unit's buzzer can be checked.
pub async fn trigger_test(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let event_id = state.engine.trigger_test().await?;
    Ok((StatusCode::CREATED, Json(InjectHazardResponse { event_id })))
}

/// `GET /api/risk-alert/history?limit=N` -- recent decisions, newest first.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let alerts = state.engine.get_history(limit);
    Json(HistoryResponse {
        total: u32::try_from(alerts.len()).unwrap_or(u32::MAX),
        alerts,
        timestamp: Utc::now(),
    })
}

/// `GET /api/snapshot` -- full snapshot with decision and active events.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.latest().snapshot_response())
}

// ---------------------------------------------------------------------------
// Hazard events
// ---------------------------------------------------------------------------

/// `POST /api/events` -- inject a hazard event.
///
/// Responds `201 Created` with the new event id, or `400` naming the
/// invalid field.
pub async fn inject_event(
    State(state): State<Arc<AppState>>,
    body: Result<Json<InjectHazardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ObserverError> {
    let Json(request) = body?;
    let event_id = state.engine.inject(&request).await?;
    Ok((StatusCode::CREATED, Json(InjectHazardResponse { event_id })))
}

/// `GET /api/events` -- active events in injection order.
pub async fn list_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest();
    Json(serde_json::json!({
        "count": latest.active_events.len(),
        "events": latest.active_events,
    }))
}

/// `GET /api/events/{id}` -- a single active event.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.get_event(&id)?))
}

/// `DELETE /api/events/{target}` -- clear one event, or every event when
/// `target` is `all`. Clearing an unknown id succeeds and removes nothing.
pub async fn clear_events(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
) -> impl IntoResponse {
    Json(state.engine.clear(&target).await)
}

// ---------------------------------------------------------------------------
// Graph and nodes
// ---------------------------------------------------------------------------

/// `GET /api/graph` -- all nodes with current risk, plus edges.
pub async fn get_graph(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.latest().graph_response())
}

/// `GET /api/nodes/{id}` -- a single node with current risk.
pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.get_node(&id)?))
}

/// `PUT /api/nodes/{id}/condition` -- apply an observed load and/or base
/// risk. Responds with the node as published after the update.
pub async fn update_node_condition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<NodeConditionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ObserverError> {
    let Json(request) = body?;
    Ok(Json(state.engine.update_node_condition(&id, &request).await?))
}
