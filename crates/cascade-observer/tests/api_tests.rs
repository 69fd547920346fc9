//! Integration tests for the gateway endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use cascade_core::{EngineConfig, RiskEngine};
use cascade_graph::create_demo_region;
use cascade_observer::router::build_router;
use cascade_observer::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let engine = RiskEngine::new(create_demo_region().unwrap(), &EngineConfig::default());
    Arc::new(AppState::new(Arc::new(engine)))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: &Value) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn epicenter_flood() -> Value {
    json!({
        "type": "flood",
        "severity": 0.85,
        "location": { "lat": 28.6139, "lon": 77.2090 },
        "radius": 2000
    })
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let router = build_router(make_test_state());

    let response = router.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_risk_alert_initially_safe() {
    let router = build_router(make_test_state());

    let (status, json) = send(&router, get("/api/risk-alert")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["risk_level"], "safe");
    assert_eq!(json["hardware_action"], "none");
    assert_eq!(json["hardware_trigger"]["green_led"], true);
    assert_eq!(json["hardware_trigger"]["buzzer"], false);
    assert_eq!(json["active_event_count"], 0);
    assert!(json["timestamp"].is_string());
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_risk_alert_accepts_post() {
    let router = build_router(make_test_state());

    let request = Request::post("/api/risk-alert").body(Body::empty()).unwrap();
    let (status, json) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["risk_score"].is_number());
}

#[tokio::test]
async fn test_inject_flood_raises_alarm() {
    let router = build_router(make_test_state());

    let (status, json) = send(&router, post_json("/api/events", &epicenter_flood())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json["event_id"].is_string());

    let (_, alert) = send(&router, get("/api/risk-alert")).await;
    assert!(alert["risk_score"].as_f64().unwrap() > 0.849);
    let level = alert["risk_level"].as_str().unwrap();
    assert!(level == "high" || level == "critical", "level was {level}");
    assert_eq!(alert["hardware_action"], "alarm");
    assert_eq!(alert["hardware_trigger"]["buzzer"], true);
    assert_eq!(alert["hardware_trigger"]["pulse"], true);
    assert_eq!(alert["active_event_count"], 1);
}

#[tokio::test]
async fn test_distant_weak_flood_stays_safe() {
    let router = build_router(make_test_state());

    let body = json!({
        "type": "flood",
        "severity": 0.2,
        "location": { "lat": 51.5074, "lon": -0.1278 }
    });
    let (status, _) = send(&router, post_json("/api/events", &body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, alert) = send(&router, get("/api/risk-alert")).await;
    assert_eq!(alert["risk_level"], "safe");
    assert_eq!(alert["hardware_trigger"]["buzzer"], false);
    assert_eq!(alert["hardware_trigger"]["green_led"], true);
}

#[tokio::test]
async fn test_inject_rejects_invalid_fields() {
    let router = build_router(make_test_state());

    let cases = [
        (json!({"type": "meteor", "severity": 0.5, "location": {"lat": 0, "lon": 0}}), "type"),
        (json!({"type": "fire", "severity": 1.5, "location": {"lat": 0, "lon": 0}}), "severity"),
        (json!({"type": "fire", "severity": 0.5, "location": {"lat": 95, "lon": 0}}), "location"),
        (json!({"type": "fire", "severity": 0.5}), "location"),
        (
            json!({"type": "fire", "severity": 0.5, "location": {"lat": 0, "lon": 0}, "radius": 0}),
            "radius",
        ),
    ];

    for (body, field) in cases {
        let (status, json) = send(&router, post_json("/api/events", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["field"], field, "{body}");
        assert_eq!(json["status"], 400);
    }

    let (_, alert) = send(&router, get("/api/risk-alert")).await;
    assert_eq!(alert["active_event_count"], 0);
}

#[tokio::test]
async fn test_inject_rejects_malformed_json() {
    let router = build_router(make_test_state());

    let request = Request::post("/api/events")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
    assert_eq!(json["field"], "body");
}

#[tokio::test]
async fn test_inject_mistyped_field_is_named() {
    let router = build_router(make_test_state());

    let cases = [
        (
            json!({"type": "flood", "severity": "high", "location": {"lat": 0, "lon": 0}}),
            "severity",
        ),
        (
            json!({"type": "flood", "severity": 0.5, "location": {"lat": "north", "lon": 0}}),
            "location.lat",
        ),
        (json!({"type": 7, "severity": 0.5, "location": {"lat": 0, "lon": 0}}), "type"),
        (json!([1, 2, 3]), "body"),
    ];

    for (body, field) in cases {
        let (status, json) = send(&router, post_json("/api/events", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["field"], field, "{body}");
    }
}

#[tokio::test]
async fn test_trigger_test_sounds_buzzer() {
    let router = build_router(make_test_state());

    let request = Request::post("/api/risk-alert/trigger-test")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = json["event_id"].as_str().unwrap().to_owned();

    let (_, alert) = send(&router, get("/api/risk-alert")).await;
    let level = alert["risk_level"].as_str().unwrap();
    assert!(level == "high" || level == "critical", "level was {level}");
    assert_eq!(alert["hardware_action"], "alarm");
    assert_eq!(alert["hardware_trigger"]["buzzer"], true);
    assert_eq!(alert["active_event_count"], 1);

    let (status, event) = send(&router, get(&format!("/api/events/{event_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["type"], "test");
}

#[tokio::test]
async fn test_list_and_get_event() {
    let router = build_router(make_test_state());
    let (_, created) = send(&router, post_json("/api/events", &epicenter_flood())).await;
    let id = created["event_id"].as_str().unwrap().to_owned();

    let (status, json) = send(&router, get("/api/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["events"][0]["id"], id.as_str());
    assert_eq!(json["events"][0]["type"], "flood");

    let (status, json) = send(&router, get(&format!("/api/events/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["severity"], 0.85);
}

#[tokio::test]
async fn test_get_unknown_event_returns_404() {
    let router = build_router(make_test_state());

    let (status, json) = send(
        &router,
        get("/api/events/01900000-0000-7000-8000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
    assert_eq!(json["status"], 404);

    let (status, _) = send(&router, get("/api/events/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_event_is_idempotent() {
    let router = build_router(make_test_state());
    let (_, created) = send(&router, post_json("/api/events", &epicenter_flood())).await;
    let id = created["event_id"].as_str().unwrap().to_owned();

    let (status, json) = send(&router, delete(&format!("/api/events/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], 1);
    assert_eq!(json["active_event_count"], 0);

    let (_, before) = send(&router, get("/api/snapshot")).await;

    let (status, json) = send(&router, delete(&format!("/api/events/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], 0);

    let (_, after) = send(&router, get("/api/snapshot")).await;
    assert_eq!(before["version"], after["version"]);
    assert_eq!(before["snapshot"], after["snapshot"]);
}

#[tokio::test]
async fn test_clear_all() {
    let router = build_router(make_test_state());
    send(&router, post_json("/api/events", &epicenter_flood())).await;
    send(&router, post_json("/api/events", &epicenter_flood())).await;

    let (status, json) = send(&router, delete("/api/events/all")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], 2);

    let (_, alert) = send(&router, get("/api/risk-alert")).await;
    assert_eq!(alert["active_event_count"], 0);
    assert_eq!(alert["risk_level"], "safe");
}

#[tokio::test]
async fn test_snapshot_contains_timeline_and_decision() {
    let router = build_router(make_test_state());
    send(&router, post_json("/api/events", &epicenter_flood())).await;

    let (status, json) = send(&router, get("/api/snapshot")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["version"], 1);
    assert_eq!(json["snapshot"]["converged"], true);
    assert!(json["snapshot"]["nodes"]["power_grid_1"]["risk"].as_f64().unwrap() > 0.849);

    let timeline = json["snapshot"]["cascade_timeline"].as_array().unwrap();
    assert!(!timeline.is_empty());
    assert_eq!(timeline[0]["node_id"], "power_grid_1");
    assert_eq!(timeline[0]["time_offset_minutes"], 0);
    let offsets: Vec<u64> = timeline
        .iter()
        .map(|s| s["time_offset_minutes"].as_u64().unwrap())
        .collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(json["decision"]["hardware_action"], "alarm");
    assert_eq!(json["active_events"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_newest_first_with_limit() {
    let router = build_router(make_test_state());
    for _ in 0..3 {
        send(&router, post_json("/api/events", &epicenter_flood())).await;
    }

    let (status, json) = send(&router, get("/api/risk-alert/history?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["alerts"][0]["version"], 3);
    assert_eq!(json["alerts"][1]["version"], 2);

    let (_, json) = send(&router, get("/api/risk-alert/history")).await;
    assert_eq!(json["total"], 4);
    assert_eq!(json["alerts"][3]["version"], 0);
}

#[tokio::test]
async fn test_graph_lists_nodes_with_risk() {
    let router = build_router(make_test_state());

    let (status, json) = send(&router, get("/api/graph")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 7);
    assert_eq!(json["edges"].as_array().unwrap().len(), 13);
    let first = &json["nodes"][0];
    assert!(first["id"].is_string());
    assert!(first["risk"]["risk"].is_number());
}

#[tokio::test]
async fn test_get_node() {
    let router = build_router(make_test_state());

    let (status, json) = send(&router, get("/api/nodes/hospital_1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "hospital_1");
    assert_eq!(json["type"], "medical");
    assert_eq!(json["risk"]["level"], "safe");

    let (status, json) = send(&router, get("/api/nodes/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
}

#[tokio::test]
async fn test_update_node_condition() {
    let router = build_router(make_test_state());

    let (status, json) = send(
        &router,
        put_json(
            "/api/nodes/bridge_yamuna/condition",
            &json!({"current_load": 290.0, "base_risk": 0.65}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_load"], 290.0);
    assert_eq!(json["risk"]["level"], "medium");

    let (_, alert) = send(&router, get("/api/risk-alert")).await;
    assert_eq!(alert["risk_level"], "medium");
    assert_eq!(alert["hardware_trigger"]["red_led"], true);
    assert_eq!(alert["hardware_trigger"]["buzzer"], false);

    let (status, json) = send(
        &router,
        put_json("/api/nodes/bridge_yamuna/condition", &json!({"base_risk": 1.4})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "base_risk");

    let (status, _) = send(
        &router,
        put_json("/api/nodes/ghost/condition", &json!({"current_load": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscribers_notified_on_injection() {
    let state = make_test_state();
    let mut rx = state.subscribe();
    let router = build_router(Arc::clone(&state));

    send(&router, post_json("/api/events", &epicenter_flood())).await;

    let published = rx.recv().await.unwrap();
    assert_eq!(published.version, 1);
    let alert = published.alert();
    assert!(alert.hardware_trigger.buzzer);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let router = build_router(make_test_state());

    let response = router.oneshot(get("/api/nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
