//! `WebSocket` handler for live risk streaming.
//!
//! Clients connect to `GET /ws/risk`, immediately receive the current
//! alert snapshot, then one JSON-encoded
//! [`RiskAlertResponse`](cascade_types::RiskAlertResponse) per
//! publication, in publication order.
//!
//! If a client falls behind, its oldest pending notifications are dropped
//! and it resumes from the most recent publication.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use cascade_core::PublishedState;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming risk alerts.
///
/// # Route
///
/// `GET /ws/risk`
pub async fn ws_risk(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Serialize a publication into the wire frame.
fn alert_frame(published: &PublishedState) -> Option<Message> {
    match serde_json::to_string(&published.alert()) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!(version = published.version, "Failed to serialize risk alert: {e}");
            None
        }
    }
}

/// Handle the `WebSocket` lifecycle: subscribe, send the current state,
/// then forward each publication as a text frame.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the current state so no publication falls
    // between the two.
    let mut rx = state.subscribe();
    let current = state.latest();
    let mut last_sent = current.version;
    if let Some(frame) = alert_frame(&current) {
        if socket.send(frame).await.is_err() {
            debug!("WebSocket client disconnected (initial send failed)");
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(published) => {
                        // Already covered by the initial frame.
                        if published.version <= last_sent {
                            continue;
                        }
                        last_sent = published.version;
                        let Some(frame) = alert_frame(&published) else {
                            continue;
                        };
                        if socket.send(frame).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Publication channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Clients have nothing to say on this channel.
                    }
                }
            }
        }
    }
}
