//! Shared application state for the gateway.
//!
//! [`AppState`] is a thin handle on the [`RiskEngine`]. Queries read the
//! engine's latest publication and never wait on the writer; mutations
//! are forwarded to the engine, which serializes them.

use std::sync::Arc;

use cascade_core::{PublishedState, RiskEngine};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The risk engine session.
    pub engine: Arc<RiskEngine>,
    /// When the gateway was started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state around an engine.
    pub fn new(engine: Arc<RiskEngine>) -> Self {
        Self {
            engine,
            started_at: Utc::now(),
        }
    }

    /// Latest publication.
    pub fn latest(&self) -> Arc<PublishedState> {
        self.engine.get_snapshot()
    }

    /// Subscribe to publications.
    ///
    /// A receiver that falls behind gets
    /// [`broadcast::error::RecvError::Lagged`] and resumes at the newest
    /// publication.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PublishedState>> {
        self.engine.subscribe()
    }
}
