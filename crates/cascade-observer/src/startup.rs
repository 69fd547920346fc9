//! Gateway startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_observer`] which binds the gateway eagerly, so a
//! port conflict fails startup, then serves it on a background Tokio
//! task alongside the decay loop.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the gateway.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind the gateway and serve it on a background task.
///
/// The task runs until `shutdown` resolves. Hold the returned handle and
/// await it during clean shutdown to let in-flight requests drain.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_observer<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<JoinHandle<()>, StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = crate::server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Risk gateway exited with error");
        }
    });

    tracing::info!(
        host = %config.host,
        port = config.port,
        "Risk gateway spawned on background task"
    );

    Ok(handle)
}
