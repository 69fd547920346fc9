//! Cascading infrastructure risk engine binary.
//!
//! Wires the infrastructure graph, the risk engine session, the hazard
//! decay loop, and the risk gateway together, then runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `cascade-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Load the infrastructure graph, or the built-in demo region
//! 4. Create the risk engine and publish the initial state
//! 5. Start the risk gateway
//! 6. Run the decay loop until shutdown
//! 7. Drain the gateway and log the result

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cascade_core::{EngineConfig, RiskEngine};
use cascade_graph::InfrastructureGraph;
use cascade_observer::{AppState, ServerConfig};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "cascade-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, graph loading, or gateway startup
/// fails. Any of these is fatal: a region that cannot be modeled is not
/// served.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config)?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        tick_interval_ms = config.decay.tick_interval_ms,
        half_life_seconds = config.decay.half_life_seconds,
        "cascade-engine starting"
    );

    // 3. Load the infrastructure graph.
    let graph = load_graph(&config)?;

    // 4. Create the engine session.
    let engine = Arc::new(RiskEngine::new(graph, &config));
    let initial = engine.get_snapshot();
    info!(
        risk_level = %initial.decision.risk_level,
        converged = initial.snapshot.converged,
        "Initial risk state published"
    );

    // 5. Start the risk gateway.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let app_state = Arc::new(AppState::new(Arc::clone(&engine)));
    let gateway = cascade_observer::spawn_observer(
        &server_config,
        app_state,
        wait_for_shutdown(shutdown_rx.clone()),
    )
    .await?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        } else {
            info!("Ctrl-C received, shutting down");
        }
        shutdown_tx.send_replace(true);
    });

    // 6. Run the decay loop.
    let period = Duration::from_millis(config.decay.tick_interval_ms);
    let summary =
        cascade_core::run_decay_loop(Arc::clone(&engine), period, wait_for_shutdown(shutdown_rx))
            .await;

    // 7. Drain the gateway.
    if let Err(e) = gateway.await {
        error!(error = %e, "Risk gateway task failed");
    }

    info!(
        ticks = summary.ticks,
        publications = summary.publications,
        events_expired = summary.events_expired,
        final_version = engine.get_snapshot().version,
        "cascade-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults.
///
/// Environment overrides apply in both cases.
fn load_config() -> Result<EngineConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        return Ok(EngineConfig::from_file(path)?);
    }
    let mut config = EngineConfig::default();
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &EngineConfig) -> Result<(), EngineError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level).map_err(|e| EngineError::Logging {
            message: format!("invalid log level {:?}: {e}", config.logging.level),
        })?,
    };

    let installed = if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Load the configured graph file, or the demo region when none is set.
fn load_graph(config: &EngineConfig) -> Result<InfrastructureGraph, EngineError> {
    let graph = config.graph.path.as_deref().map_or_else(
        || {
            info!("No graph file configured, using demo region");
            cascade_graph::create_demo_region()
        },
        |path| {
            info!(path = %path.display(), "Loading graph file");
            InfrastructureGraph::from_file(path)
        },
    )?;
    Ok(graph)
}

/// Resolve once the shutdown flag is raised or its sender is dropped.
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_future_resolves_on_signal() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));
        tx.send_replace(true);
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn shutdown_future_resolves_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let joined = tokio::time::timeout(Duration::from_secs(1), wait_for_shutdown(rx)).await;
        assert!(joined.is_ok());
    }

    #[test]
    fn demo_graph_is_used_without_path() {
        let config = EngineConfig::default();
        let graph = load_graph(&config);
        assert!(matches!(graph, Ok(ref g) if g.node_count() == 7));
    }

    #[test]
    fn missing_graph_file_is_fatal() {
        let mut config = EngineConfig::default();
        config.graph.path = Some("does/not/exist.yaml".into());
        assert!(matches!(load_graph(&config), Err(EngineError::Graph { .. })));
    }
}
