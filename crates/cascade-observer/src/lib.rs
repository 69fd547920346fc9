//! Query and stream gateway for the cascading infrastructure risk engine.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Alert unit endpoint** (`/api/risk-alert`) returning the exact
//!   shape the polling hardware expects
//! - **`WebSocket` endpoint** (`/ws/risk`) pushing the same shape on
//!   every state transition
//! - **REST endpoints** for hazard injection and clearing, snapshot and
//!   history queries, and graph/node inspection
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Handlers hold an [`AppState`] wrapping the shared
//! [`RiskEngine`](cascade_core::RiskEngine). Reads are served from the
//! engine's latest immutable publication and never wait on writers;
//! injections, clears, and node updates go through the engine's single
//! writer and return once the new state is published.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
