//! Risk propagation, alert derivation, and session state for the
//! cascading infrastructure risk engine.
//!
//! Data flows one way: an injection, clear, decay tick, or node update
//! mutates the session; the session recomputes a [`RiskSnapshot`] and an
//! [`AlertDecision`]; the result is published for readers and streamed to
//! subscribers.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `cascade-config.yaml` into
//!   strongly-typed structs.
//! - [`propagation`] -- Seeding, bounded relaxation, and snapshot summary.
//! - [`decision`] -- Pure snapshot-to-decision derivation.
//! - [`event_store`] -- Hazard validation, clearing, and decay.
//! - [`engine`] -- [`RiskEngine`], the single-writer session with
//!   lock-free publication.
//! - [`runner`] -- The periodic decay loop.
//! - [`error`] -- Caller-facing session errors.
//!
//! [`RiskSnapshot`]: cascade_types::RiskSnapshot
//! [`AlertDecision`]: cascade_types::AlertDecision
//! [`RiskEngine`]: engine::RiskEngine

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod event_store;
pub mod propagation;
pub mod runner;

pub use config::{ConfigError, EngineConfig};
pub use engine::{PublishedState, RiskEngine};
pub use error::SessionError;
pub use propagation::PropagationError;
pub use runner::{DecayLoopSummary, run_decay_loop};
