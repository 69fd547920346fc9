//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can abort startup so `main`
//! can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cascade_core::ConfigError,
    },

    /// The infrastructure graph failed to load.
    #[error("graph error: {source}")]
    Graph {
        /// The underlying graph error.
        #[from]
        source: cascade_graph::GraphError,
    },

    /// The risk gateway failed to start.
    #[error("gateway error: {source}")]
    Gateway {
        /// The underlying startup error.
        #[from]
        source: cascade_observer::StartupError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
