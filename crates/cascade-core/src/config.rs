//! Configuration loading and typed config structures for the risk engine.
//!
//! The canonical configuration lives in `cascade-config.yaml` in the
//! working directory. This module defines strongly-typed structs that
//! mirror the YAML structure and a loader that reads and validates the
//! file. Every field has a default, so an empty file (or no file) yields
//! a working configuration against the built-in demo region.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Gateway bind address.
    #[serde(default)]
    pub server: ServerSection,

    /// Infrastructure graph source.
    #[serde(default)]
    pub graph: GraphSection,

    /// Propagation tuning.
    #[serde(default)]
    pub propagation: PropagationConfig,

    /// Hazard decay tuning.
    #[serde(default)]
    pub decay: DecayConfig,

    /// Query/stream gateway buffers.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CASCADE_GRAPH_PATH` overrides `graph.path`
    /// - `CASCADE_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml maps an empty document to unit, not to an empty map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `CASCADE_PORT` is not a port
    /// number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("CASCADE_GRAPH_PATH") {
            self.graph.path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("CASCADE_PORT") {
            self.server.port = val.parse().map_err(|e| ConfigError::Invalid {
                field: "server.port",
                reason: format!("CASCADE_PORT={val}: {e}"),
            })?;
        }
        Ok(())
    }

    /// Check every section for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.propagation.validate()?;
        self.decay.validate()?;
        self.gateway.validate()
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Gateway bind address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where to load the infrastructure graph from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GraphSection {
    /// Path to a graph YAML file. `None` selects the built-in demo region.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Propagation tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropagationConfig {
    /// Relaxation pass cap. `None` uses the node count.
    #[serde(default)]
    pub max_passes: Option<u32>,

    /// A pass whose largest risk increase is at most this is converged.
    #[serde(default = "default_convergence_epsilon")]
    pub convergence_epsilon: f64,

    /// Risk at which a node enters the cascade timeline.
    #[serde(default = "default_elevated_threshold")]
    pub elevated_threshold: f64,

    /// Risk at which a node is listed as critical.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,

    /// Minimum risk for a node to be a next-failure candidate.
    #[serde(default = "default_prediction_threshold")]
    pub prediction_threshold: f64,

    /// Estimated failure time for a candidate with no timeline entry.
    #[serde(default = "default_failure_horizon_minutes")]
    pub default_failure_horizon_minutes: u32,
}

impl PropagationConfig {
    /// Check thresholds and epsilon.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("propagation.elevated_threshold", self.elevated_threshold)?;
        unit_interval("propagation.critical_threshold", self.critical_threshold)?;
        unit_interval("propagation.prediction_threshold", self.prediction_threshold)?;
        if !(self.convergence_epsilon.is_finite() && self.convergence_epsilon > 0.0) {
            return Err(ConfigError::Invalid {
                field: "propagation.convergence_epsilon",
                reason: format!("{} is not a positive number", self.convergence_epsilon),
            });
        }
        if self.max_passes == Some(0) {
            return Err(ConfigError::Invalid {
                field: "propagation.max_passes",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_passes: None,
            convergence_epsilon: default_convergence_epsilon(),
            elevated_threshold: default_elevated_threshold(),
            critical_threshold: default_critical_threshold(),
            prediction_threshold: default_prediction_threshold(),
            default_failure_horizon_minutes: default_failure_horizon_minutes(),
        }
    }
}

/// Hazard decay tuning.
///
/// Effective severity follows `severity * 0.5^(age / half_life)`; an event
/// whose effective severity drops below `negligible_severity` is removed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecayConfig {
    /// Period of the decay tick in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Seconds for an event's effective severity to halve.
    #[serde(default = "default_half_life_seconds")]
    pub half_life_seconds: f64,

    /// Effective severity below which an event is dropped.
    #[serde(default = "default_negligible_severity")]
    pub negligible_severity: f64,
}

impl DecayConfig {
    /// Check period, half-life, and cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "decay.tick_interval_ms",
                reason: "must be at least 1".to_owned(),
            });
        }
        if !(self.half_life_seconds.is_finite() && self.half_life_seconds > 0.0) {
            return Err(ConfigError::Invalid {
                field: "decay.half_life_seconds",
                reason: format!("{} is not a positive number", self.half_life_seconds),
            });
        }
        unit_interval("decay.negligible_severity", self.negligible_severity)
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            half_life_seconds: default_half_life_seconds(),
            negligible_severity: default_negligible_severity(),
        }
    }
}

/// Query/stream gateway buffers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    /// Number of decisions kept for the history query.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Per-subscriber buffer; when full the oldest notification is dropped.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl GatewayConfig {
    /// Check buffer sizes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if either buffer is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "gateway.history_capacity",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.stream_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "gateway.stream_buffer",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside 0..=1"),
        })
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8000
}

const fn default_convergence_epsilon() -> f64 {
    1e-9
}

const fn default_elevated_threshold() -> f64 {
    0.3
}

const fn default_critical_threshold() -> f64 {
    0.8
}

const fn default_prediction_threshold() -> f64 {
    0.6
}

const fn default_failure_horizon_minutes() -> u32 {
    60
}

const fn default_tick_interval_ms() -> u64 {
    5_000
}

const fn default_half_life_seconds() -> f64 {
    1_800.0
}

const fn default_negligible_severity() -> f64 {
    0.01
}

const fn default_history_capacity() -> usize {
    100
}

const fn default_stream_buffer() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.decay.tick_interval_ms, 5_000);
        assert_eq!(config.gateway.history_capacity, 100);
        assert!(config.graph.path.is_none());
        assert!(config.propagation.max_passes.is_none());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9090

graph:
  path: "regions/mumbai.yaml"

propagation:
  max_passes: 12
  convergence_epsilon: 0.000001
  elevated_threshold: 0.25
  critical_threshold: 0.85
  prediction_threshold: 0.5
  default_failure_horizon_minutes: 90

decay:
  tick_interval_ms: 1000
  half_life_seconds: 600
  negligible_severity: 0.02

gateway:
  history_capacity: 50
  stream_buffer: 4

logging:
  level: "debug"
  json: true
"#;

        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.graph.path.as_deref(),
            Some(Path::new("regions/mumbai.yaml"))
        );
        assert_eq!(config.propagation.max_passes, Some(12));
        assert_eq!(config.propagation.default_failure_horizon_minutes, 90);
        assert_eq!(config.decay.tick_interval_ms, 1000);
        assert_eq!(config.gateway.stream_buffer, 4);
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = EngineConfig::parse("decay:\n  half_life_seconds: 60\n");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert!((config.decay.half_life_seconds - 60.0).abs() < f64::EPSILON);
        // Everything else uses defaults
        assert_eq!(config.decay.tick_interval_ms, 5_000);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(EngineConfig::parse("").is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let result = EngineConfig::parse("propagation:\n  critical_threshold: 1.5\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "propagation.critical_threshold",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_half_life_and_zero_passes() {
        assert!(EngineConfig::parse("decay:\n  half_life_seconds: 0\n").is_err());
        assert!(EngineConfig::parse("propagation:\n  max_passes: 0\n").is_err());
        assert!(EngineConfig::parse("gateway:\n  stream_buffer: 0\n").is_err());
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            EngineConfig::parse("server: [unterminated"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("cascade-config.yaml");
        if path.exists() {
            let config = EngineConfig::parse(&std::fs::read_to_string(&path).unwrap_or_default());
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
