//! Configuration management for FlowScope

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Prefix for environment overrides, e.g. `FLOWSCOPE_VALIDATION__MAX_BATCH_SIZE`
pub const ENV_PREFIX: &str = "FLOWSCOPE";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validation thresholds
    pub validation: ValidationConfig,

    /// Language detection tuning
    pub detection: DetectionConfig,

    /// Ingestion behaviour
    pub ingest: IngestConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Later sources override earlier ones. The file may be in any format the
    /// `config` crate understands (TOML, YAML, JSON, ...).
    pub fn load(path: Option<&str>) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            debug!(path, "Loading configuration file");
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Batches larger than this get a performance warning
    pub max_batch_size: usize,
    /// Batches spanning more distinct sessions than this get a split warning
    pub max_sessions_per_batch: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            max_sessions_per_batch: 10,
        }
    }
}

/// Language detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Fallback rules only fire while confidence is below this value
    pub low_confidence_threshold: f64,
    /// Record detection confidence and evidence into enriched trace metadata
    pub record_detection_metadata: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.5,
            record_detection_metadata: true,
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Version stamped into `_server` metadata of processed traces
    pub server_version: String,
    /// Treat validation warnings as rejections
    pub reject_on_warnings: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            reject_on_warnings: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
