//! Vector index provisioning configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::{ConfigError, Settings};

/// Readiness polling bounds.
///
/// Every wait has a deadline; `max_attempts` additionally caps the number of
/// probes when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            max_attempts: None,
        }
    }
}

impl PollConfig {
    /// Read `poll_interval_secs`, `poll_timeout_secs` and `poll_max_attempts`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            interval_secs: settings
                .parse_optional("poll_interval_secs")?
                .unwrap_or(defaults.interval_secs),
            timeout_secs: settings
                .parse_optional("poll_timeout_secs")?
                .unwrap_or(defaults.timeout_secs),
            max_attempts: settings.parse_optional("poll_max_attempts")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::invalid("poll_interval_secs", "must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("poll_timeout_secs", "must be at least 1"));
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::invalid("poll_max_attempts", "must be at least 1"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_interval_secs() -> u64 {
    20
}

fn default_timeout_secs() -> u64 {
    30 * 60
}

/// A delta-sync vector index and the endpoint serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Source table the index syncs from (`catalog.schema.table`).
    pub table_name: String,
    pub vs_index_name: String,
    pub vs_endpoint_name: String,
    /// Serving endpoint that computes embeddings for the source column.
    pub embedding_llm_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_path: Option<PathBuf>,
    #[serde(default)]
    pub poll: PollConfig,
}

impl IndexConfig {
    pub const REQUIRED_KEYS: [&'static str; 4] = [
        "table_name",
        "vs_index_name",
        "vs_endpoint_name",
        "embedding_llm_model",
    ];

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.require_all(&Self::REQUIRED_KEYS)?;
        Ok(Self {
            table_name: settings.required("table_name")?,
            vs_index_name: settings.required("vs_index_name")?,
            vs_endpoint_name: settings.required("vs_endpoint_name")?,
            embedding_llm_model: settings.required("embedding_llm_model")?,
            logs_path: settings.get("logs_path").map(PathBuf::from),
            poll: PollConfig::from_settings(settings)?,
        })
    }
}
