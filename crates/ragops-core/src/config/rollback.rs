//! Model alias rollback configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{ConfigError, Settings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackConfig {
    /// Full registered model name (`catalog.schema.model`).
    pub model_name: String,
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_path: Option<PathBuf>,
}

impl RollbackConfig {
    pub const REQUIRED_KEYS: [&'static str; 2] = ["model_name", "alias"];

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.require_all(&Self::REQUIRED_KEYS)?;
        Ok(Self {
            model_name: settings.required("model_name")?,
            alias: settings.required("alias")?,
            logs_path: settings.get("logs_path").map(PathBuf::from),
        })
    }
}
