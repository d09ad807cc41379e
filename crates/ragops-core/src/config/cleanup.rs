//! Project teardown configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{ConfigError, Settings};

/// Name of the append-mode run log written under `logs_path`.
pub const CLEANUP_LOG_FILE: &str = "cleanup_report.log";

/// Resources owned by one project deployment, as named in its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    pub vs_endpoint_name: String,
    pub app_name: String,
    pub vs_index_name: String,
    pub catalog: String,
    pub schema: String,
    /// Full name of the backing table (`catalog.schema.table`).
    pub table_name: String,
    pub serving_endpoint_name: String,
    pub experiment_path: String,
    /// Bundle target the app is bound under.
    pub alias: String,
    pub logs_path: PathBuf,
}

impl CleanupConfig {
    /// Keys that must be present before a teardown may start.
    pub const REQUIRED_KEYS: [&'static str; 10] = [
        "vs_endpoint_name",
        "app_name",
        "vs_index_name",
        "catalog",
        "schema",
        "table_name",
        "serving_endpoint_name",
        "experiment_path",
        "alias",
        "logs_path",
    ];

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.require_all(&Self::REQUIRED_KEYS)?;
        Ok(Self {
            vs_endpoint_name: settings.required("vs_endpoint_name")?,
            app_name: settings.required("app_name")?,
            vs_index_name: settings.required("vs_index_name")?,
            catalog: settings.required("catalog")?,
            schema: settings.required("schema")?,
            table_name: settings.required("table_name")?,
            serving_endpoint_name: settings.required("serving_endpoint_name")?,
            experiment_path: settings.required("experiment_path")?,
            alias: settings.required("alias")?,
            logs_path: PathBuf::from(settings.required("logs_path")?),
        })
    }

    /// `catalog.schema`, as Unity Catalog addresses the schema.
    pub fn schema_full_name(&self) -> String {
        format!("{}.{}", self.catalog, self.schema)
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_path.join(CLEANUP_LOG_FILE)
    }
}
