//! Workspace connection configuration.
//!
//! Host and token come from the CLI surface (`--host`, `--token`) or from the
//! `DATABRICKS_HOST` / `DATABRICKS_TOKEN` environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigError;

pub const HOST_ENV: &str = "DATABRICKS_HOST";
pub const TOKEN_ENV: &str = "DATABRICKS_TOKEN";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Base URL of the workspace, without a trailing slash.
    pub host: String,

    /// Personal access token sent as a bearer credential.
    pub token: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for WorkspaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl WorkspaceConfig {
    /// Validate and normalize connection settings.
    pub fn from_parts(
        host: Option<String>,
        token: Option<String>,
        request_timeout_secs: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let host = host
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                ConfigError::invalid("host", format!("pass --host or set {}", HOST_ENV))
            })?;
        if !(host.starts_with("https://") || host.starts_with("http://")) {
            return Err(ConfigError::invalid(
                "host",
                format!("'{}' is not an http(s) URL", host),
            ));
        }

        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::invalid("token", format!("pass --token or set {}", TOKEN_ENV))
            })?;

        let request_timeout_secs = request_timeout_secs.unwrap_or_else(default_request_timeout_secs);
        if request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be at least 1"));
        }

        Ok(Self {
            host,
            token,
            request_timeout_secs,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}
