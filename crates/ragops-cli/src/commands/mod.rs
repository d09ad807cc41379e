//! Command implementations for the ragops CLI.

pub mod cleanup;
pub mod index;
pub mod rollback;

use anyhow::Context;
use ragops_core::{Settings, WorkspaceConfig};
use ragops_databricks::DatabricksClient;

use crate::{SettingsArgs, WorkspaceArgs};

/// Settings file first, then flag pairs on top.
pub fn load_settings(args: &SettingsArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::new(),
    };
    settings.merge(Settings::from_flag_pairs(&args.pairs));
    Ok(settings)
}

pub fn workspace_config(args: &WorkspaceArgs) -> anyhow::Result<WorkspaceConfig> {
    WorkspaceConfig::from_parts(
        args.host.clone(),
        args.token.clone(),
        args.request_timeout_secs,
    )
    .context("Invalid workspace connection settings")
}

pub fn connect(args: &WorkspaceArgs) -> anyhow::Result<DatabricksClient> {
    let config = workspace_config(args)?;
    DatabricksClient::new(config).context("Failed to build workspace client")
}
