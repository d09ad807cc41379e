//! `ragops rollback` - point a model alias at the previous version.

use anyhow::Context;
use ragops_core::RollbackConfig;
use ragops_runtime::{RollbackOutcome, rollback_alias};
use std::process::ExitCode;
use tracing::info;

use super::index::LOG_FILE;
use super::{connect, load_settings};
use crate::{SettingsArgs, WorkspaceArgs, logging};

pub async fn run(workspace: &WorkspaceArgs, settings: &SettingsArgs) -> anyhow::Result<ExitCode> {
    let settings = load_settings(settings)?;
    let config = RollbackConfig::from_settings(&settings).context("Invalid rollback settings")?;
    let log_file = config.logs_path.as_ref().map(|dir| dir.join(LOG_FILE));
    let _guard = logging::init(log_file.as_deref())?;

    let client = connect(workspace)?;
    let outcome = rollback_alias(&client, &config)
        .await
        .with_context(|| format!("Failed to roll back {}@{}", config.model_name, config.alias))?;

    info!(model = %config.model_name, alias = %config.alias, ?outcome, "Rollback finished");
    match outcome {
        RollbackOutcome::AlreadyOldest { version } => println!(
            "Nothing to do: {}@{} already serves the oldest version ({})",
            config.model_name, config.alias, version
        ),
        RollbackOutcome::RolledBack { from, to } => println!(
            "✔ {}@{} moved from version {} to {}",
            config.model_name, config.alias, from, to
        ),
    }
    Ok(ExitCode::SUCCESS)
}
