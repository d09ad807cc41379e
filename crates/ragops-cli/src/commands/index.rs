//! `ragops index` - provision the vector search endpoint and index.

use anyhow::Context;
use ragops_core::IndexConfig;
use ragops_runtime::ensure_vector_index;
use std::process::ExitCode;
use tracing::info;

use super::{connect, load_settings};
use crate::{SettingsArgs, WorkspaceArgs, logging};

pub const LOG_FILE: &str = "ragops.log";

pub async fn run(workspace: &WorkspaceArgs, settings: &SettingsArgs) -> anyhow::Result<ExitCode> {
    let settings = load_settings(settings)?;
    let config = IndexConfig::from_settings(&settings).context("Invalid index settings")?;
    let log_file = config.logs_path.as_ref().map(|dir| dir.join(LOG_FILE));
    let _guard = logging::init(log_file.as_deref())?;

    let client = connect(workspace)?;
    let result = ensure_vector_index(&client, &config)
        .await
        .with_context(|| format!("Failed to provision index {}", config.vs_index_name))?;
    info!(
        index = %config.vs_index_name,
        endpoint_created = result.endpoint_created,
        index_created = result.index_created,
        status = %result.status_message,
        "Index provisioned"
    );

    if result.endpoint_created {
        println!("✔ Created vector search endpoint {}", config.vs_endpoint_name);
    }
    if result.index_created {
        println!("✔ Created index {}", config.vs_index_name);
    } else {
        println!("✔ Synced existing index {}", config.vs_index_name);
    }
    println!("  status: {}", result.status_message);
    Ok(ExitCode::SUCCESS)
}
