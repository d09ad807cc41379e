//! `ragops cleanup` - tear down a deployed project.

use anyhow::Context;
use ragops_core::CleanupConfig;
use ragops_databricks::DatabricksBundleCli;
use ragops_runtime::{
    CleanupOrchestrator, CleanupOutcome, CleanupReport, ResourceAction, RunStatus, cleanup_plan,
};
use serde_json::json;
use std::process::ExitCode;
use tracing::info;

use super::{connect, load_settings, workspace_config};
use crate::{SettingsArgs, WorkspaceArgs, logging};

pub async fn run(
    workspace: &WorkspaceArgs,
    settings: &SettingsArgs,
    json: bool,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let settings = load_settings(settings)?;
    let config = CleanupConfig::from_settings(&settings).context("Invalid cleanup settings")?;

    if dry_run {
        print_plan(&config, json)?;
        return Ok(ExitCode::SUCCESS);
    }

    let log_file = config.log_file();
    let _guard = logging::init(Some(log_file.as_path()))?;

    let client = connect(workspace)?;
    let bundle = DatabricksBundleCli::default().with_workspace(workspace_config(workspace)?);
    let orchestrator = CleanupOrchestrator::new(client, bundle, config);
    let report = orchestrator.run().await;
    let summary = report.summary();
    info!(
        run_id = %report.run_id,
        exit_code = report.exit_code(),
        succeeded = summary.succeeded,
        already_absent = summary.already_absent,
        failed = summary.failed,
        "Cleanup run finished"
    );

    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print_summary(&report);
    }
    Ok(ExitCode::from(report.exit_code()))
}

fn plan_entry(action: &ResourceAction) -> serde_json::Value {
    json!({
        "name": action.name,
        "kind": action.target.kind(),
        "args": action.target.args(),
        "critical": action.critical,
        "placeholder": action.is_placeholder(),
    })
}

fn print_plan(config: &CleanupConfig, json: bool) -> anyhow::Result<()> {
    let plan = cleanup_plan(config);
    if json {
        let entries: Vec<_> = plan.iter().map(plan_entry).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Cleanup plan for {}:", config.schema_full_name());
    for (i, action) in plan.iter().enumerate() {
        let target = action.target.args().join(" ");
        let mut notes = Vec::new();
        if action.critical {
            notes.push("critical");
        }
        if action.is_placeholder() {
            notes.push("skipped: placeholder");
        }
        if notes.is_empty() {
            println!("  {}. {} ({})", i + 1, action.name, target);
        } else {
            println!("  {}. {} ({}) [{}]", i + 1, action.name, target, notes.join(", "));
        }
    }
    println!(
        "  {}. Delete every model version and registered model in {}",
        plan.len() + 1,
        config.schema_full_name()
    );
    println!(
        "  {}. Delete every volume in {}",
        plan.len() + 2,
        config.schema_full_name()
    );
    println!(
        "  {}. Unbind app {} from bundle target {}",
        plan.len() + 3,
        config.app_name,
        config.alias
    );
    Ok(())
}

fn print_summary(report: &CleanupReport) {
    let summary = report.summary();
    match &report.status {
        RunStatus::Completed => println!("✔ Cleanup completed (run {})", report.run_id),
        RunStatus::AbortedCritical { action, error } => {
            println!("✘ Cleanup aborted at '{}': {}", action, error)
        }
        RunStatus::PermissionDenied { error } => println!("✘ Permission check failed: {}", error),
        RunStatus::Running => println!("Cleanup did not finish (run {})", report.run_id),
    }
    println!(
        "  succeeded: {}, already gone: {}, placeholders: {}, failed: {}",
        summary.succeeded, summary.already_absent, summary.skipped_placeholder, summary.failed
    );
    for step in report.failed_steps() {
        if let CleanupOutcome::Failed { error } = &step.outcome {
            println!("  - {}: {}", step.name, error);
        }
    }
    if let Some(CleanupOutcome::Failed { error }) = &report.unbind {
        println!("  - Unbind App: {}", error);
    }
}
