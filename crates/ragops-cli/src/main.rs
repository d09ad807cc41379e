use clap::{Args, Parser, Subcommand};
use ragops_core::config::workspace::{HOST_ENV, TOKEN_ENV};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "ragops", version, about = "Maintenance CLI for RAG demo deployments")]
struct Cli {
    #[command(flatten)]
    workspace: WorkspaceArgs,

    #[command(subcommand)]
    cmd: Command,
}

/// Connection to the Databricks workspace.
#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Workspace URL, e.g. https://adb-123.azuredatabricks.net
    #[arg(long, env = HOST_ENV, global = true)]
    pub host: Option<String>,

    /// Personal access token
    #[arg(long, env = TOKEN_ENV, global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[arg(long = "request-timeout-secs", global = true)]
    pub request_timeout_secs: Option<u64>,
}

/// Project settings: an optional YAML file overlaid with `--key value` pairs.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Flat YAML mapping of settings, loaded before the flag pairs
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Settings as `--key value` pairs, e.g. --catalog main --schema rag
    #[arg(
        value_name = "SETTINGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub pairs: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tear down every resource of a deployed project, in dependency order.
    Cleanup {
        /// Print the run report as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Print the planned steps and exit without calling the workspace
        #[arg(long = "dry-run", default_value_t = false)]
        dry_run: bool,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Create or sync the vector search endpoint and index, then wait until ready.
    Index {
        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Move a model alias back to the previous version.
    Rollback {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Cleanup {
            json,
            dry_run,
            settings,
        } => commands::cleanup::run(&cli.workspace, &settings, json, dry_run).await,
        Command::Index { settings } => commands::index::run(&cli.workspace, &settings).await,
        Command::Rollback { settings } => {
            commands::rollback::run(&cli.workspace, &settings).await
        }
    }
}
