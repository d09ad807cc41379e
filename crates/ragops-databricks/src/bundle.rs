use async_trait::async_trait;
use ragops_core::WorkspaceConfig;
use ragops_core::config::workspace::{HOST_ENV, TOKEN_ENV};
use ragops_runtime::{ApiError, BundleUnbinder};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_CLI_PROGRAM: &str = "databricks";

/// Runs `databricks bundle deployment unbind` in the bundle's directory.
#[derive(Debug, Clone)]
pub struct DatabricksBundleCli {
    program: PathBuf,
    working_dir: Option<PathBuf>,
    workspace: Option<WorkspaceConfig>,
}

impl Default for DatabricksBundleCli {
    fn default() -> Self {
        Self::new(DEFAULT_CLI_PROGRAM)
    }
}

impl DatabricksBundleCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: None,
            workspace: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Pass host and token to the child through its environment.
    pub fn with_workspace(mut self, workspace: WorkspaceConfig) -> Self {
        self.workspace = Some(workspace);
        self
    }

    fn command(&self, resource_key: &str, target: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["bundle", "deployment", "unbind", resource_key, "--target", target]);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        if let Some(ws) = &self.workspace {
            cmd.env(HOST_ENV, &ws.host).env(TOKEN_ENV, &ws.token);
        }
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl BundleUnbinder for DatabricksBundleCli {
    async fn unbind(&self, resource_key: &str, target: &str) -> Result<(), ApiError> {
        debug!(
            program = %self.program.display(),
            resource_key,
            target,
            "running bundle unbind"
        );
        let output = self
            .command(resource_key, target)
            .output()
            .await
            .map_err(|e| {
                ApiError::other(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        Err(ApiError::other(if detail.is_empty() {
            format!("bundle unbind exited with {}", output.status)
        } else {
            format!("bundle unbind exited with {}: {}", output.status, detail)
        }))
    }
}
