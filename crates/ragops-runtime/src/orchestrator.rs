use crate::adapter::{ApiError, BundleUnbinder, WorkspaceApi};
use crate::report::{CleanupOutcome, CleanupReport, RunStatus, StepRecord};
use ragops_core::CleanupConfig;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// First-argument values meaning "not configured yet".
pub const PLACEHOLDER_VALUES: [&str; 3] = ["", "your-app-name", "your_index_name"];

/// `None` stands for a null argument and is a placeholder too.
pub fn is_placeholder(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => PLACEHOLDER_VALUES.contains(&v),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    App,
    ServingEndpoint,
    VectorIndex,
    VectorEndpoint,
    Table,
    Experiment,
    ModelVersion,
    RegisteredModel,
    Volume,
}

/// What a step deletes, with the arguments its delete call takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTarget {
    App { name: String },
    ServingEndpoint { name: String },
    VectorIndex { index_name: String },
    VectorEndpoint { endpoint_name: String },
    Table { full_name: String },
    /// Resolved to an experiment id at delete time.
    Experiment { path: String },
    ModelVersion { full_name: String, version: u64 },
    RegisteredModel { full_name: String },
    Volume { full_name: String },
}

impl ResourceTarget {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceTarget::App { .. } => ResourceKind::App,
            ResourceTarget::ServingEndpoint { .. } => ResourceKind::ServingEndpoint,
            ResourceTarget::VectorIndex { .. } => ResourceKind::VectorIndex,
            ResourceTarget::VectorEndpoint { .. } => ResourceKind::VectorEndpoint,
            ResourceTarget::Table { .. } => ResourceKind::Table,
            ResourceTarget::Experiment { .. } => ResourceKind::Experiment,
            ResourceTarget::ModelVersion { .. } => ResourceKind::ModelVersion,
            ResourceTarget::RegisteredModel { .. } => ResourceKind::RegisteredModel,
            ResourceTarget::Volume { .. } => ResourceKind::Volume,
        }
    }

    /// Positional arguments, in the order the delete call receives them.
    pub fn args(&self) -> Vec<String> {
        match self {
            ResourceTarget::App { name } | ResourceTarget::ServingEndpoint { name } => {
                vec![name.clone()]
            }
            ResourceTarget::VectorIndex { index_name } => vec![index_name.clone()],
            ResourceTarget::VectorEndpoint { endpoint_name } => vec![endpoint_name.clone()],
            ResourceTarget::Experiment { path } => vec![path.clone()],
            ResourceTarget::ModelVersion { full_name, version } => {
                vec![full_name.clone(), version.to_string()]
            }
            ResourceTarget::Table { full_name }
            | ResourceTarget::RegisteredModel { full_name }
            | ResourceTarget::Volume { full_name } => vec![full_name.clone()],
        }
    }
}

/// One step of the teardown plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAction {
    pub name: String,
    pub target: ResourceTarget,
    /// A non-absence failure of a critical step halts the run.
    pub critical: bool,
}

impl ResourceAction {
    pub fn critical(name: impl Into<String>, target: ResourceTarget) -> Self {
        Self {
            name: name.into(),
            target,
            critical: true,
        }
    }

    pub fn non_critical(name: impl Into<String>, target: ResourceTarget) -> Self {
        Self {
            name: name.into(),
            target,
            critical: false,
        }
    }

    /// Whether the first argument is unset, so the step would be skipped.
    pub fn is_placeholder(&self) -> bool {
        let args = self.target.args();
        is_placeholder(args.first().map(String::as_str))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error("authentication check failed: {0}")]
    Authentication(#[source] ApiError),

    #[error("{action} failed: {source}")]
    Critical {
        action: String,
        #[source]
        source: ApiError,
    },
}

/// Result of the pre-flight identity and schema probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheck {
    pub user_name: String,
    pub schema_reachable: bool,
}

/// The six fixed steps for `config`.
///
/// Model versions, model containers and volumes are discovered by listing
/// at run time and follow these steps.
pub fn cleanup_plan(config: &CleanupConfig) -> Vec<ResourceAction> {
    vec![
        ResourceAction::critical(
            "Delete App",
            ResourceTarget::App {
                name: config.app_name.clone(),
            },
        ),
        ResourceAction::critical(
            "Delete Serving Endpoint",
            ResourceTarget::ServingEndpoint {
                name: config.serving_endpoint_name.clone(),
            },
        ),
        ResourceAction::critical(
            "Delete Vector Search Index",
            ResourceTarget::VectorIndex {
                index_name: config.vs_index_name.clone(),
            },
        ),
        // The endpoint refuses deletion while an index is attached.
        ResourceAction::critical(
            "Delete Vector Search Endpoint",
            ResourceTarget::VectorEndpoint {
                endpoint_name: config.vs_endpoint_name.clone(),
            },
        ),
        ResourceAction::critical(
            "Delete Unity Catalog Table",
            ResourceTarget::Table {
                full_name: config.table_name.clone(),
            },
        ),
        ResourceAction::non_critical(
            "Delete MLflow Experiment",
            ResourceTarget::Experiment {
                path: config.experiment_path.clone(),
            },
        ),
    ]
}

/// Tears down every resource of one project deployment, in dependency order.
///
/// Re-running after a partial or complete run is safe: resources that are
/// already gone resolve as successful steps.
pub struct CleanupOrchestrator<A: WorkspaceApi, B: BundleUnbinder> {
    api: A,
    bundle: B,
    config: CleanupConfig,
}

impl<A: WorkspaceApi, B: BundleUnbinder> CleanupOrchestrator<A, B> {
    pub fn new(api: A, bundle: B, config: CleanupConfig) -> Self {
        Self {
            api,
            bundle,
            config,
        }
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Resolve the caller's identity and probe the configured schema.
    ///
    /// Only an identity failure is an error. An unreachable schema is logged
    /// and reported, and the teardown goes ahead.
    pub async fn check_permissions(&self) -> Result<PermissionCheck, CleanupError> {
        let user = match self.api.current_user().await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, "Authentication Check Failed: {}", e);
                return Err(CleanupError::Authentication(e));
            }
        };
        info!(user = %user.user_name, "Authenticated as: {}", user.user_name);

        let schema = self.config.schema_full_name();
        let schema_reachable = match self.api.get_schema(&schema).await {
            Ok(()) => {
                info!("Verified access to {}", schema);
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Schema {} not found. Continuing to clean other resources.", schema
                );
                false
            }
        };

        Ok(PermissionCheck {
            user_name: user.user_name,
            schema_reachable,
        })
    }

    /// Run one delete step and classify how it ended.
    ///
    /// Placeholder targets are skipped without a call. A failure that means
    /// "already gone" is a success. Any other failure is `Failed` for a
    /// non-critical step and `Err(CleanupError::Critical)` for a critical one.
    pub async fn safe_delete(
        &self,
        action: &ResourceAction,
    ) -> Result<CleanupOutcome, CleanupError> {
        if action.is_placeholder() {
            warn!(action = %action.name, "{} skipped: Placeholder config detected.", action.name);
            return Ok(CleanupOutcome::SkippedPlaceholder);
        }

        info!(action = %action.name, "Starting: {}...", action.name);
        match self.delete_target(&action.target).await {
            Ok(()) => {
                info!(action = %action.name, "{} successful.", action.name);
                Ok(CleanupOutcome::Succeeded)
            }
            Err(e) if e.is_absent() => {
                warn!(
                    action = %action.name,
                    error = %e,
                    "{} skipped: Resource already gone.", action.name
                );
                Ok(CleanupOutcome::SkippedAlreadyAbsent)
            }
            Err(e) => {
                error!(action = %action.name, "{} failed: {}", action.name, e);
                if action.critical {
                    error!(
                        action = %action.name,
                        critical = true,
                        "Aborting: {} failure blocks downstream steps.", action.name
                    );
                    return Err(CleanupError::Critical {
                        action: action.name.clone(),
                        source: e,
                    });
                }
                Ok(CleanupOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    async fn delete_target(&self, target: &ResourceTarget) -> Result<(), ApiError> {
        match target {
            ResourceTarget::App { name } => self.api.delete_app(name).await,
            ResourceTarget::ServingEndpoint { name } => {
                self.api.delete_serving_endpoint(name).await
            }
            ResourceTarget::VectorIndex { index_name } => {
                self.api.delete_vector_index(index_name).await
            }
            ResourceTarget::VectorEndpoint { endpoint_name } => {
                self.api.delete_vector_endpoint(endpoint_name).await
            }
            ResourceTarget::Table { full_name } => self.api.delete_table(full_name).await,
            ResourceTarget::Experiment { path } => {
                match self.api.get_experiment_by_name(path).await? {
                    Some(experiment) => self.api.delete_experiment(&experiment.experiment_id).await,
                    None => Err(ApiError::not_found(format!(
                        "experiment '{}' does not exist (404)",
                        path
                    ))),
                }
            }
            ResourceTarget::ModelVersion { full_name, version } => {
                self.api.delete_model_version(full_name, *version).await
            }
            ResourceTarget::RegisteredModel { full_name } => {
                self.api.delete_registered_model(full_name).await
            }
            ResourceTarget::Volume { full_name } => self.api.delete_volume(full_name).await,
        }
    }

    /// The fixed part of the teardown, in execution order.
    pub fn plan(&self) -> Vec<ResourceAction> {
        cleanup_plan(&self.config)
    }

    /// Run the whole teardown and report how it went.
    ///
    /// Never exits the process; the caller maps [`CleanupReport::exit_code`].
    pub async fn run(&self) -> CleanupReport {
        let mut report = CleanupReport::new();

        match self.check_permissions().await {
            Ok(check) => {
                report.identity = Some(check.user_name);
                report.schema_reachable = Some(check.schema_reachable);
            }
            Err(e) => {
                report.finish(RunStatus::PermissionDenied {
                    error: e.to_string(),
                });
                return report;
            }
        }

        info!(run_id = %report.run_id, "--- Starting Full Project Cleanup ---");

        match self.run_steps(&mut report).await {
            Ok(()) => {
                info!("--- Cleanup Finished Successfully ---");
                report.finish(RunStatus::Completed);
            }
            Err(CleanupError::Critical { action, source }) => {
                report.finish(RunStatus::AbortedCritical {
                    action,
                    error: source.to_string(),
                });
            }
            Err(e @ CleanupError::Authentication(_)) => {
                report.finish(RunStatus::PermissionDenied {
                    error: e.to_string(),
                });
            }
        }

        report
    }

    async fn run_steps(&self, report: &mut CleanupReport) -> Result<(), CleanupError> {
        for action in self.plan() {
            self.attempt(&action, report).await?;
        }
        self.clear_models(report).await?;
        self.clear_volumes(report).await?;
        self.unbind_app(report).await;
        Ok(())
    }

    async fn attempt(
        &self,
        action: &ResourceAction,
        report: &mut CleanupReport,
    ) -> Result<(), CleanupError> {
        match self.safe_delete(action).await {
            Ok(outcome) => {
                report.record(StepRecord::new(action, outcome));
                Ok(())
            }
            Err(e) => {
                let error = match &e {
                    CleanupError::Critical { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                report.record(StepRecord::new(action, CleanupOutcome::Failed { error }));
                Err(e)
            }
        }
    }

    async fn clear_models(&self, report: &mut CleanupReport) -> Result<(), CleanupError> {
        let c = &self.config;
        let models = match self.api.list_registered_models(&c.catalog, &c.schema).await {
            Ok(models) => models,
            Err(e) => {
                info!(error = %e, "No models found to clear.");
                return Ok(());
            }
        };

        for model in models {
            match self.api.list_model_versions(&model.full_name).await {
                Ok(versions) => {
                    for v in versions {
                        let action = ResourceAction::non_critical(
                            format!("Delete Version {} of {}", v.version, model.name),
                            ResourceTarget::ModelVersion {
                                full_name: model.full_name.clone(),
                                version: v.version,
                            },
                        );
                        self.attempt(&action, report).await?;
                    }
                }
                Err(e) => {
                    info!(model = %model.full_name, error = %e, "No versions found for {}.", model.name);
                }
            }

            let action = ResourceAction::non_critical(
                format!("Delete Model Container {}", model.name),
                ResourceTarget::RegisteredModel {
                    full_name: model.full_name.clone(),
                },
            );
            self.attempt(&action, report).await?;
        }
        Ok(())
    }

    async fn clear_volumes(&self, report: &mut CleanupReport) -> Result<(), CleanupError> {
        let c = &self.config;
        let volumes = match self.api.list_volumes(&c.catalog, &c.schema).await {
            Ok(volumes) => volumes,
            Err(e) => {
                info!(error = %e, "No volumes found to clear.");
                return Ok(());
            }
        };

        for volume in volumes {
            let action = ResourceAction::non_critical(
                format!("Delete Volume {}", volume.name),
                ResourceTarget::Volume {
                    full_name: volume.full_name.clone(),
                },
            );
            self.attempt(&action, report).await?;
        }
        info!(
            "Schema {} is now empty but remains active.",
            c.schema_full_name()
        );
        Ok(())
    }

    /// Last step, best effort: a failure is reported but does not fail the run.
    async fn unbind_app(&self, report: &mut CleanupReport) {
        let c = &self.config;
        info!(resource = %c.app_name, target = %c.alias, "Starting: Unbind App...");
        let outcome = match self.bundle.unbind(&c.app_name, &c.alias).await {
            Ok(()) => {
                info!("Unbind App successful.");
                CleanupOutcome::Succeeded
            }
            Err(e) => {
                warn!(error = %e, "Unbind App failed: {}", e);
                CleanupOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        report.unbind = Some(outcome);
    }
}
