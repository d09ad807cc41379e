//! In-memory workspace shared by the runtime integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ragops_core::{CleanupConfig, Settings};
use ragops_runtime::adapter::{
    CurrentUser, DeltaSyncIndexSpec, Experiment, IndexStatus, ModelVersion, RegisteredModel,
    VectorEndpoint, VectorIndex, Volume,
};
use ragops_runtime::{ApiError, BundleUnbinder, WorkspaceApi};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const CATALOG: &str = "main";
pub const SCHEMA: &str = "rag";

pub fn test_settings() -> Settings {
    Settings::from_flag_pairs([
        "--vs_endpoint_name",
        "vs-endpoint",
        "--app_name",
        "rag-chat",
        "--vs_index_name",
        "main.rag.docs_index",
        "--catalog",
        CATALOG,
        "--schema",
        SCHEMA,
        "--table_name",
        "main.rag.docs",
        "--serving_endpoint_name",
        "rag-agent",
        "--experiment_path",
        "/Shared/rag-experiment",
        "--alias",
        "dev",
        "--logs_path",
        "/tmp/ragops-test-logs",
    ])
}

pub fn test_config() -> CleanupConfig {
    CleanupConfig::from_settings(&test_settings()).unwrap()
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// `None` makes identity resolution fail.
    pub user: Option<String>,
    pub schemas: BTreeSet<String>,
    pub apps: BTreeSet<String>,
    pub serving_endpoints: BTreeSet<String>,
    pub vector_indexes: BTreeSet<String>,
    pub vector_endpoints: BTreeSet<String>,
    pub tables: BTreeSet<String>,
    /// Experiment name to id.
    pub experiments: BTreeMap<String, String>,
    /// Model full name to (short name, versions).
    pub models: BTreeMap<String, (String, Vec<u64>)>,
    /// Volume full name to short name.
    pub volumes: BTreeMap<String, String>,
    /// Errors returned by every call to the named operation.
    pub failures: HashMap<&'static str, ApiError>,
    pub calls: Vec<String>,

    pub endpoint_states: VecDeque<String>,
    pub index_statuses: VecDeque<IndexStatus>,
    pub created_indexes: Vec<DeltaSyncIndexSpec>,
    pub synced_indexes: Vec<String>,
    /// (model, alias) to version.
    pub aliases: BTreeMap<(String, String), u64>,
}

#[derive(Clone, Default)]
pub struct FakeWorkspace {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeWorkspace {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Every resource named by [`test_config`] exists, plus two models and two volumes.
    pub fn provisioned() -> Self {
        let mut state = FakeState {
            user: Some("ops@example.com".to_string()),
            ..Default::default()
        };
        state.schemas.insert("main.rag".to_string());
        state.apps.insert("rag-chat".to_string());
        state.serving_endpoints.insert("rag-agent".to_string());
        state.vector_indexes.insert("main.rag.docs_index".to_string());
        state.vector_endpoints.insert("vs-endpoint".to_string());
        state.tables.insert("main.rag.docs".to_string());
        state
            .experiments
            .insert("/Shared/rag-experiment".to_string(), "4242".to_string());
        state.models.insert(
            "main.rag.agent".to_string(),
            ("agent".to_string(), vec![1, 2]),
        );
        state.models.insert(
            "main.rag.judge".to_string(),
            ("judge".to_string(), vec![1]),
        );
        state
            .volumes
            .insert("main.rag.raw".to_string(), "raw".to_string());
        state
            .volumes
            .insert("main.rag.staging".to_string(), "staging".to_string());
        Self::new(state)
    }

    pub fn fail(&self, op: &'static str, err: ApiError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn called(&self, op: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| c == op || c.starts_with(&format!("{} ", op)))
    }

    fn enter(&self, op: &'static str, arg: &str) -> Result<std::sync::MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.state.lock().unwrap();
        if arg.is_empty() {
            state.calls.push(op.to_string());
        } else {
            state.calls.push(format!("{} {}", op, arg));
        }
        match state.failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(state),
        }
    }
}

fn remove(set: &mut BTreeSet<String>, what: &str, name: &str) -> Result<(), ApiError> {
    if set.remove(name) {
        Ok(())
    } else {
        Err(ApiError::not_found(format!("{} '{}' does not exist", what, name)).with_status(404))
    }
}

#[async_trait]
impl WorkspaceApi for FakeWorkspace {
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let state = self.enter("current_user", "")?;
        state
            .user
            .clone()
            .map(|user_name| CurrentUser { user_name })
            .ok_or_else(|| ApiError::other("invalid access token"))
    }

    async fn get_schema(&self, full_name: &str) -> Result<(), ApiError> {
        let state = self.enter("get_schema", full_name)?;
        if state.schemas.contains(full_name) {
            Ok(())
        } else {
            Err(ApiError::not_found("schema does not exist"))
        }
    }

    async fn delete_app(&self, name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_app", name)?;
        remove(&mut state.apps, "app", name)
    }

    async fn delete_serving_endpoint(&self, name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_serving_endpoint", name)?;
        remove(&mut state.serving_endpoints, "serving endpoint", name)
    }

    async fn delete_vector_index(&self, index_name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_vector_index", index_name)?;
        remove(&mut state.vector_indexes, "index", index_name)
    }

    async fn delete_vector_endpoint(&self, endpoint_name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_vector_endpoint", endpoint_name)?;
        remove(&mut state.vector_endpoints, "endpoint", endpoint_name)
    }

    async fn delete_table(&self, full_name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_table", full_name)?;
        remove(&mut state.tables, "table", full_name)
    }

    async fn get_experiment_by_name(&self, name: &str) -> Result<Option<Experiment>, ApiError> {
        let state = self.enter("get_experiment_by_name", name)?;
        Ok(state.experiments.get(name).map(|id| Experiment {
            experiment_id: id.clone(),
            name: name.to_string(),
        }))
    }

    async fn delete_experiment(&self, experiment_id: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_experiment", experiment_id)?;
        let before = state.experiments.len();
        state.experiments.retain(|_, id| id != experiment_id);
        if state.experiments.len() < before {
            Ok(())
        } else {
            Err(ApiError::not_found("experiment does not exist"))
        }
    }

    async fn list_registered_models(
        &self,
        catalog: &str,
        schema: &str,
    ) -> Result<Vec<RegisteredModel>, ApiError> {
        let state = self.enter("list_registered_models", &format!("{}.{}", catalog, schema))?;
        Ok(state
            .models
            .iter()
            .map(|(full_name, (name, _))| RegisteredModel {
                name: name.clone(),
                full_name: full_name.clone(),
            })
            .collect())
    }

    async fn list_model_versions(&self, full_name: &str) -> Result<Vec<ModelVersion>, ApiError> {
        let state = self.enter("list_model_versions", full_name)?;
        match state.models.get(full_name) {
            Some((_, versions)) => Ok(versions
                .iter()
                .map(|v| ModelVersion { version: *v })
                .collect()),
            None => Err(ApiError::not_found("model does not exist")),
        }
    }

    async fn delete_model_version(&self, full_name: &str, version: u64) -> Result<(), ApiError> {
        let mut state = self.enter("delete_model_version", &format!("{} {}", full_name, version))?;
        match state.models.get_mut(full_name) {
            Some((_, versions)) if versions.contains(&version) => {
                versions.retain(|v| *v != version);
                Ok(())
            }
            _ => Err(ApiError::not_found("model version does not exist")),
        }
    }

    async fn delete_registered_model(&self, full_name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_registered_model", full_name)?;
        match state.models.remove(full_name) {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("model does not exist")),
        }
    }

    async fn list_volumes(&self, catalog: &str, schema: &str) -> Result<Vec<Volume>, ApiError> {
        let state = self.enter("list_volumes", &format!("{}.{}", catalog, schema))?;
        Ok(state
            .volumes
            .iter()
            .map(|(full_name, name)| Volume {
                name: name.clone(),
                full_name: full_name.clone(),
            })
            .collect())
    }

    async fn delete_volume(&self, full_name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("delete_volume", full_name)?;
        match state.volumes.remove(full_name) {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("volume does not exist")),
        }
    }

    async fn list_vector_endpoints(&self) -> Result<Vec<VectorEndpoint>, ApiError> {
        let state = self.enter("list_vector_endpoints", "")?;
        Ok(state
            .vector_endpoints
            .iter()
            .map(|name| VectorEndpoint {
                name: name.clone(),
                state: Some("ONLINE".to_string()),
                message: None,
            })
            .collect())
    }

    async fn create_vector_endpoint(&self, name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("create_vector_endpoint", name)?;
        state.vector_endpoints.insert(name.to_string());
        Ok(())
    }

    async fn get_vector_endpoint(&self, name: &str) -> Result<VectorEndpoint, ApiError> {
        let mut state = self.enter("get_vector_endpoint", name)?;
        let endpoint_state = next_or_last(&mut state.endpoint_states)
            .unwrap_or_else(|| "ONLINE".to_string());
        Ok(VectorEndpoint {
            name: name.to_string(),
            state: Some(endpoint_state),
            message: None,
        })
    }

    async fn list_vector_indexes(&self, endpoint_name: &str) -> Result<Vec<VectorIndex>, ApiError> {
        let state = self.enter("list_vector_indexes", endpoint_name)?;
        Ok(state
            .vector_indexes
            .iter()
            .map(|name| VectorIndex { name: name.clone() })
            .collect())
    }

    async fn create_delta_sync_index(&self, spec: &DeltaSyncIndexSpec) -> Result<(), ApiError> {
        let mut state = self.enter("create_delta_sync_index", &spec.name)?;
        state.vector_indexes.insert(spec.name.clone());
        state.created_indexes.push(spec.clone());
        Ok(())
    }

    async fn sync_vector_index(&self, index_name: &str) -> Result<(), ApiError> {
        let mut state = self.enter("sync_vector_index", index_name)?;
        state.synced_indexes.push(index_name.to_string());
        Ok(())
    }

    async fn get_vector_index_status(&self, index_name: &str) -> Result<IndexStatus, ApiError> {
        let mut state = self.enter("get_vector_index_status", index_name)?;
        Ok(next_or_last(&mut state.index_statuses).unwrap_or(IndexStatus {
            ready: true,
            message: "ONLINE_NO_PENDING_UPDATE".to_string(),
        }))
    }

    async fn get_model_version_by_alias(
        &self,
        full_name: &str,
        alias: &str,
    ) -> Result<ModelVersion, ApiError> {
        let state = self.enter("get_model_version_by_alias", &format!("{} {}", full_name, alias))?;
        state
            .aliases
            .get(&(full_name.to_string(), alias.to_string()))
            .map(|v| ModelVersion { version: *v })
            .ok_or_else(|| ApiError::not_found("alias does not exist"))
    }

    async fn set_registered_model_alias(
        &self,
        full_name: &str,
        alias: &str,
        version: u64,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(
            "set_registered_model_alias",
            &format!("{} {} {}", full_name, alias, version),
        )?;
        state
            .aliases
            .insert((full_name.to_string(), alias.to_string()), version);
        Ok(())
    }
}

/// Pop the front of a scripted sequence, repeating its last element forever.
fn next_or_last<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[derive(Clone, Default)]
pub struct FakeUnbinder {
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    pub failure: Option<ApiError>,
}

impl FakeUnbinder {
    pub fn failing(err: ApiError) -> Self {
        Self {
            failure: Some(err),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BundleUnbinder for FakeUnbinder {
    async fn unbind(&self, resource_key: &str, target: &str) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((resource_key.to_string(), target.to_string()));
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
