use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lowercase substrings that mark an error message as "resource absent".
///
/// Only consulted for errors whose collaborator could not classify them
/// (`ApiErrorKind::Other`); this is a best-effort compatibility shim.
pub const ABSENCE_INDICATORS: [&str; 4] = ["not found", "404", "does not exist", "not_found"];

/// Structured classification of a collaborator failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Unauthenticated,
    /// The request never produced a response (connect, timeout, decode).
    Transport,
    Other,
}

/// Error returned by every [`WorkspaceApi`] and [`BundleUnbinder`] call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Other, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether this failure means the resource is already gone.
    ///
    /// A structured kind wins; text matching only applies to unclassified errors.
    pub fn is_absent(&self) -> bool {
        match self.kind {
            ApiErrorKind::NotFound => true,
            ApiErrorKind::Other => text_indicates_absence(&self.message),
            _ => false,
        }
    }
}

/// Case-insensitive match against [`ABSENCE_INDICATORS`].
pub fn text_indicates_absence(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ABSENCE_INDICATORS
        .iter()
        .any(|indicator| lowered.contains(indicator))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorEndpoint {
    pub name: String,
    /// Endpoint state as reported by the service (`ONLINE`, `PROVISIONING`, ...).
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorIndex {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Omitted by the service while the index is still pending.
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

/// Request for a triggered delta-sync index with one managed embedding column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSyncIndexSpec {
    pub name: String,
    pub endpoint_name: String,
    pub primary_key: String,
    pub source_table: String,
    pub pipeline_type: String,
    pub embedding_source_column: String,
    pub embedding_model_endpoint_name: String,
}

/// The managed workspace services ragops talks to.
///
/// Every call is a single request against an external service; implementations
/// classify failures into an [`ApiErrorKind`] where they can.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Resolve the identity behind the configured credentials.
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;

    async fn get_schema(&self, full_name: &str) -> Result<(), ApiError>;

    async fn delete_app(&self, name: &str) -> Result<(), ApiError>;

    async fn delete_serving_endpoint(&self, name: &str) -> Result<(), ApiError>;

    async fn delete_vector_index(&self, index_name: &str) -> Result<(), ApiError>;

    async fn delete_vector_endpoint(&self, endpoint_name: &str) -> Result<(), ApiError>;

    async fn delete_table(&self, full_name: &str) -> Result<(), ApiError>;

    /// `Ok(None)` when no experiment has this name.
    async fn get_experiment_by_name(&self, name: &str) -> Result<Option<Experiment>, ApiError>;

    async fn delete_experiment(&self, experiment_id: &str) -> Result<(), ApiError>;

    async fn list_registered_models(
        &self,
        catalog: &str,
        schema: &str,
    ) -> Result<Vec<RegisteredModel>, ApiError>;

    async fn list_model_versions(&self, full_name: &str) -> Result<Vec<ModelVersion>, ApiError>;

    async fn delete_model_version(&self, full_name: &str, version: u64) -> Result<(), ApiError>;

    async fn delete_registered_model(&self, full_name: &str) -> Result<(), ApiError>;

    async fn list_volumes(&self, catalog: &str, schema: &str) -> Result<Vec<Volume>, ApiError>;

    async fn delete_volume(&self, full_name: &str) -> Result<(), ApiError>;

    async fn list_vector_endpoints(&self) -> Result<Vec<VectorEndpoint>, ApiError>;

    async fn create_vector_endpoint(&self, name: &str) -> Result<(), ApiError>;

    async fn get_vector_endpoint(&self, name: &str) -> Result<VectorEndpoint, ApiError>;

    async fn list_vector_indexes(&self, endpoint_name: &str) -> Result<Vec<VectorIndex>, ApiError>;

    async fn create_delta_sync_index(&self, spec: &DeltaSyncIndexSpec) -> Result<(), ApiError>;

    async fn sync_vector_index(&self, index_name: &str) -> Result<(), ApiError>;

    async fn get_vector_index_status(&self, index_name: &str) -> Result<IndexStatus, ApiError>;

    async fn get_model_version_by_alias(
        &self,
        full_name: &str,
        alias: &str,
    ) -> Result<ModelVersion, ApiError>;

    async fn set_registered_model_alias(
        &self,
        full_name: &str,
        alias: &str,
        version: u64,
    ) -> Result<(), ApiError>;
}

/// Detaches a deployed resource from the bundle deployment state.
#[async_trait]
pub trait BundleUnbinder: Send + Sync {
    async fn unbind(&self, resource_key: &str, target: &str) -> Result<(), ApiError>;
}
