//! Databricks implementation of the ragops workspace boundary.
//!
//! [`DatabricksClient`] speaks the workspace REST API with a bearer token;
//! [`DatabricksBundleCli`] shells out to the `databricks` CLI for bundle state.

use async_trait::async_trait;
use ragops_core::WorkspaceConfig;
use ragops_runtime::adapter::{
    CurrentUser, DeltaSyncIndexSpec, Experiment, IndexStatus, ModelVersion, RegisteredModel,
    VectorEndpoint, VectorIndex, Volume,
};
use ragops_runtime::{ApiError, WorkspaceApi};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

mod bundle;
mod error;

pub use bundle::{DEFAULT_CLI_PROGRAM, DatabricksBundleCli};

const VECTOR_ENDPOINT_TYPE: &str = "STANDARD";
const VECTOR_INDEX_TYPE: &str = "DELTA_SYNC";

pub struct DatabricksClient {
    config: WorkspaceConfig,
    http: reqwest::Client,
}

impl DatabricksClient {
    pub fn new(config: WorkspaceConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("ragops/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(error::transport)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Workspace URL for `segments`, each one percent-encoded as a single path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.config.host).map_err(|e| {
            ApiError::other(format!("invalid workspace host '{}': {}", self.config.host, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::other(format!(
                    "workspace host '{}' cannot carry a path",
                    self.config.host
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.url(segments)?;
        debug!(method = %method, path = %url.path(), "workspace request");
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(&self.config.token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(error::transport)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error::from_response(response).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(Method::GET, segments)?.query(query))
            .await?;
        let body = response.bytes().await.map_err(error::transport)?;
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::other(format!(
                "unexpected payload from /{}: {}",
                segments.join("/"),
                e
            ))
        })
    }

    async fn post_json(&self, segments: &[&str], body: &Value) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, segments)?.json(body))
            .await
            .map(|_| ())
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, segments)?)
            .await
            .map(|_| ())
    }

    /// Follow `next_page_token` until exhausted, collecting `field` from each page.
    async fn list_all<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        field: &str,
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params = query.to_vec();
            if let Some(token) = page_token.as_deref() {
                params.push(("page_token", token));
            }
            let page: Value = self.get_json(segments, &params).await?;
            if let Some(values) = page.get(field) {
                let batch: Vec<T> = serde_json::from_value(values.clone()).map_err(|e| {
                    ApiError::other(format!(
                        "unexpected '{}' payload from /{}: {}",
                        field,
                        segments.join("/"),
                        e
                    ))
                })?;
                items.extend(batch);
            }
            match page
                .get("next_page_token")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
            {
                Some(next) => page_token = Some(next.to_string()),
                None => break,
            }
        }
        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct ScimMe {
    #[serde(rename = "userName")]
    user_name: String,
}

#[derive(Debug, Deserialize)]
struct ExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointStatus {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndpointInfo {
    name: String,
    #[serde(default)]
    endpoint_status: Option<EndpointStatus>,
}

impl From<EndpointInfo> for VectorEndpoint {
    fn from(info: EndpointInfo) -> Self {
        let status = info.endpoint_status.unwrap_or_default();
        VectorEndpoint {
            name: info.name,
            state: status.state,
            message: status.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexInfo {
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[async_trait]
impl WorkspaceApi for DatabricksClient {
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let me: ScimMe = self
            .get_json(&["api", "2.0", "preview", "scim", "v2", "Me"], &[])
            .await?;
        Ok(CurrentUser {
            user_name: me.user_name,
        })
    }

    async fn get_schema(&self, full_name: &str) -> Result<(), ApiError> {
        let segments = ["api", "2.1", "unity-catalog", "schemas", full_name];
        self.send(self.request(Method::GET, &segments)?)
            .await
            .map(|_| ())
    }

    async fn delete_app(&self, name: &str) -> Result<(), ApiError> {
        self.delete(&["api", "2.0", "apps", name]).await
    }

    async fn delete_serving_endpoint(&self, name: &str) -> Result<(), ApiError> {
        self.delete(&["api", "2.0", "serving-endpoints", name]).await
    }

    async fn delete_vector_index(&self, index_name: &str) -> Result<(), ApiError> {
        self.delete(&["api", "2.0", "vector-search", "indexes", index_name])
            .await
    }

    async fn delete_vector_endpoint(&self, endpoint_name: &str) -> Result<(), ApiError> {
        self.delete(&["api", "2.0", "vector-search", "endpoints", endpoint_name])
            .await
    }

    async fn delete_table(&self, full_name: &str) -> Result<(), ApiError> {
        self.delete(&["api", "2.1", "unity-catalog", "tables", full_name])
            .await
    }

    async fn get_experiment_by_name(&self, name: &str) -> Result<Option<Experiment>, ApiError> {
        let result: Result<ExperimentResponse, ApiError> = self
            .get_json(
                &["api", "2.0", "mlflow", "experiments", "get-by-name"],
                &[("experiment_name", name)],
            )
            .await;
        match result {
            Ok(response) => Ok(Some(response.experiment)),
            Err(e) if e.is_absent() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_experiment(&self, experiment_id: &str) -> Result<(), ApiError> {
        self.post_json(
            &["api", "2.0", "mlflow", "experiments", "delete"],
            &json!({ "experiment_id": experiment_id }),
        )
        .await
    }

    async fn list_registered_models(
        &self,
        catalog: &str,
        schema: &str,
    ) -> Result<Vec<RegisteredModel>, ApiError> {
        self.list_all(
            &["api", "2.1", "unity-catalog", "models"],
            &[("catalog_name", catalog), ("schema_name", schema)],
            "registered_models",
        )
        .await
    }

    async fn list_model_versions(&self, full_name: &str) -> Result<Vec<ModelVersion>, ApiError> {
        self.list_all(
            &["api", "2.1", "unity-catalog", "models", full_name, "versions"],
            &[],
            "model_versions",
        )
        .await
    }

    async fn delete_model_version(&self, full_name: &str, version: u64) -> Result<(), ApiError> {
        let version = version.to_string();
        self.delete(&[
            "api",
            "2.1",
            "unity-catalog",
            "models",
            full_name,
            "versions",
            version.as_str(),
        ])
        .await
    }

    async fn delete_registered_model(&self, full_name: &str) -> Result<(), ApiError> {
        self.delete(&["api", "2.1", "unity-catalog", "models", full_name])
            .await
    }

    async fn list_volumes(&self, catalog: &str, schema: &str) -> Result<Vec<Volume>, ApiError> {
        self.list_all(
            &["api", "2.1", "unity-catalog", "volumes"],
            &[("catalog_name", catalog), ("schema_name", schema)],
            "volumes",
        )
        .await
    }

    async fn delete_volume(&self, full_name: &str) -> Result<(), ApiError> {
        self.delete(&["api", "2.1", "unity-catalog", "volumes", full_name])
            .await
    }

    async fn list_vector_endpoints(&self) -> Result<Vec<VectorEndpoint>, ApiError> {
        let endpoints: Vec<EndpointInfo> = self
            .list_all(&["api", "2.0", "vector-search", "endpoints"], &[], "endpoints")
            .await?;
        Ok(endpoints.into_iter().map(VectorEndpoint::from).collect())
    }

    async fn create_vector_endpoint(&self, name: &str) -> Result<(), ApiError> {
        self.post_json(
            &["api", "2.0", "vector-search", "endpoints"],
            &json!({ "name": name, "endpoint_type": VECTOR_ENDPOINT_TYPE }),
        )
        .await
    }

    async fn get_vector_endpoint(&self, name: &str) -> Result<VectorEndpoint, ApiError> {
        let info: EndpointInfo = self
            .get_json(&["api", "2.0", "vector-search", "endpoints", name], &[])
            .await?;
        Ok(info.into())
    }

    async fn list_vector_indexes(&self, endpoint_name: &str) -> Result<Vec<VectorIndex>, ApiError> {
        self.list_all(
            &["api", "2.0", "vector-search", "indexes"],
            &[("endpoint_name", endpoint_name)],
            "vector_indexes",
        )
        .await
    }

    async fn create_delta_sync_index(&self, spec: &DeltaSyncIndexSpec) -> Result<(), ApiError> {
        let body = json!({
            "name": spec.name,
            "endpoint_name": spec.endpoint_name,
            "primary_key": spec.primary_key,
            "index_type": VECTOR_INDEX_TYPE,
            "delta_sync_index_spec": {
                "source_table": spec.source_table,
                "pipeline_type": spec.pipeline_type,
                "embedding_source_columns": [{
                    "name": spec.embedding_source_column,
                    "embedding_model_endpoint_name": spec.embedding_model_endpoint_name,
                }],
            },
        });
        self.post_json(&["api", "2.0", "vector-search", "indexes"], &body)
            .await
    }

    async fn sync_vector_index(&self, index_name: &str) -> Result<(), ApiError> {
        self.post_json(
            &["api", "2.0", "vector-search", "indexes", index_name, "sync"],
            &json!({}),
        )
        .await
    }

    async fn get_vector_index_status(&self, index_name: &str) -> Result<IndexStatus, ApiError> {
        let info: IndexInfo = self
            .get_json(&["api", "2.0", "vector-search", "indexes", index_name], &[])
            .await?;
        Ok(info.status.unwrap_or(IndexStatus {
            ready: false,
            message: "UNKNOWN".to_string(),
        }))
    }

    async fn get_model_version_by_alias(
        &self,
        full_name: &str,
        alias: &str,
    ) -> Result<ModelVersion, ApiError> {
        self.get_json(
            &["api", "2.1", "unity-catalog", "models", full_name, "aliases", alias],
            &[],
        )
        .await
    }

    async fn set_registered_model_alias(
        &self,
        full_name: &str,
        alias: &str,
        version: u64,
    ) -> Result<(), ApiError> {
        let segments = ["api", "2.1", "unity-catalog", "models", full_name, "aliases", alias];
        self.send(
            self.request(Method::PUT, &segments)?
                .json(&json!({ "version_num": version })),
        )
        .await
        .map(|_| ())
    }
}
