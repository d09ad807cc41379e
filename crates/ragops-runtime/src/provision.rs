//! Provisioning operations that share the teardown's resource set: vector
//! index setup and model alias rollback.

use ragops_core::{IndexConfig, RollbackConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapter::{ApiError, DeltaSyncIndexSpec, IndexStatus, VectorEndpoint, WorkspaceApi};
use crate::poll::{PollError, PollPolicy, PollStatus, wait_until};

const INDEX_PRIMARY_KEY: &str = "id";
const INDEX_PIPELINE_TYPE: &str = "TRIGGERED";
/// Only this column is embedded; the others stay keyword-searchable for hybrid search.
const EMBEDDING_SOURCE_COLUMN: &str = "description";

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexProvisioned {
    pub endpoint_created: bool,
    pub index_created: bool,
    pub status_message: String,
}

/// Make sure the vector search endpoint and delta-sync index exist, then wait
/// until the index reports ready.
///
/// An existing index gets a manual sync instead of being recreated.
pub async fn ensure_vector_index<A>(
    api: &A,
    config: &IndexConfig,
) -> Result<IndexProvisioned, ProvisionError>
where
    A: WorkspaceApi + ?Sized,
{
    let policy = PollPolicy::from(&config.poll);
    let endpoint_name = config.vs_endpoint_name.as_str();
    let index_name = config.vs_index_name.as_str();

    let endpoints = api.list_vector_endpoints().await?;
    let endpoint_created = if endpoints.iter().any(|e| e.name == endpoint_name) {
        false
    } else {
        info!("Creating Vector Search Endpoint: {}...", endpoint_name);
        api.create_vector_endpoint(endpoint_name).await?;
        wait_until(
            &policy,
            &format!("vector search endpoint {}", endpoint_name),
            || async move {
                let endpoint = api.get_vector_endpoint(endpoint_name).await?;
                Ok::<_, ApiError>(endpoint_status(endpoint))
            },
        )
        .await?;
        true
    };

    info!("Checking if Vector Index exists: {}...", index_name);
    let indexes = api.list_vector_indexes(endpoint_name).await?;
    let index_created = if indexes.iter().any(|i| i.name == index_name) {
        info!("Index {} already exists. Triggering manual sync...", index_name);
        api.sync_vector_index(index_name).await?;
        false
    } else {
        info!("Index {} not found. Creating with Hybrid Search...", index_name);
        let spec = DeltaSyncIndexSpec {
            name: index_name.to_string(),
            endpoint_name: endpoint_name.to_string(),
            primary_key: INDEX_PRIMARY_KEY.to_string(),
            source_table: config.table_name.clone(),
            pipeline_type: INDEX_PIPELINE_TYPE.to_string(),
            embedding_source_column: EMBEDDING_SOURCE_COLUMN.to_string(),
            embedding_model_endpoint_name: config.embedding_llm_model.clone(),
        };
        api.create_delta_sync_index(&spec).await?;
        info!("Index creation request sent.");
        true
    };

    info!("Waiting for initial sync to complete...");
    let status_message = wait_until(
        &policy,
        &format!("vector index {}", index_name),
        || async move {
            let status = api.get_vector_index_status(index_name).await?;
            Ok::<_, ApiError>(index_status(status))
        },
    )
    .await?;
    info!("Index is ready! Status: {}", status_message);

    Ok(IndexProvisioned {
        endpoint_created,
        index_created,
        status_message,
    })
}

fn endpoint_status(endpoint: VectorEndpoint) -> PollStatus<()> {
    let state = endpoint.state.unwrap_or_else(|| "UNKNOWN".to_string());
    let upper = state.to_uppercase();
    if upper == "ONLINE" {
        PollStatus::Ready(())
    } else if upper == "OFFLINE" || upper.contains("FAILED") {
        PollStatus::Failed(endpoint.message.unwrap_or(state))
    } else {
        PollStatus::Pending(state)
    }
}

fn index_status(status: IndexStatus) -> PollStatus<String> {
    if status.ready {
        PollStatus::Ready(status.message)
    } else if status.message.to_uppercase().contains("ERROR") {
        PollStatus::Failed(status.message)
    } else {
        PollStatus::Pending(status.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RollbackOutcome {
    AlreadyOldest { version: u64 },
    RolledBack { from: u64, to: u64 },
}

/// Point `alias` at the version just below the one it serves now.
pub async fn rollback_alias<A>(
    api: &A,
    config: &RollbackConfig,
) -> Result<RollbackOutcome, ProvisionError>
where
    A: WorkspaceApi + ?Sized,
{
    let model = config.model_name.as_str();
    let alias = config.alias.as_str();

    let current = api.get_model_version_by_alias(model, alias).await?.version;
    let previous = api
        .list_model_versions(model)
        .await?
        .into_iter()
        .map(|v| v.version)
        .filter(|v| *v < current)
        .max();

    let Some(previous) = previous else {
        info!(
            "Cannot rollback: Version {} is already the oldest version.",
            current
        );
        return Ok(RollbackOutcome::AlreadyOldest { version: current });
    };

    info!("Rolling back {} from v{} to v{}...", model, current, previous);
    api.set_registered_model_alias(model, alias, previous).await?;
    info!("Success! Traffic is now routed to version {}.", previous);

    Ok(RollbackOutcome::RolledBack {
        from: current,
        to: previous,
    })
}
