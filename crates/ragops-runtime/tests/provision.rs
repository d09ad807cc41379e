//! Vector index provisioning and alias rollback against an in-memory workspace.

mod common;

use common::{FakeState, FakeWorkspace};
use ragops_core::{IndexConfig, RollbackConfig, Settings};
use ragops_runtime::adapter::IndexStatus;
use ragops_runtime::{
    PollError, ProvisionError, RollbackOutcome, ensure_vector_index, rollback_alias,
};

fn index_config() -> IndexConfig {
    let settings = Settings::from_flag_pairs([
        "--table_name",
        "main.rag.docs",
        "--vs_index_name",
        "main.rag.docs_index",
        "--vs_endpoint_name",
        "vs-endpoint",
        "--embedding_llm_model",
        "databricks-gte-large-en",
        "--poll_interval_secs",
        "20",
        "--poll_timeout_secs",
        "300",
    ]);
    IndexConfig::from_settings(&settings).unwrap()
}

fn pending(message: &str) -> IndexStatus {
    IndexStatus {
        ready: false,
        message: message.to_string(),
    }
}

fn ready(message: &str) -> IndexStatus {
    IndexStatus {
        ready: true,
        message: message.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_creates_missing_endpoint_and_index() {
    let api = FakeWorkspace::new(FakeState {
        endpoint_states: ["PROVISIONING", "PROVISIONING", "ONLINE"]
            .into_iter()
            .map(String::from)
            .collect(),
        index_statuses: [
            pending("PROVISIONING_INITIAL_SNAPSHOT"),
            ready("ONLINE_NO_PENDING_UPDATE"),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    });

    let result = ensure_vector_index(&api, &index_config()).await.unwrap();
    assert!(result.endpoint_created);
    assert!(result.index_created);
    assert_eq!(result.status_message, "ONLINE_NO_PENDING_UPDATE");

    let calls = api.calls();
    let endpoint_probes = calls
        .iter()
        .filter(|c| c.starts_with("get_vector_endpoint"))
        .count();
    assert_eq!(endpoint_probes, 3);

    let state = api.state.lock().unwrap();
    assert_eq!(state.created_indexes.len(), 1);
    let spec = &state.created_indexes[0];
    assert_eq!(spec.name, "main.rag.docs_index");
    assert_eq!(spec.endpoint_name, "vs-endpoint");
    assert_eq!(spec.source_table, "main.rag.docs");
    assert_eq!(spec.primary_key, "id");
    assert_eq!(spec.pipeline_type, "TRIGGERED");
    assert_eq!(spec.embedding_source_column, "description");
    assert_eq!(spec.embedding_model_endpoint_name, "databricks-gte-large-en");
    assert!(state.synced_indexes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_existing_index_is_synced() {
    let mut state = FakeState::default();
    state.vector_endpoints.insert("vs-endpoint".to_string());
    state.vector_indexes.insert("main.rag.docs_index".to_string());
    let api = FakeWorkspace::new(state);

    let result = ensure_vector_index(&api, &index_config()).await.unwrap();
    assert!(!result.endpoint_created);
    assert!(!result.index_created);
    assert!(!api.called("create_vector_endpoint"));
    assert!(!api.called("create_delta_sync_index"));

    let state = api.state.lock().unwrap();
    assert_eq!(state.synced_indexes, vec!["main.rag.docs_index".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_index_error_status_fails() {
    let mut state = FakeState::default();
    state.vector_endpoints.insert("vs-endpoint".to_string());
    state.index_statuses = [pending("PROVISIONING"), pending("ERROR: source table missing")]
        .into_iter()
        .collect();
    let api = FakeWorkspace::new(state);

    let err = ensure_vector_index(&api, &index_config()).await.unwrap_err();
    match err {
        ProvisionError::Poll(PollError::Failed { message, .. }) => {
            assert!(message.contains("source table missing"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_index_never_ready_times_out() {
    let mut state = FakeState::default();
    state.vector_endpoints.insert("vs-endpoint".to_string());
    state.index_statuses = [pending("PROVISIONING")].into_iter().collect();
    let api = FakeWorkspace::new(state);

    let err = ensure_vector_index(&api, &index_config()).await.unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::Poll(PollError::TimedOut { .. })
    ));
}

fn rollback_config() -> RollbackConfig {
    let settings = Settings::from_flag_pairs([
        "--model_name",
        "main.rag.agent",
        "--alias",
        "champion",
    ]);
    RollbackConfig::from_settings(&settings).unwrap()
}

fn with_versions(versions: Vec<u64>, current: u64) -> FakeWorkspace {
    let mut state = FakeState::default();
    state
        .models
        .insert("main.rag.agent".to_string(), ("agent".to_string(), versions));
    state.aliases.insert(
        ("main.rag.agent".to_string(), "champion".to_string()),
        current,
    );
    FakeWorkspace::new(state)
}

#[tokio::test]
async fn test_rollback_moves_to_previous_version() {
    let api = with_versions(vec![1, 4, 7], 7);
    let outcome = rollback_alias(&api, &rollback_config()).await.unwrap();

    assert_eq!(outcome, RollbackOutcome::RolledBack { from: 7, to: 4 });
    assert!(api.called("set_registered_model_alias main.rag.agent champion 4"));
}

#[tokio::test]
async fn test_rollback_on_oldest_version_is_noop() {
    let api = with_versions(vec![1, 2], 1);
    let outcome = rollback_alias(&api, &rollback_config()).await.unwrap();

    assert_eq!(outcome, RollbackOutcome::AlreadyOldest { version: 1 });
    assert!(!api.called("set_registered_model_alias"));
}

#[tokio::test]
async fn test_rollback_without_alias_fails() {
    let api = with_versions(vec![1, 2], 2);
    api.state.lock().unwrap().aliases.clear();

    let err = rollback_alias(&api, &rollback_config()).await.unwrap_err();
    assert!(matches!(err, ProvisionError::Api(e) if e.is_absent()));
}
