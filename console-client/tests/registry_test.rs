use std::sync::Arc;

use console_client::deploy::recommended_config;
use console_client::registry::{DeploymentRegistry, DEPLOYMENTS_KEY};
use console_client::test_util::mock_ollama::MockOllamaResponse;
use console_client::test_util::{test_gateway, test_snapshot};
use console_client::{FileStore, KeyValueStore, MetricsClient};
use console_common::{DeployConfig, DeploymentStatus, NO_GPU_DETECTED};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn offline_gateway() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ps"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_redeploy_keeps_id_and_takes_new_config() {
    let dir = tempfile::tempdir().unwrap();
    let server = offline_gateway().await;
    let store = Arc::new(FileStore::new(dir.path().join("state.json")));
    let registry = DeploymentRegistry::new(store.clone(), Arc::new(test_gateway(&server.uri())));

    let cfg_a = DeployConfig {
        threads: 4,
        context_size_tokens: 4096,
        gpu_layers: 0,
        ..DeployConfig::default()
    };
    let cfg_b = DeployConfig {
        threads: 8,
        context_size_tokens: 8192,
        gpu_layers: 100,
        ..DeployConfig::default()
    };

    let first = registry.upsert("m1", &cfg_a).await.unwrap();
    registry.upsert("m1", &cfg_b).await.unwrap();

    let records = registry.list_deployments().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, first.id);
    assert_eq!(records[0].threads, cfg_b.threads);
    assert_eq!(records[0].context_size_tokens, cfg_b.context_size_tokens);
    assert_eq!(records[0].gpu_layers, cfg_b.gpu_layers);

    // Stored as one JSON array under a single key.
    let raw = store.get(DEPLOYMENTS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(1));
    assert_eq!(value[0]["contextSize"], 8192);
}

#[tokio::test]
async fn test_stop_and_start_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let server = offline_gateway().await;

    let id = {
        let registry = DeploymentRegistry::new(
            Arc::new(FileStore::new(&path)),
            Arc::new(test_gateway(&server.uri())),
        );
        let record = registry.upsert("mistral:7b", &DeployConfig::default()).await.unwrap();
        registry
            .set_status("mistral:7b", DeploymentStatus::Stopped)
            .await
            .unwrap();
        record.id
    };

    let reopened = DeploymentRegistry::new(
        Arc::new(FileStore::new(&path)),
        Arc::new(test_gateway(&server.uri())),
    );
    let records = reopened.list_deployments().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].status, DeploymentStatus::Stopped);

    reopened
        .set_status("mistral:7b", DeploymentStatus::Running)
        .await
        .unwrap();
    assert!(reopened.stored_deployments().unwrap()[0].is_running());
}

#[tokio::test]
async fn test_live_list_wins_when_server_answers() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ps"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockOllamaResponse::running(&[("llama3:8b", 4_000_000_000)])),
        )
        .mount(&server)
        .await;

    let registry = DeploymentRegistry::new(
        Arc::new(FileStore::new(dir.path().join("state.json"))),
        Arc::new(test_gateway(&server.uri())),
    );
    registry
        .upsert("llama3:8b", &DeployConfig::default())
        .await
        .unwrap();

    let records = registry.list_deployments().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "sha256:llama38b");
    assert_eq!(records[0].threads, 0);
    assert_eq!(records[0].context_size_tokens, 0);
    assert_eq!(records[0].gpu_layers, 0);
    assert_eq!(records[0].vram_bytes, Some(4_000_000_000));

    // The stored configuration is still there for the fallback path.
    assert_eq!(registry.stored_deployments().unwrap()[0].threads, 4);
}

#[tokio::test]
async fn test_deploy_defaults_from_offline_metrics() {
    // Nothing listens on port 9 in the test environment.
    let snapshot = MetricsClient::new("http://127.0.0.1:9")
        .snapshot_or_offline()
        .await;
    let config = recommended_config("llama2:70b", &snapshot);

    assert_eq!(config.threads, 4);
    assert_eq!(config.context_size_tokens, 8192);
    assert_eq!(config.gpu_layers, 0);
    assert!(config.selected_gpu_ids.is_empty());

    let no_gpu = recommended_config("llama3:8b", &test_snapshot(&[NO_GPU_DETECTED]));
    assert_eq!(no_gpu.gpu_layers, 0);
}
