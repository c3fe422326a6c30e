//! Deployment registry.
//!
//! Tracks deployed model configurations in the key-value store. Listing prefers
//! the inference server's live process list and only falls back to the stored
//! records when that query fails; the two sources are never merged.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use console_common::{DeployConfig, DeploymentRecord, DeploymentStatus};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::gateway::{GatewayClient, RunningModel};
use crate::store::KeyValueStore;

/// Store key holding the JSON array of records.
pub const DEPLOYMENTS_KEY: &str = "deployedModels";

/// Source of the models currently loaded by the inference server.
#[async_trait]
pub trait RunningModelSource: Send + Sync {
    async fn list_running(&self) -> Result<Vec<RunningModel>>;
}

#[async_trait]
impl RunningModelSource for GatewayClient {
    async fn list_running(&self) -> Result<Vec<RunningModel>> {
        GatewayClient::list_running(self).await
    }
}

pub struct DeploymentRegistry {
    store: Arc<dyn KeyValueStore>,
    live: Arc<dyn RunningModelSource>,
    /// Serializes read-modify-write cycles on the stored collection.
    write_lock: Mutex<()>,
}

impl DeploymentRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, live: Arc<dyn RunningModelSource>) -> Self {
        Self {
            store,
            live,
            write_lock: Mutex::new(()),
        }
    }

    /// Live deployments if the server answers, stored records otherwise.
    ///
    /// Live records carry zero threads, context size and GPU layers, since the
    /// server does not report them.
    pub async fn list_deployments(&self) -> Result<Vec<DeploymentRecord>> {
        match self.live.list_running().await {
            Ok(running) => {
                let now = Utc::now();
                Ok(running
                    .into_iter()
                    .map(|model| DeploymentRecord {
                        id: model
                            .digest
                            .filter(|d| !d.is_empty())
                            .unwrap_or_else(|| model.name.clone()),
                        name: model.name,
                        status: DeploymentStatus::Running,
                        threads: 0,
                        context_size_tokens: 0,
                        gpu_layers: 0,
                        started_at: now,
                        vram_bytes: model.size_vram,
                    })
                    .collect())
            }
            Err(e) => {
                tracing::debug!("Live deployment query failed, using stored records: {}", e);
                self.stored_deployments()
            }
        }
    }

    /// The persisted record set, untouched by the live query.
    pub fn stored_deployments(&self) -> Result<Vec<DeploymentRecord>> {
        let Some(raw) = self.store.get(DEPLOYMENTS_KEY)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw)
            .map_err(|e| Error::Storage(format!("corrupt deployment records: {}", e)))
    }

    /// Record `name` as running with `config`.
    ///
    /// An existing record with the same name keeps its id; every other field is
    /// overwritten. The whole collection is written back in one store write.
    pub async fn upsert(&self, name: &str, config: &DeployConfig) -> Result<DeploymentRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.stored_deployments()?;

        let existing = records.iter().position(|r| r.name == name);
        let id = match existing {
            Some(index) => records[index].id.clone(),
            None => mint_id(&records),
        };

        let record = DeploymentRecord {
            id,
            name: name.to_string(),
            status: DeploymentStatus::Running,
            threads: config.threads,
            context_size_tokens: config.context_size_tokens,
            gpu_layers: config.gpu_layers,
            started_at: Utc::now(),
            vram_bytes: None,
        };

        match existing {
            Some(index) => records[index] = record.clone(),
            None => records.push(record.clone()),
        }

        self.persist(&records)?;
        tracing::info!("Deployment {} recorded as {}", record.name, record.id);
        Ok(record)
    }

    /// Set the status of every record named `name`.
    pub async fn set_status(&self, name: &str, status: DeploymentStatus) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.stored_deployments()?;

        let mut matched = 0;
        for record in records.iter_mut().filter(|r| r.name == name) {
            record.status = status;
            matched += 1;
        }
        if matched == 0 {
            tracing::debug!("No deployment named {} to mark {}", name, status);
        }

        self.persist(&records)
    }

    fn persist(&self, records: &[DeploymentRecord]) -> Result<()> {
        let json = serde_json::to_string(records)
            .map_err(|e| Error::Storage(format!("failed to serialize deployments: {}", e)))?;
        self.store.set(DEPLOYMENTS_KEY, &json)
    }
}

/// Time-derived id, bumped past any id already in use.
fn mint_id(records: &[DeploymentRecord]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while records.iter().any(|r| r.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}
