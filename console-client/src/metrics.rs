//! Client for the metrics server's `/api/health` and `/api/system-info`.

use console_common::SystemSnapshot;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Result;
use crate::gateway::{check, normalize_base_url};

pub const DEFAULT_METRICS_URL: &str = "http://localhost:3001";

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Clone)]
pub struct MetricsClient {
    http_client: Client,
    base_url: String,
}

impl MetricsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True when the server answers `{"status":"ok"}`.
    pub async fn health(&self) -> Result<bool> {
        let response = self
            .http_client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?;

        let health: HealthResponse = check(response)
            .await?
            .json()
            .await?;

        Ok(health.status == "ok")
    }

    pub async fn system_info(&self) -> Result<SystemSnapshot> {
        let response = self
            .http_client
            .get(format!("{}/api/system-info", self.base_url))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Current snapshot, or [`SystemSnapshot::offline`] if the server cannot provide one.
    pub async fn snapshot_or_offline(&self) -> SystemSnapshot {
        match self.system_info().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Metrics server at {} unavailable: {}", self.base_url, e);
                SystemSnapshot::offline()
            }
        }
    }
}
