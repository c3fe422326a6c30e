//! Deployment records and the configuration used to create them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Running,
    Stopped,
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentStatus::Running => write!(f, "running"),
            DeploymentStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// A locally tracked model deployment.
///
/// Persisted as part of a JSON array, so the field names match the stored format.
/// `id` is assigned once and survives re-deploys of the same `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub id: String,
    pub name: String,
    pub status: DeploymentStatus,
    #[serde(default)]
    pub threads: u32,
    #[serde(rename = "contextSize", default)]
    pub context_size_tokens: u32,
    #[serde(default)]
    pub gpu_layers: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vram_bytes: Option<u64>,
}

impl DeploymentRecord {
    pub fn is_running(&self) -> bool {
        self.status == DeploymentStatus::Running
    }
}

/// User-chosen settings for a deployment. Only the resource fields survive into a
/// [`DeploymentRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub threads: u32,
    pub context_size_tokens: u32,
    pub gpu_layers: u32,
    /// Sampling temperature, 0.0..=2.0
    pub temperature: f64,
    #[serde(default)]
    pub system_prompt: String,
    pub parallel_executions: u32,
    #[serde(default)]
    pub selected_gpu_ids: BTreeSet<u32>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            context_size_tokens: 4096,
            gpu_layers: 0,
            temperature: 0.7,
            system_prompt: String::new(),
            parallel_executions: 1,
            selected_gpu_ids: BTreeSet::new(),
        }
    }
}

impl DeployConfig {
    /// Clamp temperature into the accepted range.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = if temperature.is_finite() {
            temperature.clamp(0.0, 2.0)
        } else {
            0.7
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_stored_format() {
        let record = DeploymentRecord {
            id: "1714557600000".to_string(),
            name: "llama3.2:3b".to_string(),
            status: DeploymentStatus::Running,
            threads: 4,
            context_size_tokens: 4096,
            gpu_layers: 0,
            started_at: DateTime::<Utc>::default(),
            vram_bytes: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "running");
        assert_eq!(value["contextSize"], 4096);
        assert_eq!(value["gpuLayers"], 0);
        assert!(value.get("vramBytes").is_none());
        assert!(value.get("startedAt").is_some());
    }

    #[test]
    fn test_record_reads_legacy_entry_without_resources() {
        let json = r#"{
            "id": "1",
            "name": "mistral",
            "status": "stopped",
            "startedAt": "2024-05-01T10:00:00.000Z"
        }"#;
        let record: DeploymentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, DeploymentStatus::Stopped);
        assert_eq!(record.threads, 0);
        assert!(!record.is_running());
    }

    #[test]
    fn test_temperature_is_clamped() {
        assert_eq!(DeployConfig::default().with_temperature(3.5).temperature, 2.0);
        assert_eq!(DeployConfig::default().with_temperature(-1.0).temperature, 0.0);
        assert_eq!(
            DeployConfig::default().with_temperature(f64::NAN).temperature,
            0.7
        );
    }
}
