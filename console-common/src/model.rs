//! Model listing and detail types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format and family metadata attached to a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub families: Vec<String>,
    /// Parameter count as reported by the server (e.g. "7B")
    #[serde(default)]
    pub parameter_size: String,
    /// Quantization type (e.g. "Q4_K_M")
    #[serde(default)]
    pub quantization_level: String,
}

/// A model available on the inference server.
///
/// `name` is unique within one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub modified_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub digest: String,
    pub details: ModelDetails,
}

/// Full description of a single model, fetched on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDetail {
    pub license: String,
    pub modelfile_text: String,
    pub parameters_text: String,
    pub template_text: String,
    pub system_prompt_text: String,
    #[serde(default)]
    pub details: ModelDetails,
}

impl ModelSummary {
    /// Human-readable size, e.g. "3.8 GB".
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
        let mut value = self.size_bytes as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", self.size_bytes, UNITS[0])
        } else {
            format!("{:.1} {}", value, UNITS[unit])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(size_bytes: u64) -> ModelSummary {
        ModelSummary {
            name: "llama3.2:3b".to_string(),
            modified_at: DateTime::<Utc>::default(),
            size_bytes,
            digest: "abc".to_string(),
            details: ModelDetails::default(),
        }
    }

    #[test]
    fn test_display_size() {
        assert_eq!(summary(512).display_size(), "512 B");
        assert_eq!(summary(2048).display_size(), "2.0 KB");
        assert_eq!(summary(4_080_218_931).display_size(), "3.8 GB");
    }

    #[test]
    fn test_details_defaults_when_fields_missing() {
        let details: ModelDetails = serde_json::from_str(r#"{"family":"llama"}"#).unwrap();
        assert_eq!(details.family, "llama");
        assert!(details.families.is_empty());
        assert!(details.quantization_level.is_empty());
    }
}
