//! Inference server wire types and their conversion into console types.

use chrono::{DateTime, Utc};
use console_common::{ChatMessage, ModelDetail, ModelDetails, ModelSummary};
use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub(super) struct NameRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PullRequest<'a> {
    pub name: &'a str,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateRequest<'a> {
    pub name: &'a str,
    pub modelfile: &'a str,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
}

// ============================================================================
// Responses
// ============================================================================

/// Response from /api/tags and /api/ps.
#[derive(Debug, Deserialize)]
pub(super) struct ModelsResponse<T> {
    #[serde(default = "Vec::new")]
    pub models: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TagsModel {
    pub name: String,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: Option<WireDetails>,
}

/// `families` is `null` for some models, so every field is optional here.
#[derive(Debug, Default, Deserialize)]
pub(super) struct WireDetails {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub families: Option<Vec<String>>,
    #[serde(default)]
    pub parameter_size: Option<String>,
    #[serde(default)]
    pub quantization_level: Option<String>,
}

impl From<WireDetails> for ModelDetails {
    fn from(d: WireDetails) -> Self {
        Self {
            format: d.format.unwrap_or_default(),
            family: d.family.unwrap_or_default(),
            families: d.families.unwrap_or_default(),
            parameter_size: d.parameter_size.unwrap_or_default(),
            quantization_level: d.quantization_level.unwrap_or_default(),
        }
    }
}

impl From<TagsModel> for ModelSummary {
    fn from(m: TagsModel) -> Self {
        let modified_at = m
            .modified_at
            .as_deref()
            .and_then(|s| match DateTime::parse_from_rfc3339(s) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    tracing::warn!("Unparseable modified_at '{}' for {}: {}", s, m.name, e);
                    None
                }
            })
            .unwrap_or_default();

        Self {
            name: m.name,
            modified_at,
            size_bytes: m.size,
            digest: m.digest,
            details: m.details.unwrap_or_default().into(),
        }
    }
}

/// Entry of /api/ps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunningModel {
    pub name: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub size_vram: Option<u64>,
}

/// Response from /api/show.
#[derive(Debug, Deserialize)]
pub(super) struct ShowResponse {
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub modelfile: Option<String>,
    #[serde(default)]
    pub parameters: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub details: Option<WireDetails>,
}

impl From<ShowResponse> for ModelDetail {
    fn from(r: ShowResponse) -> Self {
        Self {
            license: r.license.unwrap_or_default(),
            modelfile_text: r.modelfile.unwrap_or_default(),
            parameters_text: r.parameters.unwrap_or_default(),
            template_text: r.template.unwrap_or_default(),
            system_prompt_text: r.system.unwrap_or_default(),
            details: r.details.unwrap_or_default().into(),
        }
    }
}

/// Response from /api/generate (non-streaming).
#[derive(Debug, Deserialize)]
pub(super) struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_model_with_null_families() {
        let json = r#"{
            "name": "llama3.2:3b",
            "modified_at": "2024-05-01T10:00:00.123456789-07:00",
            "size": 2019393189,
            "digest": "a80c4f17acd5",
            "details": {
                "format": "gguf",
                "family": "llama",
                "families": null,
                "parameter_size": "3.2B",
                "quantization_level": "Q4_K_M"
            }
        }"#;
        let model: TagsModel = serde_json::from_str(json).unwrap();
        let summary = ModelSummary::from(model);

        assert_eq!(summary.name, "llama3.2:3b");
        assert_eq!(summary.size_bytes, 2019393189);
        assert!(summary.details.families.is_empty());
        assert_eq!(summary.details.quantization_level, "Q4_K_M");
        assert_eq!(summary.modified_at.to_rfc3339(), "2024-05-01T17:00:00.123456789+00:00");
    }

    #[test]
    fn test_tags_model_bad_timestamp_defaults() {
        let model: TagsModel =
            serde_json::from_str(r#"{"name": "x", "modified_at": "yesterday"}"#).unwrap();
        let summary = ModelSummary::from(model);
        assert_eq!(summary.modified_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_show_response_renames_fields() {
        let json = r#"{
            "license": "MIT",
            "modelfile": "FROM llama3",
            "parameters": "num_ctx 4096",
            "template": "{{ .Prompt }}",
            "system": "You are helpful."
        }"#;
        let detail = ModelDetail::from(serde_json::from_str::<ShowResponse>(json).unwrap());

        assert_eq!(detail.license, "MIT");
        assert_eq!(detail.modelfile_text, "FROM llama3");
        assert_eq!(detail.parameters_text, "num_ctx 4096");
        assert_eq!(detail.template_text, "{{ .Prompt }}");
        assert_eq!(detail.system_prompt_text, "You are helpful.");
    }

    #[test]
    fn test_models_response_missing_list() {
        let response: ModelsResponse<TagsModel> = serde_json::from_str("{}").unwrap();
        assert!(response.models.is_empty());
    }
}
