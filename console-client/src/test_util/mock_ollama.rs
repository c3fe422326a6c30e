use serde_json::{json, Value};

/// Canned inference-server response bodies.
pub struct MockOllamaResponse;

impl MockOllamaResponse {
    pub fn tags(names: &[&str]) -> Value {
        let models: Vec<Value> = names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "model": name,
                    "modified_at": "2024-05-01T10:00:00.123456789Z",
                    "size": 4_661_224_676u64,
                    "digest": format!("sha256:{}", name.replace([':', '.'], "")),
                    "details": {
                        "parent_model": "",
                        "format": "gguf",
                        "family": "llama",
                        "families": ["llama"],
                        "parameter_size": "8.0B",
                        "quantization_level": "Q4_0"
                    }
                })
            })
            .collect();
        json!({ "models": models })
    }

    pub fn running(models: &[(&str, u64)]) -> Value {
        let models: Vec<Value> = models
            .iter()
            .map(|(name, vram)| {
                json!({
                    "name": name,
                    "model": name,
                    "size": vram + 1_000_000,
                    "digest": format!("sha256:{}", name.replace([':', '.'], "")),
                    "expires_at": "2024-05-01T10:05:00Z",
                    "size_vram": vram
                })
            })
            .collect();
        json!({ "models": models })
    }

    pub fn show() -> Value {
        json!({
            "license": "LLAMA 3 COMMUNITY LICENSE AGREEMENT",
            "modelfile": "FROM /models/llama3\nTEMPLATE \"{{ .Prompt }}\"",
            "parameters": "stop \"<|eot_id|>\"",
            "template": "{{ .Prompt }}",
            "system": "You are a helpful assistant.",
            "details": {
                "format": "gguf",
                "family": "llama",
                "families": null,
                "parameter_size": "8.0B",
                "quantization_level": "Q4_0"
            }
        })
    }

    /// `/api/chat` reply in the nested message shape.
    pub fn chat(content: &str) -> Value {
        json!({
            "model": "llama3",
            "created_at": "2024-05-01T10:00:00Z",
            "message": { "role": "assistant", "content": content },
            "done": true
        })
    }

    pub fn generate(response: &str) -> Value {
        json!({
            "model": "llama3",
            "created_at": "2024-05-01T10:00:00Z",
            "response": response,
            "done": true
        })
    }

    pub fn error_json(message: &str) -> Value {
        json!({ "error": message })
    }
}

/// Newline-delimited JSON body, one line per value.
pub fn ndjson(lines: &[Value]) -> String {
    lines
        .iter()
        .map(|line| format!("{}\n", line))
        .collect()
}

/// A typical pull stream: manifest, two layers, verification, success.
pub fn pull_stream() -> String {
    ndjson(&[
        json!({"status": "pulling manifest"}),
        json!({"status": "pulling aaa", "digest": "sha256:aaa", "total": 200, "completed": 50}),
        json!({"status": "pulling aaa", "digest": "sha256:aaa", "total": 200, "completed": 200}),
        json!({"status": "pulling bbb", "digest": "sha256:bbb", "total": 10, "completed": 10}),
        json!({"status": "verifying sha256 digest"}),
        json!({"status": "writing manifest"}),
        json!({"status": "success"}),
    ])
}

pub fn create_stream() -> String {
    ndjson(&[
        json!({"status": "reading model metadata"}),
        json!({"status": "creating system layer"}),
        json!({"status": "writing manifest"}),
        json!({"status": "success"}),
    ])
}
