//! Modelfile text for create-from-template.

use console_common::DeployConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelfileTemplate {
    pub base_model: String,
    pub system_prompt: Option<String>,
    pub temperature: f64,
    pub context_size_tokens: u32,
}

impl ModelfileTemplate {
    pub fn new(base_model: &str, config: &DeployConfig) -> Self {
        let prompt = config.system_prompt.trim();
        Self {
            base_model: base_model.to_string(),
            system_prompt: (!prompt.is_empty()).then(|| prompt.to_string()),
            temperature: config.temperature,
            context_size_tokens: config.context_size_tokens,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![format!("FROM {}", self.base_model)];
        if let Some(prompt) = &self.system_prompt {
            lines.push(format!("SYSTEM \"\"\"{}\"\"\"", prompt));
        }
        lines.push(format!("PARAMETER temperature {}", self.temperature));
        lines.push(format!("PARAMETER num_ctx {}", self.context_size_tokens));
        lines.join("\n")
    }
}

impl std::fmt::Display for ModelfileTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
