//! Inference server gateway client.
//!
//! Translates console intents into inference-server HTTP calls and normalizes
//! the responses into the shared console types. No call is retried here.

mod chat;
mod reveal;
mod stream;
mod types;

pub use chat::{ChatReply, UNEXPECTED_RESPONSE};
pub use reveal::TypingReveal;
pub use stream::{LineBuffer, ProgressLine, ProgressTracker, StreamParseError};
pub use types::RunningModel;

use console_common::{last_user_content, ChatMessage, ModelDetail, ModelSummary};
use reqwest::{Client, Response};

use crate::error::{Error, Result};
use types::{
    ChatRequest, CreateRequest, GenerateRequest, GenerateResponse, ModelsResponse, NameRequest,
    PullRequest, ShowResponse, TagsModel,
};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:11434";

/// Returned by `generate` when the server answers without a `response` field.
pub const NO_RESPONSE: &str = "No response received from the generate endpoint.";

/// Returned by `chat` when both the chat endpoint and the generate fallback fail.
pub const CHAT_APOLOGY: &str = "Sorry, there was an error connecting to the inference server. \
                                Please check that it is running correctly.";

/// Client for one inference server.
///
/// The base URL is fixed for the lifetime of a client; use
/// [`GatewayClient::with_base_url`] to point at another server.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http_client: Client,
    base_url: String,
    typing: TypingReveal,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: normalize_base_url(base_url),
            typing: TypingReveal::default(),
        }
    }

    /// A client for another server, sharing this client's connection pool.
    pub fn with_base_url(&self, base_url: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: normalize_base_url(base_url),
            typing: self.typing,
        }
    }

    /// Set the pacing used when revealing chat replies.
    pub fn with_typing(mut self, typing: TypingReveal) -> Self {
        self.typing = typing;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// GET /api/tags - Models stored on the server. An empty list is valid.
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        let response = self
            .http_client
            .get(self.url("tags"))
            .send()
            .await?;

        let tags: ModelsResponse<TagsModel> = check(response)
            .await?
            .json()
            .await?;

        Ok(tags.models.into_iter().map(ModelSummary::from).collect())
    }

    /// GET /api/ps - Models currently loaded in memory.
    pub async fn list_running(&self) -> Result<Vec<RunningModel>> {
        let response = self
            .http_client
            .get(self.url("ps"))
            .send()
            .await?;

        let running: ModelsResponse<RunningModel> = check(response)
            .await?
            .json()
            .await?;

        Ok(running.models)
    }

    /// POST /api/pull - Download a model, reporting progress in percent.
    ///
    /// Progress values never decrease and end with 100 when the server reports
    /// success. A failure mid-stream leaves whatever the server already stored.
    pub async fn pull_model<F>(&self, name: &str, mut on_progress: F) -> Result<()>
    where
        F: FnMut(u8),
    {
        tracing::info!("Pulling model {}", name);

        let response = self
            .http_client
            .post(self.url("pull"))
            .json(&PullRequest { name, stream: true })
            .send()
            .await?;

        let response = check(response).await?;
        let mut tracker = ProgressTracker::default();

        stream::read_progress(response.bytes_stream(), |line| {
            if let Some(percent) = tracker.observe(&line) {
                on_progress(percent);
            }
        })
        .await?;

        tracing::info!("Pull of {} finished", name);
        Ok(())
    }

    /// DELETE /api/delete
    pub async fn delete_model(&self, name: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.url("delete"))
            .json(&NameRequest { name })
            .send()
            .await?;

        check(response).await?;
        tracing::info!("Deleted model {}", name);
        Ok(())
    }

    /// POST /api/show - License, Modelfile, parameters, template and system prompt.
    pub async fn show_model_info(&self, name: &str) -> Result<ModelDetail> {
        let response = self
            .http_client
            .post(self.url("show"))
            .json(&NameRequest { name })
            .send()
            .await?;

        let show: ShowResponse = check(response)
            .await?
            .json()
            .await?;

        Ok(show.into())
    }

    /// POST /api/create - Build a model from a Modelfile template.
    ///
    /// Every `status` the server streams back is forwarded verbatim.
    pub async fn create_model<F>(&self, name: &str, template: &str, mut on_status: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        tracing::info!("Creating model {}", name);

        let response = self
            .http_client
            .post(self.url("create"))
            .json(&CreateRequest {
                name,
                modelfile: template,
                stream: true,
            })
            .send()
            .await?;

        let response = check(response).await?;

        stream::read_progress(response.bytes_stream(), |line| {
            if let Some(status) = line.status.as_deref() {
                on_status(status);
            }
        })
        .await
    }

    /// POST /api/generate (non-streaming).
    ///
    /// A reply without a `response` field yields [`NO_RESPONSE`] rather than an error.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let response = self
            .http_client
            .post(self.url("generate"))
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let generated: GenerateResponse = check(response)
            .await?
            .json()
            .await?;

        Ok(generated
            .response
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| NO_RESPONSE.to_string()))
    }

    /// Chat with a model. Never fails.
    ///
    /// The chat endpoint is called once, non-streaming. With `on_update`, the
    /// reply is then revealed one character at a time. If the chat call fails,
    /// the latest user message is sent to `generate` instead, and if that fails
    /// too the reply is [`CHAT_APOLOGY`].
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        on_update: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> ChatMessage {
        let content = match self.chat_once(model, messages).await {
            Ok(reply) => {
                let text = reply.into_text();
                if let Some(on_update) = on_update {
                    self.typing.reveal(&text, on_update).await;
                }
                text
            }
            Err(e) => {
                tracing::warn!("Chat request to {} failed, trying generate: {}", model, e);

                let text = match self.generate(model, last_user_content(messages)).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Generate fallback for {} failed: {}", model, e);
                        CHAT_APOLOGY.to_string()
                    }
                };
                if let Some(on_update) = on_update {
                    on_update(&text);
                }
                text
            }
        };

        ChatMessage::assistant(content)
    }

    async fn chat_once(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatReply> {
        tracing::debug!("Sending chat request: model={} messages={}", model, messages.len());

        let response = self
            .http_client
            .post(self.url("chat"))
            .json(&ChatRequest {
                model,
                messages,
                stream: false,
            })
            .send()
            .await?;

        let body = check(response)
            .await?
            .text()
            .await?;

        Ok(ChatReply::decode(&body))
    }
}

/// Accepts both `http://host:port` and `http://host:port/api`.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    trimmed.strip_suffix("/api").unwrap_or(trimmed).to_string()
}

/// Turn a non-success status into `Error::Gateway`, keeping the body as the message.
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(Error::Gateway {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(
            GatewayClient::new("http://localhost:11434/").base_url(),
            "http://localhost:11434"
        );
        assert_eq!(
            GatewayClient::new("http://gpu-box:11434/api/").base_url(),
            "http://gpu-box:11434"
        );
    }

    #[test]
    fn test_with_base_url_returns_reconfigured_client() {
        let first = GatewayClient::new(DEFAULT_SERVER_URL);
        let moved = first.with_base_url("http://10.0.0.5:11434");

        assert_eq!(first.base_url(), DEFAULT_SERVER_URL);
        assert_eq!(moved.base_url(), "http://10.0.0.5:11434");
        assert_eq!(moved.url("tags"), "http://10.0.0.5:11434/api/tags");
    }
}
