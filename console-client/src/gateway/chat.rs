//! Chat response normalization.
//!
//! The chat endpoint's body is matched against a fixed priority of shapes:
//! a nested `message.content`, a flat `response`, a bare string, and finally
//! the whole body serialized back to text.

use serde_json::Value;

/// Shown when the chat body is empty or `null`.
pub const UNEXPECTED_RESPONSE: &str =
    "Received an unexpected response format from the inference server.";

/// Which shape the reply text was recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// `{"message": {"content": "..."}}`
    Message(String),
    /// `{"response": "..."}`
    Response(String),
    /// A body that is itself the text, JSON-quoted or not.
    Text(String),
    /// Anything else, serialized as-is.
    Raw(String),
    /// Empty or `null` body.
    Empty,
}

impl ChatReply {
    /// Classify a raw response body.
    pub fn decode(body: &str) -> Self {
        if body.trim().is_empty() {
            return ChatReply::Empty;
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => ChatReply::Text(body.to_string()),
        }
    }

    pub fn from_value(value: Value) -> Self {
        if let Some(content) = non_empty_str(value.pointer("/message/content")) {
            return ChatReply::Message(content);
        }
        if let Some(response) = non_empty_str(value.get("response")) {
            return ChatReply::Response(response);
        }

        match value {
            Value::Null => ChatReply::Empty,
            Value::String(text) => ChatReply::Text(text),
            other => ChatReply::Raw(other.to_string()),
        }
    }

    /// The text to show the user.
    pub fn into_text(self) -> String {
        match self {
            ChatReply::Message(text)
            | ChatReply::Response(text)
            | ChatReply::Text(text)
            | ChatReply::Raw(text) => text,
            ChatReply::Empty => UNEXPECTED_RESPONSE.to_string(),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
