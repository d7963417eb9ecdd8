use serde::{Deserialize, Serialize};

use super::chat::{ChatMessage, ChatRole};

// =============================================================================
// Completion Request (provider-neutral, OpenAI-compatible shape)
// =============================================================================

/// A single completion request, minus the model name which the backend owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Ordered messages. A system instruction, when present, is first.
    pub messages: Vec<RequestMessage>,
    /// Output length ceiling.
    pub max_completion_tokens: u32,
    /// Structured-output directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// One message of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestMessage {
    pub role: ChatRole,
    pub content: MessageContent,
}

/// Message body: plain text or multi-part (text + image).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image reference inside a content part. Usually a `data:` URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Output format directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// The completion must be a single JSON object.
    JsonObject,
}

impl RequestMessage {
    /// Plain text message.
    pub fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Text content of a plain message, `None` for multi-part ones.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }
}

impl From<&ChatMessage> for RequestMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self::text(msg.role, msg.content.clone())
    }
}

// =============================================================================
// Completion Response
// =============================================================================

/// What came back from the completion endpoint.
///
/// Non-success statuses are returned as values so each caller can choose
/// its own fallback message when the body carries none.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CompletionResponse {
    /// HTTP status code.
    pub status: u16,
    /// Text of the first choice, if any.
    pub content: Option<String>,
    /// `error.message` from an error body, if any.
    pub error_message: Option<String>,
    /// Raw response body, kept for diagnostics.
    pub raw: String,
}

impl CompletionResponse {
    /// Successful response with the given completion text.
    pub fn ok(content: Option<String>, raw: impl Into<String>) -> Self {
        Self {
            status: 200,
            content,
            error_message: None,
            raw: raw.into(),
        }
    }

    /// Failed response.
    pub fn failed(status: u16, error_message: Option<String>, raw: impl Into<String>) -> Self {
        Self {
            status,
            content: None,
            error_message,
            raw: raw.into(),
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Non-empty completion text.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}
