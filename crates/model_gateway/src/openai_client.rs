//! OpenAI-compatible chat-completions client.
//!
//! Implements `LlmClient` over plain HTTP so that the request body matches
//! the vision endpoint exactly (multi-part content, `response_format`).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use flyid_core::{
    config::ModelConfig,
    traits::LlmClient,
    types::{CompletionRequest, CompletionResponse},
    Error, Result,
};

/// Configuration for the OpenAI client.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Bearer token.
    pub api_key: Option<Secret<String>>,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

impl OpenAiConfig {
    /// Config for `model` against the public endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key.into()));
        self
    }

    /// Set a request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build from the application's model section.
    pub fn from_model_config(cfg: &ModelConfig) -> Self {
        Self {
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key: cfg.resolve_api_key(),
            timeout: cfg.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Serialize)]
struct CompletionsRequestBody<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a CompletionRequest,
}

// https://platform.openai.com/docs/api-reference/chat/object
#[derive(Deserialize, Debug)]
struct CompletionsResponseBody {
    #[serde(default)]
    choices: Vec<CompletionsChoice>,
}

#[derive(Deserialize, Debug)]
struct CompletionsChoice {
    message: Option<CompletionsChoiceMessage>,
}

#[derive(Deserialize, Debug)]
struct CompletionsChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorResponseBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug)]
struct ErrorDetail {
    message: Option<String>,
}

/// HTTP client for `POST {base_url}/chat/completions`.
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a client. Fails if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn parse_success(raw: String) -> CompletionResponse {
        let content = serde_json::from_str::<CompletionsResponseBody>(&raw)
            .ok()
            .and_then(|body| body.choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);
        CompletionResponse::ok(content, raw)
    }

    fn parse_failure(status: u16, raw: String) -> CompletionResponse {
        let message = serde_json::from_str::<ErrorResponseBody>(&raw)
            .ok()
            .and_then(|body| body.error)
            .and_then(|detail| detail.message)
            .filter(|m| !m.is_empty());
        CompletionResponse::failed(status, message, raw)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let body = CompletionsRequestBody {
            model: &self.config.model,
            request,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            max_completion_tokens = request.max_completion_tokens,
            "Sending completion request"
        );

        let mut http = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(ref key) = self.config.api_key {
            http = http.bearer_auth(key.expose_secret());
        }

        let response = http
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Network request failed: {}", e)))?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::upstream(format!("Failed to read response body: {}", e)))?;

        if status.is_success() {
            Ok(Self::parse_success(raw))
        } else {
            tracing::warn!(status = status.as_u16(), body = %raw, "Completion endpoint returned an error");
            Ok(Self::parse_failure(status.as_u16(), raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::new("gpt-4o-mini")
            .with_base_url("http://localhost:9999/v1/")
            .with_api_key("sk-test")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_parse_success_first_choice() {
        let raw = r#"{"choices":[{"message":{"content":"uno"}},{"message":{"content":"dos"}}]}"#;
        let resp = OpenAiClient::parse_success(raw.to_string());
        assert_eq!(resp.text(), Some("uno"));
        assert_eq!(resp.raw, raw);
    }

    #[test]
    fn test_parse_success_without_choices() {
        let resp = OpenAiClient::parse_success("{}".to_string());
        assert!(resp.is_success());
        assert_eq!(resp.content, None);
    }

    #[test]
    fn test_parse_failure_message() {
        let raw = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        let resp = OpenAiClient::parse_failure(429, raw.to_string());
        assert_eq!(resp.error_message.as_deref(), Some("Rate limit reached"));

        let resp = OpenAiClient::parse_failure(502, "<html>bad gateway</html>".to_string());
        assert_eq!(resp.error_message, None);
    }
}
