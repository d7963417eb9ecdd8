//! Mock implementations of core traits for testing.
//!
//! These are used across the workspace for unit and integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::{
    traits::{CaptureSink, ImageSource, LlmClient, ObjectStore},
    types::{CompletionRequest, CompletionResponse, FlyAnalysisResult, RecordId},
    Error, Result,
};

// =============================================================================
// Mock LLM Client
// =============================================================================

/// Scripted outcome of one mocked completion call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Success with this completion text.
    Content(String),
    /// Success with no completion text at all.
    Empty,
    /// Non-success status carrying this error message.
    Upstream(String),
    /// Non-success status with no error body.
    Status(u16),
    /// Transport failure before any response.
    Network(String),
}

/// Scripted mock LLM that records every request it receives.
pub struct MockLlm {
    replies: Mutex<Vec<MockReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    /// Create a mock with a queue of replies. The last reply repeats.
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same completion text.
    pub fn constant(content: impl Into<String>) -> Self {
        Self::new(vec![MockReply::Content(content.into())])
    }

    /// Create a mock that always fails upstream.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![MockReply::Upstream(message.into())])
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.remove(0)
            } else {
                replies.first().cloned().unwrap_or(MockReply::Empty)
            }
        };

        match reply {
            MockReply::Content(content) => {
                let raw = serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}]
                });
                Ok(CompletionResponse::ok(Some(content), raw.to_string()))
            }
            MockReply::Empty => Ok(CompletionResponse::ok(None, r#"{"choices":[]}"#)),
            MockReply::Upstream(message) => {
                let raw = serde_json::json!({"error": {"message": message}});
                Ok(CompletionResponse::failed(500, Some(message), raw.to_string()))
            }
            MockReply::Status(status) => Ok(CompletionResponse::failed(status, None, "")),
            MockReply::Network(message) => Err(Error::upstream(message)),
        }
    }
}

// =============================================================================
// Mock Image Source
// =============================================================================

/// Image source backed by a fixed map of references to bytes.
#[derive(Default)]
pub struct MockImageSource {
    images: HashMap<String, Bytes>,
}

impl MockImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under `reference`.
    pub fn with_image(mut self, reference: &str, data: impl Into<Bytes>) -> Self {
        self.images.insert(reference.to_string(), data.into());
        self
    }
}

#[async_trait]
impl ImageSource for MockImageSource {
    async fn read(&self, reference: &str) -> Result<Bytes> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::encoding(format!("cannot read {}", reference)))
    }
}

// =============================================================================
// Failing Object Store
// =============================================================================

/// Object store whose uploads always fail.
pub struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn upload(&self, key: &str, _data: Bytes, _content_type: &str) -> Result<()> {
        Err(Error::storage(format!("upload of {} refused", key)))
    }

    async fn download_url(&self, key: &str) -> Result<String> {
        Err(Error::storage(format!("no object at {}", key)))
    }
}

// =============================================================================
// Channel Sink
// =============================================================================

/// A persisted call observed by `ChannelSink`.
#[derive(Debug, Clone)]
pub struct SinkCall {
    pub result: FlyAnalysisResult,
    pub local_image_ref: String,
    pub user_id: Option<String>,
}

/// Capture sink that forwards every call to a channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkCall>,
    fail: bool,
}

impl ChannelSink {
    /// Create a sink and the receiver observing it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: false }, rx)
    }

    /// Create a sink that reports each call and then fails.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<SinkCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: true }, rx)
    }
}

#[async_trait]
impl CaptureSink for ChannelSink {
    async fn persist(
        &self,
        result: &FlyAnalysisResult,
        local_image_ref: &str,
        user_id: Option<&str>,
    ) -> Result<RecordId> {
        let _ = self.tx.send(SinkCall {
            result: result.clone(),
            local_image_ref: local_image_ref.to_string(),
            user_id: user_id.map(String::from),
        });
        if self.fail {
            return Err(Error::persistence("document write rejected"));
        }
        Ok(RecordId::generate())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Completion text for a well-formed analysis with the given confidence.
pub fn analysis_json(confidence: f64) -> String {
    serde_json::json!({
        "flyIdentification": {
            "commonName": "Baetis Olive",
            "imitatedInsect": {
                "order": "Ephemeroptera",
                "family": "Baetidae",
                "genus": "Baetis",
                "species": "Baetis rhodani"
            },
            "similarSpeciesDiscarded": ["Ephemerella ignita"],
            "confidence": confidence
        },
        "description": "Subimago de primavera en ríos del norte.",
        "mountingInstructions": [
            "Materiales: anzuelo seco del 16, pluma de gallo de León, seda olivácea",
            "Paso 1: Cercos con fibras de pardo",
            "Paso 2: Cuerpo de seda",
            "Paso 3: Alas y brinca"
        ]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatRole, RequestMessage};

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![RequestMessage::text(ChatRole::User, "hola")],
            max_completion_tokens: 10,
            response_format: None,
        }
    }

    #[tokio::test]
    async fn test_mock_llm_scripted_sequence() {
        let llm = MockLlm::new(vec![
            MockReply::Content("uno".into()),
            MockReply::Upstream("boom".into()),
        ]);

        let first = llm.complete(&request()).await.unwrap();
        assert_eq!(first.text(), Some("uno"));
        let second = llm.complete(&request()).await.unwrap();
        assert!(!second.is_success());
        assert_eq!(second.error_message.as_deref(), Some("boom"));
        // last reply repeats
        assert!(!llm.complete(&request()).await.unwrap().is_success());
        assert_eq!(llm.call_count(), 3);
    }

    #[test]
    fn test_fixture_is_valid() {
        let parsed = FlyAnalysisResult::from_completion(&analysis_json(0.85)).unwrap();
        assert_eq!(parsed.fly_identification.imitated_insect.family, "Baetidae");
    }
}
