//! Fly analysis client.
//!
//! Sends one vision request, interprets the response, and hands accepted
//! results to a capture sink on a detached task.

use std::sync::Arc;

use flyid_core::{
    traits::{CaptureSink, LlmClient},
    types::{EncodedImage, FlyAnalysisResult},
    Error, Result,
};

use crate::prompts::ANALYSIS_UPSTREAM_FALLBACK;
use crate::request::AnalysisRequestBuilder;

/// Results with confidence strictly above this are persisted.
pub const DEFAULT_PERSIST_THRESHOLD: f64 = 0.4;

/// Identifies flies through a vision-capable completion endpoint.
pub struct AnalysisClient {
    llm: Arc<dyn LlmClient>,
    builder: AnalysisRequestBuilder,
    sink: Option<Arc<dyn CaptureSink>>,
    persist_threshold: f64,
}

impl AnalysisClient {
    /// Create a client without persistence.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            builder: AnalysisRequestBuilder::default(),
            sink: None,
            persist_threshold: DEFAULT_PERSIST_THRESHOLD,
        }
    }

    /// Replace the request builder.
    pub fn with_builder(mut self, builder: AnalysisRequestBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Persist accepted results to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn CaptureSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the persistence threshold.
    pub fn with_persist_threshold(mut self, threshold: f64) -> Self {
        self.persist_threshold = threshold;
        self
    }

    /// Analyze an encoded image.
    ///
    /// Exactly one upstream attempt. On success with confidence above the
    /// threshold a persistence task is spawned and not awaited; its outcome
    /// never reaches the caller.
    pub async fn analyze(
        &self,
        image: &EncodedImage,
        user_id: Option<&str>,
    ) -> Result<FlyAnalysisResult> {
        let request = self.builder.build(image);

        tracing::info!(
            source = %image.source,
            payload_len = image.base64.len(),
            "Analyzing fly image"
        );

        let response = self.llm.complete(&request).await?;

        if !response.is_success() {
            let message = response
                .error_message
                .unwrap_or_else(|| ANALYSIS_UPSTREAM_FALLBACK.to_string());
            tracing::error!(status = response.status, error = %message, "Analysis request failed");
            return Err(Error::upstream(message));
        }

        let content = response
            .text()
            .ok_or_else(|| Error::empty_response(response.raw.clone()))?;

        let result = FlyAnalysisResult::from_completion(content)?;

        tracing::info!(
            common_name = %result.fly_identification.common_name,
            confidence = result.confidence(),
            "Analysis complete"
        );

        if result.should_persist(self.persist_threshold) {
            self.spawn_persist(&result, image, user_id);
        } else {
            tracing::debug!(
                confidence = result.confidence(),
                threshold = self.persist_threshold,
                "Confidence below threshold, not persisting"
            );
        }

        Ok(result)
    }

    fn spawn_persist(&self, result: &FlyAnalysisResult, image: &EncodedImage, user_id: Option<&str>) {
        let Some(sink) = self.sink.clone() else { return };
        let result = result.clone();
        let source = image.source.clone();
        let user_id = user_id.map(String::from);

        tokio::spawn(async move {
            match sink.persist(&result, &source, user_id.as_deref()).await {
                Ok(id) => tracing::info!(record_id = %id, "Capture saved to history"),
                Err(e) => tracing::error!(error = %e, source = %source, "Failed to save capture to history"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flyid_core::mocks::{analysis_json, ChannelSink, MockLlm, MockReply};
    use std::time::Duration;

    fn image() -> EncodedImage {
        EncodedImage::new("file:///captures/olive.jpg", "/9j/4AAQ")
    }

    #[tokio::test]
    async fn test_analyze_returns_parsed_result() {
        let llm = Arc::new(MockLlm::constant(analysis_json(0.85)));
        let client = AnalysisClient::new(llm.clone());

        let result = client.analyze(&image(), None).await.unwrap();
        assert_eq!(result.fly_identification.imitated_insect.genus, "Baetis");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_upstream_message_passed_through() {
        let llm = Arc::new(MockLlm::failing("You exceeded your current quota"));
        let client = AnalysisClient::new(llm);

        let err = client.analyze(&image(), None).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref m) if m == "You exceeded your current quota"));
    }

    #[tokio::test]
    async fn test_upstream_without_message_uses_fallback() {
        let llm = Arc::new(MockLlm::new(vec![MockReply::Status(503)]));
        let client = AnalysisClient::new(llm);

        let err = client.analyze(&image(), None).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref m) if m == ANALYSIS_UPSTREAM_FALLBACK));
    }

    #[tokio::test]
    async fn test_empty_completion_keeps_raw_body() {
        let llm = Arc::new(MockLlm::new(vec![MockReply::Empty]));
        let client = AnalysisClient::new(llm);

        let err = client.analyze(&image(), None).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(ref raw) if raw.contains("choices")));
    }

    #[tokio::test]
    async fn test_malformed_completion() {
        let llm = Arc::new(MockLlm::constant("{\"flyIdentification\": "));
        let client = AnalysisClient::new(llm);

        let err = client.analyze(&image(), None).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResult(_)));
    }

    #[tokio::test]
    async fn test_persists_above_threshold() {
        let llm = Arc::new(MockLlm::constant(analysis_json(0.40000001)));
        let (sink, mut rx) = ChannelSink::new();
        let client = AnalysisClient::new(llm).with_sink(Arc::new(sink));

        client.analyze(&image(), Some("angler-7")).await.unwrap();

        let call = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.local_image_ref, "file:///captures/olive.jpg");
        assert_eq!(call.user_id.as_deref(), Some("angler-7"));
    }

    #[tokio::test]
    async fn test_does_not_persist_at_threshold() {
        let llm = Arc::new(MockLlm::constant(analysis_json(0.4)));
        let (sink, mut rx) = ChannelSink::new();
        let client = AnalysisClient::new(llm).with_sink(Arc::new(sink));

        client.analyze(&image(), Some("angler-7")).await.unwrap();
        drop(client);

        // The sink's sender is dropped with the client, so a closed channel
        // with no message means nothing was spawned.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_fail_analysis() {
        let llm = Arc::new(MockLlm::constant(analysis_json(0.9)));
        let (sink, mut rx) = ChannelSink::failing();
        let client = AnalysisClient::new(llm).with_sink(Arc::new(sink));

        let result = client.analyze(&image(), Some("angler-7")).await;
        assert!(result.is_ok());
        assert!(rx.recv().await.is_some());
    }
}
