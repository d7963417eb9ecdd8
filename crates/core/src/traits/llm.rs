//! Completion backend traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CompletionRequest, CompletionResponse};

/// Transport to a chat-completion endpoint.
///
/// Implementations perform exactly one attempt per call. A non-success status
/// is returned as a `CompletionResponse` carrying the status and any error
/// message; only transport failures are `Err`. Callers decide how to report
/// failures and interpret the content.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one completion request.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}
