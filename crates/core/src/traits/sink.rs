//! Capture sink trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FlyAnalysisResult, RecordId};

/// Destination for accepted analyses.
///
/// Called from a detached task; the analysis caller never sees the outcome.
#[async_trait]
pub trait CaptureSink: Send + Sync {
    /// Persist an analysis for `user_id`, returning the record id.
    async fn persist(
        &self,
        result: &FlyAnalysisResult,
        local_image_ref: &str,
        user_id: Option<&str>,
    ) -> Result<RecordId>;
}
