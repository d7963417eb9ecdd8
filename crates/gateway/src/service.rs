//! FlyID pipeline facade.

use std::sync::Arc;

use flyid_core::{
    types::{CatchRecord, ChatMessage, FlyAnalysisResult},
    Error, Result,
};
use flyid_model_gateway::{AnalysisClient, ChatClient};

use crate::encoder::ImageEncoder;
use crate::persistence::PersistenceGateway;

/// Default cap on history results.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Ties the encoder, the model clients and the persistence gateway together.
pub struct FlyIdService {
    encoder: ImageEncoder,
    analysis: AnalysisClient,
    chat: ChatClient,
    persistence: Arc<PersistenceGateway>,
    history_limit: usize,
}

impl FlyIdService {
    /// `analysis` is expected to already carry `persistence` as its sink.
    pub fn new(
        encoder: ImageEncoder,
        analysis: AnalysisClient,
        chat: ChatClient,
        persistence: Arc<PersistenceGateway>,
    ) -> Self {
        Self {
            encoder,
            analysis,
            chat,
            persistence,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Encode the image at `reference`, then analyze it.
    pub async fn analyze_reference(
        &self,
        reference: &str,
        user_id: Option<&str>,
    ) -> Result<FlyAnalysisResult> {
        let image = self.encoder.encode(reference).await?;
        self.analysis.analyze(&image, user_id).await
    }

    /// Next assistant reply for a caller-owned transcript.
    pub async fn chat(&self, history: &[ChatMessage]) -> Result<String> {
        self.chat.chat(history).await
    }

    /// Newest-first history of `user_id`. `limit` is capped at the
    /// configured history limit.
    pub async fn history(&self, user_id: Option<&str>, limit: Option<usize>) -> Result<Vec<CatchRecord>> {
        let user_id = user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::unauthorized("Missing user identity"))?;
        let limit = limit.unwrap_or(self.history_limit).min(self.history_limit);
        self.persistence.history(user_id, limit).await
    }
}
