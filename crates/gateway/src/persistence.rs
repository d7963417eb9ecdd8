//! Persistence gateway: image upload plus catch record write.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use flyid_core::{
    traits::{CaptureSink, ImageSource, ObjectStore, RecordStore},
    types::{file_name, CatchRecord, FlyAnalysisResult, NewCatchRecord, RecordId},
    Error, Result,
};

/// Key prefix for uploaded captures.
pub const DEFAULT_CAPTURE_PREFIX: &str = "fly_captures";

/// Content type assumed when the bytes are not a recognized image.
const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

/// Stores accepted analyses: uploads the image, then writes the record.
pub struct PersistenceGateway {
    source: Arc<dyn ImageSource>,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    prefix: String,
}

impl PersistenceGateway {
    pub fn new(
        source: Arc<dyn ImageSource>,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            source,
            objects,
            records,
            prefix: DEFAULT_CAPTURE_PREFIX.to_string(),
        }
    }

    /// Set the object key prefix. An empty prefix stores keys at the root.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Object key for a capture uploaded now.
    pub fn object_key(&self, local_image_ref: &str) -> String {
        let name = format!("{}_{}", Utc::now().timestamp_millis(), file_name(local_image_ref));
        if self.prefix.is_empty() {
            name
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    /// Upload the image and resolve its download URL.
    async fn upload_image(&self, local_image_ref: &str) -> Result<String> {
        let data = self.source.read(local_image_ref).await?;
        let key = self.object_key(local_image_ref);
        let content_type = content_type_of(&data);

        self.objects.upload(&key, data, content_type).await?;
        self.objects.download_url(&key).await
    }

    /// Records of `user_id`, newest first, at most `limit`.
    pub async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<CatchRecord>> {
        self.records.list_by_user(user_id, limit).await
    }
}

fn content_type_of(data: &Bytes) -> &'static str {
    image::guess_format(data)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[async_trait]
impl CaptureSink for PersistenceGateway {
    async fn persist(
        &self,
        result: &FlyAnalysisResult,
        local_image_ref: &str,
        user_id: Option<&str>,
    ) -> Result<RecordId> {
        let user_id = user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::persistence("No authenticated user"))?;

        // A failed upload still produces a record, just without a remote image.
        let image_url = match self.upload_image(local_image_ref).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    reference = local_image_ref,
                    error = %e,
                    "Image upload failed, storing record without image URL"
                );
                String::new()
            }
        };

        let record = NewCatchRecord::new(result.clone(), image_url, local_image_ref, user_id);
        let id = self
            .records
            .insert(record)
            .await
            .map_err(|e| Error::persistence(e.to_string()))?;

        tracing::info!(record_id = %id, user_id = user_id, "Catch record saved");
        Ok(id)
    }
}
