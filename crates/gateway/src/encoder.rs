//! Image encoder: local reference to base64 payload.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};

use flyid_core::{traits::ImageSource, types::EncodedImage, Error, Result};

/// Encodes images read through an [`ImageSource`].
pub struct ImageEncoder {
    source: Arc<dyn ImageSource>,
}

impl ImageEncoder {
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self { source }
    }

    /// Read `reference` and encode it with the standard padded alphabet.
    pub async fn encode(&self, reference: &str) -> Result<EncodedImage> {
        let data = self.source.read(reference).await?;
        if data.is_empty() {
            return Err(Error::encoding(format!("Image is empty: {}", reference)));
        }

        let encoded = STANDARD.encode(&data);
        tracing::debug!(reference = reference, size = data.len(), "Image encoded");

        Ok(EncodedImage::new(reference, encoded))
    }
}
