//! Image source trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Reads the bytes behind a local image reference.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Read the whole image.
    async fn read(&self, reference: &str) -> Result<Bytes>;
}
