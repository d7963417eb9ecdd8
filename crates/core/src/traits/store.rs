//! Storage traits: object storage for images, document store for records.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::{CatchRecord, NewCatchRecord, RecordId};

/// Write-only blob storage with resolvable download URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `key`.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Resolve a URL from which the object can be downloaded.
    async fn download_url(&self, key: &str) -> Result<String>;
}

/// Per-user document store of catch records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record; the store assigns the id and creation timestamp.
    async fn insert(&self, record: NewCatchRecord) -> Result<RecordId>;

    /// Fetch a record by id.
    async fn get(&self, id: &RecordId) -> Result<Option<CatchRecord>>;

    /// Records owned by `user_id`, newest first, at most `limit`.
    async fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<CatchRecord>>;

    /// Total number of records.
    async fn count(&self) -> Result<usize>;
}
