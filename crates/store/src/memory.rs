//! In-memory object and record stores using DashMap.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use flyid_core::{
    traits::{ObjectStore, RecordStore},
    types::{CatchRecord, NewCatchRecord, RecordId},
    Error, Result,
};

/// Stored object with metadata.
#[derive(Debug, Clone)]
struct StoredObject {
    /// The actual data.
    data: Bytes,
    /// Content type.
    content_type: String,
}

/// In-memory object store for development and tests.
///
/// Download URLs use the `memory://` scheme and are only meaningful to
/// this process.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<String, StoredObject>,
}

impl InMemoryObjectStore {
    /// Create a new in-memory object store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Stored keys, unordered.
    pub fn keys(&self) -> Vec<String> {
        self.objects.iter().map(|r| r.key().clone()).collect()
    }

    /// Read back an object and its content type.
    pub fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects
            .get(key)
            .map(|r| (r.data.clone(), r.content_type.clone()))
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        tracing::trace!(
            key = key,
            size = data.len(),
            content_type = content_type,
            "Storing object in memory"
        );
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn download_url(&self, key: &str) -> Result<String> {
        if self.objects.contains_key(key) {
            Ok(format!("memory://{}", key))
        } else {
            Err(Error::storage(format!("Object not found: {}", key)))
        }
    }
}

/// In-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: DashMap<String, (u64, CatchRecord)>,
    seq: AtomicU64,
}

impl InMemoryRecordStore {
    /// Create a new in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, newest first.
    pub fn all(&self) -> Vec<CatchRecord> {
        let mut entries: Vec<(u64, CatchRecord)> =
            self.records.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| {
            b.1.created_at
                .cmp(&a.1.created_at)
                .then_with(|| b.0.cmp(&a.0))
        });
        entries.into_iter().map(|(_, record)| record).collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: NewCatchRecord) -> Result<RecordId> {
        let id = RecordId::generate();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let record = record.into_record(id.clone(), Utc::now());
        self.records.insert(id.0.clone(), (seq, record));
        tracing::debug!(record_id = %id, "Record stored in memory");
        Ok(id)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<CatchRecord>> {
        Ok(self.records.get(id.as_str()).map(|r| r.value().1.clone()))
    }

    async fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<CatchRecord>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|r| r.user_id() == user_id)
            .take(limit)
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}
