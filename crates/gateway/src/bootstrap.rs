//! Assembles the pipeline from configuration.

use std::sync::Arc;
use std::time::Duration;

use flyid_core::{
    config::{AppConfig, ObjectBackend, RecordBackend, ServerConfig, StoreConfig},
    traits::{LlmClient, ObjectStore, RecordStore},
    Error, Result,
};
use flyid_model_gateway::{AnalysisClient, AnalysisRequestBuilder, ChatClient};
use flyid_store::{InMemoryObjectStore, InMemoryRecordStore, S3ObjectStore, SqliteRecordStore};

use crate::encoder::ImageEncoder;
use crate::persistence::PersistenceGateway;
use crate::service::FlyIdService;
use crate::source::LocalImageSource;

/// Object store selected by `store.object_backend`.
pub async fn build_object_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.object_backend {
        ObjectBackend::Memory => {
            tracing::info!("Initializing In-Memory Object Store");
            Ok(Arc::new(InMemoryObjectStore::new()))
        }
        ObjectBackend::S3 => {
            let bucket = config
                .s3_bucket
                .as_deref()
                .ok_or_else(|| Error::config("store.s3_bucket is required for the s3 backend"))?;
            tracing::info!(bucket = %bucket, endpoint = ?config.s3_endpoint, "Initializing S3 Object Store");
            let store = S3ObjectStore::new(bucket, config.s3_endpoint.as_deref())
                .await
                .with_url_ttl(Duration::from_secs(config.url_ttl_secs));
            Ok(Arc::new(store))
        }
    }
}

/// Record store selected by `store.backend`.
pub fn build_record_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend {
        RecordBackend::Memory => {
            tracing::info!("Initializing In-Memory Record Store");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
        RecordBackend::Sqlite => {
            tracing::info!(path = %config.sqlite_path, "Initializing SQLite Record Store");
            Ok(Arc::new(SqliteRecordStore::new(&config.sqlite_path)?))
        }
    }
}

/// Image source confined to `server.capture_dir`, created if missing.
pub fn build_image_source(config: &ServerConfig) -> Result<LocalImageSource> {
    std::fs::create_dir_all(&config.capture_dir).map_err(|e| {
        Error::config(format!(
            "Cannot create capture directory {}: {}",
            config.capture_dir, e
        ))
    })?;
    tracing::info!(
        capture_dir = %config.capture_dir,
        allow_remote = config.allow_remote_images,
        "Initializing confined image source"
    );
    Ok(LocalImageSource::confined(&config.capture_dir)?
        .with_remote_fetch(config.allow_remote_images))
}

/// Build the full service around `llm` using the configured stores.
pub async fn build_service(config: &AppConfig, llm: Arc<dyn LlmClient>) -> Result<FlyIdService> {
    let source = Arc::new(build_image_source(&config.server)?);
    let objects = build_object_store(&config.store).await?;
    let records = build_record_store(&config.store)?;

    let persistence = Arc::new(
        PersistenceGateway::new(source.clone(), objects, records)
            .with_prefix(config.store.s3_prefix.clone()),
    );

    let analysis = AnalysisClient::new(llm.clone())
        .with_builder(
            AnalysisRequestBuilder::default()
                .with_max_completion_tokens(config.model.analysis_max_tokens),
        )
        .with_sink(persistence.clone())
        .with_persist_threshold(config.persistence.confidence_threshold);

    let chat = ChatClient::new(llm).with_max_completion_tokens(config.model.chat_max_tokens);

    Ok(FlyIdService::new(ImageEncoder::new(source), analysis, chat, persistence)
        .with_history_limit(config.persistence.history_limit))
}
