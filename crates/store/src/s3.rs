//! S3 implementation of ObjectStore.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream, Client};
use bytes::Bytes;

use flyid_core::{traits::ObjectStore, Error, Result};

/// Default lifetime of presigned download URLs.
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// S3 (or S3-compatible) storage for captured images.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    url_ttl: Duration,
}

impl S3ObjectStore {
    /// Create a store using the ambient AWS configuration.
    ///
    /// `endpoint` points the client at an S3-compatible service such as MinIO;
    /// path-style addressing is used in that case.
    pub async fn new(bucket: &str, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(endpoint.is_some())
            .build();

        Self::new_with_client(Client::from_conf(s3_config), bucket)
    }

    /// Create with custom client (for testing/custom config).
    pub fn new_with_client(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            url_ttl: DEFAULT_URL_TTL,
        }
    }

    /// Set how long download URLs stay valid.
    pub fn with_url_ttl(mut self, ttl: Duration) -> Self {
        self.url_ttl = ttl;
        self
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::storage(format!("S3 upload error: {}", e)))?;

        tracing::debug!(bucket = %self.bucket, key = key, size = size, "Uploaded object to S3");
        Ok(())
    }

    async fn download_url(&self, key: &str) -> Result<String> {
        let presigning = PresigningConfig::expires_in(self.url_ttl)
            .map_err(|e| Error::storage(format!("S3 presign config error: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::storage(format!("S3 presign error: {}", e)))?;

        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    fn offline_client() -> Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .build();
        Client::from_conf(config)
    }

    #[tokio::test]
    async fn test_presigned_download_url() {
        let store = S3ObjectStore::new_with_client(offline_client(), "fly-bucket")
            .with_url_ttl(Duration::from_secs(3600));

        let url = store.download_url("fly_captures/1700000000000_olive.jpg").await.unwrap();

        assert!(url.starts_with("https://"), "{url}");
        assert!(url.contains("fly-bucket"), "{url}");
        assert!(url.contains("fly_captures/1700000000000_olive.jpg"), "{url}");
        assert!(url.contains("X-Amz-Expires=3600"), "{url}");
        assert!(url.contains("X-Amz-Signature="), "{url}");
    }

    #[tokio::test]
    async fn test_ttl_over_a_week_is_rejected() {
        let store = S3ObjectStore::new_with_client(offline_client(), "fly-bucket")
            .with_url_ttl(Duration::from_secs(8 * 24 * 60 * 60));

        let err = store.download_url("fly_captures/x.jpg").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
