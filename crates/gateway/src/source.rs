//! Reading local image references.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use flyid_core::{traits::ImageSource, Error, Result};

/// Reads plain paths and `file://` URIs from disk, `http(s)://` URLs over
/// the network.
///
/// A source built with [`LocalImageSource::confined`] only serves files that
/// resolve, after symlinks, inside its capture directory, and does not fetch
/// URLs unless [`LocalImageSource::with_remote_fetch`] enables it. Its errors
/// never say why a reference was refused.
#[derive(Debug, Clone)]
pub struct LocalImageSource {
    http: reqwest::Client,
    root: Option<PathBuf>,
    allow_remote: bool,
}

impl Default for LocalImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalImageSource {
    /// Unrestricted source for trusted, in-process callers.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            root: None,
            allow_remote: true,
        }
    }

    /// Source restricted to files under `root`. Remote fetches are off.
    pub fn confined(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::fs::canonicalize(root.as_ref()).map_err(|e| {
            Error::config(format!(
                "Capture directory {} is not usable: {}",
                root.as_ref().display(),
                e
            ))
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            root: Some(root),
            allow_remote: false,
        })
    }

    /// Allow or forbid `http(s)://` references.
    pub fn with_remote_fetch(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    fn refused(&self, reference: &str, reason: impl std::fmt::Display) -> Error {
        tracing::warn!(reference = reference, reason = %reason, "Image reference refused");
        Error::encoding(format!("Image not available: {}", reference))
    }

    /// Canonical path inside the capture directory.
    async fn resolve(&self, root: &Path, reference: &str, path: &Path) -> Result<PathBuf> {
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(self.refused(reference, "parent directory component"));
        }

        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };

        let canonical = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(|e| self.refused(reference, e))?;
        if !canonical.starts_with(root) {
            return Err(self.refused(reference, "outside capture directory"));
        }
        Ok(canonical)
    }

    async fn read_file(&self, reference: &str, path: &Path) -> Result<Bytes> {
        match &self.root {
            Some(root) => {
                let path = self.resolve(root, reference, path).await?;
                let data = tokio::fs::read(&path)
                    .await
                    .map_err(|e| self.refused(reference, e))?;
                Ok(Bytes::from(data))
            }
            None => {
                let data = tokio::fs::read(path).await.map_err(|e| {
                    Error::encoding(format!("Cannot read {}: {}", path.display(), e))
                })?;
                Ok(Bytes::from(data))
            }
        }
    }

    async fn fetch(&self, reference: &str, url: Url) -> Result<Bytes> {
        if !self.allow_remote {
            return Err(self.refused(reference, "remote fetch disabled"));
        }

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::encoding(format!("Cannot fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::encoding(format!(
                "Cannot fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::encoding(format!("Cannot fetch {}: {}", url, e)))
    }
}

#[async_trait]
impl ImageSource for LocalImageSource {
    async fn read(&self, reference: &str) -> Result<Bytes> {
        match Url::parse(reference) {
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::encoding(format!("Invalid file URI: {}", reference)))?;
                self.read_file(reference, &path).await
            }
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.fetch(reference, url).await,
            // Anything else, including Windows drive letters parsed as schemes,
            // is treated as a filesystem path.
            _ => self.read_file(reference, Path::new(reference)).await,
        }
    }
}
