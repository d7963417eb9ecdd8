//! Error types for FlyID.

use thiserror::Error;

/// Result type alias using FlyID's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for FlyID.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    /// The local image could not be read or encoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Non-success status from the completion endpoint.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Success status but no completion text. Holds the raw response body.
    #[error("Empty response from upstream: {0}")]
    EmptyResponse(String),

    /// Completion text present but not a valid analysis result.
    #[error("Malformed analysis result: {0}")]
    MalformedResult(String),

    /// Object storage or document write failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // =========================================================================
    // Infrastructure Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create an upstream error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create an empty response error carrying the raw body.
    pub fn empty_response(body: impl Into<String>) -> Self {
        Self::EmptyResponse(body.into())
    }

    /// Create a malformed result error.
    pub fn malformed_result(msg: impl Into<String>) -> Self {
        Self::MalformedResult(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "ENCODING_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::EmptyResponse(_) => "EMPTY_RESPONSE",
            Self::MalformedResult(_) => "MALFORMED_RESULT",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}
