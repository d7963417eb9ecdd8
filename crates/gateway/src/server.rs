//! Axum-based HTTP server for the gateway.

use axum::{
    extract::{Json, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use flyid_core::{
    config::ServerConfig,
    types::{CatchRecord, ChatMessage, FlyAnalysisResult},
    Error, Result,
};

use crate::service::FlyIdService;

/// Header carrying the caller's identity, set by the fronting identity proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

impl From<&ServerConfig> for GatewayConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            enable_cors: server.enable_cors,
            enable_tracing: true,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub service: Arc<FlyIdService>,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(config: GatewayConfig, service: Arc<FlyIdService>) -> Self {
        Self {
            config,
            state: Arc::new(AppState { service }),
        }
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/v1/analyze", post(analyze_handler))
            .route("/v1/chat", post(chat_handler))
            .route("/v1/history", get(history_handler))
            .with_state(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::internal(format!("Failed to bind: {}", e)))?;

        tracing::info!(addr = %addr, "Gateway server starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Analyze request.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Local reference of the captured image.
    pub image_uri: String,
}

/// Chat request. The caller owns the transcript.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Trace ID.
    pub trace_id: Option<String>,
}

/// Pipeline error bound to the request that produced it.
pub struct ApiError {
    error: Error,
    trace_id: String,
}

impl ApiError {
    fn new(error: Error, trace_id: &str) -> Self {
        Self {
            error,
            trace_id: trace_id.to_string(),
        }
    }
}

/// HTTP status for a pipeline error.
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Encoding(_) | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        Error::Upstream(_) | Error::EmptyResponse(_) | Error::MalformedResult(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);
        // Raw upstream bodies stay in the logs
        let message = match &self.error {
            Error::EmptyResponse(_) => "Empty response from model".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                code: self.error.code().to_string(),
                message,
                trace_id: Some(self.trace_id),
            }),
        )
            .into_response()
    }
}

fn user_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Analyze handler.
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AnalyzeRequest>,
) -> std::result::Result<Json<FlyAnalysisResult>, ApiError> {
    let trace_id = Uuid::new_v4().to_string();
    let user_id = user_id(&headers);

    tracing::info!(
        trace_id = %trace_id,
        image_uri = %payload.image_uri,
        authenticated = user_id.is_some(),
        "Processing analyze request"
    );

    match state.service.analyze_reference(&payload.image_uri, user_id).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::error!(trace_id = %trace_id, error = %e, "Analysis failed");
            Err(ApiError::new(e, &trace_id))
        }
    }
}

/// Chat handler.
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    let trace_id = Uuid::new_v4().to_string();

    tracing::info!(
        trace_id = %trace_id,
        turns = payload.messages.len(),
        "Processing chat request"
    );

    match state.service.chat(&payload.messages).await {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(e) => {
            tracing::error!(trace_id = %trace_id, error = %e, "Chat failed");
            Err(ApiError::new(e, &trace_id))
        }
    }
}

/// History handler.
async fn history_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> std::result::Result<Json<Vec<CatchRecord>>, ApiError> {
    let trace_id = Uuid::new_v4().to_string();

    state
        .service
        .history(user_id(&headers), query.limit)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(trace_id = %trace_id, error = %e, "History lookup failed");
            ApiError::new(e, &trace_id)
        })
}
