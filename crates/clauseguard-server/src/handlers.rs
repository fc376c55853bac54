//! HTTP request handlers.
//!
//! Handlers only translate between JSON and the service. Every decision
//! (source precedence, validation, backend choice) lives in the service;
//! this layer maps its errors to status codes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use clauseguard_core::AnalysisResult;
use clauseguard_runtime::{AnalysisSource, ClauseGuard, ServiceError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ClauseGuard>,
}

impl AppState {
    pub fn new(service: ClauseGuard) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Body of `POST /analyze`. Either field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    pub text: Option<String>,
    pub url: Option<String>,
}

/// Body of `POST /chat`. Missing fields are treated as blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub question: String,
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body: `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// The request can be fixed by the caller
    BadRequest(String),
    /// Anything else; the detail has already been logged
    Internal,
}

impl From<ServiceError> for AppError {
    fn from(error: ServiceError) -> Self {
        if error.is_client_error() {
            AppError::BadRequest(error.to_string())
        } else {
            tracing::error!(error = %error, "Request failed");
            AppError::Internal
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// GET / - Static availability message
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "ClauseGuard API is running".to_string(),
    })
}

/// GET /health - Liveness only; never consults the backend
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// POST /analyze - Analyze text or the page at a URL (URL wins)
async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let source =
        AnalysisSource::from_request(request.text, request.url).map_err(ServiceError::from)?;
    let result = state.service.analyze(&source).await?;
    Ok(Json(result))
}

/// POST /chat - Answer a question from the supplied context
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let answer = state
        .service
        .chat(&request.question, &request.context)
        .await?;
    Ok(Json(ChatResponse { answer }))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
