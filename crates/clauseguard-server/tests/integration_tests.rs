//! Integration tests for the HTTP API

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

use clauseguard_core::AnalysisReport;
use clauseguard_runtime::{
    AnalysisBackend, BackendError, ClauseGuard, ContentExtractor, FallbackStrategy, FetchFailure,
    ProviderError, RuntimeConfig,
};
use clauseguard_server::handlers::{create_router, AppState};

const TERMS: &str = "ACME TERMS OF SERVICE\n\n\
    1. Disputes. Any dispute will be resolved through binding arbitration.\n\n\
    2. Billing. Your subscription will automatically renew each month.";

const REMOTE_TERMS: &str = "Remote Terms. Fees are non-refundable once paid.";

/// Serves canned pages instead of fetching.
struct CannedPages(HashMap<&'static str, Result<&'static str, FetchFailure>>);

#[async_trait]
impl ContentExtractor for CannedPages {
    async fn extract(&self, url: &str) -> Result<String, FetchFailure> {
        match self.0.get(url) {
            Some(Ok(page)) => Ok(page.to_string()),
            Some(Err(failure)) => Err(failure.clone()),
            None => Err(FetchFailure::Unreachable(None)),
        }
    }
}

/// A backend whose provider always errors.
struct DownBackend;

#[async_trait]
impl AnalysisBackend for DownBackend {
    fn name(&self) -> &str {
        "down"
    }

    async fn analyze(&self, _document: &str) -> Result<AnalysisReport, BackendError> {
        Err(ProviderError::HttpError("connection reset by 10.0.0.7".to_string()).into())
    }

    async fn answer(&self, _question: &str, _context: &str) -> Result<String, BackendError> {
        Err(ProviderError::AuthError.into())
    }
}

fn extractor() -> Arc<CannedPages> {
    let mut pages = HashMap::new();
    pages.insert("https://acme.example/terms", Ok(REMOTE_TERMS));
    pages.insert(
        "https://acme.example/missing",
        Err(FetchFailure::NotFound(Some("HTTP 404".to_string()))),
    );
    pages.insert(
        "https://acme.example/terms.pdf",
        Err(FetchFailure::NonTextual(Some("application/pdf".to_string()))),
    );
    Arc::new(CannedPages(pages))
}

fn app() -> Router {
    let service = ClauseGuard::builder()
        .with_extractor(extractor())
        .build()
        .unwrap();
    create_router(AppState::new(service))
}

fn app_with_failing_backend(fallback: FallbackStrategy) -> Router {
    let service = ClauseGuard::builder()
        .with_config(RuntimeConfig {
            fallback,
            ..Default::default()
        })
        .with_extractor(extractor())
        .with_backend(Arc::new(DownBackend))
        .build()
        .unwrap();
    create_router(AppState::new(service))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_root_endpoint() {
    let (status, body) = send(app(), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ClauseGuard API is running");
}

#[tokio::test]
async fn test_health_is_static_even_when_backend_is_down() {
    let (status, body) =
        send(app_with_failing_backend(FallbackStrategy::Fail), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_analyze_text() {
    let (status, body) = send(app(), "POST", "/analyze", Some(json!({"text": TERMS}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_score"], "High");
    assert!(body["summary"].as_str().unwrap().contains("ACME TERMS OF SERVICE"));

    let alerts = body["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert!(alerts[0].as_str().unwrap().starts_with("Binding arbitration"));
    assert!(alerts[1].as_str().unwrap().starts_with("Automatic renewal"));

    // Only the three public fields are exposed
    assert_eq!(body.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn test_analyze_is_deterministic() {
    let request = json!({"text": TERMS});
    let (_, first) = send(app(), "POST", "/analyze", Some(request.clone())).await;
    let (_, second) = send(app(), "POST", "/analyze", Some(request)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_analyze_requires_text_or_url() {
    let (status, body) = send(app(), "POST", "/analyze", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Either 'text' or 'url' must be provided");
}

#[tokio::test]
async fn test_analyze_rejects_short_text() {
    let (status, body) = send(app(), "POST", "/analyze", Some(json!({"text": "  hi  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Text is too short"));
}

#[tokio::test]
async fn test_url_takes_precedence_over_text() {
    let (status, body) = send(
        app(),
        "POST",
        "/analyze",
        Some(json!({"text": TERMS, "url": "https://acme.example/terms"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // The fetched page only has a no-refunds clause
    assert_eq!(body["risk_score"], "Low");
    assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_failures_are_client_errors() {
    let (status, body) = send(
        app(),
        "POST",
        "/analyze",
        Some(json!({"url": "https://acme.example/missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "The page was not found (HTTP 404)");

    let (status, body) = send(
        app(),
        "POST",
        "/analyze",
        Some(json!({"url": "https://acme.example/terms.pdf"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("The URL did not return an HTML or text document"));
}

#[tokio::test]
async fn test_chat_answers_from_context() {
    let (status, body) = send(
        app(),
        "POST",
        "/chat",
        Some(json!({
            "question": "How long is the cancellation window?",
            "context": "You may cancel within 14 days."
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().contains("14 days"));
}

#[tokio::test]
async fn test_chat_hedges_when_context_is_silent() {
    let (status, body) = send(
        app(),
        "POST",
        "/chat",
        Some(json!({
            "question": "What is the arbitration clause?",
            "context": "This service is free."
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "The document does not specify this.");
}

#[tokio::test]
async fn test_chat_requires_question_and_context() {
    let (status, body) = send(
        app(),
        "POST",
        "/chat",
        Some(json!({"question": "  ", "context": "You may cancel within 14 days."})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Question is required");

    let (status, body) = send(
        app(),
        "POST",
        "/chat",
        Some(json!({"question": "Can I cancel?"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Context is required");
}

#[tokio::test]
async fn test_backend_failure_falls_back_by_default() {
    let (status, body) = send(
        app_with_failing_backend(FallbackStrategy::Deterministic),
        "POST",
        "/analyze",
        Some(json!({"text": TERMS})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_score"], "High");
}

#[tokio::test]
async fn test_backend_failure_is_generic_500() {
    let (status, body) = send(
        app_with_failing_backend(FallbackStrategy::Fail),
        "POST",
        "/analyze",
        Some(json!({"text": TERMS})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Internal server error"}));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}
