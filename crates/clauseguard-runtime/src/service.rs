//! The ClauseGuard service: the full request pipeline.
//!
//! Analysis: resolve the source (fetching when it is a URL), validate the
//! text, then run the configured backend. Chat: require a question and a
//! context, then answer.
//!
//! The LLM backend, when configured, runs behind a per-operation circuit
//! breaker and a timeout. Any failure, including output that fails
//! grounding, falls back to the deterministic core unless the fallback
//! strategy says to fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use clauseguard_core::{
    require_non_blank, validate, AnalysisReport, AnalysisResult, ValidationError,
};

use crate::backend::{AnalysisBackend, BackendError, DeterministicBackend, LlmBackend};
use crate::config::{ConfigError, RuntimeConfig};
use crate::fetch::{ContentExtractor, FetchFailure, HttpExtractor};
use crate::providers::LlmProvider;
use crate::resilience::{BackendOperation, CircuitBreaker, FallbackStrategy};

/// Where the text to analyze comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnalysisSource {
    Url(String),
    Text(String),
}

impl AnalysisSource {
    /// Resolve the optional fields of a request into one source.
    ///
    /// A URL takes precedence over text when both are given. A blank URL and
    /// an empty text count as absent; whitespace-only text is kept so that
    /// validation reports it as too short.
    pub fn from_request(text: Option<String>, url: Option<String>) -> Result<Self, ValidationError> {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            return Ok(AnalysisSource::Url(url.trim().to_string()));
        }
        match text.filter(|t| !t.is_empty()) {
            Some(text) => Ok(AnalysisSource::Text(text)),
            None => Err(ValidationError::MissingInput),
        }
    }
}

/// Errors from the service. The boundary maps these to status codes.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Input(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchFailure),

    /// Internal detail, logged and never shown to callers.
    #[error("Backend failure: {0}")]
    Backend(String),
}

impl ServiceError {
    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Backend(_))
    }
}

/// An analysis report with run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeReport {
    #[serde(flatten)]
    pub report: AnalysisReport,

    /// The backend that produced the report
    pub backend: String,

    /// True when the configured backend failed and the deterministic core answered
    pub fell_back: bool,

    pub analyzed_at: DateTime<Utc>,
}

/// The ClauseGuard pipeline.
pub struct ClauseGuard {
    extractor: Arc<dyn ContentExtractor>,
    assistant: Option<Arc<dyn AnalysisBackend>>,
    deterministic: DeterministicBackend,
    circuit_breaker: CircuitBreaker,
    fallback: FallbackStrategy,
    backend_timeout: Duration,
}

impl ClauseGuard {
    pub fn builder() -> ClauseGuardBuilder {
        ClauseGuardBuilder::new()
    }

    /// A service with the HTTP extractor and no LLM backend.
    pub fn deterministic() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    /// Name of the backend tried first.
    pub fn backend_name(&self) -> &str {
        match &self.assistant {
            Some(assistant) => assistant.name(),
            None => self.deterministic.name(),
        }
    }

    /// Turn a source into validated document text.
    pub async fn resolve(&self, source: &AnalysisSource) -> Result<String, ServiceError> {
        let raw = match source {
            AnalysisSource::Url(url) => self.extractor.extract(url).await.map_err(|failure| {
                tracing::warn!(url = %url, kind = failure.kind(), failure = %failure, "Fetch failed");
                failure
            })?,
            AnalysisSource::Text(text) => text.clone(),
        };
        Ok(validate(Some(&raw))?)
    }

    /// Analyze a document.
    pub async fn analyze(&self, source: &AnalysisSource) -> Result<AnalysisResult, ServiceError> {
        Ok(self.analyze_detailed(source).await?.report.result)
    }

    /// Analyze a document, keeping findings and run metadata.
    pub async fn analyze_detailed(
        &self,
        source: &AnalysisSource,
    ) -> Result<RuntimeReport, ServiceError> {
        let text = self.resolve(source).await?;

        let (report, backend, fell_back) = match &self.assistant {
            None => (self.deterministic.analyze_now(&text), self.deterministic.name(), false),
            Some(assistant) => {
                let operation = BackendOperation::Analyze;
                match self.guarded(operation, assistant.analyze(&text)).await {
                    Ok(report) => (report, assistant.name(), false),
                    Err(error) => {
                        self.fall_back(operation, assistant.name(), error)?;
                        (self.deterministic.analyze_now(&text), self.deterministic.name(), true)
                    }
                }
            }
        };

        tracing::info!(
            backend,
            fell_back,
            risk = %report.result.risk_score,
            alerts = report.result.alerts.len(),
            "Analysis complete"
        );

        Ok(RuntimeReport {
            report,
            backend: backend.to_string(),
            fell_back,
            analyzed_at: Utc::now(),
        })
    }

    /// Answer a question from the supplied context only.
    pub async fn chat(&self, question: &str, context: &str) -> Result<String, ServiceError> {
        let question = require_non_blank("question", question)?;
        let context = require_non_blank("context", context)?;

        let Some(assistant) = &self.assistant else {
            return Ok(self.deterministic.answer_now(question, context));
        };

        let operation = BackendOperation::Answer;
        match self.guarded(operation, assistant.answer(question, context)).await {
            Ok(answer) => Ok(answer),
            Err(error) => {
                self.fall_back(operation, assistant.name(), error)?;
                Ok(self.deterministic.answer_now(question, context))
            }
        }
    }

    /// Run a backend call behind the circuit breaker and timeout.
    async fn guarded<T>(
        &self,
        operation: BackendOperation,
        call: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        if self.circuit_breaker.is_open(operation) {
            return Err(BackendError::CircuitOpen(operation));
        }

        match tokio::time::timeout(self.backend_timeout, call).await {
            Ok(Ok(value)) => {
                self.circuit_breaker.record_success(operation);
                Ok(value)
            }
            Ok(Err(error)) => {
                self.circuit_breaker.record_failure(operation);
                Err(error)
            }
            Err(_) => {
                self.circuit_breaker.record_failure(operation);
                Err(BackendError::Timeout(self.backend_timeout))
            }
        }
    }

    /// Decide whether a backend failure falls back or surfaces.
    fn fall_back(
        &self,
        operation: BackendOperation,
        backend: &str,
        error: BackendError,
    ) -> Result<(), ServiceError> {
        if self.fallback.allows_fallback() {
            tracing::warn!(
                %operation,
                backend,
                error = %error,
                "Backend failed, falling back to deterministic"
            );
            Ok(())
        } else {
            tracing::warn!(%operation, backend, error = %error, "Backend failed");
            Err(ServiceError::Backend(error.to_string()))
        }
    }
}

/// Builder for [`ClauseGuard`].
pub struct ClauseGuardBuilder {
    config: RuntimeConfig,
    extractor: Option<Arc<dyn ContentExtractor>>,
    backend: Option<Arc<dyn AnalysisBackend>>,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl ClauseGuardBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            extractor: None,
            backend: None,
            provider: None,
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the HTTP extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn ContentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Use a custom backend ahead of the deterministic core.
    pub fn with_backend(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use an LLM provider ahead of the deterministic core. Ignored when a
    /// backend is set with [`with_backend`](Self::with_backend).
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> Result<ClauseGuard, ConfigError> {
        self.config.validate()?;

        let extractor: Arc<dyn ContentExtractor> = match self.extractor {
            Some(extractor) => extractor,
            None => Arc::new(HttpExtractor::new(self.config.fetch.clone())?),
        };

        let assistant = match (self.backend, self.provider) {
            (Some(backend), _) => Some(backend),
            (None, Some(provider)) => Some(Arc::new(LlmBackend::new(
                provider,
                self.config.completion.clone(),
            )) as Arc<dyn AnalysisBackend>),
            (None, None) => None,
        };

        if let Some(assistant) = &assistant {
            tracing::info!(
                backend = assistant.name(),
                fallback = ?self.config.fallback,
                "Configured assisted backend"
            );
        }

        Ok(ClauseGuard {
            extractor,
            assistant,
            deterministic: DeterministicBackend::new(),
            circuit_breaker: CircuitBreaker::new(self.config.circuit_breaker.clone()),
            fallback: self.config.fallback,
            backend_timeout: self.config.completion.timeout,
        })
    }
}

impl Default for ClauseGuardBuilder {
    fn default() -> Self {
        Self::new()
    }
}
