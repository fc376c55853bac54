//! Analysis backends.
//!
//! A backend turns validated text into an analysis report, and a question
//! plus context into an answer. The deterministic backend is the core
//! engine and cannot fail. The LLM backend asks a provider and only returns
//! output that passed grounding validation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use clauseguard_core::{AnalysisReport, Analyzer, Responder};

use crate::grounding::{GroundingError, GroundingValidator};
use crate::prompts::{build_analysis_messages, build_chat_messages};
use crate::providers::{CompletionConfig, LlmProvider, ProviderError};
use crate::resilience::BackendOperation;

/// Errors from analysis backends.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Grounding check failed: {0}")]
    Grounding(#[from] GroundingError),

    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit open for {0}")]
    CircuitOpen(BackendOperation),
}

/// Something that can analyze documents and answer questions about them.
///
/// # Faithfulness Contract
/// - `analyze` MUST return evidence-backed findings only
/// - `answer` MUST return the hedge or an answer quoting the context
/// - Neither may use anything but the text passed in
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &str;

    async fn analyze(&self, document: &str) -> Result<AnalysisReport, BackendError>;

    async fn answer(&self, question: &str, context: &str) -> Result<String, BackendError>;
}

/// The rule-based core engine.
#[derive(Default)]
pub struct DeterministicBackend {
    analyzer: Analyzer,
    responder: Responder,
}

impl DeterministicBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infallible analysis, used directly as the fallback path.
    pub fn analyze_now(&self, document: &str) -> AnalysisReport {
        self.analyzer.analyze_detailed(document)
    }

    /// Infallible answer, used directly as the fallback path.
    pub fn answer_now(&self, question: &str, context: &str) -> String {
        self.responder.respond(question, context).text
    }
}

#[async_trait]
impl AnalysisBackend for DeterministicBackend {
    fn name(&self) -> &str {
        "deterministic"
    }

    async fn analyze(&self, document: &str) -> Result<AnalysisReport, BackendError> {
        Ok(self.analyze_now(document))
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String, BackendError> {
        Ok(self.answer_now(question, context))
    }
}

/// LLM-assisted backend with grounding validation.
pub struct LlmBackend {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }
}

#[async_trait]
impl AnalysisBackend for LlmBackend {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn analyze(&self, document: &str) -> Result<AnalysisReport, BackendError> {
        let messages = build_analysis_messages(document, self.completion.max_document_chars);
        let response = self.provider.complete(messages, &self.completion).await?;
        tracing::debug!(
            provider = self.provider.name(),
            tokens = response.usage.total(),
            "Analysis completion received"
        );

        Ok(GroundingValidator::new(document).validate_analysis(&response.content)?)
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String, BackendError> {
        let messages = build_chat_messages(question, context, self.completion.max_document_chars);
        let response = self.provider.complete(messages, &self.completion).await?;
        tracing::debug!(
            provider = self.provider.name(),
            tokens = response.usage.total(),
            "Chat completion received"
        );

        Ok(GroundingValidator::new(context).validate_answer(&response.content)?)
    }
}
