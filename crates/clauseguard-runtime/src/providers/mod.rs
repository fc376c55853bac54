//! LLM provider abstractions for clauseguard-runtime.
//!
//! This module defines the trait for LLM providers and includes an
//! implementation for Anthropic.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling.
//! See [`ApiCredential`] for the recommended patterns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::humantime_duration;

pub mod secrets;

#[cfg(feature = "anthropic")]
mod anthropic;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicProvider, ANTHROPIC_API_KEY_ENV};

/// Errors from LLM providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Request timeout
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,

    /// Enable prompt caching (Anthropic-specific)
    pub prompt_caching: bool,

    /// Documents longer than this are truncated before prompting
    pub max_document_chars: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250514".to_string(),
            max_tokens: 1500,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
            prompt_caching: true,
            max_document_chars: 60_000,
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    pub usage: TokenUsage,

    /// Model used
    pub model: String,

    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,

    /// Tokens read from cache (Anthropic)
    pub cache_read_tokens: u32,

    /// Tokens written to cache (Anthropic)
    pub cache_creation_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping LLM backends.
///
/// Providers only produce text. Whether that text is accepted is decided by
/// the grounding validator, never by the provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Build a provider by name.
///
/// `"none"` and `"deterministic"` mean no provider. `api_key` overrides the
/// provider's environment variable.
#[cfg_attr(not(feature = "anthropic"), allow(unused_variables))]
pub fn provider_from_name(
    name: &str,
    api_key: Option<&str>,
) -> Result<Option<Arc<dyn LlmProvider>>, ProviderError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "deterministic" => Ok(None),
        #[cfg(feature = "anthropic")]
        "anthropic" => {
            let provider = match api_key {
                Some(key) if !key.trim().is_empty() => AnthropicProvider::new(key),
                _ => AnthropicProvider::from_env()?,
            };
            Ok(Some(Arc::new(provider)))
        }
        other => Err(ProviderError::NotConfigured(format!(
            "unknown provider '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_creation() {
        assert_eq!(ChatMessage::system("Rules.").role, "system");
        assert_eq!(ChatMessage::user("Hello!").role, "user");
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
            ..Default::default()
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_no_provider_names() {
        assert!(provider_from_name("none", None).unwrap().is_none());
        assert!(provider_from_name("Deterministic", None).unwrap().is_none());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(matches!(
            provider_from_name("oracle", None),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[cfg(feature = "anthropic")]
    #[test]
    fn test_anthropic_with_explicit_key() {
        let provider = provider_from_name("anthropic", Some("sk-test")).unwrap().unwrap();
        assert_eq!(provider.name(), "anthropic");
    }
}
