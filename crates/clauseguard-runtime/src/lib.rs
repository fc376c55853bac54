//! # clauseguard-runtime
//!
//! The request pipeline around the deterministic `clauseguard-core` engine.
//!
//! This crate adds everything that does I/O:
//! - Fetching a terms page from a URL and extracting its text
//! - An optional LLM backend whose output is grounding-checked before use
//! - Circuit breaking, timeouts and fallback to the deterministic core
//!
//! ## Important
//!
//! The LLM backend is OPTIONAL. Without one, every analysis and answer comes
//! from `clauseguard-core`. With one, LLM output is accepted only when every
//! quote in it is found in the source text; otherwise the core answers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use clauseguard_runtime::{AnalysisSource, ClauseGuard};
//!
//! let guard = ClauseGuard::deterministic()?;
//! let source = AnalysisSource::from_request(None, Some("https://example.com/terms".into()))?;
//! let result = guard.analyze(&source).await?;
//! println!("{}: {:?}", result.risk_score, result.alerts);
//! ```

pub mod backend;
pub mod config;
pub mod fetch;
pub mod grounding;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod service;

pub use backend::{AnalysisBackend, BackendError, DeterministicBackend, LlmBackend};
pub use config::{ConfigError, FetchConfig, RuntimeConfig};
pub use fetch::{ContentExtractor, FetchFailure, HttpExtractor};
pub use grounding::{GroundingError, GroundingValidator};
pub use providers::{provider_from_name, CompletionConfig, LlmProvider, ProviderError};
pub use resilience::{BackendOperation, CircuitBreaker, FallbackStrategy};
pub use service::{AnalysisSource, ClauseGuard, ClauseGuardBuilder, RuntimeReport, ServiceError};
