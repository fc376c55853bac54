//! Resilience patterns for clauseguard-runtime.
//!
//! This module provides:
//! - Circuit breaker so a failing LLM backend stops being called
//! - Fallback strategy when the backend fails

mod circuit_breaker;
mod fallback;

pub use circuit_breaker::{BackendOperation, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use fallback::FallbackStrategy;
