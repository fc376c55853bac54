//! Circuit breaker to prevent cascade failures.
//!
//! When LLM calls fail repeatedly, the circuit opens and subsequent calls
//! go straight to the deterministic core until the recovery timeout passes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::humantime_duration;

/// The backend operations that get independent circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendOperation {
    Analyze,
    Answer,
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendOperation::Analyze => f.write_str("analyze"),
            BackendOperation::Answer => f.write_str("answer"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures before opening circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery
    #[serde(with = "humantime_duration")]
    pub recovery_timeout: Duration,

    /// Successes needed to close circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Circuit is open, all calls bypass the backend
    Open { opened_at: Instant },

    /// Testing if circuit can close
    HalfOpen { successes: u32 },
}

/// Circuit breaker with one circuit per backend operation, so a broken
/// chat prompt does not disable analysis and vice versa.
pub struct CircuitBreaker {
    states: RwLock<HashMap<BackendOperation, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns true if calls should bypass the backend.
    pub fn is_open(&self, operation: BackendOperation) -> bool {
        let states = self.states.read();
        match states.get(&operation) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(operation);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    pub fn record_success(&self, operation: BackendOperation) {
        let mut states = self.states.write();
        match states.get(&operation).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(operation, CircuitState::Closed { failures: 0 });
                    tracing::info!(%operation, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        operation,
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { .. }) => {
                states.insert(operation, CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    pub fn record_failure(&self, operation: BackendOperation) {
        let mut states = self.states.write();
        let failures = match states.get(&operation).cloned() {
            None => 0,
            Some(CircuitState::Closed { failures }) => failures,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    operation,
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(%operation, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures + 1 >= self.config.failure_threshold {
            states.insert(
                operation,
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                %operation,
                failures = failures + 1,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(
                operation,
                CircuitState::Closed {
                    failures: failures + 1,
                },
            );
        }
    }

    fn transition_to_half_open(&self, operation: BackendOperation) {
        let mut states = self.states.write();
        if matches!(states.get(&operation), Some(CircuitState::Open { .. })) {
            states.insert(operation, CircuitState::HalfOpen { successes: 0 });
            tracing::info!(%operation, "Circuit transitioning to half-open for recovery test");
        }
    }

    pub fn state(&self, operation: BackendOperation) -> CircuitState {
        self.states
            .read()
            .get(&operation)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Reset all circuits to closed.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
