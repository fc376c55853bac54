//! Fallback strategies when LLM calls fail.

use serde::{Deserialize, Serialize};

/// What to do when the LLM backend fails, times out, or produces output
/// that does not pass grounding validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Answer from the deterministic core instead
    #[default]
    Deterministic,

    /// Surface the failure to the caller
    Fail,
}

impl FallbackStrategy {
    pub fn allows_fallback(&self) -> bool {
        matches!(self, FallbackStrategy::Deterministic)
    }
}
