//! Grounding validation for LLM output.
//!
//! Every alert quote, summary quote and chat answer from an LLM is checked
//! against the source text before it is used.

mod validator;

pub use validator::{GroundingError, GroundingValidator};
