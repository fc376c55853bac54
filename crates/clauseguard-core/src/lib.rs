//! # clauseguard-core
//!
//! Deterministic Terms-and-Conditions analysis engine.
//!
//! This crate answers two questions about a document:
//! - Which risky clauses does it contain, and how risky is it overall?
//! - What does it say about a given question?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No LLM calls**: All analysis is rule-based
//! 3. **Traceable**: Every alert is backed by a finding with a document pointer
//! 4. **Monotonic**: The risk score is never lower than any alert's severity
//! 5. **Grounded**: Answers quote the context verbatim or hedge
//!
//! ## Example
//!
//! ```rust
//! use clauseguard_core::{analyze, answer, validate, Severity};
//!
//! let text = validate(Some("  Any dispute will be resolved through binding arbitration.  ")).unwrap();
//! let result = analyze(&text);
//! assert_eq!(result.risk_score, Severity::High);
//!
//! let reply = answer("How long is the refund window?", "Refunds are available within 14 days.");
//! assert!(reply.contains("14 days"));
//! ```

pub mod analyzer;
pub mod detectors;
pub mod evidence;
pub mod responder;
pub mod segment;
pub mod synthesizer;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use analyzer::Analyzer;
pub use detectors::Detector;
pub use evidence::{Evidence, EvidenceSource};
pub use responder::{is_grounded, Answer, QuestionKind, Responder, HEDGE_ANSWER};
pub use segment::{Segment, Span};
pub use synthesizer::Synthesizer;
pub use types::{AnalysisReport, AnalysisResult, Finding, RiskCategory, RiskScore, Severity};
pub use validation::{require_non_blank, validate, ValidationError, MIN_TEXT_LENGTH};

/// Analyze validated document text.
///
/// The caller is expected to have passed the text through [`validate`];
/// analysis itself never fails.
pub fn analyze(text: &str) -> AnalysisResult {
    Analyzer::new().analyze(text)
}

/// Analyze validated document text, keeping findings and confidence.
pub fn analyze_detailed(text: &str) -> AnalysisReport {
    Analyzer::new().analyze_detailed(text)
}

/// Answer a question from the supplied context only.
///
/// Returns [`HEDGE_ANSWER`] when the context does not cover the question.
pub fn answer(question: &str, context: &str) -> String {
    Responder::new().respond(question, context).text
}
