//! Evidence linking for findings and answers.
//!
//! Every alert and every non-hedged answer points back at the exact span of
//! source text it was derived from.

use serde::{Deserialize, Serialize};

/// Which text a piece of evidence points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// The analysed document
    Document,
    /// The context supplied with a follow-up question
    Context,
}

/// A quoted span of source text supporting a finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// The exact text at `start..end`
    pub quote: String,

    pub source: EvidenceSource,

    /// Byte offset of the span start
    pub start: usize,

    /// Byte offset of the span end (exclusive)
    pub end: usize,
}

impl Evidence {
    /// Create evidence from a span of the analysed document.
    ///
    /// `start..end` must lie on character boundaries of `document`.
    pub fn from_document(document: &str, start: usize, end: usize) -> Self {
        Self {
            quote: document[start..end].to_string(),
            source: EvidenceSource::Document,
            start,
            end,
        }
    }

    /// Create evidence from a span of a question's context.
    pub fn from_context(context: &str, start: usize, end: usize) -> Self {
        Self {
            quote: context[start..end].to_string(),
            source: EvidenceSource::Context,
            start,
            end,
        }
    }

    /// Pointer to the location, e.g. `document[42:68]`.
    pub fn pointer(&self) -> String {
        let source = match self.source {
            EvidenceSource::Document => "document",
            EvidenceSource::Context => "context",
        };
        format!("{}[{}:{}]", source, self.start, self.end)
    }

    /// Check that the quote still matches the text it points into.
    pub fn is_valid_for(&self, text: &str) -> bool {
        text.get(self.start..self.end) == Some(self.quote.as_str())
    }
}
