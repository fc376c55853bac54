//! Risk detectors.
//!
//! Each detector covers one family of concern categories and inspects
//! segments independently. Detectors hold no state, so the same segment
//! always yields the same findings.

mod billing;
mod disputes;
pub mod patterns;
mod privacy;
mod rights;

pub use billing::BillingDetector;
pub use disputes::DisputesDetector;
pub use privacy::PrivacyDetector;
pub use rights::RightsDetector;

use lazy_static::lazy_static;
use regex::Regex;

use crate::evidence::{Evidence, EvidenceSource};
use crate::segment::{sentences, Segment};
use crate::types::{Finding, RiskCategory};

/// A detector classifies segments against part of the risk taxonomy.
pub trait Detector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The categories this detector can raise.
    fn categories(&self) -> &'static [RiskCategory];

    /// Evaluate one segment. At most one finding per category is returned.
    fn evaluate(&self, segment: &Segment) -> Vec<Finding>;
}

/// All built-in detectors, in taxonomy order.
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(DisputesDetector::new()),
        Box::new(PrivacyDetector::new()),
        Box::new(RightsDetector::new()),
        Box::new(BillingDetector::new()),
    ]
}

lazy_static! {
    /// Where one clause of a sentence ends and a contrasting one begins.
    static ref CLAUSE_BREAK: Regex =
        Regex::new(r"(?i);|\b(?:but|however|whereas|although|though)\b").unwrap();
}

/// A pattern that raises a category, unless the clause it matched in
/// also matches the `unless` pattern (typically a negation).
pub struct Rule {
    pub category: RiskCategory,
    pub pattern: Regex,
    pub unless: Option<Regex>,
}

impl Rule {
    pub fn new(category: RiskCategory, pattern: &str) -> Self {
        Self {
            category,
            pattern: Regex::new(pattern).unwrap(),
            unless: None,
        }
    }

    pub fn unless(mut self, pattern: &str) -> Self {
        self.unless = Some(Regex::new(pattern).unwrap());
        self
    }
}

/// Split a sentence at contrastive breaks ("..., but ...", "...; ...").
pub(crate) fn clauses(sentence: &str) -> Vec<&str> {
    CLAUSE_BREAK
        .split(sentence)
        .filter(|c| !c.trim().is_empty())
        .collect()
}

impl Rule {
    /// Whether some clause of `sentence` matches and is not excepted.
    fn fires_in(&self, sentence: &str) -> bool {
        clauses(sentence).into_iter().any(|clause| {
            if !self.pattern.is_match(clause) {
                return false;
            }
            if self.unless.as_ref().is_some_and(|u| u.is_match(clause)) {
                tracing::trace!(category = ?self.category, "Match suppressed by exception pattern");
                return false;
            }
            true
        })
    }
}

/// Run a rule set over a segment.
///
/// Rules match clause by clause, so a denial in one clause does not mask an
/// admission in another. Evidence is the full sentence containing the
/// earliest match for each category, with offsets relative to the whole
/// document.
pub(crate) fn scan(segment: &Segment, rules: &[Rule]) -> Vec<Finding> {
    let spans = sentences(&segment.text);
    let mut findings: Vec<Finding> = Vec::new();

    for sentence in &spans {
        let text = sentence.slice(&segment.text);
        for rule in rules {
            if findings.iter().any(|f| f.category == rule.category) {
                continue;
            }
            if !rule.fires_in(text) {
                continue;
            }

            let evidence = Evidence {
                quote: text.to_string(),
                source: EvidenceSource::Document,
                start: segment.start + sentence.start,
                end: segment.start + sentence.end,
            };
            findings.push(Finding::new(rule.category, segment.index, evidence));
        }
    }

    findings
}
