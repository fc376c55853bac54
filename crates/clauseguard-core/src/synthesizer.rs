//! Synthesizer: Aggregates detector findings into an analysis result.
//!
//! The synthesizer applies strict, non-configurable policy rules:
//! 1. Findings are deduplicated by category, keeping the earliest evidence
//! 2. Alerts are ordered by severity (High first), then by document position
//! 3. The risk score is the maximum severity among findings, or Low if none
//!
//! Rule 3 is the monotonic aggregation guarantee: one High clause makes the
//! whole document High no matter how many Low clauses surround it.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::detectors::patterns::normalize_whitespace;
use crate::segment::{sentences, Segment};
use crate::types::{AnalysisReport, AnalysisResult, Finding, RiskCategory, RiskScore, Severity};

/// Below this share of letters among non-space characters, text is treated
/// as having no recognisable sentence structure.
pub const MIN_LETTER_RATIO: f64 = 0.4;

/// Longest subject quoted in the summary, in characters.
const MAX_SUBJECT_CHARS: usize = 80;

/// The Synthesizer aggregates findings into a final result.
pub struct Synthesizer;

impl Synthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize findings into an analysis report.
    ///
    /// # Arguments
    ///
    /// * `document` - The analysed text (evidence offsets point into it)
    /// * `segments` - The segments the findings were raised on
    /// * `findings` - Raw findings from all detectors, in any order
    pub fn synthesize(
        &self,
        document: &str,
        segments: &[Segment],
        findings: Vec<Finding>,
    ) -> AnalysisReport {
        let findings = self.dedupe_and_order(findings);
        let risk_score = self.risk_score(&findings);
        let alerts = findings.iter().map(|f| f.category.alert_text()).collect();

        let letter_ratio = letter_ratio(document);
        let garbled = letter_ratio < MIN_LETTER_RATIO;
        let confidence = self.calculate_confidence(document, letter_ratio);
        let summary = self.build_summary(document, segments.len(), &findings, risk_score, garbled);

        tracing::debug!(
            segments = segments.len(),
            findings = findings.len(),
            risk = %risk_score,
            confidence,
            "Synthesized analysis"
        );

        AnalysisReport {
            result: AnalysisResult {
                summary,
                risk_score,
                alerts,
            },
            findings,
            segment_count: segments.len(),
            confidence,
        }
    }

    /// The maximum severity among findings, or Low when there are none.
    pub fn risk_score(&self, findings: &[Finding]) -> RiskScore {
        findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Low)
    }

    /// Keep one finding per category (the earliest in the document) and
    /// order them for presentation.
    pub fn dedupe_and_order(&self, findings: Vec<Finding>) -> Vec<Finding> {
        let mut by_category: BTreeMap<RiskCategory, Finding> = BTreeMap::new();
        for finding in findings {
            match by_category.get(&finding.category) {
                Some(kept) if kept.evidence.start <= finding.evidence.start => {}
                _ => {
                    by_category.insert(finding.category, finding);
                }
            }
        }

        let mut ordered: Vec<Finding> = by_category.into_values().collect();
        ordered.sort_by_key(|f| (Reverse(f.severity), f.evidence.start, f.category));
        ordered
    }

    /// Confidence in any analysis of `document`, from how well-formed it looks.
    pub fn confidence(&self, document: &str) -> f64 {
        self.calculate_confidence(document, letter_ratio(document))
    }

    fn calculate_confidence(&self, document: &str, letter_ratio: f64) -> f64 {
        if letter_ratio < MIN_LETTER_RATIO {
            return (letter_ratio / 2.0).clamp(0.0, 1.0);
        }
        let has_sentence_end = document.contains(['.', '!', '?', ';']);
        if has_sentence_end {
            1.0
        } else {
            0.6
        }
    }

    /// Build the summary. Everything quoted in it is copied from the document.
    fn build_summary(
        &self,
        document: &str,
        segment_count: usize,
        findings: &[Finding],
        risk_score: RiskScore,
        garbled: bool,
    ) -> String {
        let mut summary = String::new();

        if garbled {
            summary.push_str(
                "The text could not be reliably interpreted as a terms document, so this analysis has low confidence. ",
            );
        } else if let Some(subject) = subject(document) {
            summary.push_str(&format!("The document opens with {}. ", subject));
        }

        summary.push_str(&match segment_count {
            1 => "It was reviewed as 1 section. ".to_string(),
            n => format!("It was reviewed as {} sections. ", n),
        });

        if findings.is_empty() {
            summary.push_str("No clauses matching known risk categories were detected.");
            return summary;
        }

        let material: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.severity > Severity::Low)
            .collect();

        if material.is_empty() {
            summary.push_str(&format!(
                "No high-risk clauses were detected; minor terms cover {}.",
                join_labels(findings.iter().map(|f| f.category))
            ));
        } else {
            summary.push_str(&format!(
                "Material terms include {}. Overall risk is {}.",
                join_labels(material.iter().map(|f| f.category)),
                risk_score
            ));
        }

        summary
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Share of alphabetic characters among non-whitespace characters.
pub fn letter_ratio(text: &str) -> f64 {
    let (letters, visible) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(letters, visible), c| {
            (letters + usize::from(c.is_alphabetic()), visible + 1)
        });
    if visible == 0 {
        return 0.0;
    }
    letters as f64 / visible as f64
}

/// The document's opening line (or its first sentence), quoted.
fn subject(document: &str) -> Option<String> {
    let line = document.lines().map(str::trim).find(|l| !l.is_empty())?;
    let first = sentences(line).first().map(|s| s.slice(line))?;

    let raw = normalize_whitespace(first);
    if raw.chars().count() <= MAX_SUBJECT_CHARS {
        return Some(format!("\"{}\"", raw));
    }

    // Cut on a word boundary, keeping the quote a verbatim prefix.
    let cut: String = raw.chars().take(MAX_SUBJECT_CHARS).collect();
    let cut = match cut.rfind(' ') {
        Some(pos) if pos > 0 => cut[..pos].to_string(),
        _ => cut,
    };
    Some(format!("\"{}\"...", cut))
}

fn join_labels(categories: impl Iterator<Item = RiskCategory>) -> String {
    let labels: Vec<String> = categories.map(|c| c.label().to_lowercase()).collect();
    match labels.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
