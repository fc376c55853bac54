//! Grounding validation ensures LLM output is tied to the source text.
//!
//! LLMs produce EVIDENCE, not VERDICTS.
//! If any piece of evidence cannot be located, the whole response is rejected
//! and the caller falls back to deterministic analysis. There is no
//! best-effort parse.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;

use clauseguard_core::detectors::patterns::{
    appears_in, unquoted, unsupported_fact, QUOTED_PATTERN,
};
use clauseguard_core::responder::MIN_QUOTE_CHARS;
use clauseguard_core::segment::segment;
use clauseguard_core::{
    is_grounded, Analyzer, AnalysisReport, AnalysisResult, Evidence, Finding, RiskCategory,
    Severity, Synthesizer, HEDGE_ANSWER,
};

lazy_static! {
    /// A risk level stated in prose: "high risk", "risk is medium".
    static ref STATED_RISK: Regex = Regex::new(
        r"(?i)\b(low|medium|moderate|high)[\s-]+risk\b|\brisk(?:\s+(?:level|score))?\s+(?:is|of)\s+(low|medium|moderate|high)\b"
    )
    .unwrap();
}

/// Errors from grounding validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroundingError {
    #[error("Response is not a valid analysis object: {0}")]
    Malformed(String),

    #[error("Response has an empty summary")]
    EmptySummary,

    #[error("Unknown risk category: {0}")]
    UnknownCategory(String),

    #[error("Unknown risk score: {0}")]
    UnknownRiskScore(String),

    #[error("Alert quote not found in document: '{0}'")]
    QuoteNotFound(String),

    #[error("Summary quotes text not found in document: '{0}'")]
    UnsupportedSummaryQuote(String),

    #[error("Summary describes {0} without a supporting alert")]
    UnsupportedSummaryClaim(RiskCategory),

    #[error("Summary states {stated} risk but the alerts support {actual}")]
    SummaryRiskMismatch { stated: Severity, actual: Severity },

    #[error("Response states '{0}', which the source does not")]
    UnsupportedFact(String),

    #[error("Answer is neither the hedge nor supported by a quote from the context")]
    UngroundedAnswer,
}

/// The analysis object the analysis prompt asks for.
#[derive(Debug, Deserialize)]
struct LlmAnalysis {
    summary: String,
    risk_score: String,
    #[serde(default)]
    alerts: Vec<LlmAlert>,
}

#[derive(Debug, Deserialize)]
struct LlmAlert {
    category: String,
    quote: String,
}

/// Grounding validator for one source text.
///
/// # Validation Steps
/// 1. The response parses into the expected structure
/// 2. Categories and the risk score parse into the fixed taxonomy
/// 3. Every alert quote is located in the source
/// 4. Every quoted summary fragment occurs in the source
/// 5. The summary's prose describes no category without a validated alert,
///    states no other risk level, and no figure missing from the source
///
/// # On Failure
/// Caller MUST fall back to deterministic analysis.
pub struct GroundingValidator<'a> {
    source: &'a str,
    synthesizer: Synthesizer,
    analyzer: Analyzer,
}

impl<'a> GroundingValidator<'a> {
    /// Create a validator for `source`: the analysed document, or the
    /// context of a follow-up question.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            synthesizer: Synthesizer::new(),
            analyzer: Analyzer::new(),
        }
    }

    /// Validate a raw analysis response and turn it into a report.
    ///
    /// Accepted alerts are rebuilt as findings with document pointers, so the
    /// report carries the same guarantees as a deterministic one: one alert
    /// per category, severity order, and a risk score no lower than any alert.
    pub fn validate_analysis(&self, raw: &str) -> Result<AnalysisReport, GroundingError> {
        let parsed: LlmAnalysis = serde_json::from_str(extract_json_object(raw)?)
            .map_err(|e| GroundingError::Malformed(e.to_string()))?;

        let summary = parsed.summary.trim();
        if summary.is_empty() {
            return Err(GroundingError::EmptySummary);
        }

        let claimed = Severity::parse(&parsed.risk_score)
            .ok_or_else(|| GroundingError::UnknownRiskScore(parsed.risk_score.clone()))?;

        let segments = segment(self.source);
        let mut findings = Vec::with_capacity(parsed.alerts.len());
        for alert in &parsed.alerts {
            let category = RiskCategory::parse(&alert.category)
                .ok_or_else(|| GroundingError::UnknownCategory(alert.category.clone()))?;
            let (start, end) = locate_quote(self.source, &alert.quote)
                .ok_or_else(|| GroundingError::QuoteNotFound(alert.quote.clone()))?;
            let segment_index = segments
                .iter()
                .find(|s| s.start <= start && start < s.end)
                .map(|s| s.index)
                .unwrap_or(0);
            findings.push(Finding::new(
                category,
                segment_index,
                Evidence::from_document(self.source, start, end),
            ));
        }

        for fragment in quoted_fragments(summary) {
            if !appears_in(fragment, self.source) {
                return Err(GroundingError::UnsupportedSummaryQuote(fragment.to_string()));
            }
        }

        let findings = self.synthesizer.dedupe_and_order(findings);
        let floor = self.synthesizer.risk_score(&findings);
        let risk_score = claimed.max(floor);
        if risk_score != claimed {
            tracing::debug!(%claimed, %risk_score, "Raised LLM risk score to match its alerts");
        }

        self.check_summary_prose(summary, &findings, risk_score)?;

        Ok(AnalysisReport {
            result: AnalysisResult {
                summary: summary.to_string(),
                risk_score,
                alerts: findings.iter().map(|f| f.category.alert_text()).collect(),
            },
            findings,
            segment_count: segments.len(),
            confidence: self.synthesizer.confidence(self.source),
        })
    }

    /// The summary may only restate what the validated alerts establish.
    ///
    /// Categories are recognised the way the deterministic detectors
    /// recognise them in a document, or by name.
    fn check_summary_prose(
        &self,
        summary: &str,
        findings: &[Finding],
        risk_score: Severity,
    ) -> Result<(), GroundingError> {
        let prose = unquoted(summary);
        let supported = |category: RiskCategory| findings.iter().any(|f| f.category == category);

        let described = self.analyzer.analyze_detailed(&prose).findings;
        if let Some(finding) = described.iter().find(|f| !supported(f.category)) {
            return Err(GroundingError::UnsupportedSummaryClaim(finding.category));
        }
        if let Some(category) = RiskCategory::ALL
            .into_iter()
            .find(|c| !supported(*c) && names_category(&prose, *c))
        {
            return Err(GroundingError::UnsupportedSummaryClaim(category));
        }

        for caps in STATED_RISK.captures_iter(&prose) {
            // "no high-risk clauses" states nothing about the level
            let negated = caps.get(0).is_some_and(|m| {
                prose[..m.start()]
                    .split_whitespace()
                    .last()
                    .is_some_and(|w| matches!(w.to_lowercase().as_str(), "no" | "not" | "without"))
            });
            if negated {
                continue;
            }
            let stated = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| Severity::parse(m.as_str()));
            if let Some(stated) = stated.filter(|s| *s != risk_score) {
                return Err(GroundingError::SummaryRiskMismatch {
                    stated,
                    actual: risk_score,
                });
            }
        }

        match unsupported_fact(&prose, self.source) {
            Some(fact) => Err(GroundingError::UnsupportedFact(fact)),
            None => Ok(()),
        }
    }

    /// Validate a raw chat answer against the context.
    ///
    /// Quotes must come from the context, and the prose around them must not
    /// state a number, duration or amount the context does not.
    pub fn validate_answer(&self, raw: &str) -> Result<String, GroundingError> {
        let answer = raw.trim();
        if answer.trim_matches('"') == HEDGE_ANSWER {
            return Ok(HEDGE_ANSWER.to_string());
        }
        if let Some(fact) = unsupported_fact(&unquoted(answer), self.source) {
            return Err(GroundingError::UnsupportedFact(fact));
        }
        if is_grounded(answer, self.source) {
            Ok(answer.to_string())
        } else {
            Err(GroundingError::UngroundedAnswer)
        }
    }
}

/// The JSON object in a response, tolerating prose or code fences around it.
fn extract_json_object(raw: &str) -> Result<&str, GroundingError> {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
        _ => Err(GroundingError::Malformed(
            "no JSON object in response".to_string(),
        )),
    }
}

/// Byte range of `quote` in `source`.
///
/// Tries an exact match first, then a case-insensitive match that lets
/// whitespace runs and straight/curly quote marks differ.
fn locate_quote(source: &str, quote: &str) -> Option<(usize, usize)> {
    let quote = quote.trim();
    if quote.is_empty() {
        return None;
    }
    if let Some(start) = source.find(quote) {
        return Some((start, start + quote.len()));
    }

    let pattern = quote
        .split_whitespace()
        .map(tolerant_word)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;
    regex.find(source).map(|m| (m.start(), m.end()))
}

fn tolerant_word(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            '\'' | '\u{2018}' | '\u{2019}' => "['\u{2018}\u{2019}]".to_string(),
            '"' | '\u{201C}' | '\u{201D}' => "[\"\u{201C}\u{201D}]".to_string(),
            other => regex::escape(&other.to_string()),
        })
        .collect()
}

/// Whether `text` mentions `category` by label or by variant name.
fn names_category(text: &str, category: RiskCategory) -> bool {
    let text = text.to_lowercase();
    let variant = format!("{:?}", category).to_lowercase();
    text.contains(&category.label().to_lowercase()) || text.contains(&variant)
}

fn quoted_fragments(text: &str) -> Vec<&str> {
    QUOTED_PATTERN
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|f| f.chars().count() >= MIN_QUOTE_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "ACME Terms of Service\n\n\
        1. Disputes. Any dispute will be resolved through binding arbitration.\n\n\
        2. Payments. All fees are non-refundable.\n\n\
        3. Privacy. We may share your personal   information with third parties.";

    fn response(summary: &str, risk: &str, alerts: &[(&str, &str)]) -> String {
        let alerts: Vec<serde_json::Value> = alerts
            .iter()
            .map(|(category, quote)| serde_json::json!({"category": category, "quote": quote}))
            .collect();
        serde_json::json!({"summary": summary, "risk_score": risk, "alerts": alerts}).to_string()
    }

    #[test]
    fn test_valid_analysis_becomes_report() {
        let raw = response(
            "The \"ACME Terms of Service\" require arbitration.",
            "High",
            &[("BindingArbitration", "resolved through binding arbitration")],
        );
        let report = GroundingValidator::new(DOCUMENT).validate_analysis(&raw).unwrap();

        assert_eq!(report.result.risk_score, Severity::High);
        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].evidence.is_valid_for(DOCUMENT));
        assert_eq!(
            report.result.alerts[0],
            RiskCategory::BindingArbitration.alert_text()
        );
    }

    #[test]
    fn test_risk_score_raised_to_alert_severity() {
        let raw = response(
            "A short document.",
            "Low",
            &[("DataSharing", "share your personal information with third parties")],
        );
        let report = GroundingValidator::new(DOCUMENT).validate_analysis(&raw).unwrap();

        // Quote matched despite the extra spaces in the document
        assert!(report.findings[0].evidence.quote.contains("personal   information"));
        assert_eq!(report.result.risk_score, Severity::High);
    }

    #[test]
    fn test_alerts_deduplicated_and_ordered() {
        let raw = response(
            "Summary.",
            "High",
            &[
                ("NonRefundable", "All fees are non-refundable."),
                ("binding arbitration", "binding arbitration"),
                ("NonRefundable", "non-refundable"),
            ],
        );
        let report = GroundingValidator::new(DOCUMENT).validate_analysis(&raw).unwrap();

        let categories: Vec<RiskCategory> = report.findings.iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            vec![RiskCategory::BindingArbitration, RiskCategory::NonRefundable]
        );
    }

    #[test]
    fn test_fabricated_quote_rejected() {
        let raw = response(
            "Summary.",
            "High",
            &[("ClassActionWaiver", "You waive any right to a class action")],
        );
        assert!(matches!(
            GroundingValidator::new(DOCUMENT).validate_analysis(&raw),
            Err(GroundingError::QuoteNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let raw = response("Summary.", "High", &[("Vibes", "binding arbitration")]);
        assert!(matches!(
            GroundingValidator::new(DOCUMENT).validate_analysis(&raw),
            Err(GroundingError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_unknown_risk_score_rejected() {
        let raw = response("Summary.", "Severe", &[]);
        assert_eq!(
            GroundingValidator::new(DOCUMENT).validate_analysis(&raw),
            Err(GroundingError::UnknownRiskScore("Severe".to_string()))
        );
    }

    #[test]
    fn test_summary_quote_must_exist() {
        let raw = response(
            "The terms say \"we will never sell your data to anyone\".",
            "Low",
            &[],
        );
        assert!(matches!(
            GroundingValidator::new(DOCUMENT).validate_analysis(&raw),
            Err(GroundingError::UnsupportedSummaryQuote(_))
        ));
    }

    #[test]
    fn test_summary_cannot_describe_unalerted_clauses() {
        let document = "Membership Terms\n\nYour membership will automatically renew each year.";
        let raw = response(
            "These terms require binding arbitration and sell your data to advertisers.",
            "Medium",
            &[("AutoRenewal", "automatically renew each year")],
        );
        assert!(matches!(
            GroundingValidator::new(document).validate_analysis(&raw),
            Err(GroundingError::UnsupportedSummaryClaim(_))
        ));

        let raw = response(
            "Renewal is automatic. See the section on class action waiver.",
            "Medium",
            &[("AutoRenewal", "automatically renew each year")],
        );
        assert_eq!(
            GroundingValidator::new(document).validate_analysis(&raw),
            Err(GroundingError::UnsupportedSummaryClaim(
                RiskCategory::ClassActionWaiver
            ))
        );
    }

    #[test]
    fn test_summary_consistent_with_alerts_accepted() {
        let document = "Membership Terms\n\nYour membership will automatically renew each year.";
        let raw = response(
            "Your membership will automatically renew each year. Overall risk is medium; no high-risk clauses.",
            "Medium",
            &[("AutoRenewal", "automatically renew each year")],
        );
        let report = GroundingValidator::new(document).validate_analysis(&raw).unwrap();
        assert_eq!(report.result.risk_score, Severity::Medium);
    }

    #[test]
    fn test_summary_risk_must_match_report() {
        let raw = response(
            "A low risk document overall.",
            "Low",
            &[("BindingArbitration", "binding arbitration")],
        );
        assert_eq!(
            GroundingValidator::new(DOCUMENT).validate_analysis(&raw),
            Err(GroundingError::SummaryRiskMismatch {
                stated: Severity::Low,
                actual: Severity::High,
            })
        );
    }

    #[test]
    fn test_summary_cannot_invent_figures() {
        let raw = response(
            "Refund requests must be made within 30 days.",
            "Low",
            &[("NonRefundable", "All fees are non-refundable.")],
        );
        assert_eq!(
            GroundingValidator::new(DOCUMENT).validate_analysis(&raw),
            Err(GroundingError::UnsupportedFact("30 days".to_string()))
        );
    }

    #[test]
    fn test_empty_summary_rejected() {
        let raw = response("   ", "Low", &[]);
        assert_eq!(
            GroundingValidator::new(DOCUMENT).validate_analysis(&raw),
            Err(GroundingError::EmptySummary)
        );
    }

    #[test]
    fn test_json_inside_code_fence() {
        let raw = format!(
            "Here is the analysis:\n```json\n{}\n```",
            response("Summary.", "Low", &[])
        );
        let report = GroundingValidator::new(DOCUMENT).validate_analysis(&raw).unwrap();
        assert!(report.result.alerts.is_empty());
        assert_eq!(report.result.risk_score, Severity::Low);
    }

    #[test]
    fn test_non_json_rejected() {
        assert!(matches!(
            GroundingValidator::new(DOCUMENT).validate_analysis("I cannot help with that."),
            Err(GroundingError::Malformed(_))
        ));
    }

    #[test]
    fn test_answer_hedge_accepted() {
        let validator = GroundingValidator::new("This service is free.");
        assert_eq!(
            validator.validate_answer(" The document does not specify this. ").unwrap(),
            HEDGE_ANSWER
        );
    }

    #[test]
    fn test_grounded_answer_accepted() {
        let context = "You may cancel within 14 days of purchase.";
        let validator = GroundingValidator::new(context);
        let answer = "You have 14 days: \"You may cancel within 14 days of purchase.\"";
        assert_eq!(validator.validate_answer(answer).unwrap(), answer);
    }

    #[test]
    fn test_unquoted_answer_rejected() {
        let validator = GroundingValidator::new("You may cancel within 14 days.");
        assert_eq!(
            validator.validate_answer("You can cancel at any time."),
            Err(GroundingError::UngroundedAnswer)
        );
    }

    #[test]
    fn test_answer_prose_cannot_contradict_quote() {
        let validator = GroundingValidator::new("You may cancel within 14 days of purchase.");
        assert_eq!(
            validator.validate_answer("You have 90 days to cancel. \"You may cancel within 14 days\""),
            Err(GroundingError::UnsupportedFact("90 days".to_string()))
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_reflowed_quote_is_located(
            start in 0usize..30,
            len in 1usize..8,
            sep in "[ \t\n]{1,3}",
        ) {
            let words: Vec<&str> = DOCUMENT.split_whitespace().collect();
            let start = start.min(words.len() - 1);
            let end = (start + len).min(words.len());
            let quote = words[start..end].join(&sep);

            let (s, e) = locate_quote(DOCUMENT, &quote).unwrap();
            proptest::prop_assert!(appears_in(&quote, &DOCUMENT[s..e]));
        }
    }

    #[test]
    fn test_locate_quote_folds_curly_apostrophes() {
        let source = "The provider’s liability is capped.";
        let (start, end) = locate_quote(source, "the provider's liability").unwrap();
        assert_eq!(&source[start..end], "The provider’s liability");
    }
}
