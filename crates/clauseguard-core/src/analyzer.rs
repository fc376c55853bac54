//! Document analyzer: segment, detect, synthesize.

use crate::detectors::{default_detectors, Detector};
use crate::segment::segment;
use crate::synthesizer::Synthesizer;
use crate::types::{AnalysisReport, AnalysisResult, Finding};

/// Runs every detector over every segment of a document.
pub struct Analyzer {
    detectors: Vec<Box<dyn Detector>>,
    synthesizer: Synthesizer,
}

impl Analyzer {
    /// An analyzer with the built-in detectors.
    pub fn new() -> Self {
        Self::with_detectors(default_detectors())
    }

    pub fn with_detectors(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self {
            detectors,
            synthesizer: Synthesizer::new(),
        }
    }

    /// Analyze validated text.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        self.analyze_detailed(text).result
    }

    /// Analyze validated text, keeping the findings behind each alert.
    pub fn analyze_detailed(&self, text: &str) -> AnalysisReport {
        let segments = segment(text);

        let findings: Vec<Finding> = segments
            .iter()
            .flat_map(|seg| {
                self.detectors.iter().flat_map(move |detector| {
                    let found = detector.evaluate(seg);
                    if !found.is_empty() {
                        tracing::trace!(
                            detector = detector.name(),
                            segment = seg.index,
                            count = found.len(),
                            "Detector raised findings"
                        );
                    }
                    found
                })
            })
            .collect();

        self.synthesizer.synthesize(text, &segments, findings)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RiskCategory, Severity};

    const SAMPLE_TERMS: &str = "\
ACME TERMS OF SERVICE

1. Acceptance
By using the Service you agree to these Terms. We may modify these Terms at any time.

2. Privacy
We may share your personal information with third parties for advertising purposes.

3. Billing
Your subscription will automatically renew each month. All fees are non-refundable.

4. Disputes
Any dispute will be resolved through binding arbitration. You waive any right to participate in a class action.
";

    #[test]
    fn test_full_document_analysis() {
        let report = Analyzer::new().analyze_detailed(SAMPLE_TERMS);
        let categories: Vec<RiskCategory> = report.findings.iter().map(|f| f.category).collect();

        assert_eq!(report.result.risk_score, Severity::High);
        assert_eq!(
            categories,
            vec![
                RiskCategory::DataSharing,
                RiskCategory::BindingArbitration,
                RiskCategory::ClassActionWaiver,
                RiskCategory::UnilateralChanges,
                RiskCategory::AutoRenewal,
                RiskCategory::NonRefundable,
            ]
        );
        assert_eq!(report.result.alerts.len(), categories.len());
        assert!(report.result.summary.contains("\"ACME TERMS OF SERVICE\""));
        for finding in &report.findings {
            assert!(finding.evidence.is_valid_for(SAMPLE_TERMS));
        }
    }

    #[test]
    fn test_benign_document() {
        let result = Analyzer::new()
            .analyze("Thank you for visiting. This page explains how to contact our support team.");
        assert_eq!(result.risk_score, Severity::Low);
        assert!(result.alerts.is_empty());
        assert!(!result.summary.is_empty());
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = Analyzer::new();
        assert_eq!(analyzer.analyze(SAMPLE_TERMS), analyzer.analyze(SAMPLE_TERMS));
    }

    #[test]
    fn test_refund_promise_raises_nothing() {
        let result = Analyzer::new().analyze("If you are not satisfied, we will refund your payment in full.");
        assert_eq!(result.risk_score, Severity::Low);
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn test_mixed_denial_and_admission() {
        let result = Analyzer::new().analyze(
            "We do not sell your data, but we share your personal information with advertisers.",
        );
        assert_eq!(result.risk_score, Severity::High);
        assert_eq!(result.alerts, vec![RiskCategory::DataSharing.alert_text()]);
    }

    #[test]
    fn test_repeated_clause_yields_one_alert() {
        let doc = "All fees are non-refundable.\n\nAgain: all fees are non-refundable.";
        let result = Analyzer::new().analyze(doc);
        assert_eq!(result.alerts, vec![RiskCategory::NonRefundable.alert_text()]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const CLAUSES: &[&str] = &[
            "Any dispute will be resolved through binding arbitration.",
            "We may share your personal information with third parties.",
            "Your subscription will automatically renew each month.",
            "All fees are non-refundable.",
            "We use cookies to remember your preferences.",
            "You agree to indemnify us against any claims.",
            "Thank you for choosing our service.",
            "Please contact support with any questions.",
            "These terms are written in plain English.",
        ];

        fn arb_document() -> impl Strategy<Value = String> {
            (
                prop::collection::vec(prop::sample::select(CLAUSES), 1..8),
                prop::sample::select(&[" ", "\n", "\n\n"][..]),
            )
                .prop_map(|(clauses, sep)| clauses.join(sep))
        }

        proptest! {
            #[test]
            fn prop_risk_score_covers_every_finding(doc in arb_document()) {
                let report = Analyzer::new().analyze_detailed(&doc);
                for finding in &report.findings {
                    prop_assert!(report.result.risk_score >= finding.severity);
                    prop_assert!(finding.evidence.is_valid_for(&doc));
                }
                if report.findings.is_empty() {
                    prop_assert_eq!(report.result.risk_score, Severity::Low);
                    prop_assert!(report.result.alerts.is_empty());
                }
            }

            #[test]
            fn prop_analysis_is_deterministic(doc in arb_document()) {
                let analyzer = Analyzer::new();
                prop_assert_eq!(analyzer.analyze(&doc), analyzer.analyze(&doc));
            }

            #[test]
            fn prop_arbitrary_text_never_panics(doc in "\\PC{10,300}") {
                let report = Analyzer::new().analyze_detailed(&doc);
                prop_assert!((0.0..=1.0).contains(&report.confidence));
            }
        }
    }
}
