//! Billing detector
//!
//! **Question**: Will the user keep paying, and can they get money back?

use lazy_static::lazy_static;

use crate::segment::Segment;
use crate::types::{Finding, RiskCategory};

use super::{scan, Detector, Rule};

lazy_static! {
    static ref RULES: Vec<Rule> = vec![
        Rule::new(
            RiskCategory::AutoRenewal,
            r"(?i)\bautomatic(ally)?[\s-]+renew"
        )
        .unless(r"(?i)\b(will\s+not|does\s+not|won't|doesn't)\s+(be\s+)?automatic(ally)?[\s-]+renew"),
        Rule::new(RiskCategory::AutoRenewal, r"(?i)\bauto[\s-]?renew"),
        Rule::new(
            RiskCategory::AutoRenewal,
            r"(?i)\b(subscription|plan|membership|term)s?\b[^.;]{0,60}\brenew\w*\b[^.;]{0,60}\b(unless|until)\b[^.;]{0,40}\bcancel"
        ),
        Rule::new(
            RiskCategory::AutoRenewal,
            r"(?i)\b(charge|bill)\w*\b[^.;]{0,60}\b(recurring|each\s+(billing\s+)?(period|month|year)|on\s+a\s+recurring)\b"
        ),
        Rule::new(
            RiskCategory::NonRefundable,
            r"(?i)\bnon[\s-]?refundable\b"
        ),
        Rule::new(
            RiskCategory::NonRefundable,
            r"(?i)\bno\s+(partial\s+|full\s+|cash\s+)?refunds?\b"
        ),
        Rule::new(
            RiskCategory::NonRefundable,
            r"(?i)\b(not|never)\s+(be\s+)?refunded\b"
        ),
        Rule::new(
            RiskCategory::NonRefundable,
            r"(?i)\b(not|never)\s+(be\s+)?(eligible|entitled)\s+(for|to)\s+(a\s+|any\s+)?refunds?\b"
        ),
        Rule::new(
            RiskCategory::NonRefundable,
            r"(?i)\b(do|does|will|shall)\s+not\s+(offer|provide|issue|give|grant)\s+(any\s+)?refunds?\b"
        ),
        Rule::new(
            RiskCategory::NonRefundable,
            r"(?i)\b(don't|doesn't|won't)\s+(offer|provide|issue|give|grant)\s+(any\s+)?refunds?\b"
        ),
        Rule::new(
            RiskCategory::NonRefundable,
            r"(?i)\ball\s+(sales|purchases|payments)\s+are\s+final\b"
        ),
    ];
}

const CATEGORIES: &[RiskCategory] = &[RiskCategory::AutoRenewal, RiskCategory::NonRefundable];

/// Detects automatic renewals and refund exclusions.
pub struct BillingDetector;

impl BillingDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BillingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for BillingDetector {
    fn name(&self) -> &'static str {
        "billing"
    }

    fn categories(&self) -> &'static [RiskCategory] {
        CATEGORIES
    }

    fn evaluate(&self, segment: &Segment) -> Vec<Finding> {
        scan(segment, &RULES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(text: &str) -> Vec<RiskCategory> {
        let seg = Segment {
            index: 0,
            start: 0,
            end: text.len(),
            heading: None,
            text: text.to_string(),
        };
        BillingDetector::new()
            .evaluate(&seg)
            .into_iter()
            .map(|f| f.category)
            .collect()
    }

    #[test]
    fn test_auto_renewal() {
        assert_eq!(
            categories("Your subscription will automatically renew each month."),
            vec![RiskCategory::AutoRenewal]
        );
        assert_eq!(
            categories("Plans renew at the end of each term unless you cancel beforehand."),
            vec![RiskCategory::AutoRenewal]
        );
    }

    #[test]
    fn test_explicit_no_renewal() {
        assert!(categories("Gift plans will not automatically renew.").is_empty());
    }

    #[test]
    fn test_non_refundable() {
        assert_eq!(
            categories("All fees are non-refundable."),
            vec![RiskCategory::NonRefundable]
        );
        assert_eq!(
            categories("We do not offer refunds for partial months."),
            vec![RiskCategory::NonRefundable]
        );
        assert_eq!(
            categories("All sales are final."),
            vec![RiskCategory::NonRefundable]
        );
    }

    #[test]
    fn test_refund_wording_variants() {
        for text in [
            "There are no refunds for unused time.",
            "Annual plans will not be refunded.",
            "You are not eligible for a refund after 14 days.",
            "We won't issue refunds for digital goods.",
        ] {
            assert_eq!(categories(text), vec![RiskCategory::NonRefundable], "{}", text);
        }
    }

    #[test]
    fn test_refund_promise_is_not_flagged() {
        assert!(categories("If you are not satisfied, we will refund your payment in full.").is_empty());
        assert!(categories("Not happy? Refunds are available within 30 days.").is_empty());
        assert!(categories("We offer a full refund, no questions asked.").is_empty());
    }

    #[test]
    fn test_both_categories() {
        assert_eq!(
            categories("Memberships auto-renew annually. Payments are non-refundable."),
            vec![RiskCategory::AutoRenewal, RiskCategory::NonRefundable]
        );
    }
}
