//! Rights detector
//!
//! **Question**: What can the provider do to the user's account, content or
//! agreement without asking?

use lazy_static::lazy_static;

use crate::segment::Segment;
use crate::types::{Finding, RiskCategory};

use super::{scan, Detector, Rule};

lazy_static! {
    static ref RULES: Vec<Rule> = vec![
        Rule::new(
            RiskCategory::ContentLicensing,
            r"(?i)\b(grant|give|provide)s?\b[^.;]{0,40}\b(us|company|we)\b[^.;]{0,120}\b(perpetual|irrevocable|worldwide|royalty[- ]free|sublicensable|transferable)\b[^.;]{0,80}\blicen[cs]e\b"
        ),
        Rule::new(
            RiskCategory::ContentLicensing,
            r"(?i)\b(perpetual|irrevocable|royalty[- ]free)\b[^.;]{0,80}\blicen[cs]e\b[^.;]{0,120}\b(use|reproduce|modify|distribute|display|publish)\b"
        ),
        Rule::new(
            RiskCategory::UnilateralChanges,
            r"(?i)\b(we|company)\b[^.;]{0,40}\b(may|can|reserve\s+the\s+right\s+to)\b[^.;]{0,40}\b(modify|change|amend|update|revise)\b[^.;]{0,60}\b(terms|agreement|policy|policies|prices?|fees)\b"
        ),
        Rule::new(
            RiskCategory::UnilateralChanges,
            r"(?i)\b(at\s+any\s+time|from\s+time\s+to\s+time)\b[^.;]{0,60}\b(without|with\s+or\s+without)\s+(prior\s+)?notice\b"
        ),
        Rule::new(
            RiskCategory::UnilateralChanges,
            r"(?i)\bcontinued\s+use\b[^.;]{0,80}\b(constitutes|means|indicates)\b[^.;]{0,40}\baccept"
        ),
        Rule::new(
            RiskCategory::AccountTermination,
            r"(?i)\b(suspend|terminate|disable|close|delete)\w*\b[^.;]{0,60}\b(your\s+)?(account|access)\b[^.;]{0,100}\b(any\s+time|any\s+reason|sole\s+discretion|without\s+(prior\s+)?notice|for\s+no\s+reason)\b"
        )
        .unless(r"(?i)\byou\s+(may|can)\s+(terminate|close|delete|cancel)\b"),
        Rule::new(
            RiskCategory::AccountTermination,
            r"(?i)\b(sole\s+discretion|any\s+reason)\b[^.;]{0,80}\b(suspend|terminate|disable|remove)\w*\b[^.;]{0,40}\b(account|access|you)\b"
        ),
    ];
}

const CATEGORIES: &[RiskCategory] = &[
    RiskCategory::ContentLicensing,
    RiskCategory::UnilateralChanges,
    RiskCategory::AccountTermination,
];

/// Detects content licences, unilateral changes and termination at will.
pub struct RightsDetector;

impl RightsDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RightsDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for RightsDetector {
    fn name(&self) -> &'static str {
        "rights"
    }

    fn categories(&self) -> &'static [RiskCategory] {
        CATEGORIES
    }

    fn evaluate(&self, segment: &Segment) -> Vec<Finding> {
        scan(segment, &RULES)
    }
}
