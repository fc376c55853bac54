//! Disputes & Liability detector
//!
//! **Question**: How does the document limit the user's ability to seek redress?
//!
//! | Category | Severity | Typical wording |
//! |----------|----------|-----------------|
//! | BindingArbitration | High | "binding arbitration", "waive your right to a jury trial" |
//! | ClassActionWaiver | High | "class action waiver", "on an individual basis" |
//! | LiabilityLimitation | Medium | "provided as is", "in no event shall we be liable" |
//! | Indemnification | Medium | "you agree to indemnify and hold harmless" |

use lazy_static::lazy_static;

use crate::segment::Segment;
use crate::types::{Finding, RiskCategory};

use super::{scan, Detector, Rule};

lazy_static! {
    static ref RULES: Vec<Rule> = vec![
        Rule::new(
            RiskCategory::BindingArbitration,
            r"(?i)\b(binding|mandatory|final)\s+(individual\s+)?arbitration\b"
        )
        .unless(r"(?i)\bnot\s+(be\s+)?(subject\s+to|required\s+to)\b[^.;]{0,30}\barbitrat"),
        Rule::new(
            RiskCategory::BindingArbitration,
            r"(?i)\bwaiv\w*\b[^.;]{0,60}\b(jury\s+trial|trial\s+by\s+jury)"
        ),
        Rule::new(
            RiskCategory::BindingArbitration,
            r"(?i)\bdisputes?\b[^.;]{0,80}\b(resolved|settled|decided)\b[^.;]{0,40}\barbitrat\w*"
        )
        .unless(r"(?i)\bnot\s+(be\s+)?(resolved|settled|decided)\b[^.;]{0,40}\barbitrat"),
        Rule::new(
            RiskCategory::BindingArbitration,
            r"(?i)\barbitrat\w*\b[^.;]{0,80}\b(American\s+Arbitration\s+Association|AAA|JAMS)\b"
        ),
        Rule::new(
            RiskCategory::ClassActionWaiver,
            r"(?i)\bclass[- ]action\b[^.;]{0,60}\b(waive\w*|waiver|not\s+(be\s+)?(permitted|allowed|available)|may\s+not|will\s+not)\b"
        ),
        Rule::new(
            RiskCategory::ClassActionWaiver,
            r"(?i)\b(waive\w*|waiver|not\s+participate|not\s+bring)\b[^.;]{0,80}\bclass[- ](action|wide|arbitration)"
        ),
        Rule::new(
            RiskCategory::ClassActionWaiver,
            r"(?i)\bindividual\s+(basis|capacity)\b[^.;]{0,80}\bnot\s+as\s+(a\s+)?(plaintiff|class\s+member)"
        ),
        Rule::new(
            RiskCategory::LiabilityLimitation,
            r#"(?i)\b(provided|offered|made\s+available)\s+(on\s+an\s+)?["“']?as[- ](is|available)\b"#
        ),
        Rule::new(
            RiskCategory::LiabilityLimitation,
            r"(?i)\b(not|in\s+no\s+event)\b[^.;]{0,40}\b(be\s+)?(liable|responsible)\b[^.;]{0,100}\b(damages?|loss(es)?|harm|injur\w+)"
        ),
        Rule::new(
            RiskCategory::LiabilityLimitation,
            r"(?i)\bdisclaim\w*\b[^.;]{0,60}\b(all\s+)?(warrant\w*|liabilit\w*)"
        ),
        Rule::new(
            RiskCategory::LiabilityLimitation,
            r"(?i)\b(total|aggregate|maximum|entire)\s+liability\b[^.;]{0,100}\b(not|never)\s+exceed"
        ),
        Rule::new(
            RiskCategory::Indemnification,
            r"(?i)\b(you|user|customer)s?\s+(agree|shall|will|must)\b[^.;]{0,40}\b(indemnify|hold\s+[\w\s]{1,40}?harmless|defend)\b"
        ),
        Rule::new(
            RiskCategory::Indemnification,
            r"(?i)\bindemnif\w*\b[^.;]{0,60}\b(us|company|our\s+(affiliates|officers|directors|employees))\b"
        )
        .unless(r"(?i)\b(we|company)\s+(will|shall|agree\s+to)\s+indemnify\s+you\b"),
    ];
}

const CATEGORIES: &[RiskCategory] = &[
    RiskCategory::BindingArbitration,
    RiskCategory::ClassActionWaiver,
    RiskCategory::LiabilityLimitation,
    RiskCategory::Indemnification,
];

/// Detects arbitration, class action waivers, disclaimers and indemnities.
pub struct DisputesDetector;

impl DisputesDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DisputesDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for DisputesDetector {
    fn name(&self) -> &'static str {
        "disputes"
    }

    fn categories(&self) -> &'static [RiskCategory] {
        CATEGORIES
    }

    fn evaluate(&self, segment: &Segment) -> Vec<Finding> {
        scan(segment, &RULES)
    }
}
