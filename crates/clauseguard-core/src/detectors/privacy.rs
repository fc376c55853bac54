//! Privacy detector
//!
//! **Question**: What happens to the user's data?
//!
//! Flags disclosure of personal data to third parties and retention or
//! tracking practices. A clause that explicitly denies sharing ("we do not
//! sell your personal information") does not raise DataSharing, but an
//! admission in a contrasting clause of the same sentence still does.

use lazy_static::lazy_static;

use crate::segment::Segment;
use crate::types::{Finding, RiskCategory};

use super::{scan, Detector, Rule};

const SHARING_DENIAL: &str =
    r"(?i)\b(do\s+not|don't|will\s+not|won't|never|does\s+not|shall\s+not)\s+(sell|share|rent|disclose|trade)\b";

lazy_static! {
    static ref RULES: Vec<Rule> = vec![
        Rule::new(
            RiskCategory::DataSharing,
            r"(?i)\b(share|sell|disclose|transfer|rent|trade|provide)s?\b[^.;]{0,80}\b(data|information|content)\b[^.;]{0,80}\b(third[- ]part(y|ies)|partners?|affiliates|advertisers|vendors)\b"
        )
        .unless(SHARING_DENIAL),
        Rule::new(
            RiskCategory::DataSharing,
            r"(?i)\b(third[- ]part(y|ies)|partners?|advertisers)\b[^.;]{0,60}\b(receive|access|obtain|collect)\b[^.;]{0,60}\b(data|information)\b"
        )
        .unless(SHARING_DENIAL),
        Rule::new(
            RiskCategory::DataSharing,
            r"(?i)\b(sell|sale\s+of)\b[^.;]{0,40}\b(personal|your)\s+(data|information)\b"
        )
        .unless(SHARING_DENIAL),
        Rule::new(
            RiskCategory::DataRetention,
            r"(?i)\b(retain|keep|store|preserve)\w*\b[^.;]{0,100}\b(after|following|even\s+if)\b[^.;]{0,60}\b(delet\w+|terminat\w+|clos\w+|cancel\w*)"
        ),
        Rule::new(
            RiskCategory::DataRetention,
            r"(?i)\b(retain\w*|store\w*|kept|keep)\b[^.;]{0,80}\b(indefinitely|for\s+as\s+long\s+as\s+(we|necessary))\b"
        ),
        Rule::new(
            RiskCategory::DataRetention,
            r"(?i)\b(use|place|set|deploy)s?\b[^.;]{0,40}\b(cookies|web\s+beacons|tracking\s+(pixels|technologies)|pixels)\b"
        ),
    ];
}

const CATEGORIES: &[RiskCategory] = &[RiskCategory::DataSharing, RiskCategory::DataRetention];

/// Detects third-party data sharing, tracking and retention.
pub struct PrivacyDetector;

impl PrivacyDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PrivacyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for PrivacyDetector {
    fn name(&self) -> &'static str {
        "privacy"
    }

    fn categories(&self) -> &'static [RiskCategory] {
        CATEGORIES
    }

    fn evaluate(&self, segment: &Segment) -> Vec<Finding> {
        scan(segment, &RULES)
    }
}
