//! Core types for ClauseGuard analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::evidence::Evidence;

/// Severity of a concern category, and the document-level risk score.
///
/// The derive order gives the total ordering `Low < Medium < High` that the
/// synthesizer relies on for monotonic aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// The single aggregate severity label for a document.
pub type RiskScore = Severity;

impl Severity {
    /// Parse a severity label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed taxonomy of concern categories.
///
/// Variant order is the tie-break order for alerts of equal severity that
/// start at the same offset, so it is part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    BindingArbitration,
    ClassActionWaiver,
    DataSharing,
    ContentLicensing,
    UnilateralChanges,
    AutoRenewal,
    LiabilityLimitation,
    AccountTermination,
    Indemnification,
    NonRefundable,
    DataRetention,
}

impl RiskCategory {
    /// Every category in taxonomy order.
    pub const ALL: [RiskCategory; 11] = [
        RiskCategory::BindingArbitration,
        RiskCategory::ClassActionWaiver,
        RiskCategory::DataSharing,
        RiskCategory::ContentLicensing,
        RiskCategory::UnilateralChanges,
        RiskCategory::AutoRenewal,
        RiskCategory::LiabilityLimitation,
        RiskCategory::AccountTermination,
        RiskCategory::Indemnification,
        RiskCategory::NonRefundable,
        RiskCategory::DataRetention,
    ];

    pub fn severity(&self) -> Severity {
        match self {
            RiskCategory::BindingArbitration
            | RiskCategory::ClassActionWaiver
            | RiskCategory::DataSharing
            | RiskCategory::ContentLicensing => Severity::High,
            RiskCategory::UnilateralChanges
            | RiskCategory::AutoRenewal
            | RiskCategory::LiabilityLimitation
            | RiskCategory::AccountTermination
            | RiskCategory::Indemnification => Severity::Medium,
            RiskCategory::NonRefundable | RiskCategory::DataRetention => Severity::Low,
        }
    }

    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::BindingArbitration => "Binding arbitration",
            RiskCategory::ClassActionWaiver => "Class action waiver",
            RiskCategory::DataSharing => "Data sharing with third parties",
            RiskCategory::ContentLicensing => "Broad license over your content",
            RiskCategory::UnilateralChanges => "Unilateral changes to terms",
            RiskCategory::AutoRenewal => "Automatic renewal",
            RiskCategory::LiabilityLimitation => "Liability disclaimers",
            RiskCategory::AccountTermination => "Account termination at will",
            RiskCategory::Indemnification => "Indemnification obligations",
            RiskCategory::NonRefundable => "No refunds",
            RiskCategory::DataRetention => "Data retention and tracking",
        }
    }

    fn explanation(&self) -> &'static str {
        match self {
            RiskCategory::BindingArbitration => {
                "disputes must go to binding arbitration, which may waive your right to a jury trial"
            }
            RiskCategory::ClassActionWaiver => {
                "you may not join class actions and must bring claims individually"
            }
            RiskCategory::DataSharing => {
                "your personal data may be shared with or sold to third parties"
            }
            RiskCategory::ContentLicensing => {
                "the provider takes a broad, possibly perpetual license to content you submit"
            }
            RiskCategory::UnilateralChanges => {
                "the provider may change these terms at any time, sometimes without notice"
            }
            RiskCategory::AutoRenewal => {
                "the subscription renews automatically and cancellation may be restricted"
            }
            RiskCategory::LiabilityLimitation => {
                "the provider disclaims warranties or caps its liability for losses"
            }
            RiskCategory::AccountTermination => {
                "your account or access can be suspended or terminated at the provider's discretion"
            }
            RiskCategory::Indemnification => {
                "you agree to cover the provider's legal costs and losses arising from your use"
            }
            RiskCategory::NonRefundable => "payments are stated to be non-refundable",
            RiskCategory::DataRetention => {
                "your data may be tracked or retained, including after you delete your account"
            }
        }
    }

    /// The alert string shown to users for this category.
    pub fn alert_text(&self) -> String {
        format!("{}: {}.", self.label(), self.explanation())
    }

    /// Parse a category name as produced by serde or by an LLM.
    ///
    /// Matching ignores case and any non-alphanumeric characters, and accepts
    /// either the variant name or the human label.
    pub fn parse(name: &str) -> Option<Self> {
        let wanted = squash(name);
        Self::ALL.into_iter().find(|category| {
            squash(&format!("{:?}", category)) == wanted || squash(category.label()) == wanted
        })
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single triggered concern within one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: RiskCategory,
    pub severity: Severity,
    /// Index of the segment that triggered the finding
    pub segment_index: usize,
    pub evidence: Evidence,
}

impl Finding {
    pub fn new(category: RiskCategory, segment_index: usize, evidence: Evidence) -> Self {
        Self {
            category,
            severity: category.severity(),
            segment_index,
            evidence,
        }
    }
}

/// The structured result returned for an analysed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub risk_score: RiskScore,
    pub alerts: Vec<String>,
}

/// An analysis result together with the findings behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub result: AnalysisResult,

    /// Deduplicated findings, in alert order
    pub findings: Vec<Finding>,

    pub segment_count: usize,

    /// How well-formed the input looked (0.0 - 1.0)
    pub confidence: f64,
}
