//! Output formatting.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

use clauseguard_core::AnalysisResult;
use clauseguard_runtime::RuntimeReport;

use crate::cli::OutputFormat;

#[derive(Serialize)]
struct AnswerOutput<'a> {
    question: &'a str,
    answer: &'a str,
}

/// Renders results in the selected format.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn result(&self, result: &AnalysisResult) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(result_text(result)),
            _ => self.structured(result),
        }
    }

    pub fn report(&self, report: &RuntimeReport) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(report_text(report)),
            _ => self.structured(report),
        }
    }

    pub fn answer(&self, question: &str, answer: &str) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(answer.to_string()),
            _ => self.structured(&AnswerOutput { question, answer }),
        }
    }

    fn structured<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            _ => serde_json::to_string_pretty(value)?,
        })
    }
}

fn result_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Risk: {}", result.risk_score);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.summary);

    if !result.alerts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Alerts:");
        for alert in &result.alerts {
            let _ = writeln!(out, "  - {}", alert);
        }
    }
    out
}

fn report_text(report: &RuntimeReport) -> String {
    let mut out = result_text(&report.report.result);

    if !report.report.findings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Evidence:");
        for finding in &report.report.findings {
            let _ = writeln!(
                out,
                "  [{}] {} (section {}, bytes {}..{})",
                finding.severity,
                finding.category,
                finding.segment_index + 1,
                finding.evidence.start,
                finding.evidence.end
            );
            let _ = writeln!(out, "      \"{}\"", finding.evidence.quote);
        }
    }

    let _ = writeln!(out);
    let _ = write!(
        out,
        "Sections: {}  Confidence: {:.2}  Backend: {}",
        report.report.segment_count, report.report.confidence, report.backend
    );
    if report.fell_back {
        let _ = write!(out, " (fallback)");
    }
    let _ = writeln!(out);
    out
}
