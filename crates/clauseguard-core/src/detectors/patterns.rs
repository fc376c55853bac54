//! Shared text patterns.
//!
//! Fact patterns (durations, amounts) used by the responder to recognise
//! sentences that carry the kind of fact a question asks for, plus text
//! normalisation and fact-checking helpers shared with the runtime's
//! grounding checks.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    /// A period of time: "14 days", "thirty (30) days", "12-month", "one year"
    pub static ref DURATION_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:\d+|one|two|three|four|five|six|seven|eight|nine|ten|fourteen|thirty|sixty|ninety)(?:\s*\(\d+\))?[\s-]*(?:business\s+|calendar\s+)?(?:hours?|days?|weeks?|months?|years?)\b"
    ).unwrap();

    /// A monetary amount: "$9.99", "USD 100", "50 euros", "€20"
    pub static ref MONEY_PATTERN: Regex = Regex::new(
        r"(?i)(?:[$€£]\s?\d[\d,]*(?:\.\d+)?|\b(?:usd|eur|gbp)\s?\d[\d,]*(?:\.\d+)?|\b\d[\d,]*(?:\.\d+)?\s?(?:dollars|euros|pounds|usd|eur|gbp)\b)"
    ).unwrap();

    /// A quoted fragment, with straight or typographic quotes.
    pub static ref QUOTED_PATTERN: Regex = Regex::new(r#""([^"]+)"|“([^”]+)”"#).unwrap();

    static ref NUMBER: Regex = Regex::new(r"\d+(?:[.,]\d+)*").unwrap();
}

/// First duration mentioned in `text`, if any.
pub fn find_duration(text: &str) -> Option<&str> {
    DURATION_PATTERN.find(text).map(|m| m.as_str())
}

/// First monetary amount mentioned in `text`, if any.
pub fn find_money(text: &str) -> Option<&str> {
    MONEY_PATTERN.find(text).map(|m| m.as_str())
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise text for containment checks: whitespace collapsed, lowercase,
/// and typographic quotes/apostrophes folded to ASCII.
pub fn normalize_for_match(s: &str) -> String {
    let folded: String = s
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect();
    normalize_whitespace(&folded).to_lowercase()
}

/// Whether `fragment` occurs in `source`, ignoring case and whitespace layout.
pub fn appears_in(fragment: &str, source: &str) -> bool {
    let fragment = normalize_for_match(fragment);
    !fragment.is_empty() && normalize_for_match(source).contains(&fragment)
}

/// `text` with every quoted fragment blanked out.
pub fn unquoted(text: &str) -> String {
    QUOTED_PATTERN.replace_all(text, " ").into_owned()
}

fn numbers(text: &str) -> HashSet<String> {
    NUMBER
        .find_iter(text)
        .map(|m| m.as_str().replace(',', ""))
        .collect()
}

/// The first duration, amount or number stated in `claim` that `source`
/// does not state.
///
/// A duration or amount is supported when it occurs in the source as
/// written, or when every number in it occurs there ("14-day" against
/// "14 days"). Spelled-out durations must occur as written.
pub fn unsupported_fact(claim: &str, source: &str) -> Option<String> {
    let known = numbers(source);

    for m in DURATION_PATTERN
        .find_iter(claim)
        .chain(MONEY_PATTERN.find_iter(claim))
    {
        let stated = numbers(m.as_str());
        let supported =
            appears_in(m.as_str(), source) || (!stated.is_empty() && stated.is_subset(&known));
        if !supported {
            return Some(normalize_whitespace(m.as_str()));
        }
    }

    NUMBER
        .find_iter(claim)
        .map(|m| m.as_str())
        .find(|n| !known.contains(&n.replace(',', "")))
        .map(str::to_string)
}
