//! Document segmentation.
//!
//! Splits a document into clause-sized segments (paragraphs and numbered
//! sections) and segments into sentences. Both splitters are pure functions
//! of their input: identical text always yields identical boundaries.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Paragraphs longer than this are split further on sentence boundaries.
pub const MAX_SEGMENT_CHARS: usize = 1200;

/// Longest line still treated as a section heading.
const MAX_HEADING_CHARS: usize = 100;

lazy_static! {
    /// Numbered or lettered section starts: `1.`, `4.2`, `(a)`, `Section 7`, `ARTICLE II:`
    static ref NUMBERED_HEADING: Regex = Regex::new(
        r"^\s*(?:\d{1,3}(?:\.\d{1,3})*[.)]|\d{1,3}(?:\.\d{1,3})+|\([a-zA-Z0-9]{1,4}\)|(?i:section|article)\s+[0-9IVXLCivxlc]+[.:]?)\s+\S"
    ).unwrap();

    /// Bullet or list item at the start of a line.
    static ref LIST_ITEM: Regex = Regex::new(
        r"^[ \t]*(?:[-*•]|\d{1,3}[.)]|\([a-zA-Z0-9]{1,3}\))\s"
    ).unwrap();
}

const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "inc", "ltd", "co", "corp", "llc", "u.s", "no", "vs", "mr", "mrs", "ms",
    "dr", "st", "art", "sec", "para",
];

/// A byte range within a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A contiguous clause or section of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,

    /// Byte offset of the segment in the document
    pub start: usize,

    /// Byte offset of the segment end (exclusive)
    pub end: usize,

    /// The section heading this segment sits under, if any
    pub heading: Option<String>,

    pub text: String,
}

/// Split a document into segments.
///
/// Blank lines and heading lines start new segments. A heading that stands
/// alone is carried over to the segment that follows it.
pub fn segment(document: &str) -> Vec<Segment> {
    let mut blocks: Vec<(Span, Option<String>)> = Vec::new();
    let mut pending_heading: Option<String> = None;
    let mut current: Option<Span> = None;
    let mut current_heading: Option<String> = None;
    let mut current_has_body = false;

    let mut offset = 0;
    for line in document.split_inclusive('\n') {
        let line_start = offset;
        let line_end = offset + line.len();
        offset = line_end;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush_block(
                &mut current,
                &mut current_heading,
                current_has_body,
                &mut pending_heading,
                &mut blocks,
            );
            current_has_body = false;
            continue;
        }

        if is_heading_line(trimmed) {
            flush_block(
                &mut current,
                &mut current_heading,
                current_has_body,
                &mut pending_heading,
                &mut blocks,
            );
            pending_heading = None;
            current = Some(Span { start: line_start, end: line_end });
            current_heading = heading_text(trimmed);
            current_has_body = !is_bare_heading(trimmed);
            continue;
        }

        match current.as_mut() {
            Some(span) => span.end = line_end,
            None => {
                current = Some(Span { start: line_start, end: line_end });
                current_heading = pending_heading.take();
            }
        }
        current_has_body = true;
    }
    flush_block(
        &mut current,
        &mut current_heading,
        current_has_body,
        &mut pending_heading,
        &mut blocks,
    );

    let mut segments = Vec::new();
    for (span, heading) in blocks {
        for piece in split_long(document, span) {
            if let Some(trimmed) = trim_span(document, piece) {
                segments.push(Segment {
                    index: segments.len(),
                    start: trimmed.start,
                    end: trimmed.end,
                    heading: heading.clone(),
                    text: trimmed.slice(document).to_string(),
                });
            }
        }
    }

    // A document made only of headings still gets analysed as a whole.
    if segments.is_empty() {
        if let Some(whole) = trim_span(document, Span { start: 0, end: document.len() }) {
            segments.push(Segment {
                index: 0,
                start: whole.start,
                end: whole.end,
                heading: None,
                text: whole.slice(document).to_string(),
            });
        }
    }

    segments
}

fn flush_block(
    current: &mut Option<Span>,
    current_heading: &mut Option<String>,
    has_body: bool,
    pending_heading: &mut Option<String>,
    blocks: &mut Vec<(Span, Option<String>)>,
) {
    let Some(span) = current.take() else {
        return;
    };
    let heading = current_heading.take();
    if has_body {
        blocks.push((span, heading));
    } else {
        *pending_heading = heading;
    }
}

fn is_heading_line(line: &str) -> bool {
    NUMBERED_HEADING.is_match(line) || is_caps_heading(line)
}

/// A heading line with no clause text after it, e.g. `12. GOVERNING LAW`.
fn is_bare_heading(line: &str) -> bool {
    if is_caps_heading(line) {
        return true;
    }
    let chars = line.chars().count();
    chars <= 60 && !line.ends_with(['.', ';', ':']) && line.split_whitespace().count() <= 6
}

fn is_caps_heading(line: &str) -> bool {
    let chars = line.chars().count();
    if !(3..=80).contains(&chars) {
        return false;
    }
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
}

fn heading_text(line: &str) -> Option<String> {
    if line.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    Some(line.to_string())
}

fn split_long(document: &str, span: Span) -> Vec<Span> {
    let text = span.slice(document);
    if text.chars().count() <= MAX_SEGMENT_CHARS {
        return vec![span];
    }

    let mut pieces = Vec::new();
    let mut piece_start: Option<usize> = None;
    let mut piece_end = 0;

    for sentence in sentences(text) {
        if let Some(start) = piece_start {
            if text[start..sentence.end].chars().count() > MAX_SEGMENT_CHARS {
                pieces.push(Span {
                    start: span.start + start,
                    end: span.start + piece_end,
                });
                piece_start = None;
            }
        }
        if piece_start.is_none() {
            piece_start = Some(sentence.start);
        }
        piece_end = sentence.end;
    }
    if let Some(start) = piece_start {
        pieces.push(Span {
            start: span.start + start,
            end: span.start + piece_end,
        });
    }

    pieces
}

fn trim_span(text: &str, span: Span) -> Option<Span> {
    let slice = span.slice(text);
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return None;
    }
    Some(Span {
        start: span.start + leading,
        end: span.end - trailing,
    })
}

/// Split text into sentence spans.
///
/// Boundaries are terminal punctuation (`.`, `!`, `?`, `;`) followed by
/// whitespace, paragraph breaks, and line breaks before a list item.
/// Common abbreviations and initials do not end a sentence.
pub fn sentences(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|(_, n)| *n);
        let end = i + c.len_utf8();
        let boundary = match c {
            '\n' => matches!(next, Some('\n') | Some('\r')) || LIST_ITEM.is_match(&text[end..]),
            '!' | '?' | ';' => next.map_or(true, char::is_whitespace),
            '.' => next.map_or(true, char::is_whitespace) && !is_abbreviation(&text[start..i]),
            _ => false,
        };

        if boundary {
            if let Some(span) = trim_span(text, Span { start, end }) {
                spans.push(span);
            }
            start = end;
        }
    }

    if start < text.len() {
        if let Some(span) = trim_span(text, Span { start, end: text.len() }) {
            spans.push(span);
        }
    }

    spans
}

fn is_abbreviation(before_period: &str) -> bool {
    let token = before_period
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '"', '\'', '“']);

    let mut chars = token.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        // Initials like "J." in "J. Smith"
        return only.is_alphabetic() && only.is_uppercase();
    }

    let lower = token.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_segments() {
        let doc = "First paragraph here.\n\nSecond paragraph here.\n";
        let segments = segment(doc);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "First paragraph here.");
        assert_eq!(segments[1].text, "Second paragraph here.");
        assert_eq!(&doc[segments[1].start..segments[1].end], segments[1].text);
    }

    #[test]
    fn test_numbered_sections_split_without_blank_lines() {
        let doc = "1. Use of the service is permitted.\n2. Fees are billed monthly.\n3. We may end this agreement.";
        let segments = segment(doc);
        assert_eq!(segments.len(), 3);
        assert!(segments[1].text.starts_with("2. Fees"));
    }

    #[test]
    fn test_bare_heading_carries_to_next_segment() {
        let doc = "12. GOVERNING LAW\n\nThese terms are governed by the laws of Delaware.";
        let segments = segment(doc);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].heading.as_deref(), Some("12. GOVERNING LAW"));
        assert!(segments[0].text.starts_with("These terms"));
    }

    #[test]
    fn test_caps_heading_starts_segment() {
        let doc = "Intro text for the document.\nPRIVACY\nWe collect data.";
        let segments = segment(doc);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].heading.as_deref(), Some("PRIVACY"));
    }

    #[test]
    fn test_heading_only_document_is_single_segment() {
        let segments = segment("TERMS OF SERVICE");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "TERMS OF SERVICE");
    }

    #[test]
    fn test_long_paragraph_is_split() {
        let sentence = "This sentence is part of a very long paragraph of legal text. ";
        let doc = sentence.repeat(60);
        let segments = segment(&doc);
        assert!(segments.len() > 1);
        for s in &segments {
            assert!(s.text.chars().count() <= MAX_SEGMENT_CHARS);
            assert_eq!(&doc[s.start..s.end], s.text);
        }
    }

    #[test]
    fn test_segmentation_is_stable() {
        let doc = "1. A clause.\n\n2. Another clause; with parts.\n\nTrailing text.";
        assert_eq!(segment(doc), segment(doc));
    }

    #[test]
    fn test_sentences_split_on_terminal_punctuation() {
        let text = "You may cancel within 14 days. Fees apply! Really? Yes; indeed.";
        let parts: Vec<&str> = sentences(text).iter().map(|s| s.slice(text)).collect();
        assert_eq!(
            parts,
            vec!["You may cancel within 14 days.", "Fees apply!", "Really?", "Yes;", "indeed."]
        );
    }

    #[test]
    fn test_sentences_skip_abbreviations() {
        let text = "We use providers, e.g. payment processors. Acme Inc. is the operator.";
        let parts: Vec<&str> = sentences(text).iter().map(|s| s.slice(text)).collect();
        assert_eq!(
            parts,
            vec![
                "We use providers, e.g. payment processors.",
                "Acme Inc. is the operator."
            ]
        );
    }

    #[test]
    fn test_sentences_keep_decimals_together() {
        let text = "The fee is $9.99 per month.";
        assert_eq!(sentences(text).len(), 1);
    }

    #[test]
    fn test_sentences_break_before_list_items() {
        let text = "We collect:\n- your name\n- your email";
        assert_eq!(sentences(text).len(), 3);
    }
}
