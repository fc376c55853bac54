//! Grounded responder.
//!
//! Answers questions by quoting the sentences of the supplied context that
//! best match the question. Nothing outside the context is ever stated: an
//! answer is either fixed framing around verbatim quotes, or the hedge.

use serde::{Deserialize, Serialize};

use crate::detectors::patterns::{
    appears_in, find_duration, find_money, normalize_whitespace, unquoted, unsupported_fact,
    QUOTED_PATTERN,
};
use crate::evidence::Evidence;
use crate::segment::sentences;

/// Returned when the context does not answer the question.
pub const HEDGE_ANSWER: &str = "The document does not specify this.";

/// Share of question keywords a sentence must cover to be quoted.
pub const MIN_KEYWORD_OVERLAP: f64 = 0.34;

/// Shortest quoted fragment that counts as evidence.
pub const MIN_QUOTE_CHARS: usize = 12;

const STOPWORDS: &[&str] = &[
    "a", "about", "all", "am", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by",
    "can", "could", "did", "do", "does", "for", "from", "get", "had", "has", "have", "how", "i",
    "if", "in", "into", "is", "it", "its", "long", "many", "may", "me", "might", "much", "must",
    "my", "of", "on", "or", "our", "shall", "should", "so", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "to", "us", "was", "we", "were", "what",
    "when", "where", "which", "who", "whom", "why", "will", "with", "within", "would", "you",
    "your",
];

/// Words about the document itself rather than its content.
const META_WORDS: &[&str] = &[
    "agreement", "clause", "clauses", "condition", "conditions", "contract", "document", "explain",
    "mention", "mentions", "policy", "provision", "provisions", "regarding", "say", "says",
    "section", "sections", "state", "states", "tell", "terms",
];

const YES_NO_OPENERS: &[&str] = &[
    "am", "are", "can", "could", "did", "do", "does", "has", "have", "is", "may", "must", "should",
    "will", "would",
];


/// What kind of fact a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Duration,
    Amount,
    YesNo,
    Open,
}

impl QuestionKind {
    pub fn detect(question: &str) -> Self {
        let q = question.trim().to_lowercase();
        let first = q.split_whitespace().next().unwrap_or("");

        if q.contains("how long")
            || q.contains("how many days")
            || q.contains("how many months")
            || q.contains("deadline")
            || first == "when"
        {
            QuestionKind::Duration
        } else if q.contains("how much")
            || ["cost", "fee", "price", "charge"]
                .iter()
                .any(|w| q.contains(w))
        {
            QuestionKind::Amount
        } else if YES_NO_OPENERS.contains(&first) {
            QuestionKind::YesNo
        } else {
            QuestionKind::Open
        }
    }

    /// Whether `sentence` carries the kind of fact this question asks for.
    fn is_satisfied_by(&self, sentence: &str) -> bool {
        match self {
            QuestionKind::Duration => find_duration(sentence).is_some(),
            QuestionKind::Amount => find_money(sentence).is_some(),
            QuestionKind::YesNo | QuestionKind::Open => false,
        }
    }
}

/// A responder answer with the context spans it quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub kind: QuestionKind,
    /// Quoted sentences, empty for the hedge
    pub evidence: Vec<Evidence>,
}

impl Answer {
    fn hedge(kind: QuestionKind) -> Self {
        Self {
            text: HEDGE_ANSWER.to_string(),
            kind,
            evidence: Vec::new(),
        }
    }

    pub fn is_hedge(&self) -> bool {
        self.evidence.is_empty()
    }
}

struct Candidate {
    start: usize,
    end: usize,
    score: f64,
}

/// Extractive, context-bound question answering.
pub struct Responder;

impl Responder {
    pub fn new() -> Self {
        Self
    }

    /// Answer `question` from `context` alone.
    pub fn respond(&self, question: &str, context: &str) -> Answer {
        let kind = QuestionKind::detect(question);
        let keywords = keywords(question);
        if keywords.is_empty() {
            tracing::debug!("Question has no content words, hedging");
            return Answer::hedge(kind);
        }

        let mut candidates: Vec<Candidate> = sentences(context)
            .into_iter()
            .filter_map(|span| {
                let sentence = span.slice(context);
                let tokens = tokens(sentence);
                let hits = keywords
                    .iter()
                    .filter(|k| tokens.iter().any(|t| stem_match(k, t)))
                    .count();
                let overlap = hits as f64 / keywords.len() as f64;
                if hits == 0 || overlap < MIN_KEYWORD_OVERLAP {
                    return None;
                }
                let bonus = if kind.is_satisfied_by(sentence) { 0.5 } else { 0.0 };
                Some(Candidate {
                    start: span.start,
                    end: span.end,
                    score: hits as f64 + bonus,
                })
            })
            .collect();

        if candidates.is_empty() {
            tracing::debug!(keywords = keywords.len(), "No sentence covers the question");
            return Answer::hedge(kind);
        }

        // Stable sort keeps document order among equal scores.
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        let best = &candidates[0];
        let mut chosen = vec![best];
        if let Some(runner_up) = candidates.get(1) {
            if runner_up.score >= best.score {
                chosen.push(runner_up);
            }
        }
        chosen.sort_by_key(|c| c.start);

        let evidence: Vec<Evidence> = chosen
            .iter()
            .map(|c| Evidence::from_context(context, c.start, c.end))
            .collect();
        let text = render(kind, &evidence);

        Answer {
            text,
            kind,
            evidence,
        }
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

fn render(kind: QuestionKind, evidence: &[Evidence]) -> String {
    let opener = match kind {
        QuestionKind::YesNo => "The document addresses this:",
        _ => "According to the document:",
    };
    let mut text = format!("{} “{}”", opener, normalize_whitespace(&evidence[0].quote));
    for extra in &evidence[1..] {
        text.push_str(&format!(
            " It also states: “{}”",
            normalize_whitespace(&extra.quote)
        ));
    }
    text
}

/// Whether an answer stays within its context.
///
/// The hedge is always grounded. Any other answer must quote at least one
/// fragment of `MIN_QUOTE_CHARS` or more, every such fragment must occur in
/// the context, and the prose around the quotes must not state a number,
/// duration or amount the context does not.
pub fn is_grounded(answer: &str, context: &str) -> bool {
    let answer = answer.trim();
    if answer == HEDGE_ANSWER {
        return true;
    }

    if let Some(fact) = unsupported_fact(&unquoted(answer), context) {
        tracing::debug!(fact = %fact, "Answer states a fact missing from its context");
        return false;
    }

    let fragments: Vec<&str> = QUOTED_PATTERN
        .captures_iter(answer)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|f| f.chars().count() >= MIN_QUOTE_CHARS)
        .collect();

    !fragments.is_empty() && fragments.iter().all(|f| appears_in(f, context))
}

/// Content words of a question, stemmed and deduplicated.
fn keywords(question: &str) -> Vec<String> {
    let mut words: Vec<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 2)
        .filter(|w| !STOPWORDS.contains(&w.as_str()) && !META_WORDS.contains(&w.as_str()))
        .map(|w| depluralize(&w))
        .collect();
    words.sort();
    words.dedup();
    words
}

fn tokens(sentence: &str) -> Vec<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| depluralize(&w.to_lowercase()))
        .collect()
}

fn depluralize(word: &str) -> String {
    if word.chars().count() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Prefix stemming: "cancel" matches "cancellation", "refund" matches
/// "refundable".
fn stem_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let shared = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
    let shorter = a.chars().count().min(b.chars().count());
    shared >= 5 || (shared == shorter && shorter >= 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question: &str, context: &str) -> String {
        Responder::new().respond(question, context).text
    }

    #[test]
    fn test_duration_fact_is_surfaced() {
        let text = answer(
            "How long is the cancellation window?",
            "You may cancel within 14 days.",
        );
        assert!(text.contains("14 days"), "{}", text);
        assert_ne!(text, HEDGE_ANSWER);
    }

    #[test]
    fn test_missing_fact_is_hedged() {
        assert_eq!(
            answer("What is the arbitration clause?", "This service is free."),
            HEDGE_ANSWER
        );
    }

    #[test]
    fn test_meta_only_question_is_hedged() {
        assert_eq!(answer("What does this section say?", "Fees are billed monthly."), HEDGE_ANSWER);
    }

    #[test]
    fn test_duration_bonus_prefers_sentence_with_the_period() {
        let context = "Cancellation requests are handled by support. \
                       Cancellation is possible within 30 days of purchase.";
        let text = answer("How long do I have for cancellation?", context);
        assert!(text.contains("30 days"), "{}", text);
    }

    #[test]
    fn test_yes_no_question_quotes_the_clause() {
        let reply = Responder::new().respond("Can I get a refund?", "All fees are non-refundable.");
        assert_eq!(reply.kind, QuestionKind::YesNo);
        assert_eq!(
            reply.text,
            "The document addresses this: “All fees are non-refundable.”"
        );
        assert_eq!(reply.evidence[0].pointer(), "context[0:28]");
    }

    #[test]
    fn test_answers_are_grounded() {
        let context = "We may share your data with partners.\n\nYou can delete your account at any time.";
        for question in [
            "Do you share my data?",
            "Can I delete my account?",
            "What is the governing law?",
        ] {
            let text = answer(question, context);
            assert!(is_grounded(&text, context), "{}", text);
        }
    }

    #[test]
    fn test_question_kinds() {
        assert_eq!(QuestionKind::detect("How long is the trial?"), QuestionKind::Duration);
        assert_eq!(QuestionKind::detect("When does it renew?"), QuestionKind::Duration);
        assert_eq!(QuestionKind::detect("How much is the fee?"), QuestionKind::Amount);
        assert_eq!(QuestionKind::detect("Is my data sold?"), QuestionKind::YesNo);
        assert_eq!(QuestionKind::detect("Who owns my uploads?"), QuestionKind::Open);
    }

    #[test]
    fn test_is_grounded_rejects_invented_quotes() {
        let context = "Payments are processed monthly.";
        assert!(is_grounded(HEDGE_ANSWER, context));
        assert!(is_grounded("It says \"payments are processed monthly\".", context));
        assert!(!is_grounded("It says \"refunds are always available\".", context));
        assert!(!is_grounded("Refunds are available.", context));
        // Short quotes are not evidence on their own
        assert!(!is_grounded("Yes, \"monthly\".", context));
    }

    #[test]
    fn test_is_grounded_rejects_contradicting_prose() {
        let context = "You may cancel within 14 days of purchase.";
        assert!(!is_grounded(
            "You have 90 days to cancel. \"You may cancel within 14 days\"",
            context
        ));
        assert!(is_grounded(
            "You have 14 days to cancel. \"You may cancel within 14 days\"",
            context
        ));
    }

    #[test]
    fn test_own_answers_are_grounded() {
        let context = "Refunds are available within 14 days. A fee of $5 applies.";
        for question in ["How long do I have to get a refund?", "How much is the fee?"] {
            let reply = Responder::new().respond(question, context);
            assert!(is_grounded(&reply.text, context), "{}", reply.text);
        }
    }

    #[test]
    fn test_stem_match() {
        assert!(stem_match("cancellation", "cancel"));
        assert!(stem_match("refund", "refundable"));
        assert!(stem_match("terminate", "termination"));
        assert!(!stem_match("data", "date"));
        assert!(!stem_match("use", "user"));
    }

    #[test]
    fn test_keywords_drop_stopwords_and_meta_words() {
        assert_eq!(
            keywords("What does the arbitration clause say about fees?"),
            vec!["arbitration".to_string(), "fee".to_string()]
        );
    }
}
