//! System prompts for the LLM backend.
//!
//! The system prompts are static so they can be cached by the provider; the
//! document or context always goes in the user message.
//!
//! Whatever the model answers, the grounding validator decides whether it is
//! used. The prompts only make acceptance likely.

use crate::providers::ChatMessage;
use clauseguard_core::HEDGE_ANSWER;

/// System prompt for document analysis.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"
You review Terms-and-Conditions documents for a consumer.

Your role is to locate clauses that fall into a fixed set of risk categories
and to quote them. You do not give legal advice. You do not invent clauses.

## Risk Categories (use these names exactly)
- BindingArbitration: disputes go to binding arbitration or the user waives a jury trial
- ClassActionWaiver: the user may not bring or join class actions
- DataSharing: personal data is shared with or sold to third parties
- ContentLicensing: the provider takes a broad license over user content
- UnilateralChanges: the provider may change the terms, possibly without notice
- AutoRenewal: subscriptions renew automatically or cancellation is restricted
- LiabilityLimitation: warranties are disclaimed or liability is capped
- AccountTermination: the account can be suspended or terminated at the provider's discretion
- Indemnification: the user must cover the provider's losses or legal costs
- NonRefundable: payments are non-refundable
- DataRetention: data is tracked or retained, including after deletion

## Rules
1. Report a category only if a clause in the document supports it
2. Every alert carries a quote copied exactly from the document
3. Anything you put in double quotes in the summary must be copied exactly from the document
4. Report each category at most once
5. risk_score is the highest severity among your alerts, or Low if there are none

## Output Format (JSON only, no prose around it)
{
  "summary": "two to four sentences on what the document covers and its most material terms",
  "risk_score": "Low" | "Medium" | "High",
  "alerts": [
    {
      "category": "one of the category names above",
      "quote": "exact text from the document"
    }
  ]
}
"#;

/// System prompt for follow-up questions.
pub const CHAT_SYSTEM_PROMPT: &str = r#"
You answer questions about a Terms-and-Conditions document.

## Rules
1. Use only the context you are given. You have no other documents.
2. Support your answer with at least one quote copied exactly from the context, in double quotes
3. If the context does not answer the question, reply with exactly:
   The document does not specify this.
4. Never guess numbers, dates, prices or durations that the context does not state
5. Keep the answer to a few sentences
"#;

/// Messages for analysing `document`, truncated to `max_chars` characters.
pub fn build_analysis_messages(document: &str, max_chars: usize) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "## Document\n{}\n\nReturn the JSON analysis.",
            truncate_chars(document, max_chars)
        )),
    ]
}

/// Messages for answering `question` from `context`.
pub fn build_chat_messages(question: &str, context: &str, max_chars: usize) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CHAT_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "## Context\n{}\n\n## Question\n{}",
            truncate_chars(context, max_chars),
            question.trim()
        )),
    ]
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
