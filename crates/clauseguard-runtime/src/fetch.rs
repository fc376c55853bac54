//! Content extraction: resolve a URL to the text of a terms page.
//!
//! Fetching uses reqwest with browser-like headers and a redirect limit.
//! Extraction uses scraper: boilerplate elements are skipped, a main-content
//! container is preferred over the whole body, and block elements become
//! paragraph breaks so the segmenter sees the page's structure.
//!
//! Only transient failures (transport errors, 5xx, 429) are retried, with
//! exponential backoff. A 4xx is reported on the first attempt.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use lazy_static::lazy_static;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::{ConfigError, FetchConfig};
use clauseguard_core::detectors::patterns::normalize_whitespace;

/// Why a URL could not be turned into document text.
///
/// Every variant is the caller's problem to fix (a different URL, or pasting
/// the text), so all of them map to a client error at the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FetchFailure {
    #[error("{}", with_detail("The URL could not be reached", .0))]
    Unreachable(Option<String>),

    #[error("{}", with_detail("The page was not found", .0))]
    NotFound(Option<String>),

    #[error("{}", with_detail("The URL did not return an HTML or text document", .0))]
    NonTextual(Option<String>),

    #[error("{}", with_detail("Access to the page was denied", .0))]
    Forbidden(Option<String>),

    #[error("{}", with_detail("No readable text could be extracted from the page", .0))]
    Empty(Option<String>),
}

fn with_detail(base: &str, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{} ({})", base, detail),
        None => base.to_string(),
    }
}

impl FetchFailure {
    /// Short machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Unreachable(_) => "unreachable",
            FetchFailure::NotFound(_) => "not_found",
            FetchFailure::NonTextual(_) => "non_textual",
            FetchFailure::Forbidden(_) => "forbidden",
            FetchFailure::Empty(_) => "empty",
        }
    }

    /// The diagnostic message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            FetchFailure::Unreachable(m)
            | FetchFailure::NotFound(m)
            | FetchFailure::NonTextual(m)
            | FetchFailure::Forbidden(m)
            | FetchFailure::Empty(m) => m.as_deref(),
        }
    }
}

/// Resolves a URL to extracted document text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String, FetchFailure>;
}

/// How a response body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    PlainText,
}

impl DocumentKind {
    /// Classify a `Content-Type` header value. A missing header is treated
    /// as HTML; anything else that is not HTML or plain text is rejected.
    pub fn from_content_type(content_type: Option<&str>) -> Option<Self> {
        let Some(content_type) = content_type else {
            return Some(DocumentKind::Html);
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Some(DocumentKind::Html),
            "text/plain" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// One failed attempt, with whether trying again could help.
#[derive(Debug)]
struct AttemptError {
    failure: FetchFailure,
    retryable: bool,
}

impl AttemptError {
    fn fatal(failure: FetchFailure) -> Self {
        Self {
            failure,
            retryable: false,
        }
    }

    fn from_status(status: StatusCode) -> Self {
        Self {
            failure: classify_status(status),
            retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn from_transport(error: reqwest::Error) -> Self {
        tracing::debug!(error = %error, "Fetch transport error");
        let (detail, retryable) = if error.is_timeout() {
            ("request timed out", true)
        } else if error.is_redirect() {
            ("too many redirects", false)
        } else if error.is_connect() {
            ("connection failed", true)
        } else {
            ("request failed", true)
        };
        Self {
            failure: FetchFailure::Unreachable(Some(detail.to_string())),
            retryable,
        }
    }
}

/// Map a non-success HTTP status to a fetch failure.
pub fn classify_status(status: StatusCode) -> FetchFailure {
    let detail = Some(format!("HTTP {}", status.as_u16()));
    match status.as_u16() {
        404 | 410 => FetchFailure::NotFound(detail),
        401 | 403 | 451 => FetchFailure::Forbidden(detail),
        _ => FetchFailure::Unreachable(detail),
    }
}

struct FetchedBody {
    kind: DocumentKind,
    text: String,
}

/// HTTP content extractor.
pub struct HttpExtractor {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpExtractor {
    pub fn new(config: FetchConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,text/plain;q=0.9,*/*;q=0.5",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedBody, AttemptError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(AttemptError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::from_status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let kind = DocumentKind::from_content_type(content_type.as_deref()).ok_or_else(|| {
            AttemptError::fatal(FetchFailure::NonTextual(content_type.clone()))
        })?;

        let max = self.config.max_body_bytes;
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(AttemptError::from_transport)?
        {
            let room = max - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!(%url, max_body_bytes = max, "Response body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedBody {
            kind,
            text: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<String, FetchFailure> {
        let url = parse_url(url)?;
        let target = &url;

        let fetched = (move || async move { self.fetch_once(target).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(self.config.retry_min_delay)
                    .with_max_times(self.config.max_retries),
            )
            .when(|e: &AttemptError| e.retryable)
            .notify(|e: &AttemptError, delay: Duration| {
                tracing::warn!(
                    url = %target,
                    failure = %e.failure,
                    delay = ?delay,
                    "Retrying fetch"
                );
            })
            .await
            .map_err(|e| e.failure)?;

        let text = match fetched.kind {
            DocumentKind::Html => extract_text(&fetched.text),
            DocumentKind::PlainText => tidy_plain_text(&fetched.text),
        };

        if text.is_empty() {
            return Err(FetchFailure::Empty(None));
        }

        tracing::info!(url = %url, chars = text.chars().count(), "Extracted document text");
        Ok(text)
    }
}

/// Parse and check a user-supplied URL. A missing scheme defaults to https.
pub fn parse_url(input: &str) -> Result<Url, FetchFailure> {
    let input = input.trim();
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| FetchFailure::Unreachable(Some(format!("invalid URL: {}", e))))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(FetchFailure::Unreachable(Some(
            "URL has no host".to_string(),
        ))),
        other => Err(FetchFailure::Unreachable(Some(format!(
            "unsupported URL scheme '{}'",
            other
        )))),
    }
}

lazy_static! {
    static ref CONTENT_SELECTORS: Vec<Selector> = [
        "main",
        "article",
        "[role='main']",
        "#terms",
        ".terms",
        "#content",
        ".content",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
    static ref BODY: Selector = Selector::parse("body").unwrap();
}

/// Elements whose text never belongs to the document.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "form", "iframe", "svg",
    "button", "template", "head",
];

/// Elements that start a new paragraph.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "main", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5",
    "h6", "table", "tr", "blockquote", "pre", "dd", "dt", "br", "hr",
];

/// Table cells: kept on their row's line, separated by a space.
const CELL_ELEMENTS: &[&str] = &["td", "th"];

/// Extract readable text from an HTML page.
///
/// Paragraphs are separated by blank lines; whitespace inside a paragraph
/// is collapsed.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = CONTENT_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())
        .or_else(|| document.select(&BODY).next())
        .unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    collect_text(root, &mut raw);
    tidy_paragraphs(raw.split('\n'))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                for c in text.chars() {
                    out.push(if c.is_whitespace() { ' ' } else { c });
                }
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let separator = if BLOCK_ELEMENTS.contains(&name) {
                    Some('\n')
                } else if CELL_ELEMENTS.contains(&name) {
                    Some(' ')
                } else {
                    None
                };
                out.extend(separator);
                collect_text(child_element, out);
                out.extend(separator);
            }
            _ => {}
        }
    }
}

fn tidy_plain_text(text: &str) -> String {
    let text = text.replace('\r', "");
    tidy_paragraphs(text.split("\n\n"))
}

fn tidy_paragraphs<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
