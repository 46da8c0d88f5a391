use clap::ValueEnum;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html};
use std::time::Duration;

use crate::error::{AppError, Result};

const MINIMAL_BLOCK_LIST: &[&str] = &["script", "style"];
const AGGRESSIVE_BLOCK_LIST: &[&str] = &["script", "style", "img", "picture", "video"];

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            Client::new()
        })
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractionKind {
    /// Drop scripts and styles only
    Minimal,
    /// Also drop images, pictures and videos
    Aggressive,
}

/// Tag names whose elements (and everything inside them) never reach the extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPolicy {
    blocked: Vec<String>,
}

impl ExtractionPolicy {
    pub fn minimal() -> Self {
        Self::from_kind(ExtractionKind::Minimal)
    }

    pub fn aggressive() -> Self {
        Self::from_kind(ExtractionKind::Aggressive)
    }

    pub fn from_kind(kind: ExtractionKind) -> Self {
        let tags = match kind {
            ExtractionKind::Minimal => MINIMAL_BLOCK_LIST,
            ExtractionKind::Aggressive => AGGRESSIVE_BLOCK_LIST,
        };
        ExtractionPolicy {
            blocked: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn with_extra_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref().trim().to_ascii_lowercase();
            if !tag.is_empty() && !self.blocked.contains(&tag) {
                self.blocked.push(tag);
            }
        }
        self
    }

    pub fn blocks(&self, tag: &str) -> bool {
        self.blocked.iter().any(|b| b.eq_ignore_ascii_case(tag))
    }

    pub fn tags(&self) -> &[String] {
        &self.blocked
    }
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self::aggressive()
    }
}

pub async fn fetch_html(url: &str) -> Result<String> {
    let response = CLIENT.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        // Non-2xx pages are still summarised, only flagged.
        tracing::warn!(site = url, %status, "site answered with a non-success status");
    }

    response
        .text()
        .await
        .map_err(|e| AppError::ParseError(format!("Failed to read body: {e}")))
}

/// Fetch `url` and return its visible text, logging any failure before handing it back.
pub async fn scrape_site(url: &str, policy: &ExtractionPolicy) -> Result<String> {
    tracing::info!(site = url, "fetching site");

    let html = match fetch_html(url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(site = url, error = %e, "Failed to get site");
            return Err(e);
        }
    };

    let text = extract_text(&html, policy);
    tracing::info!(site = url, chars = text.chars().count(), "site text extracted");
    tracing::debug!(text = %text, "site text");
    Ok(text)
}

pub fn extract_text(html: &str, policy: &ExtractionPolicy) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::with_capacity(html.len() / 2);
    let mut removed = 0usize;
    collect_text(document.root_element(), policy, &mut raw, &mut removed);

    if removed > 0 {
        tracing::info!(removed, "removed non-text elements");
    }

    normalize_whitespace(&raw)
}

enum Pending<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

// Explicit stack: pages can nest far deeper than the call stack allows.
fn collect_text(root: ElementRef<'_>, policy: &ExtractionPolicy, out: &mut String, removed: &mut usize) {
    let mut stack = vec![Pending::Element(root)];

    while let Some(item) = stack.pop() {
        let element = match item {
            Pending::Text(text) => {
                out.push_str(text);
                continue;
            }
            Pending::Element(element) => element,
        };

        let name = element.value().name();
        if policy.blocks(name) {
            tracing::debug!(tag = name, "removing element");
            *removed += 1;
            continue;
        }

        for child in element.children().rev() {
            if let Some(text) = child.value().as_text() {
                stack.push(Pending::Text(&text[..]));
            } else if let Some(child_element) = ElementRef::wrap(child) {
                stack.push(Pending::Element(child_element));
            }
        }
    }
}

/// Collapse every whitespace run (newlines included) into one space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for word in text.split_whitespace() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(word);
    }

    result
}
