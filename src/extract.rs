//! Markup → dense plain text.
//!
//! Two passes: every visible text node joined by single spaces, then a
//! readability pass that keeps only the article-like part of the page. The
//! article subtree is joined with the same single-space rule, so both passes
//! tokenize text identically. The article text wins when it has any text;
//! otherwise the joined text is returned as-is.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node};
use tracing::debug;
use url::Url;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Readability resolves relative links against a base; nothing here uses them.
const READABILITY_BASE: &str = "http://localhost/";

/// Extract plain text from raw markup. Never fails; no content → empty string.
pub fn extract(raw_markup: &str) -> String {
    if raw_markup.trim().is_empty() {
        return String::new();
    }

    let visible = visible_text(raw_markup);
    match main_content(raw_markup) {
        Some(article) => {
            debug!(
                visible_chars = visible.chars().count(),
                article_chars = article.chars().count(),
                "boilerplate pass kept article text"
            );
            article
        }
        None => visible,
    }
}

/// All visible text nodes, each trimmed, joined with single spaces.
pub fn visible_text(raw_markup: &str) -> String {
    let document = Html::parse_document(raw_markup);
    let mut parts = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

/// Visible text of the article subtree readability picks, whitespace collapsed.
/// `None` when the heuristic finds nothing.
fn main_content(raw_markup: &str) -> Option<String> {
    let base = Url::parse(READABILITY_BASE).ok()?;
    let product = match readability::extractor::extract(&mut raw_markup.as_bytes(), &base) {
        Ok(product) => product,
        Err(e) => {
            debug!(error = ?e, "readability pass failed");
            return None;
        }
    };

    let text = collapse_whitespace(&visible_text(&product.content));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s, " ").trim().to_string()
}
