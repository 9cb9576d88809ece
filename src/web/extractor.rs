//! Page content extraction.
//!
//! Tries an ordered list of content-bearing selectors and keeps the first
//! whose collapsed text is substantial enough, falling back to whole-body
//! text. Parsing stays inside sync helpers — `scraper::Html` is not `Send`,
//! so nothing here may be held across an await point.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::rag::chunker::normalize_whitespace;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Tried in order; first substantial match wins.
    pub selectors: Vec<String>,
    /// A selector's text must exceed this many characters to qualify.
    pub min_selector_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            selectors: vec![
                "main".to_string(),
                "article".to_string(),
                "#content".to_string(),
                ".content".to_string(),
                "#main-content".to_string(),
            ],
            min_selector_chars: 120,
        }
    }
}

pub struct ContentExtractor {
    config: ExtractionConfig,
}

impl ContentExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Extracts the primary textual content from rendered HTML.
    pub fn extract_text(&self, html: &str) -> String {
        let doc = Html::parse_document(html);

        for raw in &self.config.selectors {
            let Ok(selector) = Selector::parse(raw) else {
                tracing::warn!(selector = %raw, "skipping unparseable content selector");
                continue;
            };
            if let Some(element) = doc.select(&selector).next() {
                let text = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
                if text.chars().count() > self.config.min_selector_chars {
                    return text;
                }
            }
        }

        body_text(&doc)
    }
}

fn body_text(doc: &Html) -> String {
    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };
    match doc.select(&body).next() {
        Some(element) => normalize_whitespace(&element.text().collect::<Vec<_>>().join(" ")),
        None => String::new(),
    }
}

/// Collects outbound anchor targets, resolved against the page's own
/// (post-redirect) location.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    doc.select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .collect()
}
