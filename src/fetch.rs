//! Article text retrieval for items that arrive with a link but no text.
//!
//! Uses reqwest for fetching and scraper for HTML parsing. Failures never
//! propagate into the batch: the item keeps its empty text.

use crate::item::SectionBatch;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// User-Agent string identifying this fetcher
const USER_AGENT: &str = concat!("daybrief/", env!("CARGO_PKG_VERSION"));

/// Default timeout for HTTP requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Extracted text at or below this length counts as no text
const MIN_ARTICLE_CHARS: usize = 100;

/// Paragraphs shorter than this are navigation, captions and the like
const MIN_PARAGRAPH_CHARS: usize = 20;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch URL: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no article text found at URL")]
    NoContent,
}

pub struct ArticleFetcher {
    client: Client,
}

impl ArticleFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a page and extract its readable text
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let text = extract_article_text(&html);
        if text.chars().count() <= MIN_ARTICLE_CHARS {
            return Err(FetchError::NoContent);
        }
        Ok(text)
    }

    /// Fill `raw_text` for every item that has a `link` extra and no text.
    /// Returns how many items were filled.
    pub async fn fill_missing_text(&self, batch: &mut SectionBatch) -> usize {
        let mut filled = 0;
        for (section, items) in batch.iter_mut() {
            for item in items.iter_mut().filter(|item| !item.has_text()) {
                let Some(link) = item.extra_str("link").map(str::to_string) else {
                    continue;
                };
                match self.fetch_text(&link).await {
                    Ok(text) => {
                        debug!(section = %section, chars = text.len(), url = %link, "Article text extracted");
                        item.raw_text = text;
                        filled += 1;
                    }
                    Err(e) => warn!(section = %section, url = %link, error = %e, "Failed to extract article text"),
                }
            }
        }
        info!(filled, "Article text retrieval complete");
        filled
    }
}

/// Extract readable text from an HTML page, preferring its main content area
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let main_selectors = ["article", "main", "[role='main']", ".content", "#content"];

    for selector_str in main_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = paragraph_text(&Html::parse_fragment(&element.html()));
                if !text.trim().is_empty() {
                    return text;
                }
            }
        }
    }

    // Fall back to paragraphs anywhere in the body
    paragraph_text(&document)
}

/// Text of paragraphs and list items, whitespace-normalized, one per line
fn paragraph_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("p, li") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|element| {
            element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|paragraph| paragraph.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect::<Vec<_>>()
        .join("\n")
}
