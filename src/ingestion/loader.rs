//! Web page loader with CSS-selector scoping.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use super::cache::PageCache;
use crate::types::{Document, RagError};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Fetches a web page and extracts a plain-text [`Document`].
///
/// Extraction can be restricted to a CSS selector list (for example
/// `".post-content, .post-title, .post-header"`); the default scope is the
/// whole `body`. Malformed HTML yields a partial or empty document rather
/// than an error; only fetch failures abort.
#[derive(Clone, Debug)]
pub struct PageLoader {
    client: Client,
    selector: Option<String>,
    cache: Option<PageCache>,
}

impl PageLoader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            selector: None,
            cache: None,
        }
    }

    /// Restricts extraction to elements matching a CSS selector list.
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Serves repeated loads of the same URL from disk.
    #[must_use]
    pub fn with_cache(mut self, cache: PageCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Fetches `url` and returns its extracted text with provenance metadata.
    pub async fn load(&self, url: &Url) -> Result<Document, RagError> {
        let html = self.fetch(url).await?;
        let text = extract_text(&html, self.selector.as_deref())?;
        info!(
            url = %url,
            bytes = html.len(),
            chars = text.chars().count(),
            "loaded document"
        );

        let mut document = Document::new(text).with_metadata("source", url.as_str());
        if let Some(selector) = &self.selector {
            document = document.with_metadata("selector", selector.clone());
        }
        Ok(document)
    }

    async fn fetch(&self, url: &Url) -> Result<String, RagError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.load(url).await? {
                info!(url = %url, "serving page from cache");
                return Ok(cached);
            }
        }
        let html = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        if let Some(cache) = &self.cache {
            cache.store(url, &html).await?;
        }
        Ok(html)
    }
}

/// Extracts text from `html`, scoped to `selector` when given.
///
/// Text nodes are joined with single spaces and runs of whitespace are
/// collapsed, mirroring what a browser-visible rendering of the scoped
/// elements reads like.
pub fn extract_text(html: &str, selector: Option<&str>) -> Result<String, RagError> {
    let scope = selector.unwrap_or("body");
    let parsed =
        Selector::parse(scope).map_err(|err| RagError::InvalidDocument(err.to_string()))?;
    let document = Html::parse_document(html);

    let mut parts: Vec<String> = Vec::new();
    for element in document.select(&parsed) {
        let text = element.text().collect::<Vec<_>>().join(" ");
        let text = WHITESPACE.replace_all(text.trim(), " ").into_owned();
        if !text.is_empty() {
            parts.push(text);
        }
    }
    Ok(parts.join("\n\n"))
}
