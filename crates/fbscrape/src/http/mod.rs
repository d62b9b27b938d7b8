//! HTTP/cache layer: fetch page markup with session cookies and a response cache.
//!
//! Pipelines depend on the [`PageSource`] trait rather than on [`Fetcher`]
//! directly, so they can run against fixture markup in tests.

pub mod cache;
pub mod client;

pub use cache::ResponseCache;
pub use client::{HttpClient, HttpResponse};

use crate::config::ScraperConfig;
use crate::error::{ScrapeError, ScrapeResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Anything that can turn a URL into page markup.
#[async_trait]
pub trait PageSource: Send {
    /// Fetch a page, serving it from cache when allowed.
    async fn fetch(&mut self, url: &str) -> ScrapeResult<String>;

    /// Fetch a page from the network even if a cached copy is fresh.
    async fn fetch_fresh(&mut self, url: &str) -> ScrapeResult<String>;
}

/// Network-backed page source: HTTP client plus response cache.
pub struct Fetcher {
    client: HttpClient,
    cache: ResponseCache,
    session_id: String,
}

impl Fetcher {
    pub fn new(config: &ScraperConfig) -> ScrapeResult<Self> {
        let client = HttpClient::new(&config.session, config.timeout_ms)?;
        let cache = if config.cache.is_enabled() {
            ResponseCache::open(config.cache_dir.clone(), config.cache)?
        } else {
            ResponseCache::disabled()
        };
        Ok(Self::with_parts(client, cache, config.session.user_id()))
    }

    pub fn with_parts(client: HttpClient, cache: ResponseCache, session_id: &str) -> Self {
        Self {
            client,
            cache,
            session_id: session_id.to_string(),
        }
    }

    async fn download(&mut self, url: &str) -> ScrapeResult<String> {
        let resp = self.client.get(url).await?;
        tracing::debug!(status = resp.status, final_url = %resp.final_url, "fetched {url}");
        if let Err(e) = self.cache.put(url, &self.session_id, &resp.body) {
            tracing::warn!("failed to cache {url}: {e}");
        }
        Ok(resp.body)
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch(&mut self, url: &str) -> ScrapeResult<String> {
        if let Some(body) = self.cache.get(url, &self.session_id) {
            tracing::debug!("cache hit: {url}");
            return Ok(body);
        }
        self.download(url).await
    }

    async fn fetch_fresh(&mut self, url: &str) -> ScrapeResult<String> {
        self.download(url).await
    }
}

/// Page source backed by saved markup, keyed by absolute URL.
///
/// Unknown URLs fail with [`ScrapeError::FetchFailed`], like a 404 would.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    pages: HashMap<String, String>,
    requested: Vec<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.insert(url, markup);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, markup: impl Into<String>) {
        self.pages.insert(url.into(), markup.into());
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

#[async_trait]
impl PageSource for MemorySource {
    async fn fetch(&mut self, url: &str) -> ScrapeResult<String> {
        self.requested.push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::FetchFailed {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            })
    }

    async fn fetch_fresh(&mut self, url: &str) -> ScrapeResult<String> {
        self.fetch(url).await
    }
}
