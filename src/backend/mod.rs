//! Scraping backend abstraction
//!
//! The crawler never talks HTTP to the forum itself. Every page is retrieved
//! through a [`FetchBackend`], which returns rendered HTML and/or markdown
//! plus whatever metadata the service attaches. [`FirecrawlBackend`] is the
//! production implementation; tests substitute in-memory fakes.

mod firecrawl;

#[cfg(test)]
pub(crate) mod fake;

pub use firecrawl::{build_http_client, FirecrawlBackend};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Content formats a backend can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputFormat {
    /// The page HTML exactly as served
    RawHtml,
    Markdown,
    Links,
}

/// A single page request
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub url: String,
    pub formats: Vec<OutputFormat>,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>, formats: &[OutputFormat]) -> Self {
        Self {
            url: url.into(),
            formats: formats.to_vec(),
        }
    }
}

/// Content returned by a backend for one page
#[derive(Debug, Clone, Default)]
pub struct ScrapedPage {
    pub html: Option<String>,
    pub markdown: Option<String>,
    pub links: Vec<String>,
    /// Opaque metadata, passed through to the output untouched
    pub metadata: Map<String, Value>,
}

/// Errors reported by a fetch backend
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} from backend for {url}")]
    Status { url: String, status: u16 },

    #[error("Backend rate limit hit for {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("Backend failed to scrape {url}: {message}")]
    Backend { url: String, message: String },

    #[error("Malformed backend response for {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. }
            | Self::Status { .. }
            | Self::RateLimited { .. }
            | Self::Backend { .. } => true,
            Self::Decode { .. } => false,
        }
    }

    /// Minimum wait the backend asked for before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Retrieves rendered page content on the crawler's behalf
#[async_trait]
pub trait FetchBackend: Send + Sync {
    /// Fetches one page in the requested formats
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapedPage, FetchError>;
}

#[async_trait]
impl<T: FetchBackend + ?Sized> FetchBackend for Arc<T> {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapedPage, FetchError> {
        (**self).scrape(request).await
    }
}
