//! Thread Extractor
//!
//! Turns one discovered thread URL into a [`Post`]: fetch the page in raw
//! HTML and markdown, run the field extractor over the HTML, and attach the
//! backend's markdown and metadata.

use crate::backend::{FetchError, OutputFormat, ScrapeRequest};
use crate::crawler::fields::{parse_thread, ThreadSelectors};
use crate::crawler::throttle::ThrottledFetcher;
use crate::output::Post;
use crate::url::ThreadUrlMatcher;
use thiserror::Error;
use url::Url;

/// Formats requested for every thread page
const THREAD_FORMATS: &[OutputFormat] = &[OutputFormat::RawHtml, OutputFormat::Markdown];

/// Why a thread was left out of the output
///
/// Every variant carries the thread URL so a failure can be logged and
/// reported on its own.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{url} is not a thread URL")]
    InvalidUrl { url: String },

    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("No HTML content returned for {url}")]
    NoHtml { url: String },

    #[error("Required field '{field}' not found on {url}")]
    MissingField { url: String, field: &'static str },
}

impl ExtractError {
    /// The thread URL this failure belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url }
            | Self::Fetch { url, .. }
            | Self::NoHtml { url }
            | Self::MissingField { url, .. } => url,
        }
    }
}

/// Extracts posts from thread pages of one forum
#[derive(Debug, Clone)]
pub struct ThreadExtractor {
    selectors: ThreadSelectors,
    matcher: ThreadUrlMatcher,
}

impl ThreadExtractor {
    pub fn new(selectors: ThreadSelectors, matcher: ThreadUrlMatcher) -> Self {
        Self { selectors, matcher }
    }

    /// Fetches and extracts a single thread
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The run's throttled fetcher
    /// * `url` - A thread URL produced by discovery
    ///
    /// # Returns
    ///
    /// * `Ok(Post)` - Every required field was found
    /// * `Err(ExtractError)` - The thread is skipped; the error names the URL
    pub async fn extract(
        &self,
        fetcher: &mut ThrottledFetcher,
        url: &Url,
    ) -> Result<Post, ExtractError> {
        let url_str = url.to_string();

        let id = self
            .matcher
            .thread_id(url)
            .ok_or_else(|| ExtractError::InvalidUrl {
                url: url_str.clone(),
            })?;

        tracing::debug!("Scraping thread {} ({})", id, url_str);

        let page = fetcher
            .fetch(&ScrapeRequest::new(url_str.as_str(), THREAD_FORMATS))
            .await
            .map_err(|source| ExtractError::Fetch {
                url: url_str.clone(),
                source,
            })?;

        let html = page.html.as_deref().ok_or_else(|| ExtractError::NoHtml {
            url: url_str.clone(),
        })?;

        let thread = parse_thread(html, &url_str, &self.selectors)?;

        if thread.has_more_pages {
            tracing::warn!(
                "{} has more reply pages; only the first {} replies were collected",
                url_str,
                thread.replies.len()
            );
        }

        Ok(Post {
            id,
            url: url_str,
            title: thread.title,
            author: thread.author,
            date: thread.date,
            content: thread.content,
            markdown_content: page.markdown.unwrap_or_default(),
            tags: thread.tags,
            replies: thread.replies,
            metadata: page.metadata,
        })
    }
}
