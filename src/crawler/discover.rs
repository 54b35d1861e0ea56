//! Listing Discoverer
//!
//! Fetches the forum's listing page once and returns the thread URLs it
//! links to, canonicalized, deduplicated and in page order.

use crate::backend::{OutputFormat, ScrapeRequest, ScrapedPage};
use crate::crawler::parser::{extract_anchor_links, extract_markdown_links};
use crate::crawler::throttle::ThrottledFetcher;
use crate::url::{dedup_preserve_order, resolve_link, ThreadUrlMatcher};
use url::Url;

/// Formats requested for the listing page
const LISTING_FORMATS: &[OutputFormat] = &[
    OutputFormat::RawHtml,
    OutputFormat::Markdown,
    OutputFormat::Links,
];

/// Finds thread URLs on a listing page
#[derive(Debug, Clone)]
pub struct ListingDiscoverer {
    listing_url: Url,
    matcher: ThreadUrlMatcher,
    limit: Option<usize>,
}

impl ListingDiscoverer {
    /// Creates a discoverer for `listing_url`
    ///
    /// `limit` caps the number of URLs returned; None means unbounded.
    pub fn new(listing_url: Url, matcher: ThreadUrlMatcher, limit: Option<usize>) -> Self {
        Self {
            listing_url,
            matcher,
            limit,
        }
    }

    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// Fetches the listing page and returns its thread URLs
    ///
    /// A failed fetch or a page without usable content yields an empty list;
    /// the failure is logged, never returned.
    pub async fn discover(&self, fetcher: &mut ThrottledFetcher) -> Vec<Url> {
        tracing::info!("Crawling listing page: {}", self.listing_url);

        let request = ScrapeRequest::new(self.listing_url.as_str(), LISTING_FORMATS);
        let page = match fetcher.fetch(&request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Discovery failed for {}: {}", self.listing_url, e);
                return Vec::new();
            }
        };

        let candidates = self.candidate_links(&page);
        if candidates.is_empty() {
            tracing::warn!("No links found on listing page {}", self.listing_url);
        }

        let threads = self.select_threads(candidates);
        tracing::info!("Found {} unique thread links", threads.len());
        threads
    }

    /// Keeps thread links only, canonicalized, deduplicated and capped
    ///
    /// Order follows first appearance in `candidates`.
    pub fn select_threads<I>(&self, candidates: I) -> Vec<Url>
    where
        I: IntoIterator<Item = Url>,
    {
        let canonical = candidates
            .into_iter()
            .filter_map(|url| self.matcher.canonicalize(&url));

        let mut threads = dedup_preserve_order(canonical);
        if let Some(limit) = self.limit {
            threads.truncate(limit);
        }
        threads
    }

    /// Link targets from the richest format the backend returned
    fn candidate_links(&self, page: &ScrapedPage) -> Vec<Url> {
        if let Some(html) = page.html.as_deref() {
            return extract_anchor_links(html, &self.listing_url);
        }

        if let Some(markdown) = page.markdown.as_deref() {
            tracing::debug!("No HTML for listing page, scanning markdown links");
            return extract_markdown_links(markdown, &self.listing_url);
        }

        page.links
            .iter()
            .filter_map(|link| resolve_link(link, &self.listing_url))
            .collect()
    }
}
