//! Crawler coordinator - run orchestration
//!
//! Sequences one run end to end:
//! - Discover thread URLs on the listing page
//! - Extract each thread in discovery order, one at a time
//! - Fold per-thread outcomes into a `CrawlResult`
//! - Write the artifact

use crate::backend::{FetchBackend, FirecrawlBackend};
use crate::config::Config;
use crate::crawler::discover::ListingDiscoverer;
use crate::crawler::extract::{ExtractError, ThreadExtractor};
use crate::crawler::fields::ThreadSelectors;
use crate::crawler::throttle::{RateLimiter, RetryPolicy, ThrottledFetcher};
use crate::output::{write_crawl_result, CrawlResult, Post, RunStats};
use crate::url::ThreadUrlMatcher;
use crate::TrawlError;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use url::Url;

/// Everything a run produced
#[derive(Debug)]
pub struct RunReport {
    /// The artifact contents
    pub result: CrawlResult,

    /// Threads left out, in discovery order
    pub failures: Vec<ExtractError>,

    pub stats: RunStats,
}

/// Main crawler coordinator structure
///
/// Owns all run state: the throttled fetcher (and with it the rate
/// limiter's last request time), the discoverer and the extractor.
pub struct Coordinator {
    config: Config,
    discoverer: ListingDiscoverer,
    extractor: ThreadExtractor,
    fetcher: ThrottledFetcher,
}

impl Coordinator {
    /// Creates a coordinator that fetches through `backend`
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    /// * `backend` - The fetch backend every request goes through
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(TrawlError)` - The listing URL, thread pattern or a selector is invalid
    pub fn new(config: Config, backend: Box<dyn FetchBackend>) -> Result<Self, TrawlError> {
        let listing_url = config.listing_url()?;
        let matcher = ThreadUrlMatcher::new(&config.forum.thread_pattern, &listing_url)?;
        let selectors = ThreadSelectors::compile(&config.selectors)?;

        let fetcher = ThrottledFetcher::new(
            backend,
            RateLimiter::new(config.crawler.min_delay()),
            RetryPolicy::new(config.crawler.max_attempts, config.crawler.backoff_base()),
        );

        Ok(Self {
            discoverer: ListingDiscoverer::new(
                listing_url,
                matcher.clone(),
                config.crawler.max_posts,
            ),
            extractor: ThreadExtractor::new(selectors, matcher),
            fetcher,
            config,
        })
    }

    /// Creates a coordinator backed by the Firecrawl API
    pub fn from_config(config: Config, api_key: String) -> Result<Self, TrawlError> {
        let backend = FirecrawlBackend::new(&config.backend, api_key)?;
        Self::new(config, Box::new(backend))
    }

    pub fn listing_url(&self) -> &Url {
        self.discoverer.listing_url()
    }

    /// Runs discovery only
    pub async fn discover(&mut self) -> Vec<Url> {
        self.discoverer.discover(&mut self.fetcher).await
    }

    /// Discovers and extracts every thread without writing anything
    pub async fn collect(&mut self) -> RunReport {
        let start_time = Instant::now();

        let urls = self.discover().await;
        if urls.is_empty() {
            tracing::warn!("No threads discovered; the artifact will contain no posts");
        }

        let total = urls.len();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, url) in urls.iter().enumerate() {
            let outcome = self.extractor.extract(&mut self.fetcher, url).await;

            match &outcome {
                Ok(post) => tracing::info!("Successfully scraped post: {} ({})", post.title, url),
                Err(e) => tracing::error!("Skipping {}: {}", e.url(), e),
            }
            tracing::info!("Processed {}/{} threads", idx + 1, total);

            outcomes.push(outcome);
        }

        let mut report = fold_outcomes(
            &self.config.forum.name,
            self.listing_url().as_str(),
            &Utc::now().to_rfc3339(),
            total,
            outcomes,
        );
        report.stats.elapsed = start_time.elapsed();
        report
    }

    /// Runs the whole crawl and writes the artifact
    ///
    /// Per-thread failures never abort the run; only the final write can.
    pub async fn run(&mut self) -> Result<RunReport, TrawlError> {
        tracing::info!("Starting crawl of {}", self.config.forum.name);

        let report = self.collect().await;
        let output_path = Path::new(&self.config.output.json_path);

        if let Err(e) = write_crawl_result(&report.result, output_path) {
            tracing::error!("Failed to write {}: {}", output_path.display(), e);
            return Err(e);
        }

        tracing::info!(
            "Successfully saved {} posts to {} ({} failed)",
            report.result.posts_count,
            output_path.display(),
            report.stats.failed
        );

        Ok(report)
    }
}

/// Folds per-thread outcomes into a run report
///
/// Successful posts keep their relative order; failures are set aside.
pub fn fold_outcomes<I>(
    forum_name: &str,
    source_url: &str,
    crawl_date: &str,
    discovered: usize,
    outcomes: I,
) -> RunReport
where
    I: IntoIterator<Item = Result<Post, ExtractError>>,
{
    let mut stats = RunStats {
        discovered,
        ..RunStats::default()
    };
    let mut posts = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        stats.attempted += 1;
        match outcome {
            Ok(post) => {
                stats.succeeded += 1;
                stats.replies += post.replies.len();
                stats.undated += usize::from(post.date.is_none())
                    + post.replies.iter().filter(|r| r.date.is_none()).count();
                posts.push(post);
            }
            Err(e) => {
                stats.failed += 1;
                failures.push(e);
            }
        }
    }

    RunReport {
        result: CrawlResult::new(forum_name, source_url, crawl_date, posts),
        failures,
        stats,
    }
}
