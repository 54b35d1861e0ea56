//! Request pacing and retry
//!
//! Every backend call in a run goes through one [`ThrottledFetcher`], which
//! combines two policies:
//!
//! - a minimum interval between the *starts* of consecutive requests, so a
//!   fast response waits out the remainder while a slow one lets the next
//!   request go immediately
//! - bounded retry with exponential backoff for transient failures
//!   (1s, 2s, 4s, ... with the default base)

use crate::backend::{FetchBackend, FetchError, ScrapeRequest, ScrapedPage};
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};

/// Longest server-requested `Retry-After` wait that is honored
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Minimum-interval throttle
///
/// The only state is the start time of the previous request.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_start: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: None,
        }
    }

    /// Waits until `min_interval` has passed since the previous request
    /// started, then records now as the start of the next one
    pub async fn acquire(&mut self) {
        if let Some(last_start) = self.last_start {
            let ready_at = last_start + self.min_interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    "Throttling for {:?}",
                    ready_at.saturating_duration_since(Instant::now())
                );
                sleep_until(ready_at).await;
            }
        }

        self.last_start = Some(Instant::now());
    }
}

/// Retry budget for a single request
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles on every further failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff after failed attempt number `attempt` (1-based): base * 2^(attempt-1)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// A fetch backend wrapped in the run's throttle and retry policy
pub struct ThrottledFetcher {
    backend: Box<dyn FetchBackend>,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl ThrottledFetcher {
    pub fn new(backend: Box<dyn FetchBackend>, limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self {
            backend,
            limiter,
            policy,
        }
    }

    /// Fetches a page, retrying transient failures with exponential backoff
    ///
    /// Returns the last error once the attempt budget is spent, or the first
    /// permanent error.
    pub async fn fetch(&mut self, request: &ScrapeRequest) -> Result<ScrapedPage, FetchError> {
        let mut attempt = 1;

        loop {
            self.limiter.acquire().await;

            match self.backend.scrape(request).await {
                Ok(page) => {
                    if attempt > 1 {
                        tracing::debug!("Fetched {} on attempt {}", request.url, attempt);
                    }
                    return Ok(page);
                }
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let requested = e.retry_after().unwrap_or_default();
                    if requested > MAX_RETRY_AFTER {
                        tracing::debug!(
                            "Retry-After of {:?} for {} capped at {:?}",
                            requested,
                            request.url,
                            MAX_RETRY_AFTER
                        );
                    }
                    let wait = self
                        .policy
                        .delay_after(attempt)
                        .max(requested.min(MAX_RETRY_AFTER));
                    tracing::warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.policy.max_attempts,
                        e,
                        wait
                    );
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::debug!(
                            "Giving up on {} after {} attempts",
                            request.url,
                            attempt
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}
