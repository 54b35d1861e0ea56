//! Scripted in-memory backend for unit tests

use super::{FetchBackend, FetchError, ScrapeRequest, ScrapedPage};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Failure kinds a scripted response can produce
#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    Status(u16),
    RateLimited(Option<Duration>),
    Decode,
}

impl Failure {
    fn into_error(self, url: &str) -> FetchError {
        let url = url.to_string();
        match self {
            Self::Status(status) => FetchError::Status { url, status },
            Self::RateLimited(retry_after) => FetchError::RateLimited { url, retry_after },
            Self::Decode => FetchError::Decode {
                url,
                message: "scripted decode failure".to_string(),
            },
        }
    }
}

/// Answers each URL from a queue of scripted outcomes
///
/// Every call is recorded with its start time. A URL with nothing left in
/// its queue answers HTTP 404.
#[derive(Default)]
pub(crate) struct FakeBackend {
    scripts: Mutex<HashMap<String, VecDeque<Result<ScrapedPage, Failure>>>>,
    calls: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every call take `latency` before answering
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn push_html(&self, url: &str, html: &str) {
        self.push_page(
            url,
            ScrapedPage {
                html: Some(html.to_string()),
                ..ScrapedPage::default()
            },
        );
    }

    pub(crate) fn push_page(&self, url: &str, page: ScrapedPage) {
        self.push(url, Ok(page));
    }

    pub(crate) fn push_failure(&self, url: &str, failure: Failure) {
        self.push(url, Err(failure));
    }

    /// URLs requested so far, with the instant each request started
    pub(crate) fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, url: &str, outcome: Result<ScrapedPage, Failure>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
    }
}

#[async_trait]
impl FetchBackend for FakeBackend {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapedPage, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url.clone(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(page)) => Ok(page),
            Some(Err(failure)) => Err(failure.into_error(&request.url)),
            None => Err(Failure::Status(404).into_error(&request.url)),
        }
    }
}
