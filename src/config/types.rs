use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Topic-Trawl
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// configuration that crawls the Cursor forum's latest page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub forum: ForumConfig,
    pub backend: BackendConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    pub selectors: SelectorConfig,
}

impl Config {
    /// Absolute URL of the listing page
    pub fn listing_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.forum.base_url)?.join(&self.forum.listing_path)
    }
}

/// Which forum to crawl and how its thread URLs look
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    /// Human readable forum name, copied into the output artifact
    pub name: String,

    /// Forum root URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the listing page, joined onto `base_url`
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Regex matched against a link's path; capture group 1 is the thread id
    #[serde(rename = "thread-pattern")]
    pub thread_pattern: String,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            name: "Cursor Forum".to_string(),
            base_url: "https://forum.cursor.com".to_string(),
            listing_path: "/latest".to_string(),
            thread_pattern: r"^/t/[^/]+/(\d+)".to_string(),
        }
    }
}

/// Scraping backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Root of the scraping API
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Environment variable holding the bearer API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Ask the backend to strip navigation and headers (breaks selectors on most forums)
    #[serde(rename = "only-main-content")]
    pub only_main_content: bool,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.firecrawl.dev".to_string(),
            api_key_env: "FIRECRAWL_API_KEY".to_string(),
            only_main_content: false,
            timeout_secs: 60,
        }
    }
}

/// Crawler pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Minimum time between the starts of two backend requests (seconds)
    #[serde(rename = "min-delay-secs")]
    pub min_delay_secs: f64,

    /// Maximum number of threads to process; `None` means unbounded
    #[serde(rename = "max-posts")]
    pub max_posts: Option<usize>,

    /// Attempts per backend request, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Wait before the first retry; doubles for every further retry (seconds)
    #[serde(rename = "backoff-base-secs")]
    pub backoff_base_secs: f64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 1.0,
            max_posts: None,
            max_attempts: 3,
            backoff_base_secs: 1.0,
        }
    }
}

impl CrawlerConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.min_delay_secs).unwrap_or(Duration::ZERO)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::try_from_secs_f64(self.backoff_base_secs).unwrap_or(Duration::ZERO)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the JSON artifact
    #[serde(rename = "json-path")]
    pub json_path: String,

    /// Path to the append-only run log
    #[serde(rename = "log-path")]
    pub log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: "cursor_forum_latest_posts.json".to_string(),
            log_path: "crawl_forum.log".to_string(),
        }
    }
}

/// CSS selectors used to pull fields out of a thread page
///
/// Defaults describe a Discourse forum. Reply selectors are evaluated
/// relative to each element matched by `replies`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: String,
    pub author: String,
    /// Element carrying the post date in its `title` attribute
    pub date: String,
    pub body: String,
    pub tags: String,
    pub replies: String,
    #[serde(rename = "reply-author")]
    pub reply_author: String,
    #[serde(rename = "reply-date")]
    pub reply_date: String,
    #[serde(rename = "reply-content")]
    pub reply_content: String,
    /// Presence of this element means the thread has more reply pages
    #[serde(rename = "next-page")]
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: "h1.topic-title".to_string(),
            author: ".topic-meta-data .names .username".to_string(),
            date: ".topic-meta-data .post-date".to_string(),
            body: ".topic-body .cooked".to_string(),
            tags: ".discourse-tags .discourse-tag".to_string(),
            replies: ".topic-post:not(.topic-owner)".to_string(),
            reply_author: ".names .username".to_string(),
            reply_date: ".post-date".to_string(),
            reply_content: ".cooked".to_string(),
            next_page: "link[rel='next'], a[rel='next']".to_string(),
        }
    }
}
