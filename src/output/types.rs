//! Records written to the crawl artifact

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Top-level artifact of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub forum_name: String,

    /// The listing page the run started from
    pub source_url: String,

    /// When the run finished, ISO-8601
    pub crawl_date: String,

    /// Always equal to `posts.len()`
    pub posts_count: usize,

    /// Successful threads in discovery order
    pub posts: Vec<Post>,
}

impl CrawlResult {
    /// Builds a result, deriving `posts_count` from the posts themselves
    pub fn new(
        forum_name: impl Into<String>,
        source_url: impl Into<String>,
        crawl_date: impl Into<String>,
        posts: Vec<Post>,
    ) -> Self {
        Self {
            forum_name: forum_name.into(),
            source_url: source_url.into(),
            crawl_date: crawl_date.into(),
            posts_count: posts.len(),
            posts,
        }
    }
}

/// One extracted thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// The forum's thread identifier
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: String,

    /// ISO-8601, or null when the page date could not be parsed
    pub date: Option<String>,

    /// Plain text of the opening post
    pub content: String,

    /// Markdown rendering supplied by the backend, empty when there was none
    #[serde(default)]
    pub markdown_content: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub replies: Vec<Reply>,

    /// Backend metadata, passed through as-is
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// One reply, in on-page order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub author: String,
    pub date: Option<String>,
    pub content: String,
}
