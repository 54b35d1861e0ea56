use crate::url::normalize::normalize_url;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Recognizes thread URLs on a single forum host
///
/// A link is a thread link when it lives on the forum's host and its path
/// matches the configured pattern, e.g. `^/t/[^/]+/(\d+)` for Discourse.
/// Capture group 1 is the thread id. Anything after the match (post
/// numbers, `/print`, ...) is dropped, so every link into a thread maps to
/// the same canonical URL.
#[derive(Debug, Clone)]
pub struct ThreadUrlMatcher {
    pattern: Regex,
    host: String,
}

impl ThreadUrlMatcher {
    /// Builds a matcher for threads hosted next to `forum_url`
    ///
    /// # Examples
    ///
    /// ```
    /// use topic_trawl::url::ThreadUrlMatcher;
    /// use url::Url;
    ///
    /// let forum = Url::parse("https://forum.example.com/latest").unwrap();
    /// let matcher = ThreadUrlMatcher::new(r"^/t/[^/]+/(\d+)", &forum).unwrap();
    ///
    /// let link = Url::parse("https://forum.example.com/t/hello-world/42/7").unwrap();
    /// let canonical = matcher.canonicalize(&link).unwrap();
    /// assert_eq!(canonical.as_str(), "https://forum.example.com/t/hello-world/42");
    /// assert_eq!(matcher.thread_id(&canonical), Some("42".to_string()));
    /// ```
    pub fn new(pattern: &str, forum_url: &Url) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("thread pattern: {}", e)))?;

        let host = forum_url
            .host_str()
            .ok_or_else(|| ConfigError::InvalidUrl(format!("{} has no host", forum_url)))?
            .to_lowercase();

        Ok(Self { pattern, host })
    }

    /// Returns the canonical thread URL for `url`, or None if it is not a thread link
    pub fn canonicalize(&self, url: &Url) -> Option<Url> {
        if !self.is_forum_host(url) {
            return None;
        }

        let normalized = normalize_url(url.as_str()).ok()?;
        let matched = self.pattern.find(normalized.path())?;

        let mut canonical = normalized.clone();
        canonical.set_path(matched.as_str());
        canonical.set_query(None);
        canonical.set_fragment(None);
        Some(canonical)
    }

    /// Extracts the thread id (capture group 1) from a thread URL
    pub fn thread_id(&self, url: &Url) -> Option<String> {
        if !self.is_forum_host(url) {
            return None;
        }

        self.pattern
            .captures(url.path())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    }

    fn is_forum_host(&self, url: &Url) -> bool {
        url.host_str()
            .map(|h| h.eq_ignore_ascii_case(&self.host))
            .unwrap_or(false)
    }
}
