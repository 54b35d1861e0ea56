use crate::UrlError;
use std::collections::HashSet;
use url::Url;

/// Query parameters that never change which thread a link points at
const TRACKING_PARAMS: &[&str] = &["u", "ref", "source", "fbclid", "gclid"];

/// Normalizes a URL so that equivalent links compare equal
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase the host (done by the parser)
/// 3. Remove dot segments, repeated slashes and the trailing slash
/// 4. Remove the fragment
/// 5. Remove share/tracking query parameters (`utm_*`, Discourse's `u=`)
///
/// # Examples
///
/// ```
/// use topic_trawl::url::normalize_url;
///
/// let url = normalize_url("https://Forum.Example.com/t/hello/42/?u=alice#post_3").unwrap();
/// assert_eq!(url.as_str(), "https://forum.example.com/t/hello/42");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Resolves an `href` against the page it was found on
///
/// Returns None for links that can never be thread pages: empty hrefs,
/// same-page anchors, `javascript:`/`mailto:`/`tel:`/`data:` links and
/// anything that does not resolve to HTTP(S).
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute)
    } else {
        None
    }
}

/// Removes duplicate URLs, keeping the first occurrence of each
pub fn dedup_preserve_order<I>(urls: I) -> Vec<Url>
where
    I: IntoIterator<Item = Url>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
