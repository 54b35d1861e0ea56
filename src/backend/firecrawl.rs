//! Firecrawl scraping backend
//!
//! Pages are requested through Firecrawl's `/v1/scrape` endpoint, which
//! renders the page on the service side and returns the requested formats:
//!
//! ```text
//! POST {api-url}/v1/scrape
//! Authorization: Bearer <key>
//! {"url": "...", "formats": ["rawHtml", "markdown"], "onlyMainContent": false}
//!
//! 200 {"success": true, "data": {"rawHtml": "...", "markdown": "...", "metadata": {...}}}
//! 429 rate limited (optional Retry-After header, in seconds)
//! ```

use super::{FetchBackend, FetchError, OutputFormat, ScrapeRequest, ScrapedPage};
use crate::config::BackendConfig;
use crate::{ConfigError, TrawlError};
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// Builds the HTTP client used to talk to the scraping API
///
/// # Arguments
///
/// * `timeout` - Overall per-request timeout; rendering a forum page can take
///   several seconds on the backend side
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`FetchBackend`] backed by the Firecrawl HTTP API
#[derive(Debug, Clone)]
pub struct FirecrawlBackend {
    client: Client,
    endpoint: Url,
    api_key: String,
    only_main_content: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeBody<'a> {
    url: &'a str,
    formats: &'a [OutputFormat],
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct ScrapeEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeData {
    raw_html: Option<String>,
    html: Option<String>,
    markdown: Option<String>,
    links: Option<Vec<String>>,
    metadata: Option<Map<String, Value>>,
}

impl FirecrawlBackend {
    /// Creates a backend from configuration and an already validated API key
    pub fn new(config: &BackendConfig, api_key: String) -> Result<Self, TrawlError> {
        let endpoint = scrape_endpoint(&config.api_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("api-url '{}': {}", config.api_url, e)))?;

        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            only_main_content: config.only_main_content,
        })
    }
}

#[async_trait]
impl FetchBackend for FirecrawlBackend {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapedPage, FetchError> {
        let url = request.url.clone();
        let body = ScrapeBody {
            url: &request.url,
            formats: &request.formats,
            only_main_content: self.only_main_content,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::RateLimited { url, retry_after });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?;

        parse_envelope(&url, &text)
    }
}

/// `{api-url}/v1/scrape`, keeping any path prefix of `api-url`
fn scrape_endpoint(api_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(api_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("v1/scrape")
}

/// Turns a scrape response body into a [`ScrapedPage`]
fn parse_envelope(url: &str, body: &str) -> Result<ScrapedPage, FetchError> {
    let envelope: ScrapeEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !envelope.success {
        let message = envelope
            .error
            .unwrap_or_else(|| "unknown backend error".to_string());

        if message.to_lowercase().contains("rate limit") {
            return Err(FetchError::RateLimited {
                url: url.to_string(),
                retry_after: None,
            });
        }

        return Err(FetchError::Backend {
            url: url.to_string(),
            message,
        });
    }

    let data = envelope.data.ok_or_else(|| FetchError::Decode {
        url: url.to_string(),
        message: "response has no data".to_string(),
    })?;

    Ok(ScrapedPage {
        html: non_blank(data.raw_html).or_else(|| non_blank(data.html)),
        markdown: non_blank(data.markdown),
        links: data.links.unwrap_or_default(),
        metadata: data.metadata.unwrap_or_default(),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://forum.example.com/t/alpha/100";

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_new_backend_joins_endpoint() {
        let backend = FirecrawlBackend::new(&BackendConfig::default(), "fc-key".to_string())
            .unwrap();
        assert_eq!(backend.endpoint.as_str(), "https://api.firecrawl.dev/v1/scrape");
    }

    #[test]
    fn test_endpoint_keeps_api_path_prefix() {
        assert_eq!(
            scrape_endpoint("https://example.com/firecrawl").unwrap().as_str(),
            "https://example.com/firecrawl/v1/scrape"
        );
        assert_eq!(
            scrape_endpoint("https://example.com/firecrawl/").unwrap().as_str(),
            "https://example.com/firecrawl/v1/scrape"
        );
        assert_eq!(
            scrape_endpoint("http://localhost:3002").unwrap().as_str(),
            "http://localhost:3002/v1/scrape"
        );

        let mut config = BackendConfig::default();
        config.api_url = "https://example.com/firecrawl".to_string();
        let backend = FirecrawlBackend::new(&config, "fc-key".to_string()).unwrap();
        assert_eq!(backend.endpoint.as_str(), "https://example.com/firecrawl/v1/scrape");
    }

    #[test]
    fn test_request_body_shape() {
        let formats = [OutputFormat::RawHtml, OutputFormat::Markdown];
        let body = ScrapeBody {
            url: URL,
            formats: &formats,
            only_main_content: false,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["url"], URL);
        assert_eq!(json["formats"], serde_json::json!(["rawHtml", "markdown"]));
        assert_eq!(json["onlyMainContent"], false);
    }

    #[test]
    fn test_parse_success_prefers_raw_html() {
        let body = r##"{
            "success": true,
            "data": {
                "rawHtml": "<html>raw</html>",
                "html": "<html>clean</html>",
                "markdown": "# Title",
                "metadata": {"statusCode": 200, "title": "Alpha"}
            }
        }"##;

        let page = parse_envelope(URL, body).unwrap();
        assert_eq!(page.html.as_deref(), Some("<html>raw</html>"));
        assert_eq!(page.markdown.as_deref(), Some("# Title"));
        assert_eq!(page.metadata["statusCode"], 200);
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_parse_success_falls_back_to_html() {
        let body = r#"{"success": true, "data": {"html": "<p>clean</p>", "rawHtml": "  "}}"#;
        let page = parse_envelope(URL, body).unwrap();
        assert_eq!(page.html.as_deref(), Some("<p>clean</p>"));
        assert_eq!(page.markdown, None);
    }

    #[test]
    fn test_parse_backend_failure() {
        let body = r#"{"success": false, "error": "Page failed to load"}"#;
        let err = parse_envelope(URL, body).unwrap_err();
        assert!(matches!(err, FetchError::Backend { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_parse_rate_limit_signal() {
        let body = r#"{"success": false, "error": "Rate limit exceeded. Try again later."}"#;
        let err = parse_envelope(URL, body).unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { .. }));
    }

    #[test]
    fn test_parse_malformed_body() {
        let err = parse_envelope(URL, "<html>gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_missing_data() {
        let err = parse_envelope(URL, r#"{"success": true}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
