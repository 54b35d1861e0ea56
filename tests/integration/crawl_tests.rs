//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the Firecrawl API and run the
//! full discover-extract-write cycle end-to-end.

use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use topic_trawl::config::Config;
use topic_trawl::crawler::Coordinator;
use topic_trawl::output::read_crawl_result;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "fc-test-key";
const LISTING: &str = "https://forum.example.com/latest";
const ALPHA: &str = "https://forum.example.com/t/alpha/100";
const BETA: &str = "https://forum.example.com/t/beta/200";

/// Creates a test configuration pointed at the mock API
fn create_test_config(api_url: &str, json_path: &Path) -> Config {
    let mut config = Config::default();
    config.forum.name = "Example Forum".to_string();
    config.forum.base_url = "https://forum.example.com".to_string();
    config.backend.api_url = api_url.to_string();
    config.backend.timeout_secs = 5;
    config.crawler.min_delay_secs = 0.01; // Very short for testing
    config.crawler.backoff_base_secs = 0.01;
    config.output.json_path = json_path.to_string_lossy().into_owned();
    config
}

fn scraped(raw_html: &str, markdown: &str) -> Value {
    json!({
        "success": true,
        "data": {
            "rawHtml": raw_html,
            "markdown": markdown,
            "metadata": {"statusCode": 200, "sourceURL": "mock"}
        }
    })
}

fn listing_html() -> String {
    r#"<html><body>
        <a href="/t/alpha/100">Alpha</a>
        <a href="/t/beta/200">Beta</a>
        <a href="/t/alpha/100/3">Alpha, latest reply</a>
        <a href="https://elsewhere.example.com/t/other/300">Off-site</a>
    </body></html>"#
        .to_string()
}

fn thread_html(title: &str, author: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="topic-title">{}</h1>
        <div class="discourse-tags"><a class="discourse-tag">help</a></div>
        <div class="topic-post topic-owner">
            <div class="topic-meta-data">
                <span class="names"><span class="username">{}</span></span>
                <a class="post-date" title="Jan 5, 2024 3:04 pm">Jan 5</a>
            </div>
            <div class="topic-body"><div class="cooked"><p>Opening post</p></div></div>
        </div>
        <div class="topic-post">
            <div class="topic-meta-data">
                <span class="names"><span class="username">bob</span></span>
                <a class="post-date" title="a while ago">?</a>
            </div>
            <div class="topic-body"><div class="cooked"><p>Reply text</p></div></div>
        </div>
        </body></html>"#,
        title, author
    )
}

async fn mount_page(server: &MockServer, url: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
        .and(body_partial_json(json!({ "url": url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_two_threads() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("posts.json");

    mount_page(&mock_server, LISTING, scraped(&listing_html(), "")).await;
    mount_page(
        &mock_server,
        ALPHA,
        scraped(&thread_html("Alpha", "alice"), "# Alpha"),
    )
    .await;
    mount_page(
        &mock_server,
        BETA,
        scraped(&thread_html("Beta", "carol"), "# Beta"),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), &json_path);
    let mut coordinator = Coordinator::from_config(config, API_KEY.to_string())
        .expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert!(report.failures.is_empty());

    let written = read_crawl_result(&json_path).expect("Failed to read artifact");
    assert_eq!(written.forum_name, "Example Forum");
    assert_eq!(written.source_url, LISTING);
    assert_eq!(written.posts_count, written.posts.len());

    let ids: Vec<_> = written.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["100", "200"]);

    let alpha = &written.posts[0];
    assert_eq!(alpha.url, ALPHA);
    assert_eq!(alpha.title, "Alpha");
    assert_eq!(alpha.author, "alice");
    assert_eq!(alpha.date.as_deref(), Some("2024-01-05T15:04:00"));
    assert_eq!(alpha.content, "Opening post");
    assert_eq!(alpha.markdown_content, "# Alpha");
    assert!(alpha.tags.contains("help"));
    assert_eq!(alpha.metadata["statusCode"], json!(200));

    assert_eq!(alpha.replies.len(), 1);
    assert_eq!(alpha.replies[0].author, "bob");
    assert_eq!(alpha.replies[0].date, None);
    assert_eq!(alpha.replies[0].content, "Reply text");

    // One listing request plus one per thread
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_missing_title_is_excluded() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("posts.json");

    mount_page(&mock_server, LISTING, scraped(&listing_html(), "")).await;
    mount_page(
        &mock_server,
        ALPHA,
        scraped(&thread_html("Alpha", "alice").replace("topic-title", "x"), ""),
    )
    .await;
    mount_page(&mock_server, BETA, scraped(&thread_html("Beta", "carol"), "")).await;

    let config = create_test_config(&mock_server.uri(), &json_path);
    let report = Coordinator::from_config(config, API_KEY.to_string())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url(), ALPHA);

    let written = read_crawl_result(&json_path).unwrap();
    assert_eq!(written.posts_count, 1);
    assert_eq!(written.posts[0].id, "200");
}

#[tokio::test]
async fn test_rate_limited_thread_is_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("posts.json");

    mount_page(
        &mock_server,
        LISTING,
        scraped(r#"<a href="/t/alpha/100">Alpha</a>"#, ""),
    )
    .await;

    // First request for the thread is throttled by the API
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(body_partial_json(json!({ "url": ALPHA })))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, ALPHA, scraped(&thread_html("Alpha", "alice"), "")).await;

    let config = create_test_config(&mock_server.uri(), &json_path);
    let report = Coordinator::from_config(config, API_KEY.to_string())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.result.posts_count, 1);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_backend_failure_skips_thread() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("posts.json");

    mount_page(&mock_server, LISTING, scraped(&listing_html(), "")).await;
    mount_page(
        &mock_server,
        ALPHA,
        json!({"success": false, "error": "Failed to load page"}),
    )
    .await;
    mount_page(&mock_server, BETA, scraped(&thread_html("Beta", "carol"), "")).await;

    let mut config = create_test_config(&mock_server.uri(), &json_path);
    config.crawler.max_attempts = 2;

    let report = Coordinator::from_config(config, API_KEY.to_string())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.result.posts[0].id, "200");

    // Listing, two attempts for alpha, one for beta
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_listing_failure_writes_empty_artifact() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("posts.json");

    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &json_path);
    config.crawler.max_attempts = 2;

    let report = Coordinator::from_config(config, API_KEY.to_string())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.stats.discovered, 0);

    let written = read_crawl_result(&json_path).unwrap();
    assert_eq!(written.posts_count, 0);
    assert!(written.posts.is_empty());
}

#[tokio::test]
async fn test_max_posts_limits_requests() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("posts.json");

    mount_page(&mock_server, LISTING, scraped(&listing_html(), "")).await;
    mount_page(&mock_server, ALPHA, scraped(&thread_html("Alpha", "alice"), "")).await;

    let mut config = create_test_config(&mock_server.uri(), &json_path);
    config.crawler.max_posts = Some(1);

    let report = Coordinator::from_config(config, API_KEY.to_string())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.result.posts_count, 1);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}
