//! Topic-Trawl: a one-shot forum thread harvester
//!
//! This crate discovers thread URLs on a forum's listing page, fetches every
//! thread through a scraping backend, and extracts title, author, date, body,
//! tags and replies into a single JSON artifact.

pub mod backend;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Topic-Trawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to serialize crawl result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write output to {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid selector for '{field}': {message}")]
    InvalidSelector { field: String, message: String },

    #[error("Missing or invalid API credential: {0}")]
    Credential(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Topic-Trawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

// Re-export commonly used types
pub use backend::{FetchBackend, FetchError, FirecrawlBackend};
pub use config::Config;
pub use crawler::{Coordinator, RunReport};
pub use output::{CrawlResult, Post, Reply};
pub use url::{normalize_url, ThreadUrlMatcher};
