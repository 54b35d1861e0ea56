//! Configuration module for Topic-Trawl
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and checking the scraping backend credential before any network activity.
//!
//! # Example
//!
//! ```no_run
//! use topic_trawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawl.toml")).unwrap();
//! println!("Listing page: {}{}", config.forum.base_url, config.forum.listing_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackendConfig, Config, CrawlerConfig, ForumConfig, OutputConfig, SelectorConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_api_key};
