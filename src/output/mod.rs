//! Output module for the crawl artifact
//!
//! This module handles:
//! - The `CrawlResult`/`Post`/`Reply` records
//! - Writing and reading the JSON artifact
//! - Recording run statistics

mod json;
pub mod stats;
mod types;

pub use json::{read_crawl_result, write_crawl_result};
pub use stats::{print_statistics, RunStats};
pub use types::{CrawlResult, Post, Reply};
