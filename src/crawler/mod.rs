//! Crawler module for forum thread harvesting
//!
//! This module contains the core crawling logic, including:
//! - Request pacing and retry (`throttle`)
//! - Listing page discovery (`discover`)
//! - HTML/markdown helpers and date normalization
//! - Selector-driven thread field extraction (`fields`, `extract`)
//! - Overall run coordination

mod coordinator;
mod dates;
mod discover;
mod extract;
mod fields;
mod parser;
mod throttle;

pub use coordinator::{fold_outcomes, Coordinator, RunReport};
pub use dates::normalize_date;
pub use discover::ListingDiscoverer;
pub use extract::{ExtractError, ThreadExtractor};
pub use fields::{parse_thread, ParsedThread, ThreadSelectors};
pub use parser::{extract_anchor_links, extract_markdown_links, html_to_text, inline_text};
pub use throttle::{RateLimiter, RetryPolicy, ThrottledFetcher, MAX_RETRY_AFTER};
