//! URL handling module for Topic-Trawl
//!
//! This module provides URL normalization, link resolution, order-preserving
//! deduplication, and recognition of forum thread URLs.

mod matcher;
mod normalize;

pub use matcher::ThreadUrlMatcher;
pub use normalize::{dedup_preserve_order, normalize_url, resolve_link};
