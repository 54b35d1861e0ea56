//! Field extraction from thread pages
//!
//! All knowledge of a forum's markup lives in a [`ThreadSelectors`] table.
//! [`parse_thread`] only walks that table, so supporting another forum
//! layout means supplying different selectors, not different code.

use crate::config::SelectorConfig;
use crate::crawler::dates::normalize_date;
use crate::crawler::extract::ExtractError;
use crate::crawler::parser::{html_to_text, inline_text};
use crate::output::Reply;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;

/// Author recorded for a reply whose username element is missing
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Compiled CSS selectors for every field of a thread page
#[derive(Debug, Clone)]
pub struct ThreadSelectors {
    title: Selector,
    author: Selector,
    date: Selector,
    body: Selector,
    tags: Selector,
    replies: Selector,
    reply_author: Selector,
    reply_date: Selector,
    reply_content: Selector,
    next_page: Selector,
}

impl ThreadSelectors {
    /// Compiles a selector table, naming the offending field on failure
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile("title", &config.title)?,
            author: compile("author", &config.author)?,
            date: compile("date", &config.date)?,
            body: compile("body", &config.body)?,
            tags: compile("tags", &config.tags)?,
            replies: compile("replies", &config.replies)?,
            reply_author: compile("reply-author", &config.reply_author)?,
            reply_date: compile("reply-date", &config.reply_date)?,
            reply_content: compile("reply-content", &config.reply_content)?,
            next_page: compile("next-page", &config.next_page)?,
        })
    }
}

impl Default for ThreadSelectors {
    fn default() -> Self {
        // The built-in table is known to compile
        Self::compile(&SelectorConfig::default()).expect("default selectors compile")
    }
}

fn compile(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        field: field.to_string(),
        message: format!("'{}': {:?}", selector, e),
    })
}

/// Everything a thread page yields before it is combined with fetch data
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedThread {
    pub title: String,
    pub author: String,
    /// ISO-8601, or None when missing or unparseable
    pub date: Option<String>,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub replies: Vec<Reply>,
    /// The page links to a further page of replies that was not read
    pub has_more_pages: bool,
}

/// Extracts the structured fields of a thread page
///
/// Title and author are required; a page missing either fails with
/// [`ExtractError::MissingField`]. Dates that cannot be parsed degrade to
/// None with a logged warning.
///
/// # Arguments
///
/// * `html` - The thread page HTML
/// * `url` - The thread URL, used in errors and log lines
/// * `selectors` - The forum's selector table
pub fn parse_thread(
    html: &str,
    url: &str,
    selectors: &ThreadSelectors,
) -> Result<ParsedThread, ExtractError> {
    let document = Html::parse_document(html);

    let title = first_text(&document, &selectors.title).ok_or_else(|| {
        ExtractError::MissingField {
            url: url.to_string(),
            field: "title",
        }
    })?;

    let author = first_text(&document, &selectors.author).ok_or_else(|| {
        ExtractError::MissingField {
            url: url.to_string(),
            field: "author",
        }
    })?;

    let date = document
        .select(&selectors.date)
        .next()
        .and_then(|el| parse_date_element(el, url, "topic"));

    let content = document
        .select(&selectors.body)
        .next()
        .map(html_to_text)
        .unwrap_or_default();

    let tags = document
        .select(&selectors.tags)
        .map(inline_text)
        .filter(|tag| !tag.is_empty())
        .collect();

    let replies = document
        .select(&selectors.replies)
        .map(|reply| parse_reply(reply, url, selectors))
        .collect();

    let has_more_pages = document.select(&selectors.next_page).next().is_some();

    Ok(ParsedThread {
        title,
        author,
        date,
        content,
        tags,
        replies,
        has_more_pages,
    })
}

fn parse_reply(reply: ElementRef<'_>, url: &str, selectors: &ThreadSelectors) -> Reply {
    let author = reply
        .select(&selectors.reply_author)
        .next()
        .map(inline_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let date = reply
        .select(&selectors.reply_date)
        .next()
        .and_then(|el| parse_date_element(el, url, "reply"));

    let content = reply
        .select(&selectors.reply_content)
        .next()
        .map(html_to_text)
        .unwrap_or_default();

    Reply {
        author,
        date,
        content,
    }
}

/// Reads a date from the element's `title` attribute, falling back to its text
fn parse_date_element(element: ElementRef<'_>, url: &str, context: &str) -> Option<String> {
    let raw = element
        .value()
        .attr("title")
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| inline_text(element));

    if raw.is_empty() {
        tracing::debug!("Empty {} date element on {}", context, url);
        return None;
    }

    let normalized = normalize_date(&raw);
    if normalized.is_none() {
        tracing::warn!("Failed to parse {} date '{}' for {}", context, raw, url);
    }
    normalized
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(inline_text)
        .filter(|text| !text.is_empty())
}
