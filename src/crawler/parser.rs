//! HTML and markdown helpers
//!
//! This module handles the format-level work shared by discovery and
//! extraction:
//! - Collecting link targets from HTML anchors or markdown links
//! - Flattening an HTML subtree into readable plain text

use crate::url::resolve_link;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;
use url::Url;

/// Elements separated from their surroundings by a blank line
const PARAGRAPH_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dl", "figure", "footer", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements that start and end on their own line
const LINE_ELEMENTS: &[&str] = &["dd", "div", "dt", "figcaption", "li", "summary", "tr"];

/// Elements whose content is never visible text
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Starts every line that came from a `<pre>` block in the raw text buffer
const PREFORMATTED_MARK: char = '\u{1}';

/// Extracts every followable `<a href>` target from an HTML page
///
/// Links are resolved against `base_url` and returned in document order.
/// Anchors carrying a `download` attribute are skipped, as are links that can
/// never be pages (see [`resolve_link`]).
///
/// # Example
///
/// ```
/// use topic_trawl::crawler::extract_anchor_links;
/// use url::Url;
///
/// let html = r#"<a href="/t/alpha/100">Alpha</a><a href="mailto:x@y.z">Mail</a>"#;
/// let base = Url::parse("https://forum.example.com/latest").unwrap();
/// let links = extract_anchor_links(html, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://forum.example.com/t/alpha/100");
/// ```
pub fn extract_anchor_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Extracts link targets from markdown `[text](target)` links, in order
pub fn extract_markdown_links(markdown: &str, base_url: &Url) -> Vec<Url> {
    static LINK: OnceLock<Regex> = OnceLock::new();
    let link = LINK.get_or_init(|| {
        Regex::new(r#"\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#)
            .expect("valid markdown link regex")
    });

    link.captures_iter(markdown)
        .filter_map(|caps| caps.get(1))
        .filter_map(|target| resolve_link(target.as_str(), base_url))
        .collect()
}

/// Flattens an element into plain text
///
/// Markup is dropped. Paragraph-level elements are separated by one blank
/// line, list items, table rows and `<br>` by a single line break, and runs
/// of whitespace inside a line collapse to one space. Lines inside `<pre>`
/// keep their indentation.
pub fn html_to_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw, false);
    tidy_lines(&raw)
}

/// Trimmed text content of an element, without line structure
pub fn inline_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String, preformatted: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) if preformatted => push_preformatted(out, text),
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    if preformatted {
                        out.push(PREFORMATTED_MARK);
                    }
                    continue;
                }

                let breaks = if PARAGRAPH_ELEMENTS.contains(&name) {
                    2
                } else if LINE_ELEMENTS.contains(&name) {
                    1
                } else {
                    0
                };

                if breaks > 0 {
                    ensure_breaks(out, breaks);
                }
                if name == "pre" || (preformatted && breaks > 0) {
                    out.push(PREFORMATTED_MARK);
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out, preformatted || name == "pre");
                }
                if breaks > 0 {
                    ensure_breaks(out, breaks);
                    if preformatted {
                        out.push(PREFORMATTED_MARK);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Appends text with HTML whitespace semantics: any run becomes one space
fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if !c.is_whitespace() {
            out.push(c);
        } else if !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
    }
}

/// Appends `<pre>` text verbatim, marking the start of each new line
fn push_preformatted(out: &mut String, text: &str) {
    for c in text.chars() {
        out.push(c);
        if c == '\n' {
            out.push(PREFORMATTED_MARK);
        }
    }
}

/// Makes `out` end with at least `count` line breaks
fn ensure_breaks(out: &mut String, count: usize) {
    let kept = out
        .trim_end_matches(|c: char| c == ' ' || c == '\t' || c == PREFORMATTED_MARK)
        .len();
    out.truncate(kept);

    let existing = out.chars().rev().take_while(|&c| c == '\n').count();
    for _ in existing..count {
        out.push('\n');
    }
}

fn tidy_lines(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut pending_blank = false;

    for line in raw.lines() {
        let collapsed = match line.strip_prefix(PREFORMATTED_MARK) {
            Some(verbatim) => verbatim.replace(PREFORMATTED_MARK, "").trim_end().to_string(),
            None => line.split_whitespace().collect::<Vec<_>>().join(" "),
        };
        if collapsed.is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push(String::new());
            pending_blank = false;
        }
        lines.push(collapsed);
    }

    lines.join("\n")
}
