//! Lenient date normalization
//!
//! Forum themes render dates in many shapes: RFC 3339 timestamps in data
//! attributes, `Jan 5, 2024 3:04 pm` in tooltips, `Monday, January 8th, 2024
//! at 10:15 AM` in others. [`normalize_date`] accepts all of these and emits
//! ISO-8601. Strings carrying an offset (or a `UTC`/`GMT` suffix) keep it;
//! strings without one are emitted as naive local timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Formats carrying an explicit UTC offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M %z",
    "%B %d %Y %I:%M %p %z",
    "%B %d %Y %H:%M %z",
];

/// Formats with a time of day but no offset
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%B %d %Y %I:%M:%S %p",
    "%B %d %Y %I:%M %p",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %I:%M %p",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only formats; the time is taken as midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d %Y", "%d %B %Y", "%m/%d/%Y"];

/// Parses a human or machine date string into ISO-8601
///
/// Returns None when nothing matches; callers treat that as a missing date,
/// never as a failed thread.
///
/// # Examples
///
/// ```
/// use topic_trawl::crawler::normalize_date;
///
/// assert_eq!(
///     normalize_date("Jan 5, 2024 3:04 pm").as_deref(),
///     Some("2024-01-05T15:04:00")
/// );
/// assert_eq!(
///     normalize_date("2024-01-05T15:04:00Z").as_deref(),
///     Some("2024-01-05T15:04:00+00:00")
/// );
/// assert_eq!(normalize_date("sometime last week"), None);
/// ```
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.to_rfc3339());
    }

    let cleaned = clean(trimmed);

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&cleaned, format) {
            return Some(dt.to_rfc3339());
        }
    }

    // A trailing zone name pins the naive time to UTC
    let (body, is_utc) = strip_utc_suffix(&cleaned);

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(body, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(body, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    if is_utc {
        Some(Utc.from_utc_datetime(&naive).to_rfc3339())
    } else {
        Some(naive.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

/// Strips noise that chrono's format strings cannot express
///
/// Drops a leading weekday, commas, the word "at" and ordinal suffixes
/// (`8th` -> `8`), then collapses whitespace.
fn clean(raw: &str) -> String {
    static WEEKDAY: OnceLock<Regex> = OnceLock::new();
    static ORDINAL: OnceLock<Regex> = OnceLock::new();

    let weekday = WEEKDAY.get_or_init(|| {
        Regex::new(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+")
            .expect("valid weekday regex")
    });
    let ordinal = ORDINAL.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex")
    });

    let without_weekday = weekday.replace(raw, "");
    let without_ordinals = ordinal.replace_all(&without_weekday, "$1");

    without_ordinals
        .replace(',', " ")
        .split_whitespace()
        .filter(|word| !word.eq_ignore_ascii_case("at"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_utc_suffix(cleaned: &str) -> (&str, bool) {
    for suffix in [" UTC", " GMT", " Z"] {
        if let Some(body) = cleaned.strip_suffix(suffix) {
            return (body, true);
        }
    }
    (cleaned, false)
}
