//! Shared utility functions used across multiple modules.

use std::sync::OnceLock;

use regex::Regex;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Collapse whitespace runs and truncate to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(180)
        .collect()
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Strip markup tags and collapse whitespace runs into single spaces.
pub fn strip_markup(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static SPACE: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));
    let space = SPACE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex"));
    let text = tag.replace_all(html, " ");
    space.replace_all(&text, " ").trim().to_string()
}

/// Plain-text preview of a markup payload, truncated to `max_len` characters.
///
/// Returns `None` for pages without any visible text.
pub fn text_preview(html: &str, max_len: usize) -> Option<String> {
    let text = strip_markup(html);
    if text.is_empty() {
        return None;
    }
    if text.chars().count() > max_len {
        let truncated: String = text.chars().take(max_len).collect();
        Some(format!("{truncated}..."))
    } else {
        Some(text)
    }
}
