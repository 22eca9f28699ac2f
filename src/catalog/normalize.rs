//! Text and tag normalization shared by catalog loading and filtering.
//!
//! Catalog tags and request values go through the same functions, so a
//! full-width or mixed-case request still matches the stored tag.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// Tag delimiters: comma, ideographic comma, semicolon, whitespace, slash and pipes.
static TAG_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\x{3001};\s/｜|]+").expect("tag delimiter pattern is valid"));

/// NFKC-normalize and trim
pub fn normalize_text(s: &str) -> String {
    s.nfkc().collect::<String>().trim().to_string()
}

/// Normalize a tag for comparison: NFKC, trimmed, lowercased
pub fn normalize_tag(tag: &str) -> String {
    normalize_text(tag).to_lowercase()
}

/// Normalize an optional request value, treating blank input as absent
pub fn normalize_query(value: Option<&str>) -> Option<String> {
    value.map(normalize_tag).filter(|v| !v.is_empty())
}

/// Split a delimited tag list into a deduplicated, normalized set
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    let raw = normalize_text(raw);
    TAG_SPLIT
        .split(&raw)
        .filter(|token| !token.is_empty())
        .map(normalize_tag)
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Start year of the decade containing `year` (1999 -> 1990)
pub fn decade_start(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Display form of a decade (1999 -> "1990s")
pub fn decade_label(year: i32) -> String {
    format!("{}s", decade_start(year))
}
