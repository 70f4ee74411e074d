// src/text.rs
//! Small text helpers shared by the research layer and the analysis pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script regex"));
static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("style regex"));
static RE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Short anonymized id for a piece of text (first 6 bytes of SHA-256, hex).
/// Used in logs instead of raw titles/queries.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Take at most `max` chars (not bytes), never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Collapse every whitespace run into one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// Turn an HTML page into plain text: drop script/style bodies and comments,
/// replace tags with spaces, decode entities, collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let out = RE_SCRIPT.replace_all(html, " ");
    let out = RE_STYLE.replace_all(&out, " ");
    let out = RE_COMMENT.replace_all(&out, " ");
    let out = RE_TAGS.replace_all(&out, " ");
    let decoded = html_escape::decode_html_entities(&out);
    collapse_whitespace(&decoded)
}
