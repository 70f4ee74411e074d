// src/analyze/parse.rs
//! Tolerant extraction of the structured analysis from raw model output.
//!
//! The model is asked for a JSON object, but it may wrap it in Markdown fences
//! or answer in prose. A missing object is not a failure: the raw text becomes
//! the summary and `parse_status` records `Lenient`.

use serde_json::{Map, Value};

use crate::analyze::result::{AnalysisResult, ParseStatus};
use crate::text::truncate_chars;

const LENIENT_SUMMARY_CHARS: usize = 1000;
const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

pub fn parse_response(raw: &str) -> AnalysisResult {
    let mut result = AnalysisResult {
        raw_response: raw.to_string(),
        ..Default::default()
    };

    if raw.trim().is_empty() {
        result.error = "AI returned an empty response".to_string();
        result.parse_status = ParseStatus::Empty;
        return result;
    }

    match parse_object(json_candidate(raw)) {
        Ok(obj) => {
            result.summary = field(&obj, "summary");
            result.keyword_analysis = field(&obj, "keyword_analysis");
            result.sentiment = field(&obj, "sentiment");
            result.cross_platform = field(&obj, "cross_platform");
            result.impact = field(&obj, "impact");
            result.signals = field(&obj, "signals");
            result.conclusion = field(&obj, "conclusion");
            result.parse_status = ParseStatus::Structured;
        }
        Err(msg) => {
            result.summary = truncate_chars(raw, LENIENT_SUMMARY_CHARS);
            result.error = format!("parse error: {msg}");
            result.parse_status = ParseStatus::Lenient;
        }
    }
    result.success = true;
    result
}

/// ```` ```json ```` fence first, any fence second, else the whole text.
fn json_candidate(raw: &str) -> &str {
    if let Some((_, rest)) = raw.split_once(JSON_FENCE) {
        return fence_body(rest);
    }
    if let Some((_, rest)) = raw.split_once(FENCE) {
        return drop_language_tag(fence_body(rest));
    }
    raw
}

fn fence_body(after_open: &str) -> &str {
    after_open
        .split_once(FENCE)
        .map(|(body, _)| body)
        .unwrap_or(after_open)
}

/// Skip a leading info-string line such as `text` or `js` in a generic fence.
fn drop_language_tag(body: &str) -> &str {
    let trimmed = body.trim_start_matches([' ', '\t']);
    if trimmed.starts_with('{') {
        return trimmed;
    }
    match trimmed.split_once('\n') {
        Some((tag, rest)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => rest,
        _ => body,
    }
}

fn parse_object(candidate: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(other) => Err(format!("expected a JSON object, got {}", kind_of(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strings verbatim, arrays of strings one per line, anything else as JSON.
fn field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}
