// tests/prompt_template.rs
use std::collections::HashMap;
use std::fs;

use trend_insight::analyze::PromptPair;

#[test]
fn loads_template_file_and_renders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prompt.txt");
    fs::write(
        &path,
        "[system]\nYou analyze news.\n[user]\nMode {report_mode}, {news_count} items, {unknown_field}\n{news_content}\n",
    )
    .unwrap();

    let pair = PromptPair::load(&path);
    assert_eq!(pair.system, "You analyze news.");
    assert!(pair.is_usable());

    let mut subs = HashMap::new();
    subs.insert("report_mode", "daily".to_string());
    subs.insert("news_count", "12".to_string());
    subs.insert("news_content", "- [Weibo] title".to_string());
    assert_eq!(
        pair.render(&subs),
        "Mode daily, 12 items, {unknown_field}\n- [Weibo] title"
    );
}

#[test]
fn missing_file_gives_unusable_empty_pair() {
    let dir = tempfile::tempdir().unwrap();
    let pair = PromptPair::load(&dir.path().join("nope.txt"));
    assert_eq!(pair, PromptPair::default());
    assert!(!pair.is_usable());
}

#[test]
fn file_without_markers_is_all_user_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.txt");
    fs::write(&path, "Summarize: {news_content}").unwrap();
    let pair = PromptPair::load(&path);
    assert!(pair.system.is_empty());
    assert_eq!(pair.user_template, "Summarize: {news_content}");
}
