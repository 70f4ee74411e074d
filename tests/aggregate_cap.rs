// tests/aggregate_cap.rs
use std::sync::Arc;

use serde_json::json;
use trend_insight::analyze::ContentAggregator;
use trend_insight::research::ResearchClient;
use trend_insight::{MockTransport, NewsGroup, NewsItem, ResearchConfig};

fn group(word: &str, titles: &[&str], source: &str) -> NewsGroup {
    NewsGroup::new(
        word,
        titles.iter().map(|t| NewsItem::new(*t, source)).collect(),
    )
}

fn disabled_research() -> (ResearchClient, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    (ResearchClient::new(ResearchConfig::default(), mock.clone()), mock)
}

#[tokio::test]
async fn included_never_exceeds_cap() {
    let (rc, mock) = disabled_research();
    let hot = vec![
        group("AI", &["a1", "a2", "a3", "a4"], "Weibo"),
        group("Fed", &["f1", "f2", "f3", "f4"], "Zhihu"),
    ];
    let rss = vec![group("feed", &["r1", "r2"], "Reuters")];

    for max in 0..=10 {
        let block = ContentAggregator::new(&rc, true)
            .build(&hot, Some(rss.as_slice()), max)
            .await;
        assert!(block.included <= max);
        assert_eq!(block.included, max.min(10));
        assert_eq!(block.hotlist_total, 8);
        assert_eq!(block.rss_total, 2);
        assert!(block.hotlist_total + block.rss_total >= block.included);
        assert_eq!(block.is_empty(), max == 0);
    }
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn rss_wins_a_single_slot() {
    let (rc, _mock) = disabled_research();
    let hot = vec![group("AI", &["Hot AI story"], "Weibo")];
    let rss = vec![group("feed", &["RSS story"], "Reuters")];

    let block = ContentAggregator::new(&rc, true)
        .build(&hot, Some(rss.as_slice()), 1)
        .await;
    assert_eq!(block.included, 1);
    assert_eq!(
        block.lines,
        vec![
            "### RSS highlights (research-augmented)".to_string(),
            "- [Reuters] RSS story".to_string(),
        ]
    );
    assert!(!block.render().contains("Hot AI story"));
}

#[tokio::test]
async fn sections_render_in_order_and_skip_blanks() {
    let (rc, _mock) = disabled_research();
    let hot = vec![
        group("", &["no keyword, skipped"], "Weibo"),
        NewsGroup::new(
            "AI",
            vec![
                NewsItem::new("  ", "Weibo"),
                NewsItem {
                    title: "Chip rules".into(),
                    source_name: None,
                },
            ],
        ),
    ];
    let rss = vec![group("feed", &["Fed minutes"], "Reuters")];

    let block = ContentAggregator::new(&rc, true)
        .build(&hot, Some(rss.as_slice()), 50)
        .await;
    assert_eq!(
        block.render(),
        "### RSS highlights (research-augmented)\n- [Reuters] Fed minutes\n\n### Trending hot lists\n- [Hotlist] Chip rules"
    );
    assert_eq!(block.included, 2);
    assert_eq!(block.hotlist_total, 3);
}

#[tokio::test]
async fn rss_excluded_but_still_counted() {
    let (rc, _mock) = disabled_research();
    let hot = vec![group("AI", &["h1"], "Weibo")];
    let rss = vec![group("feed", &["r1", "r2"], "Reuters")];

    let block = ContentAggregator::new(&rc, false)
        .build(&hot, Some(rss.as_slice()), 10)
        .await;
    assert_eq!(block.included, 1);
    assert_eq!(block.rss_total, 2);
    assert!(!block.render().contains("r1"));
}

#[tokio::test]
async fn hotlist_research_follows_allow_list() {
    let mock = Arc::new(MockTransport::new());
    let cfg = ResearchConfig {
        enabled: true,
        api_key: "tvly-test".into(),
        hotlist_keywords: vec!["AI".into()],
        ..Default::default()
    };
    let rc = ResearchClient::new(cfg, mock.clone());
    mock.push_json(json!({"answer": "background text"}));

    let hot = vec![group("tech", &["new ai model", "football final"], "Weibo")];
    let block = ContentAggregator::new(&rc, true).build(&hot, None, 10).await;

    assert_eq!(mock.calls(), 1);
    assert_eq!(
        block.lines,
        vec![
            "### Trending hot lists".to_string(),
            "- [Weibo] new ai model".to_string(),
            "  └─ [Background]: background text".to_string(),
            "- [Weibo] football final".to_string(),
        ]
    );
}

#[tokio::test]
async fn rss_research_uses_trigger_keywords_and_survives_failures() {
    let mock = Arc::new(MockTransport::new());
    let cfg = ResearchConfig {
        enabled: true,
        api_key: "tvly-test".into(),
        trigger_keywords: vec!["保险".into()],
        ..Default::default()
    };
    let rc = ResearchClient::new(cfg, mock.clone());
    mock.push_json_error(trend_insight::http::TransportError::Timeout);

    let rss = vec![group("feed", &["保险新规", "天气预报"], "Caixin")];
    let block = ContentAggregator::new(&rc, true).build(&[], Some(rss.as_slice()), 10).await;

    assert_eq!(mock.calls(), 1);
    assert_eq!(block.included, 2);
    assert!(!block.render().contains("[Background]"));
}

#[tokio::test]
async fn rss_deep_content_renders_as_one_background_line() {
    let mock = Arc::new(MockTransport::new());
    let cfg = ResearchConfig {
        enabled: true,
        api_key: "tvly-test".into(),
        rss_deep_content: true,
        ..Default::default()
    };
    let rc = ResearchClient::new(cfg, mock.clone());
    mock.push_json(json!({"results": [{"title": "t", "content": "line one\nline two"}]}))
        .push_json(json!({"results": []}));

    let rss = vec![group("feed", &["Fed holds", "Next item"], "Reuters")];
    let block = ContentAggregator::new(&rc, true)
        .build(&[], Some(rss.as_slice()), 10)
        .await;

    assert_eq!(mock.calls(), 2);
    assert_eq!(mock.requests()[0].body["query"], "Fed holds 深度分析 行业影响");
    assert_eq!(
        block.render(),
        [
            "### RSS highlights (research-augmented)",
            "- [Reuters] Fed holds",
            "  └─ [Background]: [Web deep-dive] line one line two",
            "- [Reuters] Next item",
        ]
        .join("\n")
    );
}
