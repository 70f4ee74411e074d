// tests/analyze_e2e.rs
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use trend_insight::analyze::PromptPair;
use trend_insight::http::TransportError;
use trend_insight::{
    AnalysisConfig, AnalysisOrchestrator, MockTransport, NewsGroup, NewsItem, ParseStatus,
    ReportOptions, ResearchConfig,
};

const TEMPLATE: &str = "[system]\nYou are a news analyst.\n[user]\n{report_mode}|{report_type}|{current_time}|{news_count}|{rss_count}|{platforms}|{keywords}\n{news_content}";

fn base_cfg() -> AnalysisConfig {
    AnalysisConfig {
        api_key: "sk-test".into(),
        ..Default::default()
    }
}

fn orchestrator(cfg: AnalysisConfig) -> (AnalysisOrchestrator, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    let fixed = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    let orch = AnalysisOrchestrator::with_transport(cfg, mock.clone())
        .with_prompt(PromptPair::parse(TEMPLATE))
        .with_clock(Arc::new(move || fixed));
    (orch, mock)
}

fn hot() -> Vec<NewsGroup> {
    vec![NewsGroup::new("AI", vec![NewsItem::new("New AI chip unveiled", "Weibo")])]
}

fn rss() -> Vec<NewsGroup> {
    vec![NewsGroup::new("", vec![NewsItem::new("Fed holds rates", "Reuters")])]
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({"choices": [{"message": {"content": content}}]})
}

#[tokio::test]
async fn empty_api_key_makes_no_calls() {
    let cfg = AnalysisConfig {
        api_key: String::new(),
        ..Default::default()
    };
    let (orch, mock) = orchestrator(cfg);
    let r = orch
        .analyze(&hot(), Some(rss().as_slice()), &ReportOptions::default())
        .await;
    assert!(!r.success);
    assert!(r.error.contains("API key"), "{}", r.error);
    assert_eq!(r.max_news_limit, 50);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn full_pipeline_with_research() {
    let mut cfg = base_cfg();
    cfg.research = ResearchConfig {
        enabled: true,
        api_key: "tvly-test".into(),
        trigger_keywords: vec!["Fed".into()],
        ..Default::default()
    };
    let (orch, mock) = orchestrator(cfg);
    mock.push_json(json!({"answer": "Rates unchanged at 5.25%."}))
        .push_json(json!({"answer": "Chip targets data centers."}))
        .push_json(chat_reply(
            "```json\n{\"summary\":\"S\",\"conclusion\":\"C\"}\n```",
        ));

    let r = orch
        .analyze(&hot(), Some(rss().as_slice()), &ReportOptions::default())
        .await;

    assert!(r.success, "{}", r.error);
    assert_eq!(r.parse_status, ParseStatus::Structured);
    assert_eq!(r.summary, "S");
    assert_eq!(r.conclusion, "C");
    assert_eq!(r.total_news, 2);
    assert_eq!(r.analyzed_news, 2);
    assert_eq!(r.hotlist_count, 1);
    assert_eq!(r.rss_count, 1);
    assert_eq!(r.max_news_limit, 50);
    assert_eq!(mock.calls(), 3);

    let reqs = mock.requests();
    assert_eq!(reqs[0].body["query"], "Fed holds rates");
    assert_eq!(reqs[1].body["query"], "New AI chip unveiled");
    assert_eq!(reqs[2].url, "https://api.openai.com/v1/chat/completions");
    assert_eq!(reqs[2].body["messages"][0]["content"], "You are a news analyst.");

    let user = reqs[2].body["messages"][1]["content"].as_str().unwrap();
    let expected = "daily|Daily summary|2024-05-01 08:30:00|1|1|multiple platforms|AI\n\
### RSS highlights (research-augmented)\n\
- [Reuters] Fed holds rates\n  └─ [Background]: Rates unchanged at 5.25%.\n\
\n\
### Trending hot lists\n\
- [Weibo] New AI chip unveiled\n  └─ [Background]: Chip targets data centers.";
    assert_eq!(user, expected);
}

#[tokio::test]
async fn report_options_override_keywords_and_platforms() {
    let (orch, mock) = orchestrator(base_cfg());
    mock.push_json(chat_reply("plain prose answer"));
    let opts = ReportOptions {
        report_mode: "incremental".into(),
        report_type: "Live".into(),
        platforms: vec!["Weibo".into(), "Zhihu".into()],
        keywords: vec!["chips".into()],
    };
    let r = orch.analyze(&hot(), None, &opts).await;

    assert!(r.success);
    assert_eq!(r.parse_status, ParseStatus::Lenient);
    assert_eq!(r.summary, "plain prose answer");
    let reqs = mock.requests();
    let user = reqs[0].body["messages"][1]["content"].as_str().unwrap();
    assert!(user.starts_with("incremental|Live|2024-05-01 08:30:00|1|0|Weibo, Zhihu|chips\n"));
}

#[tokio::test]
async fn provider_timeout_keeps_counts() {
    let (orch, mock) = orchestrator(base_cfg());
    mock.push_json_error(TransportError::Timeout);

    let r = orch
        .analyze(&hot(), Some(rss().as_slice()), &ReportOptions::default())
        .await;
    assert!(!r.success);
    assert_eq!(r.error, "AI API request timed out (90s)");
    assert_eq!(r.parse_status, ParseStatus::Skipped);
    assert_eq!(r.total_news, 2);
    assert_eq!(r.analyzed_news, 2);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn no_content_makes_no_calls() {
    let (orch, mock) = orchestrator(base_cfg());
    let empty = vec![NewsGroup::new("AI", vec![NewsItem::new("   ", "Weibo")])];
    let r = orch.analyze(&empty, None, &ReportOptions::default()).await;
    assert!(!r.success);
    assert_eq!(r.error, "No news content to analyze");
    assert_eq!(r.hotlist_count, 1);
    assert_eq!(r.analyzed_news, 0);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn unknown_provider_makes_no_calls() {
    let cfg = AnalysisConfig {
        provider: "unknownprovider".into(),
        research: ResearchConfig {
            enabled: true,
            api_key: "tvly-test".into(),
            ..Default::default()
        },
        ..base_cfg()
    };
    let (orch, mock) = orchestrator(cfg);
    let r = orch
        .analyze(&hot(), Some(rss().as_slice()), &ReportOptions::default())
        .await;
    assert!(!r.success);
    assert!(r.error.contains("unknownprovider"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn missing_prompt_template_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AnalysisConfig {
        prompt_file: dir.path().join("missing.txt"),
        ..base_cfg()
    };
    let mock = Arc::new(MockTransport::new());
    let orch = AnalysisOrchestrator::with_transport(cfg, mock.clone());
    assert!(!orch.prompt().is_usable());

    let r = orch.analyze(&hot(), None, &ReportOptions::default()).await;
    assert!(!r.success);
    assert!(r.error.contains("prompt template"), "{}", r.error);
    assert_eq!(mock.calls(), 0);
}
