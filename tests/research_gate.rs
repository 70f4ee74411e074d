// tests/research_gate.rs
use trend_insight::research::ResearchGate;
use trend_insight::ResearchConfig;

fn kw(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn disabled_gate_ignores_keyword_content() {
    for triggers in [Vec::new(), kw(&["AI"]), kw(&["x", "y"])] {
        let gate = ResearchGate::new(false, "tvly-key", triggers);
        for q in ["", "AI", "x y", "anything at all"] {
            assert!(!gate.should_trigger(q), "disabled gate triggered on {q:?}");
        }
    }
}

#[test]
fn trigger_is_any_substring_when_list_non_empty() {
    let triggers = kw(&["保险", "Fed"]);
    let gate = ResearchGate::new(true, "tvly-key", triggers.clone());
    for q in ["保险新规出台", "Fed holds rates", "weather today", "fed minutes"] {
        let expected = triggers.iter().any(|k| q.contains(k.as_str()));
        assert_eq!(gate.should_trigger(q), expected, "query {q:?}");
    }
}

#[test]
fn gate_from_config_reads_enabled_key_and_triggers() {
    let cfg = ResearchConfig {
        enabled: true,
        api_key: "tvly-key".into(),
        trigger_keywords: kw(&["AI"]),
        ..Default::default()
    };
    let gate = ResearchGate::from_config(&cfg);
    assert!(gate.is_active());
    assert!(gate.should_trigger("OpenAI"));
    assert!(!gate.should_trigger("football"));

    let no_key = ResearchGate::from_config(&ResearchConfig {
        enabled: true,
        ..Default::default()
    });
    assert!(!no_key.is_active());
    assert!(!no_key.should_trigger("AI"));
}
