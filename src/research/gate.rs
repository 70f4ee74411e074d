// src/research/gate.rs
//! Research gate: pure decision whether a title deserves an external search.
//! No I/O, no side effects.

use crate::config::ResearchConfig;

#[derive(Debug, Clone, Default)]
pub struct ResearchGate {
    enabled: bool,
    has_key: bool,
    triggers: Vec<String>,
}

impl ResearchGate {
    pub fn new(enabled: bool, api_key: &str, triggers: Vec<String>) -> Self {
        Self {
            enabled,
            has_key: !api_key.trim().is_empty(),
            triggers,
        }
    }

    pub fn from_config(cfg: &ResearchConfig) -> Self {
        Self::new(cfg.enabled, &cfg.api_key, cfg.trigger_keywords.clone())
    }

    /// Enabled and holding an API key.
    pub fn is_active(&self) -> bool {
        self.enabled && self.has_key
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }

    /// General gate:
    /// - inactive → false
    /// - no trigger keywords → true (an empty list matches everything)
    /// - else any keyword is a case-sensitive substring of `query`
    pub fn should_trigger(&self, query: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.triggers.is_empty() {
            return true;
        }
        self.triggers.iter().any(|k| query.contains(k.as_str()))
    }

    /// Gate against an explicit allow-list, matched case-insensitively.
    /// An empty allow-list never matches.
    pub fn should_trigger_with(&self, query: &str, keywords: &[String]) -> bool {
        if !self.is_active() {
            return false;
        }
        let q = query.to_lowercase();
        keywords.iter().any(|k| q.contains(&k.to_lowercase()))
    }
}
