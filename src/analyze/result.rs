// src/analyze/result.rs
use serde::{Deserialize, Serialize};

use crate::analyze::aggregate::ContentBlock;

/// How the raw model output was turned into fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    /// The run stopped before a response was parsed.
    #[default]
    Skipped,
    /// A JSON object with the expected fields was found.
    Structured,
    /// No structured object; the raw text was kept as summary.
    Lenient,
    /// The model returned nothing.
    Empty,
}

/// Final product of one `analyze` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub keyword_analysis: String,
    pub sentiment: String,
    pub cross_platform: String,
    pub impact: String,
    pub signals: String,
    pub conclusion: String,
    pub raw_response: String,
    pub success: bool,
    pub error: String,
    pub parse_status: ParseStatus,
    /// hot-list + RSS items received
    pub total_news: usize,
    /// items actually included in the prompt
    pub analyzed_news: usize,
    pub max_news_limit: usize,
    pub hotlist_count: usize,
    pub rss_count: usize,
}

impl AnalysisResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            ..Default::default()
        }
    }

    /// Overlay aggregation counters; applied whatever the outcome.
    pub fn apply_counts(&mut self, block: &ContentBlock, max_news: usize) {
        self.hotlist_count = block.hotlist_total;
        self.rss_count = block.rss_total;
        self.total_news = block.hotlist_total + block.rss_total;
        self.analyzed_news = block.included;
        self.max_news_limit = max_news;
    }
}
