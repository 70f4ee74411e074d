// src/analyze/mod.rs
//! Analysis pipeline entry.
//! Order:
//! 1) validate config (API key, prompt template, provider endpoint)
//! 2) aggregate news under the budget (research augmentation per item)
//! 3) render the prompt
//! 4) call the provider
//! 5) parse the answer
//! 6) overlay news counters

pub mod aggregate;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod result;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use metrics::counter;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::news::NewsGroup;
use crate::research::ResearchClient;
use crate::telemetry::ensure_metrics_described;

pub use aggregate::{ContentAggregator, ContentBlock};
pub use error::{AnalysisError, ProviderError, ProviderErrorKind};
pub use parse::parse_response;
pub use prompt::{render_template, PromptPair};
pub use provider::{ProviderClient, ProviderConfig, ProviderRoute};
pub use result::{AnalysisResult, ParseStatus};

const MAX_PROMPT_KEYWORDS: usize = 20;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the `{current_time}` value.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Report labels and optional overrides passed per call.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub report_mode: String,
    pub report_type: String,
    /// Empty = "multiple platforms".
    pub platforms: Vec<String>,
    /// Empty = derived from the hot-list group words.
    pub keywords: Vec<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            report_mode: "daily".to_string(),
            report_type: "Daily summary".to_string(),
            platforms: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

pub struct AnalysisOrchestrator {
    cfg: AnalysisConfig,
    prompt: PromptPair,
    research: ResearchClient,
    provider: ProviderClient,
    clock: Clock,
}

impl AnalysisOrchestrator {
    /// Production wiring over `reqwest`.
    pub fn new(cfg: AnalysisConfig) -> anyhow::Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_transport(cfg, transport))
    }

    /// The prompt template is read once here; reloading means rebuilding.
    pub fn with_transport(cfg: AnalysisConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let prompt = PromptPair::load(cfg.prompt_path());
        let research = ResearchClient::new(cfg.research.clone(), Arc::clone(&transport));
        let provider = ProviderClient::new(ProviderConfig::from(&cfg), transport);
        Self {
            cfg,
            prompt,
            research,
            provider,
            clock: Arc::new(|| chrono::Local::now().naive_local()),
        }
    }

    /// Replace the template loaded from disk.
    pub fn with_prompt(mut self, prompt: PromptPair) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn prompt(&self) -> &PromptPair {
        &self.prompt
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.cfg
    }

    /// Run one analysis. Never fails: every error ends up in a result with
    /// `success == false`.
    pub async fn analyze(
        &self,
        stats: &[NewsGroup],
        rss_stats: Option<&[NewsGroup]>,
        opts: &ReportOptions,
    ) -> AnalysisResult {
        ensure_metrics_described();
        counter!("analysis_runs_total").increment(1);
        let max_news = self.cfg.max_news_for_analysis;

        if let Err(e) = self.validate() {
            let mut result = self.failed(&e);
            result.max_news_limit = max_news;
            return result;
        }

        let aggregator = ContentAggregator::new(&self.research, self.cfg.include_rss);
        let block = aggregator.build(stats, rss_stats, max_news).await;
        info!(
            included = block.included,
            hotlist_total = block.hotlist_total,
            rss_total = block.rss_total,
            "news content aggregated"
        );

        let mut result = if block.is_empty() {
            self.failed(&AnalysisError::NoContent)
        } else {
            let user_prompt = self.build_prompt(&block, stats, opts);
            match self.provider.call(&self.prompt.system, &user_prompt).await {
                Ok(raw) => parse_response(&raw),
                Err(e) => self.failed(&e),
            }
        };
        result.apply_counts(&block, max_news);
        result
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if self.cfg.api_key.trim().is_empty() {
            return Err(AnalysisError::config(
                "AI API key is not configured; set api_key in the config file or the AI_API_KEY environment variable",
            ));
        }
        if !self.prompt.is_usable() {
            return Err(AnalysisError::config(format!(
                "prompt template missing or empty: {}",
                self.cfg.prompt_path().display()
            )));
        }
        self.provider.route()?;
        Ok(())
    }

    fn build_prompt(
        &self,
        block: &ContentBlock,
        stats: &[NewsGroup],
        opts: &ReportOptions,
    ) -> String {
        let keywords: Vec<&str> = if opts.keywords.is_empty() {
            stats
                .iter()
                .map(|g| g.word.trim())
                .filter(|w| !w.is_empty())
                .collect()
        } else {
            opts.keywords.iter().map(String::as_str).collect()
        };
        let keywords = if keywords.is_empty() {
            "none".to_string()
        } else {
            keywords
                .into_iter()
                .take(MAX_PROMPT_KEYWORDS)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let platforms = if opts.platforms.is_empty() {
            "multiple platforms".to_string()
        } else {
            opts.platforms.join(", ")
        };

        let mut subs: HashMap<&str, String> = HashMap::new();
        subs.insert("report_mode", opts.report_mode.clone());
        subs.insert("report_type", opts.report_type.clone());
        subs.insert("current_time", (self.clock)().format(TIME_FORMAT).to_string());
        subs.insert("news_count", block.hotlist_total.to_string());
        subs.insert("rss_count", block.rss_total.to_string());
        subs.insert("platforms", platforms);
        subs.insert("keywords", keywords);
        subs.insert("news_content", block.render());
        self.prompt.render(&subs)
    }

    fn failed(&self, e: &AnalysisError) -> AnalysisResult {
        counter!("analysis_failures_total").increment(1);
        warn!(error = %e, provider = %self.cfg.provider, "analysis failed");
        AnalysisResult::failure(e.user_message(self.cfg.timeout_secs))
    }
}
