// src/config/analysis.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

pub const DEFAULT_ANALYSIS_CONFIG_PATH: &str = "config/analysis.toml";
pub const ENV_ANALYSIS_CONFIG_PATH: &str = "ANALYSIS_CONFIG_PATH";
pub const ENV_AI_API_KEY: &str = "AI_API_KEY";
pub const ENV_RESEARCH_API_KEY: &str = "TAVILY_API_KEY";

const DEFAULT_PROMPT_FILE: &str = "ai_analysis_prompt.txt";
const DEFAULT_TIMEOUT_SECS: u64 = 90;
const DEFAULT_RESEARCH_TIMEOUT_SECS: u64 = 15;

/// Top-level analysis settings. Keys also accept the upper-case spellings
/// (`API_KEY`, `PROVIDER`, ...) used by older config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Empty or "ENV" means: read from `AI_API_KEY`.
    #[serde(alias = "API_KEY")]
    pub api_key: String,
    /// "openai" | "deepseek" | "gemini" | any OpenAI-compatible name with `base_url`
    #[serde(alias = "PROVIDER")]
    pub provider: String,
    #[serde(alias = "MODEL")]
    pub model: String,
    /// Full completion endpoint; overrides the built-in provider table.
    #[serde(alias = "BASE_URL")]
    pub base_url: String,
    #[serde(alias = "TIMEOUT")]
    pub timeout_secs: u64,
    #[serde(alias = "MAX_NEWS_FOR_ANALYSIS")]
    pub max_news_for_analysis: usize,
    #[serde(alias = "INCLUDE_RSS")]
    pub include_rss: bool,
    /// Relative paths are resolved against the config file's directory.
    #[serde(alias = "PROMPT_FILE")]
    pub prompt_file: PathBuf,
    #[serde(alias = "DEEP_RESEARCH")]
    pub research: ResearchConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_news_for_analysis: 50,
            include_rss: true,
            prompt_file: PathBuf::from(DEFAULT_PROMPT_FILE),
            research: ResearchConfig::default(),
        }
    }
}

/// Settings of the search/extraction service used for deep research.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub enabled: bool,
    /// Empty or "ENV" means: read from `TAVILY_API_KEY`.
    pub api_key: String,
    /// Case-sensitive substrings that authorize research for RSS titles.
    /// Empty list = every title qualifies.
    pub trigger_keywords: Vec<String>,
    /// Case-insensitive allow-list for noisier hot-list titles.
    /// Empty list = hot-list items are never researched.
    pub hotlist_keywords: Vec<String>,
    pub max_results: u32,
    /// "basic" | "advanced"
    pub search_depth: String,
    pub timeout_secs: u64,
    pub search_url: String,
    pub extract_url: String,
    /// Cap for a provider-generated answer used as snippet.
    pub answer_max_chars: usize,
    /// Leading chars taken from each of the first two results.
    pub fragment_chars: usize,
    /// Appended to a title when searching for deep background.
    pub deep_query_suffix: String,
    pub deep_max_chars: usize,
    /// Use full deep background (search + article extraction) for RSS items
    /// instead of the short snippet.
    pub rss_deep_content: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            trigger_keywords: Vec::new(),
            hotlist_keywords: vec![
                "AI".to_string(),
                "安全".to_string(),
                "保险".to_string(),
                "险".to_string(),
            ],
            max_results: 3,
            search_depth: "advanced".to_string(),
            timeout_secs: DEFAULT_RESEARCH_TIMEOUT_SECS,
            search_url: "https://api.tavily.com/search".to_string(),
            extract_url: "https://api.tavily.com/extract".to_string(),
            answer_max_chars: 300,
            fragment_chars: 120,
            deep_query_suffix: "深度分析 行业影响".to_string(),
            deep_max_chars: 2000,
            rss_deep_content: false,
        }
    }
}

impl ResearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AnalysisConfig {
    /// Load from a TOML (default) or JSON (`.json` extension) file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading analysis config from {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut cfg: AnalysisConfig = if is_json {
            serde_json::from_str(&data)
                .with_context(|| format!("parsing {} as JSON", path.display()))?
        } else {
            toml::from_str(&data).with_context(|| format!("parsing {} as TOML", path.display()))?
        };

        if cfg.prompt_file.is_relative() {
            if let Some(dir) = path.parent() {
                cfg.prompt_file = dir.join(&cfg.prompt_file);
            }
        }
        cfg.normalize();
        Ok(cfg)
    }

    /// Parse a TOML string. Relative prompt paths stay relative to the CWD.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut cfg: AnalysisConfig = toml::from_str(toml_str)?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Resolve the config file:
    /// 1) $ANALYSIS_CONFIG_PATH (must exist)
    /// 2) config/analysis.toml
    /// 3) built-in defaults (+ env keys)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_ANALYSIS_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_ANALYSIS_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            return Self::load_from_file(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_ANALYSIS_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        let mut cfg = Self::default();
        if let Some(dir) = default_path.parent() {
            cfg.prompt_file = dir.join(&cfg.prompt_file);
        }
        cfg.normalize();
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn prompt_path(&self) -> &Path {
        &self.prompt_file
    }

    /// Env key fallbacks + value sanitizing.
    fn normalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        self.model = self.model.trim().to_string();
        self.base_url = self.base_url.trim().to_string();

        self.api_key = resolve_key(&self.api_key, ENV_AI_API_KEY);
        self.research.api_key = resolve_key(&self.research.api_key, ENV_RESEARCH_API_KEY);

        if self.timeout_secs == 0 {
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        if self.research.timeout_secs == 0 {
            self.research.timeout_secs = DEFAULT_RESEARCH_TIMEOUT_SECS;
        }
        if self.research.max_results == 0 {
            self.research.max_results = 1;
        }
        self.research.trigger_keywords = clean_list(&self.research.trigger_keywords);
        self.research.hotlist_keywords = clean_list(&self.research.hotlist_keywords);
    }
}

fn resolve_key(raw: &str, env_name: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("env") {
        env::var(env_name).unwrap_or_default().trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Trim entries and drop blanks, keeping order (keyword order is meaningful).
fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
