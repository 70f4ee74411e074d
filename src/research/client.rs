// src/research/client.rs
//! Search/extraction client. Failures never reach the caller as errors: they
//! come back as `ResearchMiss` internally, get logged, and degrade to "no
//! augmentation" at the public edge (`research_text`, `deep_content`).

use std::sync::Arc;

use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ResearchConfig;
use crate::http::{HttpTransport, JsonPost, TransportError};
use crate::research::gate::ResearchGate;
use crate::text::{anon_hash, collapse_whitespace, strip_html, truncate_chars};

const FRAGMENT_SEPARATOR: &str = " | ";
const DEEP_HEADING: &str = "[Web deep-dive]";

/// Short text summarizing what the search service found for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchSnippet {
    pub text: String,
}

/// Why a query produced no augmentation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResearchMiss {
    #[error("research disabled or no API key")]
    Disabled,
    #[error("query matched no trigger keyword")]
    NoMatch,
    #[error("search returned nothing usable")]
    Empty,
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("search response malformed: {0}")]
    Decode(String),
}

impl ResearchMiss {
    /// Transport and decode failures are real faults; the rest is normal flow.
    pub fn is_failure(&self) -> bool {
        matches!(self, ResearchMiss::Transport(_) | ResearchMiss::Decode(_))
    }
}

impl From<TransportError> for ResearchMiss {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Decode(msg) => ResearchMiss::Decode(msg),
            other => ResearchMiss::Transport(other.to_string()),
        }
    }
}

/// One search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub raw_content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

pub struct ResearchClient {
    cfg: ResearchConfig,
    gate: ResearchGate,
    transport: Arc<dyn HttpTransport>,
}

impl ResearchClient {
    pub fn new(cfg: ResearchConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let gate = ResearchGate::from_config(&cfg);
        Self {
            cfg,
            gate,
            transport,
        }
    }

    pub fn gate(&self) -> &ResearchGate {
        &self.gate
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.cfg
    }

    /// One search call, condensed into a snippet. Trigger keywords are the
    /// caller's business; only the enabled/key check happens here.
    ///
    /// Preference order: provider answer (truncated), then leading fragments
    /// of the first two results, else `ResearchMiss::Empty`.
    pub async fn research(&self, query: &str) -> Result<ResearchSnippet, ResearchMiss> {
        if !self.gate.is_active() {
            return Err(ResearchMiss::Disabled);
        }
        let body = json!({
            "api_key": self.cfg.api_key,
            "query": query,
            "search_depth": self.cfg.search_depth,
            "max_results": self.cfg.max_results,
            "include_answer": true,
        });
        let resp = self.post_search(&body).await?;
        snippet_from_response(&resp, self.cfg.answer_max_chars, self.cfg.fragment_chars)
    }

    /// `research` with misses degraded to `None` (and logged).
    pub async fn research_text(&self, query: &str) -> Option<String> {
        match self.research(query).await {
            Ok(snippet) => {
                counter!("research_hits_total").increment(1);
                debug!(id = %anon_hash(query), chars = snippet.text.chars().count(), "research hit");
                Some(snippet.text)
            }
            Err(miss) => {
                log_miss(query, &miss);
                None
            }
        }
    }

    /// Gated search returning the full result list (raw page content included).
    pub async fn search(
        &self,
        query: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<SearchHit>, ResearchMiss> {
        if !self.gate.is_active() {
            return Err(ResearchMiss::Disabled);
        }
        if !self.gate.should_trigger(query) {
            return Err(ResearchMiss::NoMatch);
        }
        let body = json!({
            "api_key": self.cfg.api_key,
            "query": query,
            "search_depth": self.cfg.search_depth,
            "max_results": max_results.unwrap_or(self.cfg.max_results),
            "include_raw_content": true,
        });
        let resp = self.post_search(&body).await?;
        Ok(resp.results)
    }

    /// Full text of an article. Tries the extraction service first, then
    /// fetches the page and strips markup. Empty string when both fail.
    pub async fn extract_article(&self, url: &str) -> String {
        let url = url.trim();
        if url.is_empty() {
            return String::new();
        }

        if self.gate.has_key() {
            match self.extract_via_service(url).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => debug!(url, "extraction service returned no content"),
                Err(e) => warn!(url, error = %e, "extraction service failed; fetching page"),
            }
        }

        match self.transport.get_text(url, self.cfg.timeout()).await {
            Ok(html) => strip_html(&html),
            Err(e) => {
                warn!(url, error = %e, "article fetch failed");
                String::new()
            }
        }
    }

    /// Deep background for a title: search with the configured suffix, read
    /// each hit's article when a URL is known, join and cap the texts.
    pub async fn deep_content(&self, title: &str) -> Option<String> {
        let query = format!("{} {}", title.trim(), self.cfg.deep_query_suffix)
            .trim()
            .to_string();
        let hits = match self.search(&query, None).await {
            Ok(hits) => hits,
            Err(miss) => {
                log_miss(&query, &miss);
                return None;
            }
        };

        let mut contents = Vec::with_capacity(hits.len());
        for hit in hits {
            let mut content = hit
                .raw_content
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(hit.content);
            if let Some(url) = hit.url.as_deref().filter(|u| !u.trim().is_empty()) {
                let article = self.extract_article(url).await;
                if !article.is_empty() {
                    content = article;
                }
            }
            if !content.trim().is_empty() {
                contents.push(content);
            }
        }

        if contents.is_empty() {
            log_miss(&query, &ResearchMiss::Empty);
            return None;
        }
        counter!("research_hits_total").increment(1);
        let body = truncate_chars(&contents.join("\n"), self.cfg.deep_max_chars);
        Some(format!("{DEEP_HEADING}\n{body}"))
    }

    async fn post_search(&self, body: &Value) -> Result<SearchResponse, ResearchMiss> {
        counter!("research_requests_total").increment(1);
        let value = self
            .transport
            .post_json(JsonPost::new(&self.cfg.search_url, body, self.cfg.timeout()))
            .await?;
        serde_json::from_value(value).map_err(|e| ResearchMiss::Decode(e.to_string()))
    }

    async fn extract_via_service(&self, url: &str) -> Result<String, TransportError> {
        counter!("research_requests_total").increment(1);
        let body = json!({
            "api_key": self.cfg.api_key,
            "urls": [url],
        });
        let value = self
            .transport
            .post_json(JsonPost::new(&self.cfg.extract_url, &body, self.cfg.timeout()))
            .await?;
        Ok(extracted_text(&value))
    }
}

/// Pull article text from an extraction answer:
/// `results[0].raw_content`, else top-level `content` / `raw_content`.
fn extracted_text(value: &Value) -> String {
    let first = value
        .get("results")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("raw_content"))
        .and_then(Value::as_str);
    let top = || {
        ["content", "raw_content"]
            .iter()
            .find_map(|k| {
                value
                    .get(*k)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
            })
    };
    first
        .filter(|s| !s.trim().is_empty())
        .or_else(top)
        .unwrap_or_default()
        .to_string()
}

fn snippet_from_response(
    resp: &SearchResponse,
    answer_max: usize,
    fragment_chars: usize,
) -> Result<ResearchSnippet, ResearchMiss> {
    if let Some(answer) = resp.answer.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        return Ok(ResearchSnippet {
            text: truncate_chars(answer, answer_max),
        });
    }

    let fragments: Vec<String> = resp
        .results
        .iter()
        .take(2)
        .map(|hit| truncate_chars(&collapse_whitespace(&hit.content), fragment_chars))
        .filter(|f| !f.is_empty())
        .collect();

    if fragments.is_empty() {
        Err(ResearchMiss::Empty)
    } else {
        Ok(ResearchSnippet {
            text: fragments.join(FRAGMENT_SEPARATOR),
        })
    }
}

fn log_miss(query: &str, miss: &ResearchMiss) {
    let id = anon_hash(query);
    if miss.is_failure() {
        counter!("research_errors_total").increment(1);
        warn!(%id, error = %miss, "research failed; continuing without augmentation");
    } else {
        debug!(%id, reason = %miss, "no research augmentation");
    }
}
