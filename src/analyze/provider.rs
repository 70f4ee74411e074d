// src/analyze/provider.rs
//! LLM provider abstraction: endpoint resolution + request/response shapes for
//! OpenAI-compatible chat completions and Google Gemini.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::histogram;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::analyze::error::{AnalysisError, ProviderError};
use crate::config::AnalysisConfig;
use crate::http::{HttpTransport, JsonPost};

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 2000;

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
const GEMINI_MODELS_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";
const GEMINI_SYSTEM_ACK: &str = "Understood.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl From<&AnalysisConfig> for ProviderConfig {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            provider: cfg.provider.clone(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout(),
        }
    }
}

/// Where and how to send the completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRoute {
    OpenAiCompatible { endpoint: String },
    Gemini { endpoint: String },
}

impl ProviderRoute {
    /// Explicit base URL wins; otherwise the built-in table. Unknown provider
    /// names without a base URL are a configuration error.
    pub fn resolve(cfg: &ProviderConfig) -> Result<Self, AnalysisError> {
        let provider = cfg.provider.as_str();
        if !cfg.base_url.is_empty() {
            let endpoint = cfg.base_url.clone();
            return Ok(match provider {
                "gemini" => ProviderRoute::Gemini { endpoint },
                _ => ProviderRoute::OpenAiCompatible { endpoint },
            });
        }
        match provider {
            "openai" => Ok(ProviderRoute::OpenAiCompatible {
                endpoint: OPENAI_ENDPOINT.to_string(),
            }),
            "deepseek" => Ok(ProviderRoute::OpenAiCompatible {
                endpoint: DEEPSEEK_ENDPOINT.to_string(),
            }),
            "gemini" => Ok(ProviderRoute::Gemini {
                endpoint: format!(
                    "{GEMINI_MODELS_BASE}/{}:generateContent",
                    gemini_model(&cfg.model)
                ),
            }),
            other => Err(AnalysisError::config(format!(
                "provider `{other}` needs a base_url"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderRoute::OpenAiCompatible { .. } => "openai-compatible",
            ProviderRoute::Gemini { .. } => "gemini",
        }
    }
}

fn gemini_model(model: &str) -> &str {
    if model.is_empty() {
        GEMINI_DEFAULT_MODEL
    } else {
        model
    }
}

// ------------------------------------------------------------
// Wire shapes
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiTurn {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiTurn>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Chat-completion body: optional system message, then the user message.
pub fn openai_request_body(
    model: &str,
    system: &str,
    user: &str,
) -> Result<Value, ProviderError> {
    let mut messages = Vec::with_capacity(2);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: user,
    });
    let req = ChatRequest {
        model,
        messages,
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
    };
    encode_body(req)
}

/// Gemini body. The API has no system role, so a system text becomes a
/// leading user/model exchange before the real user turn.
pub fn gemini_request_body(system: &str, user: &str) -> Result<Value, ProviderError> {
    let text = |t: String| vec![GeminiPart { text: t }];
    let mut contents = Vec::with_capacity(3);
    if !system.is_empty() {
        contents.push(GeminiTurn {
            role: "user",
            parts: text(format!("System instruction: {system}")),
        });
        contents.push(GeminiTurn {
            role: "model",
            parts: text(GEMINI_SYSTEM_ACK.to_string()),
        });
    }
    contents.push(GeminiTurn {
        role: "user",
        parts: text(user.to_string()),
    });
    let req = GeminiRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    };
    encode_body(req)
}

fn encode_body<T: Serialize>(req: T) -> Result<Value, ProviderError> {
    serde_json::to_value(req)
        .map_err(|e| ProviderError::other(format!("cannot encode request: {e}")))
}

// ------------------------------------------------------------
// Client
// ------------------------------------------------------------

pub struct ProviderClient {
    cfg: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ProviderClient {
    pub fn new(cfg: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { cfg, transport }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.cfg
    }

    pub fn route(&self) -> Result<ProviderRoute, AnalysisError> {
        ProviderRoute::resolve(&self.cfg)
    }

    /// One completion call. Configuration problems are reported before any
    /// request is sent.
    pub async fn call(&self, system: &str, user: &str) -> Result<String, AnalysisError> {
        if self.cfg.api_key.trim().is_empty() {
            return Err(AnalysisError::config("AI API key is not configured"));
        }
        let route = self.route()?;

        let t0 = Instant::now();
        let out = match &route {
            ProviderRoute::OpenAiCompatible { endpoint } => {
                self.call_openai(endpoint, system, user).await
            }
            ProviderRoute::Gemini { endpoint } => self.call_gemini(endpoint, system, user).await,
        };
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("llm_call_ms").record(ms);
        info!(
            provider = route.name(),
            model = %self.cfg.model,
            ms = ms as u64,
            ok = out.is_ok(),
            "llm call finished"
        );
        out.map_err(AnalysisError::from)
    }

    async fn call_openai(
        &self,
        endpoint: &str,
        system: &str,
        user: &str,
    ) -> Result<String, ProviderError> {
        let body = openai_request_body(&self.cfg.model, system, user)?;
        let value = self
            .transport
            .post_json(JsonPost::new(endpoint, &body, self.cfg.timeout).bearer(&self.cfg.api_key))
            .await?;
        let resp: ChatResponse = serde_json::from_value(value)
            .map_err(|e| ProviderError::other(format!("unexpected response shape: {e}")))?;
        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::other("response contained no choices"))
    }

    async fn call_gemini(
        &self,
        endpoint: &str,
        system: &str,
        user: &str,
    ) -> Result<String, ProviderError> {
        let body = gemini_request_body(system, user)?;
        let value = self
            .transport
            .post_json(JsonPost::new(endpoint, &body, self.cfg.timeout).query("key", &self.cfg.api_key))
            .await?;
        let resp: GeminiResponse = serde_json::from_value(value)
            .map_err(|e| ProviderError::other(format!("unexpected response shape: {e}")))?;
        resp.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::other("response contained no candidates"))
    }
}
