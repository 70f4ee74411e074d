// src/http.rs
//! HTTP transport seam used by the research client and the LLM providers.
//!
//! Production code talks to the network through `ReqwestTransport`; tests (and
//! local dry runs) swap in `MockTransport`, which replays queued responses and
//! records every request it sees.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::text::truncate_chars;

const USER_AGENT: &str = "trend-insight/0.1";
/// Some sites refuse obvious bot agents when we fall back to fetching raw pages.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Transport-level failure, classified so callers can tell timeouts from
/// refused connections from non-2xx answers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connection(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// A JSON POST request description.
#[derive(Debug, Clone)]
pub struct JsonPost<'a> {
    pub url: &'a str,
    pub bearer: Option<&'a str>,
    pub query: Vec<(&'a str, &'a str)>,
    pub body: &'a Value,
    pub timeout: Duration,
}

impl<'a> JsonPost<'a> {
    pub fn new(url: &'a str, body: &'a Value, timeout: Duration) -> Self {
        Self {
            url,
            bearer: None,
            query: Vec::new(),
            body,
            timeout,
        }
    }

    pub fn bearer(mut self, token: &'a str) -> Self {
        self.bearer = Some(token);
        self
    }

    pub fn query(mut self, key: &'a str, value: &'a str) -> Self {
        self.query.push((key, value));
        self
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a JSON body and decode a JSON answer. Non-2xx is an error.
    async fn post_json(&self, req: JsonPost<'_>) -> Result<Value, TransportError>;

    /// GET a page as text (browser user agent). Non-2xx is an error.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, TransportError>;
}

// ------------------------------------------------------------
// reqwest-backed transport
// ------------------------------------------------------------

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http })
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body: truncate_chars(body.trim(), 200),
    })
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, req: JsonPost<'_>) -> Result<Value, TransportError> {
        let mut rb = self.http.post(req.url).timeout(req.timeout).json(req.body);
        if let Some(token) = req.bearer {
            rb = rb.bearer_auth(token);
        }
        if !req.query.is_empty() {
            rb = rb.query(&req.query);
        }
        let resp = ensure_success(rb.send().await?).await?;
        // Body-phase errors keep their class; a stalled body is a timeout.
        resp.json::<Value>().await.map_err(TransportError::from)
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, TransportError> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .timeout(timeout)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.text().await?)
    }
}

// ------------------------------------------------------------
// Mock transport for tests/local runs
// ------------------------------------------------------------

/// One request observed by `MockTransport`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Value,
}

/// Replays queued answers in FIFO order. JSON posts and page GETs have
/// separate queues; an empty queue yields `TransportError::Other`.
#[derive(Default)]
pub struct MockTransport {
    json: Mutex<VecDeque<Result<Value, TransportError>>>,
    pages: Mutex<VecDeque<Result<String, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, value: Value) -> &Self {
        lock(&self.json).push_back(Ok(value));
        self
    }

    pub fn push_json_error(&self, err: TransportError) -> &Self {
        lock(&self.json).push_back(Err(err));
        self
    }

    pub fn push_page(&self, html: impl Into<String>) -> &Self {
        lock(&self.pages).push_back(Ok(html.into()));
        self
    }

    pub fn push_page_error(&self, err: TransportError) -> &Self {
        lock(&self.pages).push_back(Err(err));
        self
    }

    /// Total number of requests (POST + GET) issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    fn record(&self, req: RecordedRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(req);
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_json(&self, req: JsonPost<'_>) -> Result<Value, TransportError> {
        self.record(RecordedRequest {
            method: "POST",
            url: req.url.to_string(),
            bearer: req.bearer.map(str::to_string),
            query: req
                .query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: req.body.clone(),
        });
        lock(&self.json)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no mock response queued".into())))
    }

    async fn get_text(&self, url: &str, _timeout: Duration) -> Result<String, TransportError> {
        self.record(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            bearer: None,
            query: Vec::new(),
            body: Value::Null,
        });
        lock(&self.pages)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no mock page queued".into())))
    }
}
