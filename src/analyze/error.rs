// src/analyze/error.rs
use std::fmt;

use thiserror::Error;

use crate::http::TransportError;
use crate::text::truncate_chars;

/// Classification of a failed LLM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Timeout,
    Connection,
    Http,
    Other,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Connection => "connection",
            ProviderErrorKind::Http => "http-error",
            ProviderErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message)
    }
}

impl From<TransportError> for ProviderError {
    fn from(e: TransportError) -> Self {
        let kind = match &e {
            TransportError::Timeout => ProviderErrorKind::Timeout,
            TransportError::Connection(_) => ProviderErrorKind::Connection,
            TransportError::Status { .. } => ProviderErrorKind::Http,
            TransportError::Decode(_) | TransportError::Other(_) => ProviderErrorKind::Other,
        };
        Self::new(kind, e.to_string())
    }
}

/// Everything that can stop an analysis run. Converted into a failed
/// `AnalysisResult` at the orchestrator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("no news content to analyze")]
    NoContent,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AnalysisError {
    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Configuration(msg.into())
    }

    /// Human-readable message for `AnalysisResult.error`.
    pub fn user_message(&self, timeout_secs: u64) -> String {
        match self {
            AnalysisError::Configuration(msg) => msg.clone(),
            AnalysisError::NoContent => "No news content to analyze".to_string(),
            AnalysisError::Provider(e) => match e.kind {
                ProviderErrorKind::Timeout => {
                    format!("AI API request timed out ({timeout_secs}s)")
                }
                ProviderErrorKind::Connection => "Unable to connect to the AI API".to_string(),
                ProviderErrorKind::Http => {
                    format!("AI API returned an error: {}", truncate_chars(&e.message, 150))
                }
                ProviderErrorKind::Other => {
                    format!("AI analysis failed: {}", truncate_chars(&e.message, 150))
                }
            },
        }
    }
}
