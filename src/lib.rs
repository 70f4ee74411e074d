// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod config;
pub mod http;
pub mod news;
pub mod research;
pub mod telemetry;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{AnalysisOrchestrator, AnalysisResult, ParseStatus, ReportOptions};
pub use crate::config::{AnalysisConfig, ResearchConfig};
pub use crate::http::{HttpTransport, MockTransport, ReqwestTransport};
pub use crate::news::{NewsGroup, NewsItem, SourceKind};
