// src/telemetry.rs
//! Logging setup and metric descriptions. The crate never installs a metrics
//! recorder; without one the macros are no-ops.

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "trend_insight=info,warn";

/// Compact fmt logs filtered by `RUST_LOG` (default `trend_insight=info,warn`).
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
}

/// One-time metrics registration (so series show up once a recorder exists).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "research_requests_total",
            "Search/extraction requests sent to the research service."
        );
        describe_counter!(
            "research_hits_total",
            "Research lookups that produced augmentation text."
        );
        describe_counter!(
            "research_errors_total",
            "Research lookups that failed at transport or decode level."
        );
        describe_counter!("analysis_runs_total", "Calls to analyze().");
        describe_counter!(
            "analysis_failures_total",
            "analyze() calls that returned success=false."
        );
        describe_histogram!("llm_call_ms", "LLM completion call latency in milliseconds.");
    });
}
