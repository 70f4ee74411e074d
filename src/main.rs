//! Trend Insight binary entrypoint.
//! Reads collector output (hot-list and RSS keyword groups) from JSON files,
//! runs one analysis and prints the result as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use trend_insight::{telemetry, AnalysisConfig, AnalysisOrchestrator, NewsGroup, ReportOptions};

#[derive(Debug, Parser)]
#[command(name = "trend-insight", version, about = "Research-augmented LLM analysis of trending news")]
struct Args {
    /// Config file (TOML or JSON). Defaults to $ANALYSIS_CONFIG_PATH, then config/analysis.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hot-list keyword groups as JSON (`[{"word": ..., "titles": [...]}]`).
    #[arg(long)]
    stats: PathBuf,

    /// RSS groups as JSON, same shape as --stats.
    #[arg(long)]
    rss: Option<PathBuf>,

    #[arg(long, default_value = "daily")]
    mode: String,

    #[arg(long, default_value = "Daily summary")]
    report_type: String,

    /// Platform names shown in the prompt (repeatable).
    #[arg(long = "platform")]
    platforms: Vec<String>,

    /// Keywords shown in the prompt (repeatable); defaults to the group words.
    #[arg(long = "keyword")]
    keywords: Vec<String>,
}

fn read_groups(path: &Path) -> Result<Vec<NewsGroup>> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

async fn run(args: Args) -> Result<bool> {
    let cfg = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)?,
        None => AnalysisConfig::load_default()?,
    };
    let stats = read_groups(&args.stats)?;
    let rss = args.rss.as_deref().map(read_groups).transpose()?;

    let orchestrator = AnalysisOrchestrator::new(cfg)?;
    let opts = ReportOptions {
        report_mode: args.mode,
        report_type: args.report_type,
        platforms: args.platforms,
        keywords: args.keywords,
    };
    let result = orchestrator.analyze(&stats, rss.as_deref(), &opts).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.success)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = ?e, "trend-insight failed");
            ExitCode::from(2)
        }
    }
}
