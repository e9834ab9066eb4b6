// src/main.rs
mod documents;
mod extractors;
mod fnguide;
mod pipeline;
mod record;
mod storage;
mod utils;

use chrono::Datelike;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use fnguide::cache::{CachedSource, MonthlyCache};
use fnguide::client::FnGuideClient;
use fnguide::models::{CollectionTarget, ListedCompany};
use pipeline::{batch, ExtractionConfig};
use storage::{FailureEntry, RunSummary, StorageManager};
use utils::AppError;

const SAMPLE_CODE: &str = "005930";

/// Collects FnGuide company pages into wide per-company tables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Which collection to run
    #[arg(value_enum)]
    target: CollectionTarget,

    /// CSV of listed companies (종목코드,회사명,업종,주요제품)
    #[arg(short, long, default_value = "./derived/listed_companies.csv")]
    universe: PathBuf,

    /// Output directory for tables and the run summary
    #[arg(short, long, default_value = "./derived")]
    output_dir: PathBuf,

    /// Root of the monthly page cache
    #[arg(long, default_value = "./derived")]
    cache_dir: PathBuf,

    /// Year that period windows are anchored to (defaults to this year)
    #[arg(long, env = "FNGUIDE_CURRENT_YEAR")]
    current_year: Option<i32>,

    /// Companies processed at once
    #[arg(long, env = "FNGUIDE_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Pause before every request, in milliseconds
    #[arg(long, default_value_t = 150)]
    request_delay_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run against a few codes instead of the whole universe
    Test {
        /// Company codes (defaults to 005930)
        codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    let started_at = chrono::Local::now();
    let current_year = args.current_year.unwrap_or_else(|| started_at.year());
    let config = ExtractionConfig::for_year(current_year);
    config
        .validate(args.target)
        .map_err(|e| AppError::Config(format!("Invalid extraction rules: {}", e)))?;

    // 3. Initialize storage and the cached page source
    let storage = StorageManager::new(&args.output_dir)?;
    let cache = MonthlyCache::for_current_month(&args.cache_dir);
    for kind in args.target.documents() {
        let removed = cache.evict_stale(*kind)?;
        if removed > 0 {
            tracing::info!("Removed {} stale {} cache directories", removed, kind);
        }
    }
    let source = Arc::new(CachedSource::new(FnGuideClient::new(args.request_delay_ms)?, cache));

    // 4. Pick the companies
    let companies = match &args.command {
        Some(Command::Test { codes }) if codes.is_empty() => vec![ListedCompany::from_code(SAMPLE_CODE)],
        Some(Command::Test { codes }) => codes
            .iter()
            .map(|code| ListedCompany::from_code(&fnguide::universe::normalize_code(code)))
            .collect(),
        None => fnguide::universe::load_universe(&args.universe)?,
    };
    if companies.is_empty() {
        return Err(AppError::Config(format!("No companies found in {}", args.universe.display())));
    }

    // 5. Collect
    let report = batch::collect(source, companies, args.target, config, args.concurrency).await?;

    // 6. Save tables and the run summary
    let timestamp = started_at.format("%Y%m%d_%H%M%S").to_string();
    let mut output_files = Vec::new();
    if !report.records.is_empty() {
        output_files.push(storage.save_target_table(args.target, &report.records, &timestamp)?);
        if args.target.partitions_by_industry() {
            let layout = args.target.layout();
            output_files.extend(storage.save_industry_partitions(args.target, &layout, &report.records, &timestamp)?);
        }
    }

    let summary = RunSummary {
        target: args.target,
        current_year,
        started_at: started_at.to_rfc3339(),
        finished_at: chrono::Local::now().to_rfc3339(),
        total: report.total,
        succeeded: report.succeeded(),
        no_data: report.no_data.clone(),
        failures: report
            .failures
            .iter()
            .map(|(code, cause)| FailureEntry { code: code.clone(), cause: cause.clone() })
            .collect(),
        output_files: output_files.iter().map(|path| path.display().to_string()).collect(),
    };
    storage.save_run_summary(&summary, &timestamp)?;

    tracing::info!(
        "Processing finished. Success: {}, No data: {}, Failures: {}",
        report.succeeded(),
        report.no_data.len(),
        report.failures.len()
    );

    if report.succeeded() == 0 && report.total > 0 {
        return Err(AppError::Processing(format!(
            "No records extracted from {} companies",
            report.total
        )));
    }

    Ok(())
}
