//! Command-line driver for the NEO analysis pipeline.
//!
//! # Environment Variables
//! - `NASA_API_KEY`: Feed API key (default: `DEMO_KEY`)
//! - `DATA_DIR`: Directory holding the raw feed and the tables (default: `data`)
//! - `RUST_LOG`: Log level (default: info)

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use neows_rust::algorithms::{snapshot_from_frame, top_risk_frame, AnalysisSnapshot};
use neows_rust::config::PipelineConfig;
use neows_rust::core::{AnalyzedRecord, Metric};
use neows_rust::fetch::{fetch_in_chunks, trailing_window, NeoWsClient};
use neows_rust::io::{load_analyzed_table, FeedLoader};
use neows_rust::preprocessing::AnalysisPipeline;
use neows_rust::time::parse_day;
use neows_rust::transformations::{daily_closest_approaches, AlertQuery};

#[derive(Parser, Debug)]
#[command(name = "neows-pipeline")]
#[command(version)]
#[command(about = "Fetch near-Earth object feeds and build risk and trend tables", long_about = None)]
struct Args {
    /// Path to a TOML configuration file (default: search for neows.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the raw feed
    Fetch {
        /// Number of days back from today
        #[arg(long, conflicts_with_all = ["start", "end"])]
        days: Option<u32>,
        /// First day (YYYY-MM-DD)
        #[arg(long, requires = "end", value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD)
        #[arg(long, requires = "start", value_parser = parse_date_arg)]
        end: Option<NaiveDate>,
    },
    /// Turn the raw feed into the analyzed and daily tables
    Process,
    /// Fetch if no raw feed is present, then process
    Run,
    /// Print the batch summary and the top risk objects
    Summary {
        /// Number of top-risk rows to show
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// List objects above a risk or z-score threshold
    Alerts {
        /// Risk score threshold (strictly above)
        #[arg(long)]
        risk: Option<f64>,
        /// Z-score alert as METRIC:THRESHOLD, e.g. risk_score:2.5
        #[arg(long, value_parser = parse_zscore_arg)]
        zscore: Option<(Metric, f64)>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,
        /// Show the closest approach of each day instead
        #[arg(long, conflicts_with_all = ["risk", "zscore"])]
        closest: bool,
    },
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_day(value).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

fn parse_zscore_arg(value: &str) -> Result<(Metric, f64), String> {
    let (metric, threshold) = value
        .split_once(':')
        .ok_or_else(|| format!("invalid z-score alert '{}', expected METRIC:THRESHOLD", value))?;
    let threshold: f64 = threshold
        .trim()
        .parse()
        .map_err(|_| format!("invalid threshold '{}'", threshold))?;
    Ok((metric.parse()?, threshold))
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::from_default_location()?.unwrap_or_default(),
    }
    .with_env_overrides();
    config.validate()?;
    Ok(config)
}

async fn fetch(config: &PipelineConfig, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        bail!("start date {} is after end date {}", start, end);
    }
    let client = NeoWsClient::from_settings(&config.fetch)?;
    let feed = fetch_in_chunks(
        &client,
        start,
        end,
        config.fetch.chunk_days,
        Duration::from_millis(config.fetch.request_delay_ms),
    )
    .await?;

    let raw_path = config.paths.raw_path();
    FeedLoader::save_to_file(&feed, &raw_path)
        .with_context(|| format!("Failed to save raw feed to {}", raw_path.display()))?;
    Ok(())
}

fn default_window(config: &PipelineConfig) -> (NaiveDate, NaiveDate) {
    trailing_window(Utc::now().date_naive(), config.fetch.days)
}

fn process(config: &PipelineConfig) -> Result<()> {
    let raw_path = config.paths.raw_path();
    let output = AnalysisPipeline::with_config(&config.analysis)
        .process(&raw_path)
        .with_context(|| format!("Failed to process {}", raw_path.display()))?;
    output.persist(&config.paths)?;

    let snapshot = output.snapshot();
    info!(
        "Processed {} records: {} high risk, {} anomalies",
        snapshot.total_records, snapshot.high_risk_count, snapshot.anomaly_count
    );
    Ok(())
}

async fn run(config: &PipelineConfig) -> Result<()> {
    if config.paths.raw_path().exists() {
        info!("Using existing raw feed {}", config.paths.raw_path().display());
    } else {
        let (start, end) = default_window(config);
        fetch(config, start, end).await?;
    }
    process(config)
}

fn print_snapshot(snapshot: &AnalysisSnapshot) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v));

    println!("Records:            {}", snapshot.total_records);
    if let (Some(first), Some(last)) = (snapshot.first_date, snapshot.last_date) {
        println!("Date range:         {} to {}", first, last);
    }
    println!("Mean risk score:    {}", fmt(snapshot.mean_risk_score));
    println!(
        "High risk (> {}):  {}",
        snapshot.high_risk_threshold, snapshot.high_risk_count
    );
    println!("Anomalies:          {}", snapshot.anomaly_count);
    println!(
        "Hazardous:          {} ({:.1}%)",
        snapshot.hazardous_count,
        snapshot.hazardous_fraction * 100.0
    );
    println!("Mean diameter km:   {}", fmt(snapshot.mean_diameter_km));
    println!("Mean miss dist km:  {}", fmt(snapshot.mean_miss_distance_km));
}

async fn summary(config: &PipelineConfig, top: usize) -> Result<()> {
    let analyzed_path = config.paths.analyzed_path();
    if !analyzed_path.exists() {
        warn!(
            "{} not found; running the pipeline first",
            analyzed_path.display()
        );
        run(config).await?;
    }

    let df = load_analyzed_table(&analyzed_path)?;
    print_snapshot(&snapshot_from_frame(
        &df,
        config.analysis.high_risk_threshold,
    )?);
    println!();
    println!("{}", top_risk_frame(&df, top)?);
    Ok(())
}

fn print_records(records: &[AnalyzedRecord]) {
    println!(
        "{:<12} {:<28} {:>10} {:<10} {:>14} {:>9}",
        "date", "name", "risk", "level", "miss_km", "anomaly"
    );
    for r in records {
        let miss = r
            .measurements()
            .miss_distance_km
            .map_or_else(|| "n/a".to_string(), |m| format!("{:.0}", m));
        println!(
            "{:<12} {:<28} {:>10.4} {:<10} {:>14} {:>9}",
            r.date().to_string(),
            r.name(),
            r.risk_score(),
            r.scored.risk_level.label(),
            miss,
            r.is_anomaly
        );
    }
}

fn alerts(config: &PipelineConfig, query: &AlertQuery, closest: bool) -> Result<()> {
    let raw_path = config.paths.raw_path();
    let output = AnalysisPipeline::with_config(&config.analysis)
        .process(&raw_path)
        .with_context(|| format!("Failed to process {}; run `fetch` first", raw_path.display()))?;

    let selected = if closest {
        daily_closest_approaches(&query.apply(&output.analyzed))
    } else {
        query.apply(&output.analyzed)
    };
    info!("{} of {} records selected", selected.len(), output.analyzed.len());
    print_records(&selected);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Fetch { days, start, end } => {
            let (start, end) = match (start, end, days) {
                (Some(start), Some(end), _) => (start, end),
                (_, _, Some(days)) => trailing_window(Utc::now().date_naive(), days),
                _ => default_window(&config),
            };
            fetch(&config, start, end).await
        }
        Command::Process => process(&config),
        Command::Run => run(&config).await,
        Command::Summary { top } => summary(&config, top).await,
        Command::Alerts {
            risk,
            zscore,
            start,
            end,
            closest,
        } => {
            let query = AlertQuery {
                start,
                end,
                risk_threshold: risk,
                zscore,
            };
            alerts(&config, &query, closest)
        }
    }
}
