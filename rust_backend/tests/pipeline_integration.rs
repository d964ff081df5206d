//! Integration tests for the full analysis pipeline.
//!
//! These tests ensure that:
//! 1. A raw feed on disk becomes analyzed and daily tables on disk
//! 2. The daily table is dense over the observed date span
//! 3. Chunked fetching feeds the pipeline like a single download
//! 4. Missing artifacts and undersized batches are reported, not hidden

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;

use neows_rust::algorithms::{snapshot_from_frame, top_risk_frame};
use neows_rust::config::{PathSettings, PipelineConfig};
use neows_rust::error::{PipelineError, PipelineResult};
use neows_rust::fetch::{fetch_in_chunks, FeedSource};
use neows_rust::io::{load_analyzed_table, load_time_series_table, FeedLoader};
use neows_rust::parsing::NeoFeed;
use neows_rust::preprocessing::{run_pipeline, AnalysisPipeline};
use neows_rust::transformations::{count_above_risk, daily_closest_approaches, AlertQuery};

// ==================== Helper Functions ====================

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

fn neo_entry(id: u32, date: &str, diameter_km: f64, km_h: f64, miss_km: f64, hazardous: bool) -> Value {
    json!({
        "id": id.to_string(),
        "name": format!("({})", id),
        "estimated_diameter": {"kilometers": {
            "estimated_diameter_min": diameter_km * 0.5,
            "estimated_diameter_max": diameter_km * 1.5
        }},
        "is_potentially_hazardous_asteroid": hazardous,
        "close_approach_data": [{
            "close_approach_date": date,
            "relative_velocity": {"kilometers_per_hour": km_h.to_string()},
            "miss_distance": {"kilometers": miss_km.to_string()}
        }]
    })
}

/// Ten days of approaches with nothing listed on day 5
fn ten_day_feed() -> NeoFeed {
    let mut days = serde_json::Map::new();
    for d in (1..=10).filter(|d| *d != 5) {
        let date = day(d).format("%Y-%m-%d").to_string();
        let entries = vec![
            neo_entry(d * 10, &date, 0.1 * d as f64, 20_000.0 + 1_000.0 * d as f64, 5.0e6, false),
            neo_entry(d * 10 + 1, &date, 0.05, 30_000.0, 2.0e7 - 1.0e6 * d as f64, d == 7),
        ];
        days.insert(date, Value::Array(entries));
    }
    NeoFeed::from_value(&json!({ "near_earth_objects": days }))
}

fn paths_in(dir: &TempDir) -> PathSettings {
    PathSettings {
        data_dir: dir.path().join("data"),
        ..PathSettings::default()
    }
}

/// Serves slices of a prepared feed, as the remote endpoint would
struct SlicedFeed {
    feed: NeoFeed,
}

#[async_trait]
impl FeedSource for SlicedFeed {
    async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> PipelineResult<NeoFeed> {
        let (start, end) = (start.to_string(), end.to_string());
        let mut slice = NeoFeed::default();
        slice.near_earth_objects = self
            .feed
            .near_earth_objects
            .range(start..=end)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        slice.element_count = slice.entry_count() as u64;
        Ok(slice)
    }
}

// ==================== Tests ====================

#[test]
fn test_raw_feed_to_tables_on_disk() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    FeedLoader::save_to_file(&ten_day_feed(), &paths.raw_path()).unwrap();

    let output = run_pipeline(&paths.raw_path(), &paths).unwrap();
    assert_eq!(output.analyzed.len(), 18);
    assert!(paths.clean_path().exists());

    let analyzed = load_analyzed_table(&paths.analyzed_path()).unwrap();
    assert_eq!(analyzed.height(), 18);
    for column in ["risk_score", "risk_level", "is_anomaly", "risk_score_zscore"] {
        assert!(analyzed.column(column).is_ok(), "missing column {}", column);
    }
    let scores = analyzed.column("risk_score").unwrap().f64().unwrap();
    assert!(scores.into_iter().flatten().all(|s| (0.0..=1.0).contains(&s)));

    let daily = load_time_series_table(&paths.time_series_path()).unwrap();
    assert_eq!(daily.height(), 10);
    let dates: Vec<Option<&str>> = daily.column("date").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(dates[4], Some("2024-04-05"));
    assert_eq!(daily.column("avg_risk_score").unwrap().null_count(), 1);
}

#[test]
fn test_daily_rolling_columns() {
    let output = AnalysisPipeline::new().process_feed(&ten_day_feed()).unwrap();
    let daily = &output.daily;
    assert_eq!(daily.len(), 10);

    // day 5 is synthesized with zero counts and gaps
    assert_eq!(daily[4].asteroid_count, 0);
    assert_eq!(daily[4].high_risk_count, 0);
    assert!(daily[4].avg_diameter_km.is_none());

    // first day's rolling value is its own value
    assert_eq!(daily[0].avg_diameter_km_7d_avg, daily[0].avg_diameter_km);

    // day 8 averages the observed days among 2..=8
    let observed: Vec<f64> = daily[1..8].iter().filter_map(|d| d.avg_diameter_km).collect();
    assert_eq!(observed.len(), 6);
    let expected = observed.iter().sum::<f64>() / observed.len() as f64;
    assert!((daily[7].avg_diameter_km_7d_avg.unwrap() - expected).abs() < 1e-12);

    let counts: f64 = daily[1..8].iter().map(|d| d.asteroid_count as f64).sum();
    assert!((daily[7].asteroid_count_7d_avg - counts / 7.0).abs() < 1e-12);
}

#[test]
fn test_summary_from_persisted_table() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    FeedLoader::save_to_file(&ten_day_feed(), &paths.raw_path()).unwrap();
    let output = run_pipeline(&paths.raw_path(), &paths).unwrap();

    let df = load_analyzed_table(&paths.analyzed_path()).unwrap();
    let expected = output.snapshot();
    let snapshot = snapshot_from_frame(&df, expected.high_risk_threshold).unwrap();
    assert_eq!(snapshot.total_records, expected.total_records);
    assert_eq!(snapshot.first_date, Some(day(1)));
    assert_eq!(snapshot.last_date, Some(day(10)));
    assert_eq!(snapshot.hazardous_count, 1);
    assert_eq!(snapshot.high_risk_count, expected.high_risk_count);
    assert_eq!(snapshot.anomaly_count, expected.anomaly_count);

    let top = top_risk_frame(&df, 5).unwrap();
    assert_eq!(top.height(), 5);
    let top_scores: Vec<f64> = top
        .column("risk_score")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert!(top_scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_chunked_fetch_matches_single_download() {
    let source = SlicedFeed { feed: ten_day_feed() };
    let fetched = fetch_in_chunks(&source, day(1), day(10), 3, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(fetched, source.feed);

    let pipeline = AnalysisPipeline::new();
    let from_chunks = pipeline.process_feed(&fetched).unwrap();
    let direct = pipeline.process_feed(&source.feed).unwrap();
    assert_eq!(from_chunks.analyzed, direct.analyzed);
    assert_eq!(from_chunks.daily, direct.daily);
}

#[test]
fn test_missing_artifacts_are_reported() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);

    assert!(matches!(
        AnalysisPipeline::new().process(&paths.raw_path()),
        Err(PipelineError::MissingUpstreamArtifact(_))
    ));
    assert!(matches!(
        load_time_series_table(&paths.time_series_path()),
        Err(PipelineError::MissingUpstreamArtifact(_))
    ));
}

#[test]
fn test_config_driven_run() {
    let dir = TempDir::new().unwrap();
    let toml = format!(
        "[paths]\ndata_dir = {:?}\n\n[analysis]\nhigh_risk_threshold = 0.0\n",
        dir.path().join("custom").display().to_string()
    );
    let config = PipelineConfig::from_toml_str(&toml).unwrap();
    FeedLoader::save_to_file(&ten_day_feed(), &config.paths.raw_path()).unwrap();

    let output = AnalysisPipeline::with_config(&config.analysis)
        .process(&config.paths.raw_path())
        .unwrap();
    output.persist(&config.paths).unwrap();

    let total_high: u32 = output.daily.iter().map(|d| d.high_risk_count).sum();
    let positive = output.analyzed.iter().filter(|r| r.risk_score() > 0.0).count();
    assert_eq!(total_high as usize, positive);
    assert!(config.paths.time_series_path().exists());

    // summaries from memory and from disk agree with the daily table
    assert_eq!(output.snapshot().high_risk_count, positive);
    let df = load_analyzed_table(&config.paths.analyzed_path()).unwrap();
    let snapshot = snapshot_from_frame(&df, config.analysis.high_risk_threshold).unwrap();
    assert_eq!(snapshot.high_risk_count, positive);
}

#[test]
fn test_alerts_over_pipeline_output() {
    let output = AnalysisPipeline::new().process_feed(&ten_day_feed()).unwrap();

    let risky = AlertQuery {
        risk_threshold: Some(0.6),
        ..AlertQuery::default()
    }
    .apply(&output.analyzed);
    assert_eq!(risky.len(), count_above_risk(&output.analyzed, 0.6));

    let windowed = AlertQuery {
        start: Some(day(3)),
        end: Some(day(6)),
        ..AlertQuery::default()
    }
    .apply(&output.analyzed);
    // days 3, 4 and 6; day 5 is empty
    assert_eq!(windowed.len(), 6);
    assert!(windowed.iter().all(|r| r.date() >= day(3) && r.date() <= day(6)));

    let closest = daily_closest_approaches(&output.analyzed);
    assert_eq!(closest.len(), 9);
    assert!(closest.iter().all(|r| r.measurements().miss_distance_km.is_some()));
}
