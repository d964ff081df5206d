use log::info;
use std::path::Path;

use crate::algorithms::analysis::{compute_snapshot, AnalysisSnapshot};
use crate::algorithms::anomaly::AnomalyDetector;
use crate::algorithms::risk::RiskScorer;
use crate::algorithms::timeseries::TimeSeriesAggregator;
use crate::config::{AnalysisSettings, PathSettings};
use crate::core::domain::{AnalyzedRecord, AsteroidRecord, DailyAggregate, FlatRecord};
use crate::error::PipelineResult;
use crate::io::loaders::FeedLoader;
use crate::io::tables;
use crate::parsing::neo_feed::{self, NeoFeed};
use crate::transformations::cleaning::clean_records;

/// Tables produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub cleaned: Vec<AsteroidRecord>,
    pub analyzed: Vec<AnalyzedRecord>,
    pub daily: Vec<DailyAggregate>,
    /// Threshold the daily high-risk counts were built with
    pub high_risk_threshold: f64,
}

impl PipelineOutput {
    /// Summary of the analyzed table, using the same high-risk threshold as
    /// the daily table
    pub fn snapshot(&self) -> AnalysisSnapshot {
        compute_snapshot(&self.analyzed, self.high_risk_threshold)
    }

    /// Write the clean, analyzed and daily tables under `paths`
    pub fn persist(&self, paths: &PathSettings) -> PipelineResult<()> {
        tables::write_clean_table(&self.cleaned, &paths.clean_path())?;
        tables::write_analyzed_table(&self.analyzed, &paths.analyzed_path())?;
        tables::write_time_series_table(&self.daily, &paths.time_series_path())?;
        Ok(())
    }
}

/// Normalize, clean, score, flag and aggregate one batch
pub struct AnalysisPipeline {
    scorer: RiskScorer,
    detector: AnomalyDetector,
    aggregator: TimeSeriesAggregator,
}

impl AnalysisPipeline {
    /// Create a new pipeline with default settings
    pub fn new() -> Self {
        Self::with_config(&AnalysisSettings::default())
    }

    /// Create a pipeline with custom thresholds
    pub fn with_config(settings: &AnalysisSettings) -> Self {
        Self {
            scorer: RiskScorer::new(),
            detector: AnomalyDetector::with_threshold(settings.anomaly_threshold),
            aggregator: TimeSeriesAggregator::with_settings(
                settings.rolling_window_days,
                settings.high_risk_threshold,
            ),
        }
    }

    /// Process a raw feed file into the analyzed and daily tables
    ///
    /// # Arguments
    /// * `raw_path` - Path to the saved feed JSON
    ///
    /// # Returns
    /// PipelineOutput with the cleaned, analyzed and daily tables
    pub fn process(&self, raw_path: &Path) -> PipelineResult<PipelineOutput> {
        let loaded = FeedLoader::load_from_file(raw_path)?;
        self.process_records(&loaded.records)
    }

    /// Process from JSON string (useful for testing or API usage)
    pub fn process_json_str(&self, json_str: &str) -> PipelineResult<PipelineOutput> {
        let loaded = FeedLoader::load_from_str(json_str)?;
        self.process_records(&loaded.records)
    }

    /// Process a feed already held in memory
    pub fn process_feed(&self, feed: &NeoFeed) -> PipelineResult<PipelineOutput> {
        self.process_records(&neo_feed::normalize_feed(feed))
    }

    /// Run every stage after normalization.
    ///
    /// # Errors
    /// An empty batch fails at risk scoring and a single record fails at
    /// anomaly detection; no partial tables are returned.
    pub fn process_records(&self, records: &[FlatRecord]) -> PipelineResult<PipelineOutput> {
        let cleaned = clean_records(records);
        let scored = self.scorer.score(&cleaned)?;
        let analyzed = self.detector.detect(&scored)?;
        let daily = self.aggregator.aggregate(&analyzed);

        info!(
            "Pipeline produced {} analyzed records and {} daily rows",
            analyzed.len(),
            daily.len()
        );
        Ok(PipelineOutput {
            cleaned,
            analyzed,
            daily,
            high_risk_threshold: self.aggregator.high_risk_threshold(),
        })
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to run the pipeline on a raw feed file and persist
/// its tables
pub fn run_pipeline(raw_path: &Path, paths: &PathSettings) -> PipelineResult<PipelineOutput> {
    let output = AnalysisPipeline::new().process(raw_path)?;
    output.persist(paths)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn feed_json() -> &'static str {
        r#"{
            "element_count": 3,
            "near_earth_objects": {
                "2024-01-01": [
                    {
                        "id": "1",
                        "name": "(A)",
                        "estimated_diameter": {"kilometers": {"estimated_diameter_min": 0.05, "estimated_diameter_max": 0.15}},
                        "is_potentially_hazardous_asteroid": false,
                        "close_approach_data": [{
                            "close_approach_date": "2024-01-01",
                            "relative_velocity": {"kilometers_per_hour": "18000"},
                            "miss_distance": {"kilometers": "1000000"}
                        }]
                    },
                    {
                        "id": "2",
                        "name": "(B)",
                        "estimated_diameter": {"kilometers": {"estimated_diameter_min": 0.4, "estimated_diameter_max": 0.6}},
                        "is_potentially_hazardous_asteroid": false,
                        "close_approach_data": [{
                            "close_approach_date": "2024-01-01",
                            "relative_velocity": {"kilometers_per_hour": "54000"},
                            "miss_distance": {"kilometers": "5000000"}
                        }]
                    }
                ],
                "2024-01-03": [
                    {
                        "id": "3",
                        "name": "(C)",
                        "estimated_diameter": {"kilometers": {"estimated_diameter_min": 0.9, "estimated_diameter_max": 1.1}},
                        "is_potentially_hazardous_asteroid": true,
                        "close_approach_data": [{
                            "close_approach_date": "2024-01-03",
                            "relative_velocity": {"kilometers_per_hour": "108000"},
                            "miss_distance": {"kilometers": "9000000"}
                        }]
                    }
                ]
            }
        }"#
    }

    #[test]
    fn test_process_json_str_basic() {
        let output = AnalysisPipeline::new().process_json_str(feed_json()).unwrap();

        assert_eq!(output.cleaned.len(), 3);
        assert_eq!(output.analyzed.len(), 3);
        // 2024-01-01..=2024-01-03, with the middle day empty
        assert_eq!(output.daily.len(), 3);
        assert_eq!(output.daily[1].asteroid_count, 0);

        // diameter 0.1/0.5/1.0, velocity 5/15/30 km/s, miss 1e6/5e6/9e6
        let scores: Vec<f64> = output.analyzed.iter().map(|r| r.risk_score()).collect();
        assert!((scores[0] - 0.3).abs() < 1e-9);
        assert!((scores[2] - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_empty_feed_is_an_error() {
        let result = AnalysisPipeline::new().process_json_str(r#"{"element_count": 0}"#);
        assert!(matches!(result, Err(PipelineError::EmptyBatch(_))));
    }

    #[test]
    fn test_single_record_is_insufficient() {
        let feed = r#"{"near_earth_objects": {"2024-01-01": [{"id": "1", "name": "x"}]}}"#;
        let result = AnalysisPipeline::new().process_json_str(feed);
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientData { found: 1, .. })
        ));
    }

    #[test]
    fn test_custom_thresholds() {
        let settings = AnalysisSettings {
            anomaly_threshold: 0.5,
            high_risk_threshold: 0.4,
            rolling_window_days: 2,
        };
        let output = AnalysisPipeline::with_config(&settings)
            .process_json_str(feed_json())
            .unwrap();

        assert!(output.analyzed.iter().any(|r| r.is_anomaly));
        assert_eq!(output.daily[0].high_risk_count, 1);

        // the summary counts high risk the same way the daily table does
        let snapshot = output.snapshot();
        let daily_high: u32 = output.daily.iter().map(|d| d.high_risk_count).sum();
        assert_eq!(snapshot.high_risk_threshold, 0.4);
        assert_eq!(snapshot.high_risk_count, daily_high as usize);
        assert_eq!(snapshot.high_risk_count, 2);
        // window of two: day 3 averages days 2 and 3
        assert_eq!(output.daily[2].asteroid_count_7d_avg, 0.5);
    }
}
