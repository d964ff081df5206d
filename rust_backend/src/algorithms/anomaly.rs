//! Z-score based anomaly detection.

use log::{debug, info};

use crate::algorithms::stats::{mean, observed, sample_std};
use crate::core::domain::{AnalyzedRecord, Metric, ScoredRecord, ZScores};
use crate::error::{PipelineError, PipelineResult};

/// Default absolute z-score above which a record is anomalous
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 2.0;

/// Mean and sample standard deviation of one metric over a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMoments {
    pub mean: f64,
    pub std: f64,
}

impl ColumnMoments {
    /// `None` when the column has fewer than two observed values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            std: sample_std(values)?,
        })
    }

    /// Standard score of `value`; 0 for a constant column or a gap.
    pub fn zscore(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) if self.std > 0.0 => (v - self.mean) / self.std,
            _ => 0.0,
        }
    }
}

/// Flags records whose metrics sit far from the batch mean
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ZSCORE_THRESHOLD,
        }
    }
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compute z-scores for every [`Metric`] and flag anomalies.
    ///
    /// A record is anomalous when any of its z-scores exceeds the threshold in
    /// absolute value. Columns with zero spread contribute a z-score of 0.
    ///
    /// # Errors
    /// [`PipelineError::InsufficientData`] when the batch has fewer than two
    /// records.
    pub fn detect(&self, records: &[ScoredRecord]) -> PipelineResult<Vec<AnalyzedRecord>> {
        if records.len() < 2 {
            return Err(PipelineError::InsufficientData {
                required: 2,
                found: records.len(),
            });
        }

        let moments: Vec<(Metric, Option<ColumnMoments>)> = Metric::ALL
            .into_iter()
            .map(|metric| {
                let values = observed(records.iter().map(|r| metric.value(r)));
                let m = ColumnMoments::from_values(&values);
                match m {
                    Some(m) if m.std > 0.0 => {
                        debug!("{}: mean={} std={}", metric.column_name(), m.mean, m.std)
                    }
                    _ => debug!("{} has no spread; z-scores are 0", metric.column_name()),
                }
                (metric, m)
            })
            .collect();

        let analyzed: Vec<AnalyzedRecord> = records
            .iter()
            .map(|record| {
                let mut zscores = ZScores::default();
                for (metric, m) in &moments {
                    let z = m.map_or(0.0, |m| m.zscore(metric.value(record)));
                    zscores.set(*metric, z);
                }
                let is_anomaly = Metric::ALL
                    .iter()
                    .any(|metric| zscores.get(*metric).abs() > self.threshold);

                AnalyzedRecord {
                    scored: record.clone(),
                    zscores,
                    is_anomaly,
                }
            })
            .collect();

        info!(
            "Flagged {} anomalies in {} records",
            analyzed.iter().filter(|r| r.is_anomaly).count(),
            analyzed.len()
        );
        Ok(analyzed)
    }
}

/// Detect anomalies with the default threshold
pub fn calculate_z_scores(records: &[ScoredRecord]) -> PipelineResult<Vec<AnalyzedRecord>> {
    AnomalyDetector::new().detect(records)
}
