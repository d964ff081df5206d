//! Composite risk scoring.
//!
//! Each record gets a score in `[0, 1]` built from three batch-normalized
//! signals: size, speed and proximity (closer approach scores higher). The
//! source hazard flag adds a flat bonus before the score is clipped at 1.0.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::algorithms::stats::{min_max, observed};
use crate::core::domain::{AsteroidRecord, RiskLevel, ScoredRecord};
use crate::error::{PipelineError, PipelineResult};

/// Weights and bonus of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub diameter: f64,
    pub velocity: f64,
    pub miss_distance: f64,
    pub hazard_bonus: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            diameter: 0.4,
            velocity: 0.3,
            miss_distance: 0.3,
            hazard_bonus: 0.2,
        }
    }
}

/// Batch range of one signal, used for min-max normalization.
///
/// A signal whose batch range is zero (or that has no observed values)
/// normalizes to 0 for every record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRange {
    bounds: Option<(f64, f64)>,
}

impl SignalRange {
    pub fn from_values<I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let bounds = min_max(&observed(values)).filter(|(min, max)| max > min);
        if bounds.is_none() {
            debug!("Signal {} has zero range in this batch; its term is 0", name);
        }
        Self { bounds }
    }

    /// `(value - min) / (max - min)`, or 0 for a degenerate range or a gap.
    pub fn normalize(&self, value: Option<f64>) -> f64 {
        match (self.bounds, value) {
            (Some((min, max)), Some(v)) => (v - min) / (max - min),
            _ => 0.0,
        }
    }

    /// `1 - normalize(value)`, or 0 for a degenerate range or a gap.
    pub fn normalize_inverted(&self, value: Option<f64>) -> f64 {
        match (self.bounds, value) {
            (Some(_), Some(_)) => 1.0 - self.normalize(value),
            _ => 0.0,
        }
    }
}

/// Risk scorer holding the weights applied to every batch
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: RiskWeights) -> Self {
        Self { weights }
    }

    /// Score a cleaned batch.
    ///
    /// # Errors
    /// [`PipelineError::EmptyBatch`] when `records` is empty.
    pub fn score(&self, records: &[AsteroidRecord]) -> PipelineResult<Vec<ScoredRecord>> {
        if records.is_empty() {
            return Err(PipelineError::EmptyBatch("risk scoring"));
        }

        let diameter = SignalRange::from_values(
            "diameter_mean_km",
            records.iter().map(|r| r.measurements.diameter_mean_km),
        );
        let velocity = SignalRange::from_values(
            "relative_velocity_km_s",
            records.iter().map(|r| r.measurements.relative_velocity_km_s),
        );
        let miss = SignalRange::from_values(
            "miss_distance_km",
            records.iter().map(|r| r.measurements.miss_distance_km),
        );

        let w = &self.weights;
        let scored: Vec<ScoredRecord> = records
            .iter()
            .map(|record| {
                let m = &record.measurements;
                let mut score = w.diameter * diameter.normalize(m.diameter_mean_km)
                    + w.velocity * velocity.normalize(m.relative_velocity_km_s)
                    + w.miss_distance * miss.normalize_inverted(m.miss_distance_km);

                if record.is_potentially_hazardous {
                    score += w.hazard_bonus;
                }
                let risk_score = score.min(1.0);

                ScoredRecord {
                    asteroid: record.clone(),
                    risk_score,
                    risk_level: RiskLevel::from_score(risk_score),
                }
            })
            .collect();

        info!("Scored {} records", scored.len());
        Ok(scored)
    }
}

/// Score a batch with the default weights
pub fn calculate_risk_scores(records: &[AsteroidRecord]) -> PipelineResult<Vec<ScoredRecord>> {
    RiskScorer::new().score(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Measurements;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn record(diameter: f64, velocity: f64, miss: f64, hazardous: bool) -> AsteroidRecord {
        AsteroidRecord {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            id: format!("{}-{}-{}", diameter, velocity, miss),
            name: "test".to_string(),
            measurements: Measurements {
                diameter_mean_km: Some(diameter),
                miss_distance_km: Some(miss),
                relative_velocity_km_s: Some(velocity),
                ..Measurements::default()
            },
            is_potentially_hazardous: hazardous,
            close_approach_date: None,
        }
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let result = calculate_risk_scores(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyBatch(_))));
    }

    #[test]
    fn test_three_record_scores() {
        let batch = vec![
            record(0.1, 5.0, 1.0e6, false),
            record(0.5, 15.0, 5.0e6, false),
            record(1.0, 30.0, 9.0e6, false),
        ];
        let scored = calculate_risk_scores(&batch).unwrap();

        // terms: diameter {0, 4/9, 1}, velocity {0, 0.4, 1}, inverted miss {1, 0.5, 0}
        let expected = [0.3, 0.4 * 4.0 / 9.0 + 0.12 + 0.15, 0.7];
        for (s, e) in scored.iter().zip(expected) {
            assert!((s.risk_score - e).abs() < 1e-9, "{} vs {}", s.risk_score, e);
        }
        assert_eq!(scored[0].risk_level, RiskLevel::Low);
        assert_eq!(scored[1].risk_level, RiskLevel::Medium);
        assert_eq!(scored[2].risk_level, RiskLevel::High);
    }

    #[test]
    fn test_hazard_bonus_clips_at_one() {
        // largest, fastest and closest: raw composite 1.0, plus bonus
        let batch = vec![
            record(2.0, 40.0, 1.0e5, true),
            record(0.1, 5.0, 9.0e6, false),
        ];
        let scored = calculate_risk_scores(&batch).unwrap();
        assert_eq!(scored[0].risk_score, 1.0);
        assert_eq!(scored[0].risk_level, RiskLevel::VeryHigh);
        assert_eq!(scored[1].risk_score, 0.0);
    }

    #[test]
    fn test_hazard_bonus_is_additive() {
        let batch = vec![
            record(0.1, 5.0, 9.0e6, false),
            record(0.1, 5.0, 9.0e6, true),
            record(1.0, 30.0, 1.0e6, false),
        ];
        let scored = calculate_risk_scores(&batch).unwrap();
        assert!((scored[1].risk_score - scored[0].risk_score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_range_yields_zero_term() {
        let batch = vec![
            record(0.5, 10.0, 1.0e6, false),
            record(0.5, 10.0, 1.0e6, false),
        ];
        let scored = calculate_risk_scores(&batch).unwrap();
        for s in &scored {
            assert_eq!(s.risk_score, 0.0);
            assert!(!s.risk_score.is_nan());
        }

        let single = calculate_risk_scores(&[record(0.5, 10.0, 1.0e6, true)]).unwrap();
        assert!((single[0].risk_score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_input_is_not_modified() {
        let batch = vec![record(0.1, 5.0, 1.0e6, false), record(0.2, 6.0, 2.0e6, true)];
        let before = batch.clone();
        let scored = calculate_risk_scores(&batch).unwrap();
        assert_eq!(batch, before);
        assert_eq!(scored[1].asteroid, before[1]);
    }

    proptest! {
        #[test]
        fn prop_scores_stay_in_unit_interval(
            rows in prop::collection::vec(
                (0.001f64..10.0, 0.1f64..80.0, 1.0e3f64..1.0e8, any::<bool>()),
                1..50,
            )
        ) {
            let batch: Vec<AsteroidRecord> = rows
                .iter()
                .map(|(d, v, m, h)| record(*d, *v, *m, *h))
                .collect();
            let scored = calculate_risk_scores(&batch).unwrap();
            for s in scored {
                prop_assert!(s.risk_score >= 0.0 && s.risk_score <= 1.0);
                prop_assert_eq!(s.risk_level, RiskLevel::from_score(s.risk_score));
            }
        }
    }
}
