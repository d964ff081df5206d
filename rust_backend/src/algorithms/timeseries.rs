//! Daily time series with trailing rolling averages.

use chrono::NaiveDate;
use log::info;
use std::collections::BTreeMap;

use crate::algorithms::stats::{mean, observed};
use crate::core::domain::{AnalyzedRecord, DailyAggregate};
use crate::time::day_span;

/// Default trailing window, in days
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// Default risk score above which a record counts as high risk
pub const DEFAULT_HIGH_RISK_THRESHOLD: f64 = 0.6;

/// Trailing mean over `window` entries ending at each position.
///
/// Gaps are skipped; a position whose window holds no observed value stays a
/// gap. At least one observation is required, so the first position equals
/// its own value.
///
/// # Example
/// ```
/// use neows_rust::algorithms::timeseries::rolling_mean;
///
/// let values = [Some(1.0), None, Some(3.0), Some(5.0)];
/// let rolled = rolling_mean(&values, 2);
/// assert_eq!(rolled, vec![Some(1.0), Some(1.0), Some(3.0), Some(4.0)]);
/// ```
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&observed(values[start..=i].iter().copied()))
        })
        .collect()
}

/// Daily bucket before rolling averages are attached
#[derive(Debug, Default)]
struct DayBucket {
    count: u32,
    high_risk: u32,
    diameters: Vec<Option<f64>>,
    velocities: Vec<Option<f64>>,
    miss_distances: Vec<Option<f64>>,
    risk_scores: Vec<Option<f64>>,
}

/// Aggregates analyzed records into a dense daily table
#[derive(Debug, Clone)]
pub struct TimeSeriesAggregator {
    window: usize,
    high_risk_threshold: f64,
}

impl Default for TimeSeriesAggregator {
    fn default() -> Self {
        Self {
            window: DEFAULT_ROLLING_WINDOW,
            high_risk_threshold: DEFAULT_HIGH_RISK_THRESHOLD,
        }
    }
}

impl TimeSeriesAggregator {
    /// Scores strictly above this count as high risk
    pub fn high_risk_threshold(&self) -> f64 {
        self.high_risk_threshold
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(window: usize, high_risk_threshold: f64) -> Self {
        Self {
            window: window.max(1),
            high_risk_threshold,
        }
    }

    /// Build one row per calendar day from the earliest to the latest `date`.
    ///
    /// Days without records get zero counts and gaps for every mean column.
    /// An empty batch yields an empty table.
    pub fn aggregate(&self, records: &[AnalyzedRecord]) -> Vec<DailyAggregate> {
        let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        for record in records {
            let bucket = buckets.entry(record.date()).or_default();
            let m = record.measurements();
            bucket.count += 1;
            if record.risk_score() > self.high_risk_threshold {
                bucket.high_risk += 1;
            }
            bucket.diameters.push(m.diameter_mean_km);
            bucket.velocities.push(m.relative_velocity_km_s);
            bucket.miss_distances.push(m.miss_distance_km);
            bucket.risk_scores.push(Some(record.risk_score()));
        }

        let (Some(first), Some(last)) = (
            buckets.keys().next().copied(),
            buckets.keys().next_back().copied(),
        ) else {
            return Vec::new();
        };

        let empty = DayBucket::default();
        let days = day_span(first, last);

        let daily_mean = |pick: fn(&DayBucket) -> &Vec<Option<f64>>| -> Vec<Option<f64>> {
            days.iter()
                .map(|day| {
                    let bucket = buckets.get(day).unwrap_or(&empty);
                    mean(&observed(pick(bucket).iter().copied()))
                })
                .collect()
        };

        let counts: Vec<Option<f64>> = days
            .iter()
            .map(|day| Some(buckets.get(day).map_or(0, |b| b.count) as f64))
            .collect();
        let high_risk: Vec<Option<f64>> = days
            .iter()
            .map(|day| Some(buckets.get(day).map_or(0, |b| b.high_risk) as f64))
            .collect();
        let diameters = daily_mean(|b| &b.diameters);
        let velocities = daily_mean(|b| &b.velocities);
        let miss_distances = daily_mean(|b| &b.miss_distances);
        let risk_scores = daily_mean(|b| &b.risk_scores);

        let counts_7d = rolling_mean(&counts, self.window);
        let high_risk_7d = rolling_mean(&high_risk, self.window);
        let diameters_7d = rolling_mean(&diameters, self.window);
        let velocities_7d = rolling_mean(&velocities, self.window);
        let miss_distances_7d = rolling_mean(&miss_distances, self.window);
        let risk_scores_7d = rolling_mean(&risk_scores, self.window);

        let table: Vec<DailyAggregate> = days
            .iter()
            .enumerate()
            .map(|(i, day)| {
                let bucket = buckets.get(day).unwrap_or(&empty);
                DailyAggregate {
                    date: *day,
                    asteroid_count: bucket.count,
                    avg_diameter_km: diameters[i],
                    avg_velocity_km_s: velocities[i],
                    avg_miss_distance_km: miss_distances[i],
                    avg_risk_score: risk_scores[i],
                    high_risk_count: bucket.high_risk,
                    asteroid_count_7d_avg: counts_7d[i].unwrap_or(0.0),
                    avg_diameter_km_7d_avg: diameters_7d[i],
                    avg_velocity_km_s_7d_avg: velocities_7d[i],
                    avg_miss_distance_km_7d_avg: miss_distances_7d[i],
                    avg_risk_score_7d_avg: risk_scores_7d[i],
                    high_risk_count_7d_avg: high_risk_7d[i].unwrap_or(0.0),
                }
            })
            .collect();

        info!(
            "Aggregated {} records into {} days ({} to {})",
            records.len(),
            table.len(),
            first,
            last
        );
        table
    }
}

/// Aggregate with the default window and high-risk threshold
pub fn generate_time_series(records: &[AnalyzedRecord]) -> Vec<DailyAggregate> {
    TimeSeriesAggregator::new().aggregate(records)
}
