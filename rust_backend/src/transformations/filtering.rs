use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::core::domain::{AnalyzedRecord, DailyAggregate, Metric};

/// Filter records whose `date` falls in `[start, end]`
pub fn filter_by_date_range(
    records: &[AnalyzedRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<AnalyzedRecord> {
    records
        .iter()
        .filter(|r| (start..=end).contains(&r.date()))
        .cloned()
        .collect()
}

/// Filter daily rows whose `date` falls in `[start, end]`
pub fn filter_daily_by_date_range(
    days: &[DailyAggregate],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyAggregate> {
    days.iter()
        .filter(|d| (start..=end).contains(&d.date))
        .cloned()
        .collect()
}

/// Records with a risk score strictly above `threshold`
pub fn risk_alerts(records: &[AnalyzedRecord], threshold: f64) -> Vec<AnalyzedRecord> {
    records
        .iter()
        .filter(|r| r.risk_score() > threshold)
        .cloned()
        .collect()
}

/// Records whose z-score on `metric` exceeds `threshold` in absolute value
pub fn zscore_alerts(
    records: &[AnalyzedRecord],
    metric: Metric,
    threshold: f64,
) -> Vec<AnalyzedRecord> {
    records
        .iter()
        .filter(|r| r.zscores.get(metric).abs() > threshold)
        .cloned()
        .collect()
}

pub fn count_above_risk(records: &[AnalyzedRecord], threshold: f64) -> usize {
    records.iter().filter(|r| r.risk_score() > threshold).count()
}

/// Closest approach of each day, ordered by day.
///
/// Records without a miss distance never win; a day where no record has one
/// is left out. On equal distances the first record seen is kept.
pub fn daily_closest_approaches(records: &[AnalyzedRecord]) -> Vec<AnalyzedRecord> {
    let mut closest: BTreeMap<NaiveDate, (f64, &AnalyzedRecord)> = BTreeMap::new();
    for record in records {
        let Some(miss) = record.measurements().miss_distance_km else {
            continue;
        };
        closest
            .entry(record.date())
            .and_modify(|best| {
                if miss < best.0 {
                    *best = (miss, record);
                }
            })
            .or_insert((miss, record));
    }
    closest.into_values().map(|(_, r)| r.clone()).collect()
}

/// Alert selection over an analyzed batch.
///
/// The date window is applied first; each threshold that is set must then
/// hold. With no threshold set every record in the window is returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub risk_threshold: Option<f64>,
    pub zscore: Option<(Metric, f64)>,
}

impl AlertQuery {
    pub fn apply(&self, records: &[AnalyzedRecord]) -> Vec<AnalyzedRecord> {
        let mut selected = filter_by_date_range(
            records,
            self.start.unwrap_or(NaiveDate::MIN),
            self.end.unwrap_or(NaiveDate::MAX),
        );
        if let Some(threshold) = self.risk_threshold {
            selected = risk_alerts(&selected, threshold);
        }
        if let Some((metric, threshold)) = self.zscore {
            selected = zscore_alerts(&selected, metric, threshold);
        }
        selected
    }
}
