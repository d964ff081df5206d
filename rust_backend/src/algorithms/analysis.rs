use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithms::stats::{mean, observed};
use crate::core::domain::AnalyzedRecord;
use crate::time::parse_day;

/// Size of the top-risk subset
pub const TOP_RISK_COUNT: usize = 10;
/// Diameter above which an object counts as large, in km
pub const LARGE_DIAMETER_KM: f64 = 0.5;
/// Miss distance below which an approach counts as close, in km
pub const CLOSE_APPROACH_KM: f64 = 10_000_000.0;
/// Relative velocity above which an object counts as fast, in km/s
pub const FAST_VELOCITY_KM_S: f64 = 20.0;

/// Batch-level summary of an analyzed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub total_records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub mean_risk_score: Option<f64>,
    /// Scores strictly above this count as high risk
    pub high_risk_threshold: f64,
    pub high_risk_count: usize,
    pub anomaly_count: usize,
    pub hazardous_count: usize,
    pub hazardous_fraction: f64,
    pub mean_diameter_km: Option<f64>,
    pub mean_miss_distance_km: Option<f64>,
}

/// The slice of a row the snapshot needs
struct SnapshotRow {
    date: Option<NaiveDate>,
    risk_score: Option<f64>,
    is_anomaly: bool,
    is_hazardous: bool,
    diameter_km: Option<f64>,
    miss_distance_km: Option<f64>,
}

fn summarize(rows: Vec<SnapshotRow>, high_risk_threshold: f64) -> AnalysisSnapshot {
    let total = rows.len();
    let hazardous_count = rows.iter().filter(|r| r.is_hazardous).count();

    AnalysisSnapshot {
        total_records: total,
        first_date: rows.iter().filter_map(|r| r.date).min(),
        last_date: rows.iter().filter_map(|r| r.date).max(),
        mean_risk_score: mean(&observed(rows.iter().map(|r| r.risk_score))),
        high_risk_threshold,
        high_risk_count: rows
            .iter()
            .filter(|r| r.risk_score.is_some_and(|s| s > high_risk_threshold))
            .count(),
        anomaly_count: rows.iter().filter(|r| r.is_anomaly).count(),
        hazardous_count,
        hazardous_fraction: if total > 0 {
            hazardous_count as f64 / total as f64
        } else {
            0.0
        },
        mean_diameter_km: mean(&observed(rows.iter().map(|r| r.diameter_km))),
        mean_miss_distance_km: mean(&observed(rows.iter().map(|r| r.miss_distance_km))),
    }
}

/// Compute the summary of an analyzed batch, counting scores above
/// `high_risk_threshold` as high risk
pub fn compute_snapshot(records: &[AnalyzedRecord], high_risk_threshold: f64) -> AnalysisSnapshot {
    let rows = records
        .iter()
        .map(|r| SnapshotRow {
            date: Some(r.date()),
            risk_score: Some(r.risk_score()),
            is_anomaly: r.is_anomaly,
            is_hazardous: r.scored.asteroid.is_potentially_hazardous,
            diameter_km: r.measurements().diameter_mean_km,
            miss_distance_km: r.measurements().miss_distance_km,
        })
        .collect();
    summarize(rows, high_risk_threshold)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, PolarsError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn bool_column(df: &DataFrame, name: &str) -> Result<Vec<bool>, PolarsError> {
    let column = df.column(name)?;
    match column.dtype() {
        DataType::Boolean => Ok(column
            .bool()?
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect()),
        _ => {
            // all-null columns come back as strings
            let text = column.cast(&DataType::String)?;
            Ok(text
                .str()?
                .into_iter()
                .map(|v| v.is_some_and(|s| s.eq_ignore_ascii_case("true")))
                .collect())
        }
    }
}

fn date_column(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>, PolarsError> {
    let text = df.column(name)?.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_day))
        .collect())
}

/// Compute the summary of an analyzed table read back from disk
///
/// # Arguments
/// * `df` - Analyzed table with the persisted column names
/// * `high_risk_threshold` - Scores strictly above this count as high risk
///
/// # Returns
/// AnalysisSnapshot with aggregated metrics
pub fn snapshot_from_frame(
    df: &DataFrame,
    high_risk_threshold: f64,
) -> Result<AnalysisSnapshot, PolarsError> {
    let dates = date_column(df, "date")?;
    let risk = float_column(df, "risk_score")?;
    let anomalies = bool_column(df, "is_anomaly")?;
    let hazardous = bool_column(df, "is_potentially_hazardous")?;
    let diameters = float_column(df, "diameter_mean_km")?;
    let misses = float_column(df, "miss_distance_km")?;

    let rows = (0..df.height())
        .map(|i| SnapshotRow {
            date: dates[i],
            risk_score: risk[i],
            is_anomaly: anomalies[i],
            is_hazardous: hazardous[i],
            diameter_km: diameters[i],
            miss_distance_km: misses[i],
        })
        .collect();
    Ok(summarize(rows, high_risk_threshold))
}

/// Top `n` records by risk score, highest first; ties keep input order
pub fn top_risk(records: &[AnalyzedRecord], n: usize) -> Vec<AnalyzedRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.risk_score().total_cmp(&a.risk_score()));
    sorted.truncate(n);
    sorted
}

/// Get top N rows of an analyzed table ordered by risk score
///
/// # Arguments
/// * `df` - Analyzed table
/// * `n` - Number of top rows to return
///
/// # Returns
/// DataFrame with the display columns of the top N rows
pub fn top_risk_frame(df: &DataFrame, n: usize) -> Result<DataFrame, PolarsError> {
    if df.column("risk_score").is_err() || n == 0 {
        return Ok(DataFrame::empty());
    }

    let columns = [
        "date",
        "name",
        "diameter_mean_km",
        "miss_distance_km",
        "relative_velocity_km_s",
        "risk_score",
        "risk_level",
        "is_anomaly",
    ];
    let existing_cols: Vec<&str> = columns
        .iter()
        .filter(|&&col| df.column(col).is_ok())
        .copied()
        .collect();

    let sorted = df.sort(
        ["risk_score"],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_maintain_order(true),
    )?;
    sorted.head(Some(n)).select(existing_cols)
}

/// Record subsets behind the standard charts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSubsets {
    pub top_risk: Vec<AnalyzedRecord>,
    pub hazardous: Vec<AnalyzedRecord>,
    pub large: Vec<AnalyzedRecord>,
    pub close_approach: Vec<AnalyzedRecord>,
    pub fast: Vec<AnalyzedRecord>,
    pub anomalous: Vec<AnalyzedRecord>,
}

impl VisualizationSubsets {
    pub fn from_records(records: &[AnalyzedRecord]) -> Self {
        let select = |pred: &dyn Fn(&AnalyzedRecord) -> bool| -> Vec<AnalyzedRecord> {
            records.iter().filter(|r| pred(r)).cloned().collect()
        };

        Self {
            top_risk: top_risk(records, TOP_RISK_COUNT),
            hazardous: select(&|r| r.scored.asteroid.is_potentially_hazardous),
            large: select(&|r| {
                r.measurements()
                    .diameter_mean_km
                    .is_some_and(|d| d > LARGE_DIAMETER_KM)
            }),
            close_approach: select(&|r| {
                r.measurements()
                    .miss_distance_km
                    .is_some_and(|d| d < CLOSE_APPROACH_KM)
            }),
            fast: select(&|r| {
                r.measurements()
                    .relative_velocity_km_s
                    .is_some_and(|v| v > FAST_VELOCITY_KM_S)
            }),
            anomalous: select(&|r| r.is_anomaly),
        }
    }
}
