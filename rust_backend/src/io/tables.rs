use log::info;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

use crate::core::domain::{AnalyzedRecord, AsteroidRecord, DailyAggregate, Measurements};
use crate::error::{PipelineError, PipelineResult};
use crate::time::format_day;

/// Columns read back as `Float64` even when every value looks integral
const FLOAT_COLUMNS: [&str; 21] = [
    "diameter_min_km",
    "diameter_max_km",
    "diameter_mean_km",
    "miss_distance_km",
    "relative_velocity_km_h",
    "relative_velocity_km_s",
    "risk_score",
    "diameter_mean_km_zscore",
    "miss_distance_km_zscore",
    "relative_velocity_km_s_zscore",
    "risk_score_zscore",
    "avg_diameter_km",
    "avg_velocity_km_s",
    "avg_miss_distance_km",
    "avg_risk_score",
    "asteroid_count_7d_avg",
    "avg_diameter_km_7d_avg",
    "avg_velocity_km_s_7d_avg",
    "avg_miss_distance_km_7d_avg",
    "avg_risk_score_7d_avg",
    "high_risk_count_7d_avg",
];

/// Measurement columns shared by the clean and analyzed tables
struct MeasurementColumns {
    diameter_min: Vec<Option<f64>>,
    diameter_max: Vec<Option<f64>>,
    diameter_mean: Vec<Option<f64>>,
    miss_distance: Vec<Option<f64>>,
    velocity_km_h: Vec<Option<f64>>,
    velocity_km_s: Vec<Option<f64>>,
}

impl MeasurementColumns {
    fn collect<'a>(rows: impl Iterator<Item = &'a Measurements>) -> Self {
        let mut columns = Self {
            diameter_min: Vec::new(),
            diameter_max: Vec::new(),
            diameter_mean: Vec::new(),
            miss_distance: Vec::new(),
            velocity_km_h: Vec::new(),
            velocity_km_s: Vec::new(),
        };
        for m in rows {
            columns.diameter_min.push(m.diameter_min_km);
            columns.diameter_max.push(m.diameter_max_km);
            columns.diameter_mean.push(m.diameter_mean_km);
            columns.miss_distance.push(m.miss_distance_km);
            columns.velocity_km_h.push(m.relative_velocity_km_h);
            columns.velocity_km_s.push(m.relative_velocity_km_s);
        }
        columns
    }
}

fn asteroid_to_dataframe<'a>(
    records: impl Iterator<Item = &'a AsteroidRecord> + Clone,
) -> PolarsResult<DataFrame> {
    let dates: Vec<String> = records.clone().map(|r| format_day(r.date)).collect();
    let ids: Vec<String> = records.clone().map(|r| r.id.clone()).collect();
    let names: Vec<String> = records.clone().map(|r| r.name.clone()).collect();
    let hazardous: Vec<bool> = records
        .clone()
        .map(|r| r.is_potentially_hazardous)
        .collect();
    let approach_dates: Vec<Option<String>> = records
        .clone()
        .map(|r| r.close_approach_date.map(format_day))
        .collect();
    let m = MeasurementColumns::collect(records.map(|r| &r.measurements));

    df!(
        "date" => dates,
        "id" => ids,
        "name" => names,
        "diameter_min_km" => m.diameter_min,
        "diameter_max_km" => m.diameter_max,
        "diameter_mean_km" => m.diameter_mean,
        "miss_distance_km" => m.miss_distance,
        "relative_velocity_km_h" => m.velocity_km_h,
        "relative_velocity_km_s" => m.velocity_km_s,
        "is_potentially_hazardous" => hazardous,
        "close_approach_date" => approach_dates,
    )
}

/// Convert cleaned records into a DataFrame, `date` first
pub fn clean_to_dataframe(records: &[AsteroidRecord]) -> PolarsResult<DataFrame> {
    asteroid_to_dataframe(records.iter())
}

/// Convert analyzed records into a DataFrame with score and z-score columns
pub fn analyzed_to_dataframe(records: &[AnalyzedRecord]) -> PolarsResult<DataFrame> {
    let mut df = asteroid_to_dataframe(records.iter().map(|r| &r.scored.asteroid))?;

    let risk_scores: Vec<f64> = records.iter().map(|r| r.scored.risk_score).collect();
    let risk_levels: Vec<String> = records
        .iter()
        .map(|r| r.scored.risk_level.label().to_string())
        .collect();
    let z_diameter: Vec<f64> = records.iter().map(|r| r.zscores.diameter_mean_km_zscore).collect();
    let z_miss: Vec<f64> = records.iter().map(|r| r.zscores.miss_distance_km_zscore).collect();
    let z_velocity: Vec<f64> = records
        .iter()
        .map(|r| r.zscores.relative_velocity_km_s_zscore)
        .collect();
    let z_risk: Vec<f64> = records.iter().map(|r| r.zscores.risk_score_zscore).collect();
    let anomalies: Vec<bool> = records.iter().map(|r| r.is_anomaly).collect();

    let extra = df!(
        "risk_score" => risk_scores,
        "risk_level" => risk_levels,
        "diameter_mean_km_zscore" => z_diameter,
        "miss_distance_km_zscore" => z_miss,
        "relative_velocity_km_s_zscore" => z_velocity,
        "risk_score_zscore" => z_risk,
        "is_anomaly" => anomalies,
    )?;
    df.hstack_mut(extra.get_columns())?;
    Ok(df)
}

/// Convert the daily series into a DataFrame, `date` first
pub fn daily_to_dataframe(days: &[DailyAggregate]) -> PolarsResult<DataFrame> {
    let pick = |f: fn(&DailyAggregate) -> Option<f64>| -> Vec<Option<f64>> {
        days.iter().map(f).collect()
    };

    df!(
        "date" => days.iter().map(|d| format_day(d.date)).collect::<Vec<_>>(),
        "asteroid_count" => days.iter().map(|d| d.asteroid_count).collect::<Vec<_>>(),
        "avg_diameter_km" => pick(|d| d.avg_diameter_km),
        "avg_velocity_km_s" => pick(|d| d.avg_velocity_km_s),
        "avg_miss_distance_km" => pick(|d| d.avg_miss_distance_km),
        "avg_risk_score" => pick(|d| d.avg_risk_score),
        "high_risk_count" => days.iter().map(|d| d.high_risk_count).collect::<Vec<_>>(),
        "asteroid_count_7d_avg" => days.iter().map(|d| d.asteroid_count_7d_avg).collect::<Vec<_>>(),
        "avg_diameter_km_7d_avg" => pick(|d| d.avg_diameter_km_7d_avg),
        "avg_velocity_km_s_7d_avg" => pick(|d| d.avg_velocity_km_s_7d_avg),
        "avg_miss_distance_km_7d_avg" => pick(|d| d.avg_miss_distance_km_7d_avg),
        "avg_risk_score_7d_avg" => pick(|d| d.avg_risk_score_7d_avg),
        "high_risk_count_7d_avg" => days.iter().map(|d| d.high_risk_count_7d_avg).collect::<Vec<_>>(),
    )
}

/// Write a DataFrame as CSV with a header row, creating parent directories
pub fn write_csv(df: &mut DataFrame, path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

pub fn write_clean_table(records: &[AsteroidRecord], path: &Path) -> PipelineResult<()> {
    write_csv(&mut clean_to_dataframe(records)?, path)
}

pub fn write_analyzed_table(records: &[AnalyzedRecord], path: &Path) -> PipelineResult<()> {
    write_csv(&mut analyzed_to_dataframe(records)?, path)
}

pub fn write_time_series_table(days: &[DailyAggregate], path: &Path) -> PipelineResult<()> {
    write_csv(&mut daily_to_dataframe(days)?, path)
}

/// Read a persisted table, normalizing the column types the writer produced.
///
/// Identifiers and dates come back as strings and measurement, score and
/// average columns as `Float64`, whatever the CSV reader inferred.
pub fn read_table(path: &Path) -> PipelineResult<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::MissingUpstreamArtifact(path.to_path_buf()));
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;

    for name in ["id", "name", "risk_level", "date", "close_approach_date"] {
        let cast = match df.column(name) {
            Ok(column) => column.cast(&DataType::String)?,
            Err(_) => continue,
        };
        df.with_column(cast)?;
    }
    for name in FLOAT_COLUMNS {
        let cast = match df.column(name) {
            Ok(column) => column.cast(&DataType::Float64)?,
            Err(_) => continue,
        };
        df.with_column(cast)?;
    }
    Ok(df)
}
