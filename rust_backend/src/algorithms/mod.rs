//! Scoring, anomaly detection and time-series analytics.
//!
//! This module holds the numerical stages of the pipeline that run after
//! cleaning, plus dataset-level summaries used by reports.
//!
//! # Components
//!
//! - [`stats`]: Gap-aware descriptive statistics
//! - [`risk`]: Composite risk score and risk level
//! - [`anomaly`]: Z-scores and anomaly flags
//! - [`timeseries`]: Dense daily aggregates with trailing averages
//! - [`analysis`]: Batch summaries and chart subsets
//!
//! # Example
//!
//! ```
//! use neows_rust::algorithms::{calculate_risk_scores, calculate_z_scores, generate_time_series};
//! use neows_rust::core::{AsteroidRecord, Measurements};
//! use chrono::NaiveDate;
//!
//! # fn main() -> Result<(), neows_rust::error::PipelineError> {
//! let records: Vec<AsteroidRecord> = (1..=3)
//!     .map(|d| AsteroidRecord {
//!         date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
//!         id: d.to_string(),
//!         name: format!("({})", d),
//!         measurements: Measurements {
//!             diameter_mean_km: Some(0.1 * d as f64),
//!             miss_distance_km: Some(1.0e6 * d as f64),
//!             relative_velocity_km_s: Some(5.0 * d as f64),
//!             ..Measurements::default()
//!         },
//!         is_potentially_hazardous: false,
//!         close_approach_date: None,
//!     })
//!     .collect();
//!
//! let analyzed = calculate_z_scores(&calculate_risk_scores(&records)?)?;
//! let daily = generate_time_series(&analyzed);
//! assert_eq!(daily.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod anomaly;
pub mod risk;
pub mod stats;
pub mod timeseries;

pub use analysis::{
    compute_snapshot, snapshot_from_frame, top_risk, top_risk_frame, AnalysisSnapshot,
    VisualizationSubsets,
};
pub use anomaly::{calculate_z_scores, AnomalyDetector, ColumnMoments, DEFAULT_ZSCORE_THRESHOLD};
pub use risk::{calculate_risk_scores, RiskScorer, RiskWeights, SignalRange};
pub use timeseries::{
    generate_time_series, rolling_mean, TimeSeriesAggregator, DEFAULT_HIGH_RISK_THRESHOLD,
};
