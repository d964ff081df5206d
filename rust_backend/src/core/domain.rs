//! Domain models for near-Earth object close approaches.
//!
//! This module provides the record types that flow through the analysis
//! pipeline, from the flat normalized record up to the analyzed record carrying
//! risk and anomaly information, plus the per-day aggregate row.

use chrono::NaiveDate;
use qtty::velocity::Velocity;
use qtty::{Hour, Kilometer, Per, Second};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Converts a relative velocity from km/h to km/s.
///
/// # Examples
///
/// ```
/// use neows_rust::core::domain::km_per_hour_to_km_per_second;
///
/// let v = km_per_hour_to_km_per_second(36_000.0);
/// assert!((v - 10.0).abs() < 1e-9);
/// ```
pub fn km_per_hour_to_km_per_second(km_h: f64) -> f64 {
    Velocity::<Kilometer, Hour>::new(km_h)
        .to::<Per<Kilometer, Second>>()
        .value()
}

/// The numeric measurements carried by every asteroid row.
///
/// All fields are optional: the upstream feed may omit diameter or approach
/// data, and the cleaner only fills a gap when the column has at least one
/// observed value in the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub diameter_min_km: Option<f64>,
    pub diameter_max_km: Option<f64>,
    pub diameter_mean_km: Option<f64>,
    pub miss_distance_km: Option<f64>,
    pub relative_velocity_km_h: Option<f64>,
    pub relative_velocity_km_s: Option<f64>,
}

/// One of the six numeric columns of [`Measurements`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    DiameterMin,
    DiameterMax,
    DiameterMean,
    MissDistance,
    VelocityKmH,
    VelocityKmS,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 6] = [
        NumericColumn::DiameterMin,
        NumericColumn::DiameterMax,
        NumericColumn::DiameterMean,
        NumericColumn::MissDistance,
        NumericColumn::VelocityKmH,
        NumericColumn::VelocityKmS,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::DiameterMin => "diameter_min_km",
            NumericColumn::DiameterMax => "diameter_max_km",
            NumericColumn::DiameterMean => "diameter_mean_km",
            NumericColumn::MissDistance => "miss_distance_km",
            NumericColumn::VelocityKmH => "relative_velocity_km_h",
            NumericColumn::VelocityKmS => "relative_velocity_km_s",
        }
    }

    pub fn get(self, m: &Measurements) -> Option<f64> {
        match self {
            NumericColumn::DiameterMin => m.diameter_min_km,
            NumericColumn::DiameterMax => m.diameter_max_km,
            NumericColumn::DiameterMean => m.diameter_mean_km,
            NumericColumn::MissDistance => m.miss_distance_km,
            NumericColumn::VelocityKmH => m.relative_velocity_km_h,
            NumericColumn::VelocityKmS => m.relative_velocity_km_s,
        }
    }

    pub fn get_mut(self, m: &mut Measurements) -> &mut Option<f64> {
        match self {
            NumericColumn::DiameterMin => &mut m.diameter_min_km,
            NumericColumn::DiameterMax => &mut m.diameter_max_km,
            NumericColumn::DiameterMean => &mut m.diameter_mean_km,
            NumericColumn::MissDistance => &mut m.miss_distance_km,
            NumericColumn::VelocityKmH => &mut m.relative_velocity_km_h,
            NumericColumn::VelocityKmS => &mut m.relative_velocity_km_s,
        }
    }
}

/// A flat record as produced by the normalizer, before cleaning.
///
/// `date` is the feed's day bucket the entry was listed under, while
/// `close_approach_date` is read from the first close-approach entry and may be
/// absent when the feed carries no approach data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub date: NaiveDate,
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub is_potentially_hazardous: Option<bool>,
    pub close_approach_date: Option<NaiveDate>,
}

/// A cleaned asteroid record: gaps imputed and the hazard flag coerced to a
/// strict boolean.
///
/// # Examples
///
/// ```
/// use neows_rust::core::domain::{AsteroidRecord, Measurements};
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let record = AsteroidRecord {
///     date: day,
///     id: "2000433".to_string(),
///     name: "433 Eros".to_string(),
///     measurements: Measurements {
///         diameter_mean_km: Some(22.0),
///         ..Measurements::default()
///     },
///     is_potentially_hazardous: false,
///     close_approach_date: Some(day),
/// };
/// assert_eq!(record.measurements.diameter_mean_km, Some(22.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsteroidRecord {
    pub date: NaiveDate,
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub is_potentially_hazardous: bool,
    pub close_approach_date: Option<NaiveDate>,
}

/// Categorical risk bucket derived from a risk score.
///
/// Buckets are half-open intervals of width 0.2, closed on the left; the top
/// bucket also holds a score of exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    /// Bins a score in `[0, 1]` into its level.
    ///
    /// # Examples
    ///
    /// ```
    /// use neows_rust::core::domain::RiskLevel;
    ///
    /// assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
    /// assert_eq!(RiskLevel::from_score(0.5999), RiskLevel::Medium);
    /// assert_eq!(RiskLevel::from_score(1.0), RiskLevel::VeryHigh);
    /// ```
    pub fn from_score(score: f64) -> Self {
        if score < 0.2 {
            RiskLevel::VeryLow
        } else if score < 0.4 {
            RiskLevel::Low
        } else if score < 0.6 {
            RiskLevel::Medium
        } else if score < 0.8 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Very Low",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An asteroid record with its composite risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub asteroid: AsteroidRecord,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// The metrics screened for statistical outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DiameterMeanKm,
    MissDistanceKm,
    RelativeVelocityKmS,
    RiskScore,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::DiameterMeanKm,
        Metric::MissDistanceKm,
        Metric::RelativeVelocityKmS,
        Metric::RiskScore,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Metric::DiameterMeanKm => "diameter_mean_km",
            Metric::MissDistanceKm => "miss_distance_km",
            Metric::RelativeVelocityKmS => "relative_velocity_km_s",
            Metric::RiskScore => "risk_score",
        }
    }

    pub fn zscore_column(self) -> &'static str {
        match self {
            Metric::DiameterMeanKm => "diameter_mean_km_zscore",
            Metric::MissDistanceKm => "miss_distance_km_zscore",
            Metric::RelativeVelocityKmS => "relative_velocity_km_s_zscore",
            Metric::RiskScore => "risk_score_zscore",
        }
    }

    /// Reads this metric from a scored record.
    pub fn value(self, record: &ScoredRecord) -> Option<f64> {
        let m = &record.asteroid.measurements;
        match self {
            Metric::DiameterMeanKm => m.diameter_mean_km,
            Metric::MissDistanceKm => m.miss_distance_km,
            Metric::RelativeVelocityKmS => m.relative_velocity_km_s,
            Metric::RiskScore => Some(record.risk_score),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches("_zscore");
        Metric::ALL
            .into_iter()
            .find(|m| m.column_name() == trimmed)
            .ok_or_else(|| {
                format!(
                    "Unknown metric: {}. Must be one of diameter_mean_km, miss_distance_km, relative_velocity_km_s, risk_score",
                    s
                )
            })
    }
}

/// Per-record z-scores, one per [`Metric`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZScores {
    pub diameter_mean_km_zscore: f64,
    pub miss_distance_km_zscore: f64,
    pub relative_velocity_km_s_zscore: f64,
    pub risk_score_zscore: f64,
}

impl ZScores {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::DiameterMeanKm => self.diameter_mean_km_zscore,
            Metric::MissDistanceKm => self.miss_distance_km_zscore,
            Metric::RelativeVelocityKmS => self.relative_velocity_km_s_zscore,
            Metric::RiskScore => self.risk_score_zscore,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::DiameterMeanKm => self.diameter_mean_km_zscore = value,
            Metric::MissDistanceKm => self.miss_distance_km_zscore = value,
            Metric::RelativeVelocityKmS => self.relative_velocity_km_s_zscore = value,
            Metric::RiskScore => self.risk_score_zscore = value,
        }
    }
}

/// A scored record with z-scores and its anomaly flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedRecord {
    #[serde(flatten)]
    pub scored: ScoredRecord,
    #[serde(flatten)]
    pub zscores: ZScores,
    pub is_anomaly: bool,
}

impl AnalyzedRecord {
    pub fn date(&self) -> NaiveDate {
        self.scored.asteroid.date
    }

    pub fn name(&self) -> &str {
        &self.scored.asteroid.name
    }

    pub fn risk_score(&self) -> f64 {
        self.scored.risk_score
    }

    pub fn measurements(&self) -> &Measurements {
        &self.scored.asteroid.measurements
    }
}

/// One row of the daily time series.
///
/// Mean-valued columns are `None` on days without records (a gap, not zero);
/// count columns are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub asteroid_count: u32,
    pub avg_diameter_km: Option<f64>,
    pub avg_velocity_km_s: Option<f64>,
    pub avg_miss_distance_km: Option<f64>,
    pub avg_risk_score: Option<f64>,
    pub high_risk_count: u32,
    pub asteroid_count_7d_avg: f64,
    pub avg_diameter_km_7d_avg: Option<f64>,
    pub avg_velocity_km_s_7d_avg: Option<f64>,
    pub avg_miss_distance_km_7d_avg: Option<f64>,
    pub avg_risk_score_7d_avg: Option<f64>,
    pub high_risk_count_7d_avg: f64,
}
