//! Record cleaning and filtering.
//!
//! # Modules
//!
//! - [`cleaning`]: Coerce numeric fields and impute gaps with batch medians
//! - [`filtering`]: Date windows, alert thresholds and per-day selections
//!
//! # Example
//!
//! ```
//! use neows_rust::transformations::clean_records;
//! use neows_rust::core::{FlatRecord, Measurements};
//! use chrono::NaiveDate;
//!
//! let flat = FlatRecord {
//!     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     id: "1".to_string(),
//!     name: "(1)".to_string(),
//!     measurements: Measurements::default(),
//!     is_potentially_hazardous: None,
//!     close_approach_date: None,
//! };
//! let cleaned = clean_records(&[flat]);
//! assert!(!cleaned[0].is_potentially_hazardous);
//! ```

pub mod cleaning;
pub mod filtering;

pub use cleaning::{clean_records, impute_missing, ImputeStrategy};
pub use filtering::{
    count_above_risk, daily_closest_approaches, filter_by_date_range, filter_daily_by_date_range,
    risk_alerts, zscore_alerts, AlertQuery,
};
