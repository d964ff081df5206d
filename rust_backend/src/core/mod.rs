//! Core domain models for near-Earth object analysis.
//!
//! This module defines the record types shared by every pipeline stage:
//! flat and cleaned asteroid records, scored and analyzed records, and the
//! daily aggregate row.

pub mod domain;

pub use domain::{
    AnalyzedRecord, AsteroidRecord, DailyAggregate, FlatRecord, Measurements, Metric,
    NumericColumn, RiskLevel, ScoredRecord, ZScores,
};
