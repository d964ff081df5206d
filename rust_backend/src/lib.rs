//! Near-Earth object analysis pipeline.
//!
//! Raw close-approach feeds are normalized into flat records, cleaned,
//! scored for risk, screened for statistical anomalies and rolled up into a
//! dense daily time series. The resulting tables are persisted as CSV for
//! downstream reporting.

pub mod algorithms;
pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod io;
pub mod parsing;
pub mod preprocessing;
pub mod time;
pub mod transformations;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use preprocessing::{AnalysisPipeline, PipelineOutput};
