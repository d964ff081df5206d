//! End-to-end batch processing.
//!
//! [`AnalysisPipeline`] chains the normalizer, cleaner, risk scorer, anomaly
//! detector and time-series aggregator; [`PipelineOutput::persist`] writes the
//! resulting tables.

pub mod pipeline;

pub use pipeline::{run_pipeline, AnalysisPipeline, PipelineOutput};
