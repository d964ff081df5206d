//! Error types for pipeline operations.

use std::path::PathBuf;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type for pipeline operations
///
/// Record-level defects are recovered where they occur (the entry or field is
/// skipped) and only reach this type when a caller parses a single entry
/// directly. Batch-level defects are fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Empty batch: {0} requires at least one record")]
    EmptyBatch(&'static str),

    #[error("Insufficient data: need at least {required} records, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Missing upstream artifact: {}", .0.display())]
    MissingUpstreamArtifact(PathBuf),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table error: {0}")]
    Table(#[from] polars::error::PolarsError),
}

