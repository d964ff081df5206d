//! Pipeline configuration file support.
//!
//! This module reads pipeline settings from a TOML file. Every section and
//! field is optional; missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// Environment variable holding the feed API key
pub const API_KEY_ENV: &str = "NASA_API_KEY";
/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Artifact locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_raw_file")]
    pub raw_file: String,
    #[serde(default = "default_clean_file")]
    pub clean_file: String,
    #[serde(default = "default_analyzed_file")]
    pub analyzed_file: String,
    #[serde(default = "default_time_series_file")]
    pub time_series_file: String,
}

/// Feed endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u32,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

/// Analysis thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,
    #[serde(default = "default_high_risk_threshold")]
    pub high_risk_threshold: f64,
    #[serde(default = "default_rolling_window_days")]
    pub rolling_window_days: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_raw_file() -> String {
    "asteroids_raw.json".to_string()
}

fn default_clean_file() -> String {
    "asteroids_clean.csv".to_string()
}

fn default_analyzed_file() -> String {
    "asteroids_analyzed.csv".to_string()
}

fn default_time_series_file() -> String {
    "time_series_data.csv".to_string()
}

fn default_base_url() -> String {
    "https://api.nasa.gov/neo/rest/v1/feed".to_string()
}

fn default_api_key() -> String {
    "DEMO_KEY".to_string()
}

fn default_chunk_days() -> u32 {
    7
}

fn default_days() -> u32 {
    30
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_anomaly_threshold() -> f64 {
    2.0
}

fn default_high_risk_threshold() -> f64 {
    0.6
}

fn default_rolling_window_days() -> usize {
    7
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            raw_file: default_raw_file(),
            clean_file: default_clean_file(),
            analyzed_file: default_analyzed_file(),
            time_series_file: default_time_series_file(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            chunk_days: default_chunk_days(),
            days: default_days(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            anomaly_threshold: default_anomaly_threshold(),
            high_risk_threshold: default_high_risk_threshold(),
            rolling_window_days: default_rolling_window_days(),
        }
    }
}

impl PathSettings {
    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join(&self.raw_file)
    }

    pub fn clean_path(&self) -> PathBuf {
        self.data_dir.join(&self.clean_file)
    }

    pub fn analyzed_path(&self) -> PathBuf {
        self.data_dir.join(&self.analyzed_file)
    }

    pub fn time_series_path(&self) -> PathBuf {
        self.data_dir.join(&self.time_series_file)
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(PipelineConfig)` if successful
    /// * `Err(PipelineError::Configuration)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        toml::from_str(content).map_err(|e| {
            PipelineError::Configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load pipeline configuration from the default location.
    ///
    /// Searches for `neows.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    ///
    /// # Returns
    /// * `Ok(Some(PipelineConfig))` if found and parsed successfully
    /// * `Ok(None)` if no config file exists
    /// * `Err(PipelineError)` on a parse error
    pub fn from_default_location() -> PipelineResult<Option<Self>> {
        let search_paths = [
            PathBuf::from("neows.toml"),
            PathBuf::from("rust_backend/neows.toml"),
            PathBuf::from("../neows.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Apply `NASA_API_KEY` and `DATA_DIR` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(DATA_DIR_ENV).ok(),
        )
    }

    /// Replace the API key and data directory when values are given.
    /// Empty strings are ignored.
    pub fn with_overrides(mut self, api_key: Option<String>, data_dir: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.fetch.api_key = key;
        }
        if let Some(dir) = data_dir.filter(|d| !d.is_empty()) {
            self.paths.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// Reject settings no stage can run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.fetch.chunk_days == 0 {
            return Err(PipelineError::Configuration(
                "fetch.chunk_days must be at least 1".to_string(),
            ));
        }
        if self.analysis.rolling_window_days == 0 {
            return Err(PipelineError::Configuration(
                "analysis.rolling_window_days must be at least 1".to_string(),
            ));
        }
        if !(self.analysis.anomaly_threshold.is_finite() && self.analysis.anomaly_threshold >= 0.0)
        {
            return Err(PipelineError::Configuration(format!(
                "analysis.anomaly_threshold must be a non-negative number, got {}",
                self.analysis.anomaly_threshold
            )));
        }
        Ok(())
    }
}
