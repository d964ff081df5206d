use log::info;
use polars::prelude::*;
use std::fs;
use std::path::Path;

use crate::core::domain::FlatRecord;
use crate::error::PipelineResult;
use crate::io::tables::read_table;
use crate::parsing::neo_feed::{self, NeoFeed};

/// Result of loading a raw feed
#[derive(Debug)]
pub struct FeedLoadResult {
    pub feed: NeoFeed,
    pub records: Vec<FlatRecord>,
    pub num_days: usize,
}

impl FeedLoadResult {
    pub fn new(feed: NeoFeed) -> Self {
        let records = neo_feed::normalize_feed(&feed);
        let num_days = feed.near_earth_objects.len();
        Self {
            feed,
            records,
            num_days,
        }
    }
}

/// Reads and writes the raw feed artifact
pub struct FeedLoader;

impl FeedLoader {
    /// Load and normalize a raw feed file
    pub fn load_from_file(path: &Path) -> PipelineResult<FeedLoadResult> {
        let feed = neo_feed::parse_feed_file(path)?;
        let result = FeedLoadResult::new(feed);
        info!(
            "Loaded {} records over {} days from {}",
            result.records.len(),
            result.num_days,
            path.display()
        );
        Ok(result)
    }

    /// Load and normalize a raw feed held in memory
    pub fn load_from_str(json_str: &str) -> PipelineResult<FeedLoadResult> {
        Ok(FeedLoadResult::new(neo_feed::parse_feed_str(json_str)?))
    }

    /// Save a feed as pretty-printed JSON, creating parent directories
    pub fn save_to_file(feed: &NeoFeed, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(feed)?)?;
        info!(
            "Saved raw feed ({} objects) to {}",
            feed.element_count,
            path.display()
        );
        Ok(())
    }
}

/// Load the analyzed asteroid table
pub fn load_analyzed_table(path: &Path) -> PipelineResult<DataFrame> {
    read_table(path)
}

/// Load the daily time-series table
pub fn load_time_series_table(path: &Path) -> PipelineResult<DataFrame> {
    read_table(path)
}
