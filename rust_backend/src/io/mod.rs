//! Artifact persistence.
//!
//! The raw feed is stored as JSON; the cleaned, analyzed and daily tables are
//! stored as CSV through polars and read back as `DataFrame`s.
//!
//! # Example
//!
//! ```no_run
//! use neows_rust::io::{load_analyzed_table, FeedLoader};
//! use std::path::Path;
//!
//! let result = FeedLoader::load_from_file(Path::new("data/asteroids_raw.json"))
//!     .expect("Failed to load");
//! println!("Loaded {} records", result.records.len());
//!
//! let table = load_analyzed_table(Path::new("data/asteroids_analyzed.csv"))
//!     .expect("Failed to read table");
//! println!("{}", table.head(Some(5)));
//! ```

pub mod loaders;
pub mod tables;

#[cfg(test)]
mod tables_tests;

pub use loaders::{load_analyzed_table, load_time_series_table, FeedLoadResult, FeedLoader};
pub use tables::{
    analyzed_to_dataframe, clean_to_dataframe, daily_to_dataframe, read_table,
    write_analyzed_table, write_clean_table, write_csv, write_time_series_table,
};
