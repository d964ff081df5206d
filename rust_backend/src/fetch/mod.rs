//! Feed acquisition.
//!
//! The feed endpoint only serves short date ranges, so longer windows are
//! split into chunks that are requested one after another and merged.
//!
//! # Example
//!
//! ```no_run
//! use neows_rust::fetch::{fetch_in_chunks, NeoWsClient};
//! use chrono::NaiveDate;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), neows_rust::error::PipelineError> {
//! let client = NeoWsClient::new("https://api.nasa.gov/neo/rest/v1/feed", "DEMO_KEY")?;
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
//! let feed = fetch_in_chunks(&client, start, end, 7, Duration::from_secs(1)).await?;
//! println!("{} objects", feed.element_count);
//! # Ok(())
//! # }
//! ```

pub mod chunks;
#[cfg(feature = "fetch")]
pub mod client;

pub use chunks::{fetch_in_chunks, split_date_range, trailing_window, FeedSource};
#[cfg(feature = "fetch")]
pub use client::NeoWsClient;
