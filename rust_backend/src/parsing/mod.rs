//! Parsers for the near-Earth object feed.
//!
//! This module types the raw feed document at the ingestion boundary and
//! flattens it into one record per asteroid per feed day.
//!
//! # Example
//!
//! ```
//! use neows_rust::parsing::{normalize_feed, parse_feed_str};
//!
//! let feed = parse_feed_str(r#"{"near_earth_objects": {"2024-01-01": [
//!     {"id": "1", "name": "(2024 AA)", "close_approach_data": []}
//! ]}}"#).unwrap();
//! let records = normalize_feed(&feed);
//! assert_eq!(records.len(), 1);
//! ```

pub mod neo_feed;


pub use neo_feed::{
    normalize_entry, normalize_feed, parse_feed_file, parse_feed_str, parse_neo_entry, NeoFeed,
    RawNeo,
};
