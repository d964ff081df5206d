use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use log::{debug, info};
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::parsing::neo_feed::NeoFeed;

/// Anything able to return the feed for an inclusive date range.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the feed covering `start..=end`.
    async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> PipelineResult<NeoFeed>;
}

/// Split `start..=end` into consecutive inclusive chunks of at most
/// `chunk_days` days.
///
/// # Errors
/// [`PipelineError::Configuration`] when `chunk_days` is 0.
///
/// # Example
/// ```
/// use neows_rust::fetch::split_date_range;
/// use chrono::NaiveDate;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let chunks = split_date_range(d(1), d(10), 7).unwrap();
/// assert_eq!(chunks, vec![(d(1), d(7)), (d(8), d(10))]);
/// ```
pub fn split_date_range(
    start: NaiveDate,
    end: NaiveDate,
    chunk_days: u32,
) -> PipelineResult<Vec<(NaiveDate, NaiveDate)>> {
    if chunk_days == 0 {
        return Err(PipelineError::Configuration(
            "chunk_days must be at least 1".to_string(),
        ));
    }

    let mut chunks = Vec::new();
    let mut current = start;
    while current <= end {
        let chunk_end = current
            .checked_add_days(Days::new(u64::from(chunk_days) - 1))
            .map_or(end, |d| d.min(end));
        chunks.push((current, chunk_end));
        match chunk_end.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(chunks)
}

/// The window of the last `days` days ending at `end`, as `(end - days, end)`
pub fn trailing_window(end: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let start = end
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// Fetch `start..=end` chunk by chunk and merge the results.
///
/// Chunks are requested in order with `delay` between consecutive requests.
/// A day present in several chunks keeps the later chunk's entries, and the
/// element count is recomputed from the merged map. The first failing chunk
/// aborts the whole fetch.
pub async fn fetch_in_chunks<S>(
    source: &S,
    start: NaiveDate,
    end: NaiveDate,
    chunk_days: u32,
    delay: Duration,
) -> PipelineResult<NeoFeed>
where
    S: FeedSource + ?Sized,
{
    let chunks = split_date_range(start, end, chunk_days)?;
    info!(
        "Fetching {} to {} in {} chunk(s) of up to {} days",
        start,
        end,
        chunks.len(),
        chunk_days
    );

    let mut merged = NeoFeed::default();
    for (i, (chunk_start, chunk_end)) in chunks.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let feed = source.fetch_range(*chunk_start, *chunk_end).await?;
        debug!(
            "Chunk {}..{} returned {} objects",
            chunk_start,
            chunk_end,
            feed.entry_count()
        );
        merged.merge(feed);
    }

    info!(
        "Fetched {} objects over {} days",
        merged.element_count,
        merged.near_earth_objects.len()
    );
    Ok(merged)
}
