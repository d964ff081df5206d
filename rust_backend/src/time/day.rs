use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date format used for day keys in the feed and in every written table.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%b-%d %H:%M",
];

/// Parse a day key into a calendar day.
///
/// Plain `YYYY-MM-DD` keys are the norm. Timestamps (including the feed's
/// `2024-Jan-01 13:45` style and RFC 3339) are accepted and truncated to
/// their calendar day, so nothing downstream ever sees a time of day.
///
/// # Example
/// ```
/// use neows_rust::time::parse_day;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(parse_day("2024-01-05"), Some(day));
/// assert_eq!(parse_day("2024-Jan-05 23:59"), Some(day));
/// assert_eq!(parse_day("yesterday"), None);
/// ```
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, DAY_FORMAT) {
        return Some(day);
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Format a calendar day as `YYYY-MM-DD`.
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Every calendar day from `start` to `end`, both inclusive.
///
/// Returns an empty vector when `start > end`.
pub fn day_span(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}
