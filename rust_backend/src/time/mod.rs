pub mod day;

pub use day::{day_span, format_day, parse_day, DAY_FORMAT};
