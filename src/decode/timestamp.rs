use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Utc};

use crate::error::ParseError;

/// Upstream stamps carry no year, e.g. "Jan 05, 12:00 UTC"
const STAMP_FORMAT: &str = "%Y %b %d, %H:%M";

/// December stamps further than this ahead of a January clock belong to the
/// previous year
const MAX_CLOCK_SKEW_HOURS: i64 = 24;

/// Parse a year-less upstream stamp, taking the year from `now`.
///
/// A stamp written in December and read in January would land almost a year
/// in the future; only those are placed in the previous year. Any other stamp
/// keeps the current year even when it is ahead of the clock.
pub fn parse_upstream_timestamp(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = text.trim();
    let stamp = trimmed
        .strip_suffix("UTC")
        .map(str::trim_end)
        .unwrap_or(trimmed);

    let at_year = |year: i32| {
        NaiveDateTime::parse_from_str(&format!("{year} {stamp}"), STAMP_FORMAT)
            .ok()
            .map(|dt| dt.and_utc())
    };

    let parsed = at_year(now.year()).ok_or_else(|| ParseError::Timestamp(text.to_string()))?;

    let crosses_new_year = parsed.month() == 12
        && now.month() == 1
        && parsed - now > Duration::hours(MAX_CLOCK_SKEW_HOURS);
    if crosses_new_year {
        return at_year(now.year() - 1).ok_or_else(|| ParseError::Timestamp(text.to_string()));
    }

    Ok(parsed)
}
