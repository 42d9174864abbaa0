//! Date helper functions

use chrono::{DateTime, Utc};

/// ISO 8601 with milliseconds and a `Z` suffix, as used in sitemaps
///
/// # Examples
/// ```ignore
/// iso_millis(&date) // -> "2024-01-15T10:30:00.000Z"
/// ```
pub fn iso_millis(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Format date in full format (like "January 15, 2024")
pub fn long_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Format date as "2024-01-15"
pub fn short_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
