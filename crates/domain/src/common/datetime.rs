//! DateTime parsing utilities with consistent error handling.

use chrono::{DateTime, Utc};

/// Parses an RFC3339 timestamp string, returning an error if parsing fails.
///
/// # Examples
///
/// ```
/// use loreweave_domain::common::parse_datetime;
/// use chrono::Datelike;
///
/// let dt = parse_datetime("2024-01-15T10:30:00Z").unwrap();
/// assert_eq!(dt.year(), 2024);
/// ```
///
/// # Errors
///
/// Returns `chrono::ParseError` if the string is not valid RFC3339.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Parses an RFC3339 timestamp string, falling back to provided default on error.
///
/// This is useful for database fields that should have a valid timestamp
/// even if the stored value is malformed. Use with ClockPort for testability:
///
/// ```ignore
/// parse_datetime_or(&timestamp_str, self.clock.now())
/// ```
///
/// # Examples
///
/// ```
/// use loreweave_domain::common::parse_datetime_or;
/// use chrono::{DateTime, Utc, TimeZone, Datelike};
///
/// let default = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
///
/// // Valid timestamp returns parsed value
/// let dt = parse_datetime_or("2024-01-15T10:30:00Z", default);
/// assert_eq!(dt.year(), 2024);
///
/// // Invalid timestamp returns default
/// let dt = parse_datetime_or("not-a-date", default);
/// assert_eq!(dt.year(), 2020);
/// ```
pub fn parse_datetime_or(s: &str, default: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(default)
}
