//! # Date Helpers
//!
//! Calendar-day keys for the cash register and promise-date bookkeeping for
//! debtors. Pure functions over supplied timestamps; nothing here reads the
//! clock, so the repository layer stays deterministic under test.

use chrono::{DateTime, NaiveDate, Utc};

/// The key format used by the daily cash register: `YYYY-MM-DD`.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Derives the register date key for a timestamp.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use puesto_core::dates::date_key;
///
/// let ts = Utc.with_ymd_and_hms(2026, 8, 5, 14, 30, 0).unwrap();
/// assert_eq!(date_key(ts), "2026-08-05");
/// ```
pub fn date_key(at: DateTime<Utc>) -> String {
    at.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` date key back into a date, if well-formed.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Whether a promised payment date has passed as of `today`.
///
/// Compares whole days; a promise due today is not yet overdue.
pub fn is_promise_overdue(promise: Option<DateTime<Utc>>, today: DateTime<Utc>) -> bool {
    match promise {
        Some(p) => today.date_naive() > p.date_naive(),
        None => false,
    }
}

/// Days since the promised payment date, as of `today`.
///
/// Negative values mean the promise is still in the future; `None` when no
/// promise was made.
pub fn days_overdue(promise: Option<DateTime<Utc>>, today: DateTime<Utc>) -> Option<i64> {
    promise.map(|p| (today.date_naive() - p.date_naive()).num_days())
}
