//! Time helpers
//!
//! All persisted instants are unix milliseconds; day keys and
//! human-readable dates are rendered in the configured business timezone.

use chrono_tz::Tz;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Local calendar-day key ("%Y-%m-%d") for the given instant
///
/// The day counter resets when this key changes.
pub fn day_key(ts_millis: i64, tz: Tz) -> String {
    match chrono::DateTime::from_timestamp_millis(ts_millis) {
        Some(dt) => dt.with_timezone(&tz).format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// Human-readable local timestamp for ticket display
pub fn human_date(ts_millis: i64, tz: Tz) -> String {
    match chrono::DateTime::from_timestamp_millis(ts_millis) {
        Some(dt) => dt.with_timezone(&tz).format("%d/%m/%Y, %H:%M:%S").to_string(),
        None => String::new(),
    }
}
