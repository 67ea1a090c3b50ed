//! Timestamp helpers
//!
//! All persisted timestamps are Unix epoch milliseconds (UTC). Feed cursors
//! and ordering compare these directly.

use chrono::Utc;

/// Current time as Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
