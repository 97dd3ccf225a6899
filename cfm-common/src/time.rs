//! Timestamp utilities
//!
//! Playback timestamps are stored as Unix epoch seconds.

use chrono::Utc;

/// Current time as Unix epoch seconds
pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}
