use chrono::{DateTime, Utc};

/// Convert a `DateTime<Utc>` to epoch seconds.
pub fn to_epoch(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

/// Convert epoch seconds to `DateTime<Utc>`.
/// Out-of-range values fall back to 1970-01-01.
pub fn from_epoch(epoch: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch, 0).unwrap_or_default()
}

/// Returns the current epoch seconds.
pub fn current_epoch() -> i64 {
    Utc::now().timestamp()
}
