use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chatter we have seen at least once. Rows are never deleted; a new stream
/// only zeroes `stream_watch_time`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub username: String,
    /// Accrued ticks for the current stream session.
    pub stream_watch_time: i64,
    pub last_seen: DateTime<Utc>,
}
