use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A broadcast epoch. At most one row is active; older rows are kept inactive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StreamSession {
    pub session_id: i64,
    pub started_at: DateTime<Utc>,
    pub is_active: bool,
}
