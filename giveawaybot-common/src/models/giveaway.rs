use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a giveaway's entrant set.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GiveawayEntrant {
    pub key_name: String,
    pub user_id: String,
    pub username: String,
    /// Monotonic insertion order across all keys; lower joined earlier.
    pub join_order: i64,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GiveawayStatus {
    Inactive,
    Open {
        key: String,
        /// `None` when the entrant count could not be read from storage.
        entrant_count: Option<i64>,
    },
}

