use async_trait::async_trait;
use crate::error::Error;
use crate::models::{GiveawayEntrant, StreamSession, User};

/// Per-user watch-time counters.
///
/// Implementations must make `increment_watch_time` a single atomic statement:
/// concurrent signals for the same user may never lose an increment.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the row if needed, adds exactly one tick, refreshes the display
    /// name and last-seen time. Returns the new total.
    async fn increment_watch_time(&self, user_id: &str, username: &str) -> Result<i64, Error>;

    /// Zero for unknown users.
    async fn get_watch_time(&self, user_id: &str) -> Result<i64, Error>;

    /// Zeroes every counter; rows are kept.
    async fn reset_all_watch_time(&self) -> Result<(), Error>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, Error>;
}

/// Entrant sets keyed by giveaway name. Keys are compared byte-for-byte.
#[async_trait]
pub trait GiveawayRepository: Send + Sync {
    /// Atomic insert-if-absent. `Ok(false)` means the user was already entered.
    async fn try_add_entrant(&self, key_name: &str, user_id: &str, username: &str) -> Result<bool, Error>;

    /// Ordered by join order ascending.
    async fn list_entrants(&self, key_name: &str) -> Result<Vec<GiveawayEntrant>, Error>;

    async fn count_entrants(&self, key_name: &str) -> Result<i64, Error>;

    async fn clear_entrants(&self, key_name: &str) -> Result<u64, Error>;
}

#[async_trait]
pub trait StreamSessionRepository: Send + Sync {
    /// Deactivates the current session, inserts a new active one and zeroes all
    /// watch time, as one transaction.
    async fn start_new_session(&self) -> Result<StreamSession, Error>;

    async fn get_active_session(&self) -> Result<Option<StreamSession>, Error>;
}
