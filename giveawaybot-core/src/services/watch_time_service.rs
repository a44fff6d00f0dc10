use std::sync::Arc;
use tracing::debug;
use giveawaybot_common::traits::repository_traits::UserRepository;
use crate::Error;
use crate::services::activity::ActivitySignal;

/// Turns activity signals into watch-time ticks.
pub struct WatchTimeService {
    user_repo: Arc<dyn UserRepository>,
}

impl WatchTimeService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Credits exactly one tick for `signal`. No deduplication: every call is
    /// one increment. Returns the user's new total.
    pub async fn record_activity(&self, signal: &ActivitySignal) -> Result<i64, Error> {
        let total = self.user_repo
            .increment_watch_time(&signal.user_id, &signal.display_name)
            .await?;
        debug!("watch time: user_id={} ({}) now at {}", signal.user_id, signal.display_name, total);
        Ok(total)
    }

    pub async fn get_watch_time(&self, user_id: &str) -> Result<i64, Error> {
        self.user_repo.get_watch_time(user_id).await
    }
}
