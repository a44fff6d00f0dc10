//! Giveaway lifecycle: a single-slot state machine (`Inactive` / `Open(key)`)
//! over the entrant store.
//!
//! The open key lives behind one async mutex. `open`, `join` and `close` hold
//! it for their whole check-then-act sequence, including the store calls, so
//! no two transitions interleave and a join can never land in a giveaway that
//! was closed halfway through it. The key is only updated after the store
//! write it depends on has succeeded.

use std::sync::Arc;
use rand::seq::IndexedRandom;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use giveawaybot_common::error::GiveawayError;
use giveawaybot_common::models::{GiveawayEntrant, GiveawayStatus};
use giveawaybot_common::traits::repository_traits::{GiveawayRepository, UserRepository};

/// Outcome of a successful `close`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedGiveaway {
    pub key: String,
    pub entrant_count: i64,
}

pub struct GiveawayService {
    giveaway_repo: Arc<dyn GiveawayRepository>,
    user_repo: Arc<dyn UserRepository>,
    min_watch_time: i64,
    current: Mutex<Option<String>>,
}

impl GiveawayService {
    pub fn new(
        giveaway_repo: Arc<dyn GiveawayRepository>,
        user_repo: Arc<dyn UserRepository>,
        min_watch_time: i64,
    ) -> Self {
        Self {
            giveaway_repo,
            user_repo,
            min_watch_time,
            current: Mutex::new(None),
        }
    }

    pub fn min_watch_time(&self) -> i64 {
        self.min_watch_time
    }

    /// Opens `key`. Entrants left over from an earlier run of the same key are
    /// cleared first, so every opening starts from an empty set.
    pub async fn open(&self, key: &str) -> Result<(), GiveawayError> {
        let mut current = self.current.lock().await;
        if let Some(open_key) = current.as_ref() {
            return Err(GiveawayError::AlreadyOpen(open_key.clone()));
        }

        let cleared = self.giveaway_repo.clear_entrants(key).await?;
        if cleared > 0 {
            debug!("Cleared {} stale entrant(s) for giveaway '{}'", cleared, key);
        }

        *current = Some(key.to_string());
        info!("Giveaway '{}' opened", key);
        Ok(())
    }

    /// Enters the caller into the open giveaway. Returns the giveaway key.
    pub async fn join(&self, user_id: &str, display_name: &str) -> Result<String, GiveawayError> {
        let current = self.current.lock().await;
        let key = current.as_ref().ok_or(GiveawayError::NoActiveGiveaway)?;

        let actual = self.user_repo.get_watch_time(user_id).await?;
        if actual < self.min_watch_time {
            return Err(GiveawayError::Ineligible {
                required: self.min_watch_time,
                actual,
            });
        }

        if !self.giveaway_repo.try_add_entrant(key, user_id, display_name).await? {
            return Err(GiveawayError::AlreadyEntered(key.clone()));
        }

        debug!("user_id={} ({}) joined giveaway '{}'", user_id, display_name, key);
        Ok(key.clone())
    }

    /// Stops accepting entries. Entrant rows stay in the store for `pick`.
    pub async fn close(&self) -> Result<ClosedGiveaway, GiveawayError> {
        let mut current = self.current.lock().await;
        let key = current.as_ref().ok_or(GiveawayError::NoActiveGiveaway)?;

        let entrant_count = self.giveaway_repo.count_entrants(key).await?;
        let key = key.clone();
        *current = None;

        info!("Giveaway '{}' closed with {} entrant(s)", key, entrant_count);
        Ok(ClosedGiveaway { key, entrant_count })
    }

    /// Draws one entrant of `key` uniformly at random. Works for any key with
    /// stored entrants, open or not, and never modifies the entrant set.
    pub async fn pick(&self, key: &str) -> Result<GiveawayEntrant, GiveawayError> {
        let entrants = self.giveaway_repo.list_entrants(key).await?;

        let winner = {
            let mut rng = rand::rng();
            entrants.choose(&mut rng).cloned()
        };

        match winner {
            Some(w) => {
                info!("Giveaway '{}' winner: {} ({} entrant(s))", key, w.username, entrants.len());
                Ok(w)
            }
            None => Err(GiveawayError::NoParticipants(key.to_string())),
        }
    }

    pub async fn entrant_count(&self, key: &str) -> Result<i64, GiveawayError> {
        Ok(self.giveaway_repo.count_entrants(key).await?)
    }

    pub async fn current_key(&self) -> Option<String> {
        self.current.lock().await.clone()
    }

    /// Never fails; a storage error only blanks out the entrant count.
    pub async fn status(&self) -> GiveawayStatus {
        let key = match self.current_key().await {
            Some(k) => k,
            None => return GiveawayStatus::Inactive,
        };

        let entrant_count = match self.giveaway_repo.count_entrants(&key).await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("Could not count entrants for '{}': {:?}", key, e);
                None
            }
        };
        GiveawayStatus::Open { key, entrant_count }
    }
}
