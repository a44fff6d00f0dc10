//! Channel membership roster built from chat events.
//!
//! IRC membership (JOIN/PART) only carries login names. A stable user id is
//! learned the first time a chatter speaks (from the `user-id` tag); until
//! then a present chatter has no id and is not credited.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use crate::Error;
use crate::eventbus::{BotEvent, EventBus};
use super::{ActivitySignal, PresenceSource};

#[derive(Debug, Clone, Default)]
struct RosterEntry {
    user_id: Option<String>,
    display_name: String,
    present: bool,
}

#[derive(Clone)]
pub struct ChannelRoster {
    bot_login: String,
    /// login -> entry. Entries survive PART so the id mapping is kept.
    entries: Arc<RwLock<HashMap<String, RosterEntry>>>,
}

impl ChannelRoster {
    pub fn new(bot_login: &str) -> Self {
        Self {
            bot_login: bot_login.to_lowercase(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn is_bot(&self, login: &str) -> bool {
        login.eq_ignore_ascii_case(&self.bot_login)
    }

    pub async fn record_join(&self, login: &str) {
        if self.is_bot(login) {
            return;
        }
        let login = login.to_lowercase();
        let mut map = self.entries.write().await;
        let entry = map.entry(login.clone()).or_insert_with(|| RosterEntry {
            display_name: login,
            ..Default::default()
        });
        entry.present = true;
    }

    pub async fn record_part(&self, login: &str) {
        let mut map = self.entries.write().await;
        if let Some(entry) = map.get_mut(&login.to_lowercase()) {
            entry.present = false;
        }
    }

    /// Anyone who chats is present, and their id becomes known.
    pub async fn record_chatter(&self, login: &str, user_id: &str, display_name: &str) {
        if self.is_bot(login) {
            return;
        }
        let login = login.to_lowercase();
        let mut map = self.entries.write().await;
        let entry = map.entry(login.clone()).or_default();
        if !user_id.is_empty() {
            entry.user_id = Some(user_id.to_string());
        }
        if !display_name.is_empty() {
            entry.display_name = display_name.to_string();
        } else if entry.display_name.is_empty() {
            entry.display_name = login;
        }
        entry.present = true;
    }

    /// Nobody is present after the connection drops; ids are kept.
    pub async fn mark_all_absent(&self) {
        let mut map = self.entries.write().await;
        for entry in map.values_mut() {
            entry.present = false;
        }
    }

    pub async fn present_count(&self) -> usize {
        self.entries.read().await.values().filter(|e| e.present).count()
    }

    async fn apply(&self, event: &BotEvent) {
        match event {
            BotEvent::ChatterJoined { user_login, .. } => self.record_join(user_login).await,
            BotEvent::ChatterLeft { user_login, .. } => self.record_part(user_login).await,
            BotEvent::ChatMessage { user_login, user_id, display_name, .. } => {
                self.record_chatter(user_login, user_id, display_name).await
            }
            BotEvent::ConnectionLost { reason } => {
                info!("roster: connection lost ({}); clearing presence", reason);
                self.mark_all_absent().await
            }
        }
    }
}

#[async_trait]
impl PresenceSource for ChannelRoster {
    async fn current_chatters(&self) -> Result<Vec<ActivitySignal>, Error> {
        let map = self.entries.read().await;
        let mut out = Vec::new();
        for (login, entry) in map.iter().filter(|(_, e)| e.present) {
            match &entry.user_id {
                Some(id) => out.push(ActivitySignal::new(id.as_str(), entry.display_name.as_str())),
                None => debug!("roster: '{}' is present but has no known user id yet", login),
            }
        }
        Ok(out)
    }
}

/// Keeps `roster` in sync with membership and chat events until bus shutdown.
pub async fn spawn_roster_task(bus: &EventBus, roster: ChannelRoster) -> JoinHandle<()> {
    let mut rx = bus.subscribe(None).await;
    let mut shutdown_rx = bus.shutdown_rx.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(event) => roster.apply(&event).await,
                        None => break,
                    }
                }
                Ok(_) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Roster task exited.");
    })
}
