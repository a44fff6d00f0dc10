//! src/eventbus/mod.rs
//!
//! Provides an in-process event bus that supports guaranteed delivery
//! to multiple subscribers via bounded MPSC queues.

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use chrono::{DateTime, Utc};

/// Chat role names as they appear in Twitch badges.
pub const ROLE_BROADCASTER: &str = "broadcaster";
pub const ROLE_MODERATOR: &str = "moderator";

/// Global event type that various parts of the bot can publish or subscribe to.
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// A chat line from the channel.
    ChatMessage {
        channel: String,
        user_id: String,
        /// Login name (lowercase), used to recognise the bot's own echoes.
        user_login: String,
        display_name: String,
        roles: Vec<String>,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Membership JOIN for the channel.
    ChatterJoined {
        channel: String,
        user_login: String,
    },

    /// Membership PART for the channel.
    ChatterLeft {
        channel: String,
        user_login: String,
    },

    /// The IRC connection dropped; nobody is known to be present until the
    /// channel is rejoined.
    ConnectionLost {
        reason: String,
    },
}

/// Each subscriber gets its own `mpsc::Sender<BotEvent>` for guaranteed delivery.
///
/// - If the subscriber’s channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, the channel is closed
///   and sending returns an error.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<BotEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber’s buffer.
const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    /// Create a new, empty event bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        // Setting watch to true
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<BotEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers. Closed subscribers are pruned.
    pub async fn publish(&self, event: BotEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        let mut any_closed = false;
        for s in senders {
            if s.send(event.clone()).await.is_err() {
                any_closed = true;
            }
        }
        if any_closed {
            let mut subs = self.subscribers.lock().await;
            subs.retain(|s| !s.is_closed());
        }
    }

    /// Convenience method: publish a `ChatMessage` event.
    pub async fn publish_chat(
        &self,
        channel: &str,
        user_id: &str,
        user_login: &str,
        display_name: &str,
        roles: Vec<String>,
        text: &str,
    ) {
        let event = BotEvent::ChatMessage {
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_login: user_login.to_string(),
            display_name: display_name.to_string(),
            roles,
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        self.publish(event).await;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
