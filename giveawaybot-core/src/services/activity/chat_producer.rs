use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use crate::Error;
use crate::eventbus::BotEvent;
use super::{ActivityProducer, ActivitySignal};

/// One signal per chat message, excluding the bot's own lines.
pub struct ChatActivityProducer {
    events: mpsc::Receiver<BotEvent>,
    bot_login: String,
}

impl ChatActivityProducer {
    /// `events` should be a fresh `EventBus::subscribe` receiver.
    pub fn new(events: mpsc::Receiver<BotEvent>, bot_login: &str) -> Self {
        Self {
            events,
            bot_login: bot_login.to_lowercase(),
        }
    }

    fn to_signal(&self, event: &BotEvent) -> Option<ActivitySignal> {
        match event {
            BotEvent::ChatMessage { user_id, user_login, display_name, .. } => {
                if user_login.eq_ignore_ascii_case(&self.bot_login) {
                    return None;
                }
                if user_id.is_empty() {
                    debug!("chat producer: message from '{}' has no user-id tag, skipping", user_login);
                    return None;
                }
                Some(ActivitySignal::new(user_id.as_str(), display_name.as_str()))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl ActivityProducer for ChatActivityProducer {
    fn name(&self) -> &'static str {
        "chat"
    }

    async fn run(
        &mut self,
        sink: mpsc::Sender<ActivitySignal>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), Error> {
        info!("Chat activity producer started (bot login '{}')", self.bot_login);

        loop {
            tokio::select! {
                maybe_event = self.events.recv() => {
                    match maybe_event {
                        Some(event) => {
                            if let Some(signal) = self.to_signal(&event) {
                                if sink.send(signal).await.is_err() {
                                    info!("Chat activity producer: sink closed.");
                                    break;
                                }
                            }
                        }
                        None => {
                            info!("Chat activity producer: event channel closed.");
                            break;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Chat activity producer shutting down.");
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
