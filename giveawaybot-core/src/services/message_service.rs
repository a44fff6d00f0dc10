use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use crate::eventbus::{BotEvent, EventBus};
use crate::platforms::ChatSender;
use crate::services::{CommandResponse, CommandService};

/// The MessageService takes chat lines off the bus, runs them through the
/// CommandService and sends any reply back through the `ChatSender`.
pub struct MessageService {
    command_service: Arc<CommandService>,
    sender: Arc<dyn ChatSender>,
    bot_login: String,
}

impl MessageService {
    pub fn new(
        command_service: Arc<CommandService>,
        sender: Arc<dyn ChatSender>,
        bot_login: &str,
    ) -> Self {
        debug!("MessageService::new() called");
        Self {
            command_service,
            sender,
            bot_login: bot_login.to_lowercase(),
        }
    }

    /// Handles one bus event. Only chat messages from someone other than the
    /// bot are considered. A failed send is logged and the next line still goes out.
    pub async fn process_incoming_message(&self, event: &BotEvent) {
        let BotEvent::ChatMessage { channel, user_id, user_login, display_name, roles, text, .. } = event
        else {
            return;
        };
        if user_login.eq_ignore_ascii_case(&self.bot_login) {
            return;
        }

        let response = self
            .command_service
            .handle_chat_line(channel, user_id, display_name, roles, text)
            .await;

        if let Some(CommandResponse { texts, channel: reply_channel }) = response {
            for line in texts {
                if let Err(e) = self.sender.send_chat(&reply_channel, &line).await {
                    error!("Failed to send reply to {} => {:?}", reply_channel, e);
                }
            }
        }
    }

    /// Subscribes to `bus` and processes chat lines until shutdown.
    pub async fn spawn_message_task(self: Arc<Self>, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe(None).await;
        let mut shutdown_rx = bus.shutdown_rx.clone();

        tokio::spawn(async move {
            info!("MessageService started, listening on EventBus.");
            loop {
                tokio::select! {
                    maybe_event = rx.recv() => {
                        match maybe_event {
                            Some(event) => self.process_incoming_message(&event).await,
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
            info!("MessageService task exited.");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::platforms::MockChatSender;
    use crate::repositories::sqlite::{SqliteGiveawayRepository, SqliteStreamSessionRepository, SqliteUserRepository};
    use crate::services::giveaway_service::GiveawayService;
    use crate::services::stream_session_service::StreamSessionService;
    use crate::services::watch_time_service::WatchTimeService;
    use chrono::Utc;
    use giveawaybot_common::models::CommandNames;
    use mockall::predicate::eq;

    async fn command_service() -> Arc<CommandService> {
        let db = Database::new(":memory:").await.unwrap();
        db.migrate().await.unwrap();
        let user_repo = Arc::new(SqliteUserRepository::new(db.pool().clone()));
        let giveaway_repo = Arc::new(SqliteGiveawayRepository::new(db.pool().clone()));
        let session_repo = Arc::new(SqliteStreamSessionRepository::new(db.pool().clone()));

        Arc::new(CommandService::new(
            CommandNames::default(),
            Arc::new(GiveawayService::new(giveaway_repo, user_repo.clone(), 0)),
            Arc::new(WatchTimeService::new(user_repo)),
            Arc::new(StreamSessionService::new(session_repo)),
        ))
    }

    fn chat(login: &str, roles: &[&str], text: &str) -> BotEvent {
        BotEvent::ChatMessage {
            channel: "#chan".to_string(),
            user_id: format!("id-{}", login),
            user_login: login.to_string(),
            display_name: login.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reply_is_sent_to_origin_channel() {
        let mut sender = MockChatSender::new();
        sender
            .expect_send_chat()
            .with(eq("#chan"), eq("Giveaway 'k1' started! Enter with !join"))
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = MessageService::new(command_service().await, Arc::new(sender), "mybot");
        svc.process_incoming_message(&chat("mod1", &["moderator"], "!giveaway k1")).await;
    }

    #[tokio::test]
    async fn test_bot_echo_and_plain_chat_send_nothing() {
        let mut sender = MockChatSender::new();
        sender.expect_send_chat().times(0);

        let svc = MessageService::new(command_service().await, Arc::new(sender), "MyBot");
        svc.process_incoming_message(&chat("mybot", &["broadcaster"], "!giveaway k1")).await;
        svc.process_incoming_message(&chat("viewer", &[], "hello there")).await;
        svc.process_incoming_message(&BotEvent::ConnectionLost { reason: "eof".into() }).await;
    }

    #[tokio::test]
    async fn test_send_failure_is_not_fatal() {
        let mut sender = MockChatSender::new();
        sender
            .expect_send_chat()
            .times(2)
            .returning(|_, _| Err(crate::Error::Platform("socket closed".into())));

        let svc = MessageService::new(command_service().await, Arc::new(sender), "mybot");
        svc.process_incoming_message(&chat("viewer", &[], "!current")).await;
        svc.process_incoming_message(&chat("viewer", &[], "!time")).await;
    }
}
