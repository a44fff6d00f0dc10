//! src/platforms/twitch_irc/runtime.rs
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::Error;
use crate::eventbus::{BotEvent, EventBus};
use crate::platforms::{ChatPlatform, ChatSender, ConnectionStatus, PlatformIntegration};

use super::client::{IrcIncomingEvent, TwitchIrcClient, TwitchIrcSender};

const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);
const SUPERVISOR_STOP_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TwitchIrcPlatform {
    pub user_name: String,
    oauth_token: String,
    connection_status: Arc<RwLock<ConnectionStatus>>,

    /// Shared outbound handle; survives reconnects.
    sender: Option<TwitchIrcSender>,

    /// Channels to JOIN again after a reconnect.
    joined_channels: Arc<RwLock<Vec<String>>>,

    stop_tx: Option<watch::Sender<bool>>,
    connection_handle: Option<JoinHandle<()>>,

    /// Chat and membership events are published here.
    pub event_bus: Arc<EventBus>,
}

impl TwitchIrcPlatform {
    pub fn new(user_name: &str, oauth_token: &str, event_bus: Arc<EventBus>) -> Self {
        Self {
            user_name: user_name.to_lowercase(),
            oauth_token: oauth_token.to_string(),
            connection_status: Arc::new(RwLock::new(ConnectionStatus::Disconnected)),
            sender: None,
            joined_channels: Arc::new(RwLock::new(Vec::new())),
            stop_tx: None,
            connection_handle: None,
            event_bus,
        }
    }

    /// Outbound handle for replies, available once connected.
    pub fn sender(&self) -> Option<TwitchIrcSender> {
        self.sender.clone()
    }

    fn connected_sender(&self) -> Result<&TwitchIrcSender, Error> {
        self.sender
            .as_ref()
            .ok_or_else(|| Error::Platform("Not connected to Twitch IRC".into()))
    }
}

/// Forwards one IRC event onto the bus. Non-chat commands are ignored.
pub async fn publish_irc_event(bus: &EventBus, evt: IrcIncomingEvent) {
    match evt.command.as_str() {
        "PRIVMSG" => {
            let channel = evt.channel.unwrap_or_default();
            let user_login = evt.user_login.unwrap_or_default();
            let user_id = evt.user_id.unwrap_or_default();
            let display_name = evt.display_name.unwrap_or_else(|| user_login.clone());
            let text = evt.text.unwrap_or_default();

            bus.publish_chat(&channel, &user_id, &user_login, &display_name, evt.roles, &text).await;
        }
        "JOIN" => {
            if let (Some(channel), Some(user_login)) = (evt.channel, evt.user_login) {
                bus.publish(BotEvent::ChatterJoined { channel, user_login }).await;
            }
        }
        "PART" => {
            if let (Some(channel), Some(user_login)) = (evt.channel, evt.user_login) {
                bus.publish(BotEvent::ChatterLeft { channel, user_login }).await;
            }
        }
        other => {
            debug!("(TwitchIrcPlatform) ignoring {} => {}", other, evt.raw_line);
        }
    }
}

/// Publishes events until the stream closes or Twitch sends `RECONNECT`.
/// Returns the reason the connection is considered lost.
pub async fn forward_until_lost(
    incoming: &mut mpsc::UnboundedReceiver<IrcIncomingEvent>,
    bus: &EventBus,
) -> String {
    while let Some(evt) = incoming.recv().await {
        if evt.command == "RECONNECT" {
            return "server requested RECONNECT".to_string();
        }
        publish_irc_event(bus, evt).await;
    }
    "connection closed".to_string()
}

/// Doubles the reconnect delay up to a ceiling.
pub fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(RECONNECT_MAX_DELAY)
}

/// Resolves once a stop is requested or the platform is gone.
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    while !*stop_rx.borrow() {
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Owns the live client and replaces it whenever the connection drops.
struct ConnectionSupervisor {
    user_name: String,
    oauth_token: String,
    bus: Arc<EventBus>,
    sender: TwitchIrcSender,
    status: Arc<RwLock<ConnectionStatus>>,
    channels: Arc<RwLock<Vec<String>>>,
}

impl ConnectionSupervisor {
    async fn run(self, mut client: TwitchIrcClient, mut stop_rx: watch::Receiver<bool>) {
        loop {
            let Some(mut incoming) = client.incoming.take() else {
                error!("(TwitchIrcPlatform) client has no incoming channel");
                client.shutdown();
                return;
            };

            let reason = tokio::select! {
                reason = forward_until_lost(&mut incoming, &self.bus) => reason,
                _ = stop_requested(&mut stop_rx) => {
                    client.shutdown();
                    return;
                }
            };
            client.shutdown();

            warn!("(TwitchIrcPlatform) {}; reconnecting", reason);
            *self.status.write().await = ConnectionStatus::Reconnecting;
            self.bus.publish(BotEvent::ConnectionLost { reason }).await;

            client = match self.reconnect(&mut stop_rx).await {
                Some(c) => c,
                None => return,
            };
            if *stop_rx.borrow() {
                client.shutdown();
                return;
            }

            self.sender.replace(client.sender_handle()).await;
            for channel in self.channels.read().await.iter() {
                client.join_channel(channel);
            }
            *self.status.write().await = ConnectionStatus::Connected;
            info!("(TwitchIrcPlatform) reconnected as '{}'", self.user_name);
        }
    }

    async fn reconnect(&self, stop_rx: &mut watch::Receiver<bool>) -> Option<TwitchIrcClient> {
        let mut delay = RECONNECT_BASE_DELAY;
        loop {
            tokio::select! {
                _ = sleep(delay) => {}
                _ = stop_requested(stop_rx) => return None,
            }
            match TwitchIrcClient::connect(&self.user_name, &self.oauth_token).await {
                Ok(client) => return Some(client),
                Err(e) => {
                    delay = next_backoff(delay);
                    warn!("(TwitchIrcPlatform) reconnect failed: {}; next attempt in {:?}", e, delay);
                }
            }
        }
    }
}

#[async_trait]
impl PlatformIntegration for TwitchIrcPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.sender.is_some() {
            info!("(TwitchIrcPlatform) connect => already connected");
            return Ok(());
        }

        if !self.oauth_token.starts_with("oauth:") {
            return Err(Error::Platform("Twitch IRC token must start with 'oauth:'".into()));
        }
        if self.user_name.is_empty() {
            return Err(Error::Platform("Twitch IRC credentials missing user_name".into()));
        }

        let client = match TwitchIrcClient::connect(&self.user_name, &self.oauth_token).await {
            Ok(c) => c,
            Err(e) => {
                let msg = format!("Error connecting to Twitch IRC => {}", e);
                error!("{}", msg);
                *self.connection_status.write().await = ConnectionStatus::Error(msg);
                return Err(Error::Platform("Twitch IRC connect failed".into()));
            }
        };

        let sender = client.sender();
        let (stop_tx, stop_rx) = watch::channel(false);
        let supervisor = ConnectionSupervisor {
            user_name: self.user_name.clone(),
            oauth_token: self.oauth_token.clone(),
            bus: self.event_bus.clone(),
            sender: sender.clone(),
            status: self.connection_status.clone(),
            channels: self.joined_channels.clone(),
        };

        self.connection_handle = Some(tokio::spawn(supervisor.run(client, stop_rx)));
        self.stop_tx = Some(stop_tx);
        self.sender = Some(sender);
        *self.connection_status.write().await = ConnectionStatus::Connected;
        info!("(TwitchIrcPlatform) connected as '{}'", self.user_name);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Some(mut handle) = self.connection_handle.take() {
            if timeout(SUPERVISOR_STOP_TIMEOUT, &mut handle).await.is_err() {
                warn!("(TwitchIrcPlatform) connection task did not stop; aborting");
                handle.abort();
            }
        }
        self.sender = None;
        *self.connection_status.write().await = ConnectionStatus::Disconnected;
        Ok(())
    }

    async fn send_message(&self, channel: &str, message: &str) -> Result<(), Error> {
        self.connected_sender()?.send_chat(channel, message).await
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.read().await.clone())
    }
}

#[async_trait]
impl ChatPlatform for TwitchIrcPlatform {
    async fn join_channel(&self, channel: &str) -> Result<(), Error> {
        let sender = self.connected_sender()?;
        {
            let mut channels = self.joined_channels.write().await;
            if !channels.iter().any(|c| c == channel) {
                channels.push(channel.to_string());
            }
        }
        sender.send_raw_line(format!("JOIN {}", channel)).await
    }

    async fn leave_channel(&self, channel: &str) -> Result<(), Error> {
        let sender = self.connected_sender()?;
        self.joined_channels.write().await.retain(|c| c != channel);
        sender.send_raw_line(format!("PART {}", channel)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::twitch_irc::client::ParsedTwitchMsg;

    fn incoming(line: &str) -> IrcIncomingEvent {
        IrcIncomingEvent::from_parsed(&ParsedTwitchMsg::parse_irc_line(line), line)
    }

    #[tokio::test]
    async fn test_privmsg_and_membership_reach_the_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(10)).await;

        publish_irc_event(&bus, incoming(
            "@badges=moderator/1;display-name=Eve;user-id=55 :eve!eve@eve.tmi.twitch.tv PRIVMSG #chan :!endgiveaway"
        )).await;
        publish_irc_event(&bus, incoming(":frank!frank@frank.tmi.twitch.tv JOIN #chan")).await;
        publish_irc_event(&bus, incoming(":frank!frank@frank.tmi.twitch.tv PART #chan")).await;
        publish_irc_event(&bus, incoming(":tmi.twitch.tv 001 bot :Welcome, GLHF!")).await;

        match rx.recv().await {
            Some(BotEvent::ChatMessage { channel, user_id, user_login, display_name, roles, text, .. }) => {
                assert_eq!(channel, "#chan");
                assert_eq!(user_id, "55");
                assert_eq!(user_login, "eve");
                assert_eq!(display_name, "Eve");
                assert_eq!(roles, vec!["moderator".to_string()]);
                assert_eq!(text, "!endgiveaway");
            }
            other => panic!("expected chat message, got {:?}", other),
        }
        assert!(matches!(rx.recv().await, Some(BotEvent::ChatterJoined { user_login, .. }) if user_login == "frank"));
        assert!(matches!(rx.recv().await, Some(BotEvent::ChatterLeft { user_login, .. }) if user_login == "frank"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reconnect_command_ends_forwarding() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(10)).await;
        let (tx, mut irc_rx) = mpsc::unbounded_channel();

        tx.send(incoming(":frank!frank@frank.tmi.twitch.tv JOIN #chan")).unwrap();
        tx.send(incoming(":tmi.twitch.tv RECONNECT")).unwrap();
        tx.send(incoming(":gina!gina@gina.tmi.twitch.tv JOIN #chan")).unwrap();

        let reason = forward_until_lost(&mut irc_rx, &bus).await;
        assert!(reason.contains("RECONNECT"));
        assert!(matches!(rx.recv().await, Some(BotEvent::ChatterJoined { user_login, .. }) if user_login == "frank"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_stream_ends_forwarding() {
        let bus = EventBus::new();
        let (tx, mut irc_rx) = mpsc::unbounded_channel();
        drop(tx);
        assert_eq!(forward_until_lost(&mut irc_rx, &bus).await, "connection closed");
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(next_backoff(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(next_backoff(Duration::from_secs(40)), RECONNECT_MAX_DELAY);
        assert_eq!(next_backoff(RECONNECT_MAX_DELAY), RECONNECT_MAX_DELAY);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_token_format() {
        let bus = Arc::new(EventBus::new());
        let mut platform = TwitchIrcPlatform::new("mybot", "not-a-token", bus);
        assert!(matches!(platform.connect().await, Err(Error::Platform(_))));
        assert_eq!(platform.get_connection_status().await.unwrap(), ConnectionStatus::Disconnected);
        assert!(platform.sender().is_none());
        assert!(platform.join_channel("#chan").await.is_err());
    }
}
