// File: src/platforms/mod.rs

use async_trait::async_trait;
use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
    Error(String),
}

#[async_trait]
pub trait PlatformIntegration {
    async fn connect(&mut self) -> Result<(), Error>;
    async fn disconnect(&mut self) -> Result<(), Error>;
    async fn send_message(&self, channel: &str, message: &str) -> Result<(), Error>;
    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error>;
}

#[async_trait]
pub trait ChatPlatform: PlatformIntegration {
    async fn join_channel(&self, channel: &str) -> Result<(), Error>;
    async fn leave_channel(&self, channel: &str) -> Result<(), Error>;
}

/// Outbound half of a chat connection: where command replies go.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_chat(&self, channel: &str, text: &str) -> Result<(), Error>;
}

pub mod twitch_irc;
