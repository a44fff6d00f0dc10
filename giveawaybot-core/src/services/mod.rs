// File: src/services/mod.rs

pub mod activity;
pub mod builtin_commands;
pub mod command_service;
pub mod giveaway_service;
pub mod message_service;
pub mod stream_session_service;
pub mod watch_time_service;

pub use command_service::{CommandContext, CommandResponse, CommandService};
pub use giveaway_service::{ClosedGiveaway, GiveawayService};
pub use message_service::MessageService;
pub use stream_session_service::StreamSessionService;
pub use watch_time_service::WatchTimeService;
