// File: giveawaybot-common/src/models/mod.rs
pub mod user;
pub mod giveaway;
pub mod stream_session;
pub mod config;

pub use user::User;
pub use giveaway::{GiveawayEntrant, GiveawayStatus};
pub use stream_session::StreamSession;
pub use config::{BotConfig, CommandNames, TrackingMode};
