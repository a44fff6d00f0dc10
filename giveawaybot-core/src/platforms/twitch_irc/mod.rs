pub mod client;
pub mod runtime;

pub use client::{TwitchIrcClient, TwitchIrcSender};
pub use runtime::TwitchIrcPlatform;
