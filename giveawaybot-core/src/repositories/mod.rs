// src/repositories/mod.rs

pub use giveawaybot_common::traits::repository_traits::{
    GiveawayRepository,
    StreamSessionRepository,
    UserRepository,
};

pub use sqlite::{
    SqliteGiveawayRepository,
    SqliteStreamSessionRepository,
    SqliteUserRepository,
};

pub mod sqlite;
