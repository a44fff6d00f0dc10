// src/repositories/sqlite/mod.rs

pub mod user;
pub mod giveaway;
pub mod stream_session;

pub use self::user::SqliteUserRepository;
pub use self::giveaway::SqliteGiveawayRepository;
pub use self::stream_session::SqliteStreamSessionRepository;
