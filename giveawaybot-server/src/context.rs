//! giveawaybot-server/src/context.rs
//!
//! Defines the main "global" context (ServerContext) for the bot.

use std::sync::Arc;
use tracing::info;

use giveawaybot_common::models::BotConfig;
use giveawaybot_core::Database;
use giveawaybot_core::Error;
use giveawaybot_core::eventbus::EventBus;
use giveawaybot_core::platforms::twitch_irc::TwitchIrcPlatform;
use giveawaybot_core::repositories::sqlite::{
    SqliteGiveawayRepository, SqliteStreamSessionRepository, SqliteUserRepository,
};
use giveawaybot_core::services::{
    CommandService, GiveawayService, StreamSessionService, WatchTimeService,
};

/// Everything the running bot shares: storage, bus, services, the IRC platform.
pub struct ServerContext {
    pub config: BotConfig,
    pub db: Database,
    pub event_bus: Arc<EventBus>,

    pub watch_time_service: Arc<WatchTimeService>,
    pub giveaway_service: Arc<GiveawayService>,
    pub command_service: Arc<CommandService>,

    pub platform: TwitchIrcPlatform,
}

impl ServerContext {
    pub async fn new(config: BotConfig) -> Result<Self, Error> {
        let db = Database::new(&config.database.path).await?;
        db.migrate().await?;

        let user_repo = Arc::new(SqliteUserRepository::new(db.pool().clone()));
        let giveaway_repo = Arc::new(SqliteGiveawayRepository::new(db.pool().clone()));
        let session_repo = Arc::new(SqliteStreamSessionRepository::new(db.pool().clone()));

        let watch_time_service = Arc::new(WatchTimeService::new(user_repo.clone()));
        let giveaway_service = Arc::new(GiveawayService::new(
            giveaway_repo,
            user_repo,
            config.giveaway.min_watch_time_minutes,
        ));
        let stream_session_service = Arc::new(StreamSessionService::new(session_repo));

        match stream_session_service.active_session().await? {
            Some(s) => info!("Resuming stream session #{} (started {})", s.session_id, s.started_at),
            None => info!("No stream session yet; use {} to start one",
                config.commands.display(&config.commands.new_stream)),
        }

        let command_service = Arc::new(CommandService::new(
            config.commands.clone(),
            giveaway_service.clone(),
            watch_time_service.clone(),
            stream_session_service.clone(),
        ));

        let event_bus = Arc::new(EventBus::new());
        let platform = TwitchIrcPlatform::new(
            &config.twitch.bot_username,
            &config.twitch.oauth_token,
            event_bus.clone(),
        );

        Ok(Self {
            config,
            db,
            event_bus,
            watch_time_service,
            giveaway_service,
            command_service,
            platform,
        })
    }
}
