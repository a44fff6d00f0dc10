//! giveawaybot-server/src/server.rs
//!
//! The main bot loop: connect, wire the tasks together, wait for Ctrl-C.

use std::sync::Arc;
use std::time::Duration;
use anyhow::anyhow;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{error, info, warn};

use giveawaybot_common::models::{BotConfig, GiveawayStatus, TrackingMode};
use giveawaybot_core::platforms::{ChatPlatform, PlatformIntegration};
use giveawaybot_core::services::MessageService;
use giveawaybot_core::services::activity::{
    spawn_roster_task, ActivityProducer, ChannelRoster, ChatActivityProducer,
    PresenceActivityProducer,
};
use giveawaybot_core::tasks::spawn_accrual_task;

use crate::context::ServerContext;

const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run_server(config: BotConfig) -> anyhow::Result<()> {
    let mut ctx = ServerContext::new(config).await?;
    let event_bus = ctx.event_bus.clone();
    let bot_login = ctx.config.twitch.bot_username.clone();
    let channel = ctx.config.twitch.channel.clone();

    // 1) Connect; replies need the outbound half.
    ctx.platform.connect().await?;
    let sender = ctx
        .platform
        .sender()
        .ok_or_else(|| anyhow!("Twitch IRC connected without an outbound sender"))?;

    // 2) Subscribers go up before the channel JOIN so nothing is missed.
    let message_service = Arc::new(MessageService::new(
        ctx.command_service.clone(),
        Arc::new(sender),
        &bot_login,
    ));
    let message_handle = message_service.spawn_message_task(&event_bus).await;

    let mut roster_handle: Option<JoinHandle<()>> = None;
    let producer: Box<dyn ActivityProducer> = match ctx.config.tracking.mode {
        TrackingMode::Chat => {
            let events = event_bus.subscribe(None).await;
            Box::new(ChatActivityProducer::new(events, &bot_login))
        }
        TrackingMode::Presence => {
            let roster = ChannelRoster::new(&bot_login);
            roster_handle = Some(spawn_roster_task(&event_bus, roster.clone()).await);
            Box::new(PresenceActivityProducer::new(
                Arc::new(roster),
                Duration::from_secs(ctx.config.tracking.poll_interval_secs),
            ))
        }
    };
    let accrual_handle = spawn_accrual_task(
        producer,
        ctx.watch_time_service.clone(),
        event_bus.shutdown_rx.clone(),
    );

    // 3) Join the channel.
    ctx.platform.join_channel(&channel).await?;
    info!("GiveawayBot ready in {} (tracking={:?})", channel, ctx.config.tracking.mode);

    // Ctrl-C => signal
    let eb_for_ctrlc = event_bus.clone();
    let _ctrlc_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
        }
        info!("Ctrl-C detected; shutting down event bus...");
        eb_for_ctrlc.shutdown();
    });

    // 4) Run until shutdown is signaled; the IRC platform reconnects on its own.
    let mut shutdown_rx = event_bus.shutdown_rx.clone();
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("Shutdown signaled; stopping.");

    // Cleanup
    if let Err(e) = ctx.platform.leave_channel(&channel).await {
        warn!("PART {} failed: {:?}", channel, e);
    }
    ctx.platform.disconnect().await?;

    let mut handles = vec![("message", message_handle), ("accrual", accrual_handle)];
    if let Some(h) = roster_handle {
        handles.push(("roster", h));
    }
    for (name, handle) in handles {
        match time::timeout(TASK_STOP_TIMEOUT, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("{} task ended abnormally: {:?}", name, e),
            Err(_) => warn!("{} task did not stop within {:?}", name, TASK_STOP_TIMEOUT),
        }
    }

    if let GiveawayStatus::Open { key, entrant_count } = ctx.giveaway_service.status().await {
        warn!(
            "Giveaway '{}' was still open at shutdown ({:?} entrant(s)); entrants stay stored for {}",
            key,
            entrant_count,
            ctx.config.commands.display(&ctx.config.commands.pick)
        );
    }

    ctx.db.pool().close().await;
    info!("Server shutdown complete.");
    Ok(())
}
