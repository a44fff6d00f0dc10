use giveawaybot_common::error::GiveawayError;
use giveawaybot_common::models::GiveawayStatus;
use crate::services::builtin_commands::first_arg;
use crate::services::command_service::CommandContext;

/// `!giveaway <key>`
pub async fn handle_start(ctx: &CommandContext<'_>, raw_args: &str) -> Result<String, GiveawayError> {
    let Some(key) = first_arg(raw_args) else {
        return Ok(format!("Usage: {} <key>", ctx.names.display(&ctx.names.giveaway_start)));
    };

    ctx.giveaway_service.open(key).await?;
    Ok(format!(
        "Giveaway '{}' started! Enter with {}",
        key,
        ctx.names.display(&ctx.names.giveaway_join)
    ))
}

/// `!endgiveaway`
pub async fn handle_end(ctx: &CommandContext<'_>, _raw_args: &str) -> Result<String, GiveawayError> {
    let closed = ctx.giveaway_service.close().await?;
    Ok(format!(
        "Entries for '{}' are closed! Participants: {}",
        closed.key, closed.entrant_count
    ))
}

/// `!join`
pub async fn handle_join(ctx: &CommandContext<'_>, _raw_args: &str) -> Result<String, GiveawayError> {
    let key = ctx.giveaway_service.join(ctx.user_id, ctx.display_name).await?;
    Ok(format!("@{}, you are entered in giveaway '{}'!", ctx.display_name, key))
}

/// `!pick <key>`
pub async fn handle_pick(ctx: &CommandContext<'_>, raw_args: &str) -> Result<String, GiveawayError> {
    let Some(key) = first_arg(raw_args) else {
        return Ok(format!("Usage: {} <key>", ctx.names.display(&ctx.names.pick)));
    };

    let winner = ctx.giveaway_service.pick(key).await?;
    Ok(format!("Winner of giveaway '{}': @{}!", key, winner.username))
}

/// `!participants [key]`, defaulting to the open giveaway.
pub async fn handle_participants(ctx: &CommandContext<'_>, raw_args: &str) -> Result<String, GiveawayError> {
    let key = match first_arg(raw_args) {
        Some(k) => k.to_string(),
        None => match ctx.giveaway_service.current_key().await {
            Some(k) => k,
            None => {
                return Ok(format!(
                    "No active giveaway. Usage: {} <key>",
                    ctx.names.display(&ctx.names.participants)
                ));
            }
        },
    };

    let count = ctx.giveaway_service.entrant_count(&key).await?;
    Ok(format!("Participants in giveaway '{}': {}", key, count))
}

/// `!current`
pub async fn handle_current(ctx: &CommandContext<'_>, _raw_args: &str) -> Result<String, GiveawayError> {
    let reply = match ctx.giveaway_service.status().await {
        GiveawayStatus::Inactive => "No active giveaway".to_string(),
        GiveawayStatus::Open { key, entrant_count: Some(n) } => {
            format!("Active giveaway: '{}' (participants: {})", key, n)
        }
        GiveawayStatus::Open { key, entrant_count: None } => {
            format!("Active giveaway: '{}' (participants: unknown)", key)
        }
    };
    Ok(reply)
}
