use giveawaybot_common::error::GiveawayError;
use crate::services::command_service::CommandContext;

pub async fn handle_time(ctx: &CommandContext<'_>, _raw_args: &str) -> Result<String, GiveawayError> {
    let total = ctx.watch_time_service.get_watch_time(ctx.user_id).await?;
    Ok(format!("@{}, watch time this stream: {} minutes", ctx.display_name, total))
}
