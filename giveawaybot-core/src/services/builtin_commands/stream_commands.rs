use tracing::info;
use giveawaybot_common::error::GiveawayError;
use crate::services::command_service::CommandContext;

/// `!newstream`: starts a fresh epoch and zeroes everyone's watch time.
pub async fn handle_new_stream(ctx: &CommandContext<'_>, _raw_args: &str) -> Result<String, GiveawayError> {
    let session = ctx.stream_session_service.start_new_stream().await?;
    info!(
        "newstream requested by {} in {} => session #{}",
        ctx.display_name, ctx.channel, session.session_id
    );
    Ok("New stream started! Watch time has been reset.".to_string())
}
