use std::sync::Arc;
use tracing::{debug, info, warn};
use giveawaybot_common::error::GiveawayError;
use giveawaybot_common::models::CommandNames;
use crate::eventbus::{ROLE_BROADCASTER, ROLE_MODERATOR};
use crate::services::builtin_commands::{handle_builtin_command, BuiltinCommand};
use crate::services::giveaway_service::GiveawayService;
use crate::services::stream_session_service::StreamSessionService;
use crate::services::watch_time_service::WatchTimeService;

/// Context passed to built-in command handlers.
pub struct CommandContext<'a> {
    pub channel: &'a str,
    pub user_id: &'a str,
    pub display_name: &'a str,
    pub names: &'a CommandNames,

    pub giveaway_service: &'a Arc<GiveawayService>,
    pub watch_time_service: &'a Arc<WatchTimeService>,
    pub stream_session_service: &'a Arc<StreamSessionService>,
}

/// Reply lines for one handled command, and the channel they go to.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub texts: Vec<String>,
    pub channel: String,
}

pub struct CommandService {
    names: CommandNames,
    pub giveaway_service: Arc<GiveawayService>,
    pub watch_time_service: Arc<WatchTimeService>,
    pub stream_session_service: Arc<StreamSessionService>,
}

/// True for callers allowed to run privileged commands.
pub fn is_privileged_caller(roles: &[String]) -> bool {
    roles.iter().any(|r| {
        let r = r.to_lowercase();
        r == ROLE_BROADCASTER || r == ROLE_MODERATOR
    })
}

impl CommandService {
    pub fn new(
        names: CommandNames,
        giveaway_service: Arc<GiveawayService>,
        watch_time_service: Arc<WatchTimeService>,
        stream_session_service: Arc<StreamSessionService>,
    ) -> Self {
        debug!("Initializing CommandService (prefix='{}')", names.prefix);
        Self {
            names,
            giveaway_service,
            watch_time_service,
            stream_session_service,
        }
    }

    pub fn names(&self) -> &CommandNames {
        &self.names
    }

    /// Processes a chat line and returns the reply if it was one of our commands.
    ///
    /// Privileged commands from ordinary viewers are ignored silently. Every
    /// failure is turned into a reply here; nothing is propagated.
    pub async fn handle_chat_line(
        &self,
        channel: &str,
        user_id: &str,
        display_name: &str,
        user_roles: &[String],
        message_text: &str,
    ) -> Option<CommandResponse> {
        let trimmed = message_text.trim();
        let body = trimmed.strip_prefix(self.names.prefix.as_str())?;

        let (cmd_part, args) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        let cmd = BuiltinCommand::resolve(&self.names, cmd_part)?;

        if cmd.is_privileged() && !is_privileged_caller(user_roles) {
            debug!("Ignoring {:?} from non-privileged user {} ({})", cmd, display_name, user_id);
            return None;
        }

        let ctx = CommandContext {
            channel,
            user_id,
            display_name,
            names: &self.names,
            giveaway_service: &self.giveaway_service,
            watch_time_service: &self.watch_time_service,
            stream_session_service: &self.stream_session_service,
        };

        let text = match handle_builtin_command(cmd, &ctx, args).await {
            Ok(reply) => {
                info!("{:?} by {} in {} => '{}'", cmd, display_name, channel, reply);
                reply
            }
            Err(e) => {
                warn!("{:?} by {} ({}) failed: {}", cmd, display_name, user_id, e);
                self.error_reply(&ctx, &e)
            }
        };

        Some(CommandResponse {
            texts: vec![text],
            channel: channel.to_string(),
        })
    }

    fn error_reply(&self, ctx: &CommandContext<'_>, err: &GiveawayError) -> String {
        match err {
            GiveawayError::AlreadyOpen(key) => format!(
                "Giveaway '{}' is already running. End it with {}",
                key,
                self.names.display(&self.names.giveaway_end)
            ),
            GiveawayError::NoActiveGiveaway => "No active giveaway".to_string(),
            GiveawayError::Ineligible { required, actual } => format!(
                "@{}, not enough watch time. Required: {} min, you have: {} min",
                ctx.display_name, required, actual
            ),
            GiveawayError::AlreadyEntered(key) => {
                format!("@{}, you are already entered in giveaway '{}'", ctx.display_name, key)
            }
            GiveawayError::NoParticipants(key) => format!("No participants in giveaway '{}'", key),
            GiveawayError::StorageUnavailable(_) => {
                "Something went wrong on our side, please try again in a moment.".to_string()
            }
        }
    }
}
