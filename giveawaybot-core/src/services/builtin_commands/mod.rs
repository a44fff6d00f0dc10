// File: giveawaybot-core/src/services/builtin_commands/mod.rs
//! The bot's chat commands. Each group lives in its own file; the
//! CommandService resolves a name to a `BuiltinCommand` and calls
//! `handle_builtin_command`.

pub mod giveaway_commands;
pub mod stream_commands;
pub mod watch_time_commands;

use giveawaybot_common::error::GiveawayError;
use giveawaybot_common::models::CommandNames;
use crate::services::command_service::CommandContext;
use crate::services::builtin_commands::{
    giveaway_commands::{handle_current, handle_end, handle_join, handle_participants, handle_pick, handle_start},
    stream_commands::handle_new_stream,
    watch_time_commands::handle_time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    NewStream,
    GiveawayStart,
    GiveawayEnd,
    GiveawayJoin,
    Pick,
    Time,
    Participants,
    Current,
}

impl BuiltinCommand {
    /// Maps a typed command name (prefix already stripped) onto a binding.
    /// Matching is case-insensitive.
    pub fn resolve(names: &CommandNames, name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let table = [
            (&names.new_stream, BuiltinCommand::NewStream),
            (&names.giveaway_start, BuiltinCommand::GiveawayStart),
            (&names.giveaway_end, BuiltinCommand::GiveawayEnd),
            (&names.giveaway_join, BuiltinCommand::GiveawayJoin),
            (&names.pick, BuiltinCommand::Pick),
            (&names.time, BuiltinCommand::Time),
            (&names.participants, BuiltinCommand::Participants),
            (&names.current, BuiltinCommand::Current),
        ];
        table
            .into_iter()
            .find(|(bound, _)| !bound.is_empty() && bound.eq_ignore_ascii_case(&name))
            .map(|(_, cmd)| cmd)
    }

    /// Moderator or broadcaster only.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            BuiltinCommand::NewStream
                | BuiltinCommand::GiveawayStart
                | BuiltinCommand::GiveawayEnd
                | BuiltinCommand::Pick
                | BuiltinCommand::Participants
        )
    }
}

/// Runs `cmd` and returns the reply line. Errors are left for the caller to
/// phrase, since the wording depends on who asked.
pub async fn handle_builtin_command(
    cmd: BuiltinCommand,
    ctx: &CommandContext<'_>,
    raw_args: &str,
) -> Result<String, GiveawayError> {
    match cmd {
        BuiltinCommand::NewStream => handle_new_stream(ctx, raw_args).await,
        BuiltinCommand::GiveawayStart => handle_start(ctx, raw_args).await,
        BuiltinCommand::GiveawayEnd => handle_end(ctx, raw_args).await,
        BuiltinCommand::GiveawayJoin => handle_join(ctx, raw_args).await,
        BuiltinCommand::Pick => handle_pick(ctx, raw_args).await,
        BuiltinCommand::Time => handle_time(ctx, raw_args).await,
        BuiltinCommand::Participants => handle_participants(ctx, raw_args).await,
        BuiltinCommand::Current => handle_current(ctx, raw_args).await,
    }
}

/// First whitespace-separated token of the arguments, verbatim.
pub(crate) fn first_arg(raw_args: &str) -> Option<&str> {
    raw_args.split_whitespace().next()
}
