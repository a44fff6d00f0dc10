// File: giveawaybot-common/src/models/config.rs
//
// Process configuration, read from a JSON file by the server binary.

use serde::{Deserialize, Serialize};
use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub twitch: TwitchConfig,
    #[serde(default)]
    pub giveaway: GiveawayConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub commands: CommandNames,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    pub channel: String,
    pub bot_username: String,
    #[serde(default)]
    pub oauth_token: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiveawayConfig {
    /// Minimum ticks a viewer needs before `join` is accepted.
    #[serde(default = "default_min_watch_time")]
    pub min_watch_time_minutes: i64,
}

impl Default for GiveawayConfig {
    fn default() -> Self {
        Self { min_watch_time_minutes: default_min_watch_time() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// One tick per chat message.
    Chat,
    /// One tick per chatter per poll interval.
    Presence,
}

impl std::str::FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(TrackingMode::Chat),
            "presence" => Ok(TrackingMode::Presence),
            _ => Err(format!("Unknown tracking mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_mode")]
    pub mode: TrackingMode,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            mode: default_tracking_mode(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Chat command bindings. Names are stored without the prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandNames {
    pub prefix: String,
    pub new_stream: String,
    pub giveaway_start: String,
    pub giveaway_end: String,
    pub giveaway_join: String,
    pub pick: String,
    pub time: String,
    pub participants: String,
    pub current: String,
}

impl Default for CommandNames {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            new_stream: "newstream".to_string(),
            giveaway_start: "giveaway".to_string(),
            giveaway_end: "endgiveaway".to_string(),
            giveaway_join: "join".to_string(),
            pick: "pick".to_string(),
            time: "time".to_string(),
            participants: "participants".to_string(),
            current: "current".to_string(),
        }
    }
}

impl CommandNames {
    /// The user-facing form of a binding, e.g. `!join`.
    pub fn display(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

fn default_min_watch_time() -> i64 { 30 }
fn default_tracking_mode() -> TrackingMode { TrackingMode::Presence }
fn default_poll_interval() -> u64 { 60 }
fn default_db_path() -> String { "data/bot.db".to_string() }

impl BotConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let mut cfg: BotConfig = serde_json::from_str(raw)?;
        cfg.normalize();
        Ok(cfg)
    }

    /// IRC channels are lowercase and `#`-prefixed; command names are matched
    /// case-insensitively so they are stored lowercase too.
    pub fn normalize(&mut self) {
        let channel = self.twitch.channel.trim().trim_start_matches('#').to_lowercase();
        self.twitch.channel = if channel.is_empty() { channel } else { format!("#{}", channel) };
        self.twitch.bot_username = self.twitch.bot_username.trim().to_lowercase();

        let prefix = self.commands.prefix.clone();
        let c = &mut self.commands;
        for name in [
            &mut c.new_stream,
            &mut c.giveaway_start,
            &mut c.giveaway_end,
            &mut c.giveaway_join,
            &mut c.pick,
            &mut c.time,
            &mut c.participants,
            &mut c.current,
        ] {
            *name = name.trim().trim_start_matches(prefix.as_str()).to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.twitch.channel.is_empty() {
            return Err(Error::Config("twitch.channel must not be empty".into()));
        }
        if self.twitch.bot_username.is_empty() {
            return Err(Error::Config("twitch.bot_username must not be empty".into()));
        }
        if self.twitch.oauth_token.trim().is_empty() {
            return Err(Error::Config("twitch.oauth_token must not be empty".into()));
        }
        if self.giveaway.min_watch_time_minutes < 0 {
            return Err(Error::Config("giveaway.min_watch_time_minutes must be >= 0".into()));
        }
        if self.tracking.poll_interval_secs == 0 {
            return Err(Error::Config("tracking.poll_interval_secs must be > 0".into()));
        }
        if self.commands.prefix.is_empty() {
            return Err(Error::Config("commands.prefix must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let raw = r#"{ "twitch": { "channel": "SomeStreamer", "bot_username": "MyBot", "oauth_token": "oauth:abc" } }"#;
        let cfg = BotConfig::from_json_str(raw).unwrap();

        assert_eq!(cfg.twitch.channel, "#somestreamer");
        assert_eq!(cfg.twitch.bot_username, "mybot");
        assert_eq!(cfg.giveaway.min_watch_time_minutes, 30);
        assert_eq!(cfg.tracking.mode, TrackingMode::Presence);
        assert_eq!(cfg.tracking.poll_interval_secs, 60);
        assert_eq!(cfg.commands.giveaway_join, "join");
        assert_eq!(cfg.database.path, "data/bot.db");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_command_bindings_strip_prefix() {
        let raw = r##"{
            "twitch": { "channel": "#chan", "bot_username": "bot", "oauth_token": "oauth:abc" },
            "giveaway": { "min_watch_time_minutes": 5 },
            "tracking": { "mode": "chat" },
            "commands": { "giveaway_join": "!Enter" }
        }"##;
        let cfg = BotConfig::from_json_str(raw).unwrap();

        assert_eq!(cfg.twitch.channel, "#chan");
        assert_eq!(cfg.giveaway.min_watch_time_minutes, 5);
        assert_eq!(cfg.tracking.mode, TrackingMode::Chat);
        assert_eq!(cfg.commands.giveaway_join, "enter");
        assert_eq!(cfg.commands.pick, "pick");
        assert_eq!(cfg.commands.display(&cfg.commands.giveaway_join), "!enter");
    }

    #[test]
    fn test_validate_rejects_missing_token() {
        let raw = r#"{ "twitch": { "channel": "chan", "bot_username": "bot" } }"#;
        let cfg = BotConfig::from_json_str(raw).unwrap();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_tracking_mode_from_str() {
        assert_eq!("Presence".parse::<TrackingMode>().unwrap(), TrackingMode::Presence);
        assert_eq!("chat".parse::<TrackingMode>().unwrap(), TrackingMode::Chat);
        assert!("minutes".parse::<TrackingMode>().is_err());
    }
}
