//! giveawaybot-server/src/config.rs
//!
//! Reads `BotConfig` from disk and layers the environment and CLI on top.

use std::fs;
use anyhow::Context;
use tracing::info;

use giveawaybot_common::models::BotConfig;

use crate::Args;

const TOKEN_ENV_VAR: &str = "TWITCH_OAUTH_TOKEN";

pub fn load_config(args: &Args) -> anyhow::Result<BotConfig> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();

    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("reading config file '{}'", args.config))?;
    let mut cfg = BotConfig::from_json_str(&raw)
        .with_context(|| format!("parsing config file '{}'", args.config))?;

    let env_token = std::env::var(TOKEN_ENV_VAR).ok();
    apply_overrides(&mut cfg, args, env_token.as_deref());
    cfg.validate()?;

    info!(
        "Config loaded: channel={} bot={} tracking={:?} min_watch_time={} db={}",
        cfg.twitch.channel,
        cfg.twitch.bot_username,
        cfg.tracking.mode,
        cfg.giveaway.min_watch_time_minutes,
        cfg.database.path
    );
    Ok(cfg)
}

/// Environment token beats the file; CLI flags beat both.
fn apply_overrides(cfg: &mut BotConfig, args: &Args, env_token: Option<&str>) {
    if let Some(token) = env_token.map(str::trim).filter(|t| !t.is_empty()) {
        cfg.twitch.oauth_token = token.to_string();
    }
    cfg.twitch.oauth_token = with_oauth_prefix(&cfg.twitch.oauth_token);

    if let Some(path) = &args.db_path {
        cfg.database.path = path.clone();
    }
    if let Some(mode) = args.tracking {
        cfg.tracking.mode = mode;
    }
}

/// IRC `PASS` wants `oauth:<token>`; bare tokens are accepted in config.
fn with_oauth_prefix(token: &str) -> String {
    let token = token.trim();
    if token.is_empty() || token.starts_with("oauth:") {
        token.to_string()
    } else {
        format!("oauth:{}", token)
    }
}
