use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use giveawaybot_common::models::TrackingMode;

mod config;
mod context;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "giveawaybot")]
#[command(author, version, about = "Twitch chat bot: watch-time tracking and gated giveaways")]
pub struct Args {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// SQLite database file (overrides `database.path`)
    #[arg(long)]
    pub db_path: Option<String>,

    /// Watch-time source: "chat" or "presence" (overrides `tracking.mode`)
    #[arg(long)]
    pub tracking: Option<TrackingMode>,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("giveawaybot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    info!("GiveawayBot starting. config={}", args.config);

    let cfg = config::load_config(&args)?;

    if let Err(e) = server::run_server(cfg).await {
        error!("Server error: {:?}", e);
        return Err(e);
    }

    info!("Main finished. Goodbye!");
    Ok(())
}
