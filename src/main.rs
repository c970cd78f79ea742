//! Wiring & DI. Entry point: load config, log in, run one sweep, exit.
//! No business logic here; the sweep is delegated to SweepService.

use discord_ttl::adapters::discord::{DiscordRestGateway, DiscordSession};
use discord_ttl::ports::{ChatGateway, SweepPort};
use discord_ttl::shared::config::AppConfig;
use discord_ttl::usecases::SweepService;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    discord_ttl::adapters::ui::init_ui();

    // --- Config: validated before any network activity ---
    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("load config: {}", e))?;
    let sweep_config = cfg.sweep_config()?;
    let token = cfg.bot_token()?;

    // --- Session: log in and bind to the single guild ---
    let session = Arc::new(
        DiscordSession::connect(&token, &cfg.api_base_or_default(), cfg.guild_id).await?,
    );
    let gateway: Arc<dyn ChatGateway> = Arc::new(DiscordRestGateway::new(Arc::clone(&session)));

    // --- Sweep ---
    let sweeper: Arc<dyn SweepPort> = Arc::new(SweepService::new(gateway));
    info!("Discord TTL is now running!");
    match sweeper.sweep(&sweep_config).await {
        Ok(report) => {
            info!(
                channels = report.channels_processed,
                skipped = report.channels_skipped,
                deleted = report.deleted(),
                not_deletable = report.not_deletable,
                preview = sweep_config.preview,
                "Discord TTL has finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "sweep aborted");
            Err(e.into())
        }
    }
}
