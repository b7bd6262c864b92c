use anyhow::Result;
use grid_guru_bot::api_client::F1ApiClient;
use grid_guru_bot::bot::{DeliveryLoop, Router, TelegramMessenger, TelegramUpdateSource};
use grid_guru_bot::config::AppConfig;
use grid_guru_bot::localization;
use grid_guru_bot::observability;
use grid_guru_bot::session::SessionStore;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    // Nothing is subscribed yet, so failures here are logged to stderr directly
    let config = match AppConfig::from_env().and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(e) => {
            observability::log_startup_error(&e, "app_config");
            return Err(e.into());
        }
    };

    // Initialize complete observability stack (tracing, metrics, health endpoints)
    observability::init_observability(&config.observability, config.bot.token.clone()).await?;
    info!("{}", config.summary());

    let localization_manager = localization::create_localization_manager()?;
    let api = Arc::new(F1ApiClient::new(config.api.clone())?);

    // Telegram client with a timeout above the long-poll window
    let client = reqwest::Client::builder()
        .timeout(config.bot.http_timeout())
        .build()?;
    let bot = Bot::with_client(config.bot.token.clone(), client);

    let router = Arc::new(Router::with_default_handlers(
        Arc::new(TelegramMessenger::new(bot.clone())),
        SessionStore::new(),
        api,
        localization_manager,
        Arc::new(config.bot.clone()),
    ));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    info!(
        poll_timeout_secs = config.bot.poll_timeout_secs,
        "Bot initialized, starting delivery loop"
    );
    let source = TelegramUpdateSource::new(bot, config.bot.poll_timeout_secs);
    DeliveryLoop::new(source, router).run(shutdown).await;

    Ok(())
}
