mod api;
mod config;
mod error;
mod homework;
mod notifier;
mod platform;
mod poller;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::ApiClient;
use crate::config::{Credentials, Settings};
use crate::notifier::Notifier;
use crate::platform::telegram::TelegramMessenger;
use crate::poller::Poller;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,homework_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let credentials = Credentials::from_env();
    if !credentials.check_tokens() {
        error!(
            "CRITICAL: missing required environment variables: {}",
            credentials.missing().join(", ")
        );
        std::process::exit(1);
    }
    let credentials = credentials
        .require()
        .context("Credential check passed with missing values")?;
    info!("Tokens are in order");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let settings = Settings::load(&config_path);

    info!("  Endpoint: {}", settings.poller.endpoint);
    info!("  Retry period: {}s", settings.poller.retry_period_secs);

    let messenger = TelegramMessenger::new(
        &credentials.telegram_token,
        &credentials.telegram_chat_id,
    );
    let notifier = Notifier::new(Arc::new(messenger));
    let api = ApiClient::new(settings.poller.endpoint, credentials.practicum_token);

    let poller = Poller::new(
        api,
        notifier,
        Duration::from_secs(settings.poller.retry_period_secs),
    );

    info!("Bot is starting, first window from {}", poller.window());
    poller.run().await;

    Ok(())
}
