//! `helpdesk-bot`: Telegram help-desk bot.
//!
//! Loads configuration from the environment (see
//! [`BotConfig::from_env`](helpdesk_bot::config::BotConfig::from_env)),
//! applies migrations, then long-polls Telegram until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_bot::config::BotConfig;
use helpdesk_bot::dispatcher::Dispatcher;
use helpdesk_bot::notifications::NotificationRouter;
use helpdesk_bot::runtime;
use helpdesk_db::PgStore;
use helpdesk_events::EventBus;
use helpdesk_telegram::TelegramApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk_bot=debug,helpdesk_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = BotConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        operators = config.operator_ids.len(),
        api_url = %config.telegram_api_url,
        poll_timeout_secs = config.poll_timeout_secs,
        "Loaded bot configuration"
    );

    // --- Database ---
    let pool = helpdesk_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    helpdesk_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    helpdesk_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Telegram ---
    let api = Arc::new(TelegramApi::new(
        &config.telegram_api_url,
        &config.telegram_token,
    ));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Spawn notification router (mirrors ticket events to operators and owners).
    let router = NotificationRouter::new(api.clone(), config.operator_ids.clone());
    let router_handle = tokio::spawn(router.run(event_bus.subscribe()));

    // --- Dispatcher ---
    let store = Arc::new(PgStore::new(pool.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        Arc::clone(&event_bus),
        config.operator_ids.clone(),
    ));

    // --- Shutdown ---
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
            }
            cancel.cancel();
        }
    });

    runtime::run(api, dispatcher, config.poll_timeout_secs, cancel).await;

    // Dropping the last bus handle closes the router loop.
    drop(event_bus);
    if let Err(e) = router_handle.await {
        tracing::error!(error = %e, "Notification router task failed");
    }

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
