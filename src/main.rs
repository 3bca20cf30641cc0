mod config;
mod db;
mod errors;
mod external;
mod jobs;
mod logging;
mod models;
mod services;
mod state;

use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::external::market_data_provider::MarketDataProvider;
use crate::external::notifier::{LogNotifier, NotificationChannel};
use crate::external::telegram::TelegramNotifier;
use crate::external::twse::TwseOpenApiProvider;
use crate::jobs::daily_flow_job::{self, RunOutcome};
use crate::logging::{init_logging, LoggingConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    let pool = db::open_store(&config.database_path)
        .await
        .with_context(|| format!("failed to open store at {:?}", config.database_path))?;

    let market_data: Arc<dyn MarketDataProvider> = Arc::new(
        TwseOpenApiProvider::new(config.market_data_url.clone(), config.fetch_timeout)
            .context("failed to build HTTP client")?,
    );

    let notifier: Arc<dyn NotificationChannel> = match &config.telegram {
        Some(telegram) => {
            tracing::info!("📨 Notifications go to Telegram chat {}", telegram.chat_id);
            Arc::new(
                TelegramNotifier::new(telegram, config.fetch_timeout)
                    .context("failed to build Telegram client")?,
            )
        }
        None => {
            tracing::info!("📨 TG_TOKEN/TG_CHAT_ID not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let today = daily_flow_job::exchange_today(config.market_utc_offset_hours);
    let state = AppState {
        pool,
        market_data,
        notifier,
        config: Arc::new(config),
    };

    // Anything other than a store failure exits 0 so the scheduler never flags the run
    let outcome = daily_flow_job::run_daily_flow(&state, today)
        .await
        .context("daily flow run failed")?;

    match outcome {
        RunOutcome::NoData => tracing::info!("🏁 Run finished: no data today"),
        RunOutcome::UpstreamUnavailable(cause) => {
            tracing::info!("🏁 Run finished: exchange unavailable ({})", cause)
        }
        RunOutcome::InsufficientHistory { appended } => tracing::info!(
            "🏁 Run finished: {} records appended, ranking empty",
            appended
        ),
        RunOutcome::Reported {
            appended,
            entries,
            delivered,
        } => tracing::info!(
            "🏁 Run finished: {} records appended, {} ranked, delivered: {}",
            appended,
            entries,
            delivered
        ),
    }

    state.pool.close().await;
    Ok(())
}
