use std::sync::Arc;
use sqlx::SqlitePool;
use crate::config::AppConfig;
use crate::external::market_data_provider::MarketDataProvider;
use crate::external::notifier::NotificationChannel;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub notifier: Arc<dyn NotificationChannel>,
    pub config: Arc<AppConfig>,
}
