use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

pub const DEFAULT_MARKET_DATA_URL: &str = "https://openapi.twse.com.tw/v1/fund/T86_ALL";
pub const DEFAULT_DATABASE_PATH: &str = "data/flows.db";

/// Parameters of the rolling absorption ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingParams {
    /// Number of most recent distinct trading days in the window
    pub window_size: u32,
    /// Securities must trade strictly more than this over the window
    pub min_window_value: f64,
    pub top_n: usize,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            window_size: 20,
            min_window_value: 500_000_000.0,
            top_n: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

/// Everything a run needs, resolved once at startup and handed to the
/// components that use it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub market_data_url: String,
    pub fetch_timeout: Duration,
    pub telegram: Option<TelegramConfig>,
    pub ranking: RankingParams,
    pub market_utc_offset_hours: i32,
    pub skip_duplicate_date: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let defaults = RankingParams::default();

        let telegram = match (get("TG_TOKEN"), get("TG_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig { token, chat_id }),
            _ => None,
        };

        let config = Self {
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            market_data_url: get("MARKET_DATA_URL")
                .unwrap_or_else(|| DEFAULT_MARKET_DATA_URL.to_string()),
            fetch_timeout: Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", get("FETCH_TIMEOUT_SECS"), 30u64)?),
            telegram,
            ranking: RankingParams {
                window_size: parse_or("RANK_WINDOW_DAYS", get("RANK_WINDOW_DAYS"), defaults.window_size)?,
                min_window_value: parse_or(
                    "RANK_MIN_WINDOW_VALUE",
                    get("RANK_MIN_WINDOW_VALUE"),
                    defaults.min_window_value,
                )?,
                top_n: parse_or("RANK_TOP_N", get("RANK_TOP_N"), defaults.top_n)?,
            },
            market_utc_offset_hours: parse_or(
                "MARKET_UTC_OFFSET_HOURS",
                get("MARKET_UTC_OFFSET_HOURS"),
                8,
            )?,
            skip_duplicate_date: parse_or("SKIP_DUPLICATE_DATE", get("SKIP_DUPLICATE_DATE"), false)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ranking.window_size == 0 {
            return Err("RANK_WINDOW_DAYS must be at least 1".to_string());
        }
        if self.ranking.top_n == 0 {
            return Err("RANK_TOP_N must be at least 1".to_string());
        }
        if !self.ranking.min_window_value.is_finite() || self.ranking.min_window_value < 0.0 {
            return Err("RANK_MIN_WINDOW_VALUE must be a non-negative number".to_string());
        }
        if !(-12..=14).contains(&self.market_utc_offset_hours) {
            return Err(format!(
                "MARKET_UTC_OFFSET_HOURS out of range: {}",
                self.market_utc_offset_hours
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err("FETCH_TIMEOUT_SECS must be at least 1".to_string());
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, value))),
        None => Ok(default),
    }
}
