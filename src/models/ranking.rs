use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-security totals over a set of trading days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WindowAggregate {
    pub code: String,
    pub name: String,
    pub total_net: f64,
    pub total_val: f64,
}

/// Cumulative net buy as a percentage of cumulative trade value, 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionEntry {
    pub code: String,
    pub name: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    /// Trading days the ranking covered, most recent first
    pub window_dates: Vec<NaiveDate>,
    pub window_size: u32,
    pub entries: Vec<AbsorptionEntry>,
}

impl RankingReport {
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.window_dates.first().copied()
    }

    pub fn trading_days(&self) -> usize {
        self.window_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
