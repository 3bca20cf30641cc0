//! Rolling absorption ranking.
//!
//! The window is the most recent `window_size` distinct trading dates that
//! exist in the store, not a wall-clock range, so holidays and missed runs
//! simply push the window further back.

use sqlx::SqlitePool;
use tracing::debug;

use crate::config::RankingParams;
use crate::db::flow_record_queries;
use crate::models::{AbsorptionEntry, RankingReport, WindowAggregate};

pub async fn rank(pool: &SqlitePool, params: &RankingParams) -> Result<RankingReport, sqlx::Error> {
    let window_dates = flow_record_queries::distinct_recent_dates(pool, params.window_size).await?;

    if window_dates.is_empty() {
        return Ok(RankingReport {
            window_dates,
            window_size: params.window_size,
            entries: Vec::new(),
        });
    }

    let totals = flow_record_queries::aggregate_over_dates(pool, &window_dates).await?;
    debug!(
        "Aggregated {} securities over {} trading days",
        totals.len(),
        window_dates.len()
    );

    Ok(RankingReport {
        window_dates,
        window_size: params.window_size,
        entries: rank_aggregates(totals, params),
    })
}

/// Filters, scores and orders window totals. Ties keep the input order.
pub fn rank_aggregates(totals: Vec<WindowAggregate>, params: &RankingParams) -> Vec<AbsorptionEntry> {
    let mut entries: Vec<AbsorptionEntry> = totals
        .into_iter()
        .filter(|t| t.total_val > params.min_window_value)
        .map(|t| AbsorptionEntry {
            ratio: absorption_ratio(t.total_net, t.total_val),
            code: t.code,
            name: t.name,
        })
        .collect();

    // sort_by is stable
    entries.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    entries.truncate(params.top_n);
    entries
}

/// `total_net / total_val` as a percentage, rounded to 2 decimals.
/// Callers guarantee `total_val > 0`.
pub fn absorption_ratio(total_net: f64, total_val: f64) -> f64 {
    round_to(total_net / total_val * 100.0, 2)
}

/// Half-to-even rounding. `+ 0.0` folds `-0.0` into `0.0` so zero ratios tie.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor + 0.0
}
