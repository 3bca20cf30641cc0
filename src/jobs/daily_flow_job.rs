//! Daily Institutional Flow Job
//!
//! One invocation performs a single end-of-day cycle and then returns:
//!
//! 1. Fetch today's per-security institutional trading statistics
//! 2. Classify the response (data, no data today, upstream error)
//! 3. Normalize rows into `DailyRecord`s and append them to the store
//! 4. Rank securities by their absorption ratio over the trailing window
//! 5. Format the ranking and hand it to the notification channel
//!
//! # Error Handling
//!
//! - Holidays, maintenance pages, non-200 responses, timeouts and malformed
//!   payloads end the run early with a benign outcome
//! - An empty ranking (not enough history or liquidity) skips notification
//! - Notification failures are logged and never retried
//! - Only store failures are returned as errors

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::db::flow_record_queries;
use crate::errors::AppError;
use crate::external::market_data_provider::FetchOutcome;
use crate::models::DailyRecord;
use crate::services::{ingestion_service, ranking_service, report_service};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The exchange published nothing for today
    NoData,
    /// The exchange could not be reached or returned garbage
    UpstreamUnavailable(String),
    /// Nothing in the window passed the liquidity filter
    InsufficientHistory { appended: usize },
    Reported {
        appended: usize,
        entries: usize,
        delivered: bool,
    },
}

/// Current calendar date at the exchange.
pub fn exchange_today(utc_offset_hours: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_hours * 3600) {
        Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
        None => Utc::now().date_naive(),
    }
}

pub async fn run_daily_flow(state: &AppState, today: NaiveDate) -> Result<RunOutcome, AppError> {
    info!("📥 Starting daily flow run for {}", today);

    let rows = match state.market_data.fetch_daily_flows().await {
        FetchOutcome::DataAvailable(rows) => rows,
        FetchOutcome::NoDataToday => {
            info!("🏖️  Exchange published no data for {}, nothing to do", today);
            return Ok(RunOutcome::NoData);
        }
        FetchOutcome::UpstreamError(cause) => {
            warn!("⚠️  Exchange unavailable, ending run: {}", cause);
            return Ok(RunOutcome::UpstreamUnavailable(cause));
        }
    };

    let records = ingestion_service::normalize(&rows, today);
    info!("Normalized {} of {} rows for {}", records.len(), rows.len(), today);

    let appended = append_today(state, today, &records).await?;

    let report = ranking_service::rank(&state.pool, &state.config.ranking)
        .await
        .map_err(|e| {
            error!("❌ Failed to compute ranking: {}", e);
            AppError::from(e)
        })?;

    if report.is_empty() {
        warn!(
            "⚠️  No security passed the liquidity filter over {} stored trading days, skipping notification",
            report.trading_days()
        );
        return Ok(RunOutcome::InsufficientHistory { appended });
    }

    let message = report_service::format_report(&report);
    let delivered = match state.notifier.send(&message).await {
        Ok(()) => {
            info!(
                "✅ Sent ranking of {} securities via {}",
                report.entries.len(),
                state.notifier.name()
            );
            true
        }
        Err(e) => {
            warn!("Failed to send ranking via {}: {}", state.notifier.name(), e);
            false
        }
    };

    Ok(RunOutcome::Reported {
        appended,
        entries: report.entries.len(),
        delivered,
    })
}

async fn append_today(
    state: &AppState,
    today: NaiveDate,
    records: &[DailyRecord],
) -> Result<usize, AppError> {
    if records.is_empty() {
        warn!("⚠️  No parsable rows for {}, nothing appended", today);
        return Ok(0);
    }

    if state.config.skip_duplicate_date
        && flow_record_queries::has_records_for_date(&state.pool, today).await?
    {
        warn!("⚠️  Records for {} already stored, skipping append", today);
        return Ok(0);
    }

    flow_record_queries::append(&state.pool, records).await?;
    info!("💾 Appended {} records for {}", records.len(), today);
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, RankingParams};
    use crate::db::open_in_memory;
    use crate::external::market_data_provider::{classify_response, MarketDataProvider};
    use crate::external::notifier::{NotificationChannel, NotificationError};
    use crate::models::RawFlowRecord;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct FixedProvider(FetchOutcome);

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn fetch_daily_flows(&self) -> FetchOutcome {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationChannel for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotificationError> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(NotificationError::Rejected("HTTP 400".to_string()));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn test_config(skip_duplicate_date: bool) -> AppConfig {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.skip_duplicate_date = skip_duplicate_date;
        config.ranking = RankingParams::default();
        config
    }

    async fn state_with(
        outcome: FetchOutcome,
        notifier: Arc<RecordingNotifier>,
        skip_duplicate_date: bool,
    ) -> AppState {
        AppState {
            pool: open_in_memory().await,
            market_data: Arc::new(FixedProvider(outcome)),
            notifier,
            config: Arc::new(test_config(skip_duplicate_date)),
        }
    }

    fn raw(code: &str, name: &str, foreign_net: &str, trade_value: &str) -> RawFlowRecord {
        let s = |v: &str| Some(v.to_string());
        RawFlowRecord {
            code: s(code),
            name: s(name),
            trade_value: s(trade_value),
            foreign_buy: s(foreign_net),
            foreign_sell: s("0"),
            trust_buy: s("0"),
            trust_sell: s("0"),
            dealer_buy: s("0"),
            dealer_sell: s("0"),
        }
    }

    async fn row_count(state: &AppState) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM flow_records")
            .fetch_one(&state.pool)
            .await
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_html_holiday_page_is_a_quiet_no_op() {
        let notifier = Arc::new(RecordingNotifier::default());
        let outcome = classify_response(200, "<!DOCTYPE html><html><body>休市</body></html>");
        let state = state_with(outcome, notifier.clone(), false).await;

        let result = run_daily_flow(&state, day(2)).await.unwrap();

        assert_eq!(result, RunOutcome::NoData);
        assert_eq!(row_count(&state).await, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_error_is_absorbed() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = state_with(
            FetchOutcome::UpstreamError("HTTP 502".to_string()),
            notifier.clone(),
            false,
        )
        .await;

        let result = run_daily_flow(&state, day(2)).await.unwrap();

        assert_eq!(result, RunOutcome::UpstreamUnavailable("HTTP 502".to_string()));
        assert_eq!(row_count(&state).await, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_run_appends_ranks_and_notifies() {
        let notifier = Arc::new(RecordingNotifier::default());
        let rows = vec![
            raw("A", "Alpha", "6,000,000", "1,000,000,000"),
            raw("B", "Beta", "-2,000,000", "500,000,000"),
            raw("C", "Broken", "n/a", "900,000,000"),
        ];
        let state = state_with(FetchOutcome::DataAvailable(rows), notifier.clone(), false).await;

        let result = run_daily_flow(&state, day(2)).await.unwrap();

        assert_eq!(
            result,
            RunOutcome::Reported {
                appended: 2,
                entries: 1,
                delivered: true,
            }
        );
        assert_eq!(row_count(&state).await, 2);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("1. Alpha (A) 0.60%"));
        assert!(!sent[0].contains("Beta"));
    }

    #[tokio::test]
    async fn test_insufficient_liquidity_skips_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let rows = vec![raw("S", "Small", "100", "1,000")];
        let state = state_with(FetchOutcome::DataAvailable(rows), notifier.clone(), false).await;

        let result = run_daily_flow(&state, day(2)).await.unwrap();

        assert_eq!(result, RunOutcome::InsufficientHistory { appended: 1 });
        assert_eq!(row_count(&state).await, 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_run() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let rows = vec![raw("A", "Alpha", "6,000,000", "1,000,000,000")];
        let state = state_with(FetchOutcome::DataAvailable(rows), notifier.clone(), false).await;

        let result = run_daily_flow(&state, day(2)).await.unwrap();

        assert_eq!(
            result,
            RunOutcome::Reported {
                appended: 1,
                entries: 1,
                delivered: false,
            }
        );
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rerun_appends_duplicates_by_default() {
        let notifier = Arc::new(RecordingNotifier::default());
        let rows = vec![raw("A", "Alpha", "6,000,000", "1,000,000,000")];
        let state = state_with(FetchOutcome::DataAvailable(rows), notifier, false).await;

        run_daily_flow(&state, day(2)).await.unwrap();
        run_daily_flow(&state, day(2)).await.unwrap();

        assert_eq!(row_count(&state).await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_date_guard_skips_second_append() {
        let notifier = Arc::new(RecordingNotifier::default());
        let rows = vec![raw("A", "Alpha", "6,000,000", "1,000,000,000")];
        let state = state_with(FetchOutcome::DataAvailable(rows), notifier.clone(), true).await;

        run_daily_flow(&state, day(2)).await.unwrap();
        let second = run_daily_flow(&state, day(2)).await.unwrap();

        assert_eq!(row_count(&state).await, 1);
        assert_eq!(
            second,
            RunOutcome::Reported {
                appended: 0,
                entries: 1,
                delivered: true,
            }
        );
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ranking_uses_history_from_previous_runs() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = state_with(FetchOutcome::NoDataToday, notifier.clone(), false).await;
        flow_record_queries::append(
            &state.pool,
            &[DailyRecord {
                date: day(1),
                code: "A".to_string(),
                name: "Alpha".to_string(),
                net: 4_000_000.0,
                val: 400_000_000.0,
            }],
        )
        .await
        .unwrap();

        let state = AppState {
            market_data: Arc::new(FixedProvider(FetchOutcome::DataAvailable(vec![raw(
                "A",
                "Alpha",
                "1,000,000",
                "200,000,000",
            )]))),
            ..state
        };

        let result = run_daily_flow(&state, day(2)).await.unwrap();

        // 5,000,000 / 600,000,000 over two days; neither day alone clears the threshold
        assert_eq!(
            result,
            RunOutcome::Reported {
                appended: 1,
                entries: 1,
                delivered: true,
            }
        );
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].contains("Window: 2 trading days ending 2024-01-02"));
        assert!(sent[0].contains("1. Alpha (A) 0.83%"));
    }
}
