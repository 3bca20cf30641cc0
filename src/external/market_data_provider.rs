use async_trait::async_trait;

use crate::models::RawFlowRecord;

/// What one fetch against the exchange produced.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    DataAvailable(Vec<RawFlowRecord>),
    /// Holiday, maintenance or pre-open: blank body, HTML page or empty list
    NoDataToday,
    UpstreamError(String),
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_daily_flows(&self) -> FetchOutcome;
}

/// Classifies a raw HTTP response by status and body content.
pub fn classify_response(status: u16, body: &str) -> FetchOutcome {
    if !(200..300).contains(&status) {
        return FetchOutcome::UpstreamError(format!("HTTP {}", status));
    }

    let trimmed = body.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return FetchOutcome::NoDataToday;
    }

    match serde_json::from_str::<Vec<RawFlowRecord>>(trimmed) {
        Ok(rows) if rows.is_empty() => FetchOutcome::NoDataToday,
        Ok(rows) => FetchOutcome::DataAvailable(rows),
        Err(e) => FetchOutcome::UpstreamError(format!("malformed payload: {}", e)),
    }
}
