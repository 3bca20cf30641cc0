use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::external::market_data_provider::{classify_response, FetchOutcome, MarketDataProvider};

/// Taiwan Stock Exchange open-data endpoint for daily institutional trading.
pub struct TwseOpenApiProvider {
    client: reqwest::Client,
    url: String,
}

impl TwseOpenApiProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flow-digest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for TwseOpenApiProvider {
    async fn fetch_daily_flows(&self) -> FetchOutcome {
        let resp = match self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                return FetchOutcome::UpstreamError(format!("request timed out: {}", e))
            }
            Err(e) => return FetchOutcome::UpstreamError(format!("network error: {}", e)),
        };

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return FetchOutcome::UpstreamError(format!("failed to read body: {}", e)),
        };

        debug!("Exchange responded with HTTP {} ({} bytes)", status, body.len());
        classify_response(status, &body)
    }
}
