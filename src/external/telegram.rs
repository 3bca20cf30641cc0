use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::TelegramConfig;
use crate::external::notifier::{NotificationChannel, NotificationError};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl NotificationChannel for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotificationError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        // reqwest errors can echo the URL, which carries the bot token
        let resp = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Network(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
