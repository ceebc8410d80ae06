//! Telegram Bot API sender.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::ports::{NotificationError, NotificationSender};

/// Telegram Bot API configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    bot_token: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            api_base_url: "https://api.telegram.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base_url,
            self.bot_token.expose_secret()
        )
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends notifications through a Telegram bot.
pub struct TelegramSender {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Result<Self, NotificationError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                NotificationError::DeliveryFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        let body = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
        };

        // The URL embeds the bot token; never log it or the reqwest error's URL.
        let response = self
            .http_client
            .post(self.config.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                NotificationError::DeliveryFailed(format!(
                    "Telegram request failed: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(chat_id, status = status.as_u16(), detail = %detail, "Telegram rejected message");
            return Err(NotificationError::DeliveryFailed(format!(
                "Telegram API error: {}",
                status.as_u16()
            )));
        }

        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }
}
