use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{NotificationSender, SenderError};

/// A sender for pushing notifications via the Telegram Bot API.
pub struct TelegramSender {
    client: Client,
    bot_token: Option<String>,
    api_base: String,
}

impl TelegramSender {
    /// `timeout` bounds every request so one unreachable endpoint cannot stall a pass.
    pub fn new(bot_token: Option<String>, api_base: &str, timeout: Duration) -> Result<Self, SenderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            bot_token: bot_token.filter(|t| !t.trim().is_empty()),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn send_message_url(&self, bot_token: &str) -> String {
        format!("{}/bot{bot_token}/sendMessage", self.api_base)
    }
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, chat_id: &str, message: &str) -> Result<(), SenderError> {
        let Some(bot_token) = self.bot_token.as_deref() else {
            return Err(SenderError::NotConfigured(
                "TELEGRAM_BOT_TOKEN not set".to_string(),
            ));
        };

        // Alert texts use legacy Markdown (`*bold*`), so no MarkdownV2 escaping here.
        let payload = TelegramMessage {
            chat_id,
            text: message,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(self.send_message_url(bot_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.without_url())?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "status {}: {error_body}",
                status.as_u16()
            )));
        }

        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }
}
