//! Telegram Bot API `sendMessage` relay.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::config::TelegramConfig;
use crate::error::{LeadError, Result};
use crate::utils::mask_token;

const PARSE_MODE: &str = "HTML";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Delivers formatted lead messages to one fixed chat.
#[derive(Clone)]
pub struct TelegramRelay {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramRelay {
    /// `None` unless both the bot token and chat id are configured.
    pub fn from_config(config: &TelegramConfig, client: reqwest::Client) -> Option<Self> {
        let (bot_token, chat_id) = config.credentials()?;
        Some(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    /// POST one message. Transport and decode failures map to
    /// [`LeadError::RelayTransport`]; a non-ok answer to
    /// [`LeadError::RelayRejected`] with the response body as detail.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
        };

        // Errors are stripped of their URL; it contains the bot token.
        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| LeadError::RelayTransport(e.without_url().to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| LeadError::RelayTransport(e.without_url().to_string()))?;

        let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !status.is_success() || !ok {
            tracing::warn!("Telegram rejected message ({}): {}", status, body);
            return Err(LeadError::RelayRejected(body));
        }

        tracing::debug!("Telegram accepted message for chat {}", self.chat_id);
        Ok(())
    }
}

impl fmt::Debug for TelegramRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramRelay")
            .field("api_base", &self.api_base)
            .field("bot_token", &mask_token(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}
