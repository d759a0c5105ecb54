//! Telegram delivery for stock alerts.
//!
//! One bot, one chat, Markdown messages. Sub-channel routing uses forum
//! topic threads: a message carries `message_thread_id` when the caller
//! asks for one, and falls back to the default channel exactly once if
//! Telegram reports the thread missing.

use serde_json::{json, Value};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const THREAD_NOT_FOUND: &str = "message thread not found";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("telegram rejected the message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Sends messages through the Telegram bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self::with_base_url(client, bot_token, chat_id, DEFAULT_BASE_URL)
    }

    /// Point the notifier at a different host. Intended for tests.
    #[must_use]
    pub fn with_base_url(
        client: reqwest::Client,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Delivers one Markdown message, optionally into a forum topic thread.
    ///
    /// A stale thread id degrades to the default channel rather than losing
    /// the alert; every other rejection propagates.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the request fails or Telegram rejects
    /// the message.
    pub async fn deliver(&self, text: &str, thread: Option<i64>) -> Result<(), NotifyError> {
        match self.send(text, thread).await {
            Err(NotifyError::Rejected { description, .. })
                if thread.is_some() && description.to_lowercase().contains(THREAD_NOT_FOUND) =>
            {
                tracing::warn!(
                    thread = thread.unwrap_or_default(),
                    "telegram thread missing, falling back to the default channel"
                );
                self.send(text, None).await
            }
            other => other,
        }
    }

    async fn send(&self, text: &str, thread: Option<i64>) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);

        let mut payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        if let Some(thread_id) = thread {
            payload["message_thread_id"] = json!(thread_id);
        }

        // Errors are stripped of their URL so the bot token never reaches
        // logs.
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let ok = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("ok").and_then(Value::as_bool))
            .unwrap_or(false);
        if status.is_success() && ok {
            return Ok(());
        }

        let description = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("description")
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
            })
            .unwrap_or_else(|| "no description".to_string());

        Err(NotifyError::Rejected {
            status: status.as_u16(),
            description,
        })
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("base_url", &self.base_url)
            .field("bot_token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}
