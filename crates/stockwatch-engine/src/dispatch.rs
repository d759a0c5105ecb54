//! Batched alert dispatch, one message per retailer.

use std::collections::{BTreeMap, HashMap};

use stockwatch_core::{AppConfig, RetailerResult, RetailerTag};
use stockwatch_notify::TelegramNotifier;

/// Routes formatted alert batches to Telegram, or to the log when alerting
/// is not configured. Delivery failures never fail a run.
pub struct AlertDispatcher {
    notifier: Option<TelegramNotifier>,
    threads: HashMap<RetailerTag, i64>,
    emoji: HashMap<RetailerTag, String>,
}

impl AlertDispatcher {
    #[must_use]
    pub fn new(
        notifier: Option<TelegramNotifier>,
        threads: HashMap<RetailerTag, i64>,
        emoji: HashMap<RetailerTag, String>,
    ) -> Self {
        Self {
            notifier,
            threads,
            emoji,
        }
    }

    /// Builds the dispatcher from configuration. Telegram is on only when
    /// both the bot token and the chat id are set.
    #[must_use]
    pub fn from_config(config: &AppConfig, client: reqwest::Client) -> Self {
        let notifier = config
            .telegram_credentials()
            .map(|(token, chat_id)| TelegramNotifier::new(client, token, chat_id));
        if notifier.is_none() {
            tracing::info!("telegram not configured; alerts will only be logged");
        }

        Self::new(
            notifier,
            config.alert_threads.clone(),
            config.retailer_emoji.clone(),
        )
    }

    /// Sends one batched message per retailer that found anything. Retailers
    /// with zero findings stay silent.
    pub async fn dispatch(&self, results: &BTreeMap<RetailerTag, RetailerResult>) {
        for (tag, result) in results {
            if result.lines.is_empty() {
                continue;
            }
            let text = self.format_alert(*tag, &result.lines);
            self.send(&text, self.threads.get(tag).copied()).await;
        }
    }

    /// Best-effort operator note for a run that could not execute.
    pub async fn notify_run_failure(&self, reason: &str) {
        let text = format!("❌ Stock check failed: {reason}");
        self.send(&text, None).await;
    }

    fn format_alert(&self, tag: RetailerTag, lines: &[String]) -> String {
        let emoji = self
            .emoji
            .get(&tag)
            .map_or_else(|| tag.default_emoji(), String::as_str);

        format!(
            "🔥 *{} Stock Alert* {emoji}\n\n{}",
            tag.display_name(),
            lines.join("\n\n")
        )
    }

    async fn send(&self, text: &str, thread: Option<i64>) {
        match &self.notifier {
            Some(notifier) => {
                if let Err(e) = notifier.deliver(text, thread).await {
                    tracing::error!(error = %e, "alert delivery failed");
                }
            }
            None => tracing::info!(alert = %text, "alert (telegram disabled)"),
        }
    }
}
