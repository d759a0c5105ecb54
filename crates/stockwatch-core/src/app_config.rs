use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::Pincode;
use crate::retailer::RetailerTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Pincodes tried in order by location-aware checkers.
    pub pincodes: Vec<Pincode>,
    /// Upper bound on retailer tasks checked in parallel per run.
    pub max_concurrent_retailers: usize,
    /// Per-request deadline for one availability check.
    pub check_timeout_secs: u64,
    pub http_user_agent: String,
    /// Six-field cron expression driving scheduled runs; `None` disables.
    pub check_schedule: Option<String>,
    /// Telegram forum-topic thread per retailer; absent means default channel.
    pub alert_threads: HashMap<RetailerTag, i64>,
    /// Alert header emoji overrides; unset tags use the built-in default.
    pub retailer_emoji: HashMap<RetailerTag, String>,
    /// Retailers whose product sets come from the static file instead of
    /// the catalog. Empty unless explicitly configured.
    pub static_retailers: Vec<RetailerTag>,
    pub static_products_path: PathBuf,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub amazon_access_key_id: Option<String>,
    pub amazon_secret_access_key: Option<String>,
    pub amazon_partner_tag: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Alert header emoji for a retailer, honoring configured overrides.
    #[must_use]
    pub fn emoji_for(&self, tag: RetailerTag) -> &str {
        self.retailer_emoji
            .get(&tag)
            .map_or_else(|| tag.default_emoji(), String::as_str)
    }

    /// Configured sub-channel thread for a retailer, if any.
    #[must_use]
    pub fn thread_for(&self, tag: RetailerTag) -> Option<i64> {
        self.alert_threads.get(&tag).copied()
    }

    /// Telegram credentials when alerting is fully configured.
    ///
    /// Both the bot token and the chat id are required; with either missing
    /// the dispatcher runs in detection-only mode.
    #[must_use]
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some((token.as_str(), chat_id.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("pincodes", &self.pincodes)
            .field("max_concurrent_retailers", &self.max_concurrent_retailers)
            .field("check_timeout_secs", &self.check_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("check_schedule", &self.check_schedule)
            .field("alert_threads", &self.alert_threads)
            .field("retailer_emoji", &self.retailer_emoji)
            .field("static_retailers", &self.static_retailers)
            .field("static_products_path", &self.static_products_path)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("amazon_access_key_id", &self.amazon_access_key_id)
            .field(
                "amazon_secret_access_key",
                &self.amazon_secret_access_key.as_ref().map(|_| "[redacted]"),
            )
            .field("amazon_partner_tag", &self.amazon_partner_tag)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
