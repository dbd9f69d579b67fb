//! Configuration loader for the `airquality-sensorflow` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Everything else receives a [`Config`] snapshot
//! instead of reading the environment itself.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::poller::PollerSettings;
use crate::report::REPORT_MARKER;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// HTTP listen port.
    pub port: u16,

    /// Chat-bot settings; `None` disables the transport and the poller.
    pub telegram: Option<TelegramConfig>,
}

/// Chat-bot transport and poller settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    // ---
    pub bot_token: String,

    /// Chat that readings are ingested from and reports are sent to.
    pub chat_id: i64,

    /// Sleep between poll iterations.
    pub poll_interval: Duration,

    /// Server-side wait of one fetch.
    pub long_poll: Duration,

    pub api_url: String,

    /// Text an inbound message must contain to be ingested.
    pub report_marker: String,
}

impl TelegramConfig {
    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            source_chat_id: self.chat_id,
            marker: self.report_marker.clone(),
            interval: self.poll_interval,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `PORT` – HTTP port (default: 8080)
/// - `TELEGRAM_BOT_TOKEN` – enables the chat bot; then `TELEGRAM_CHAT_ID` is
///   required and `TELEGRAM_POLL_INTERVAL_SECS` (30),
///   `TELEGRAM_LONG_POLL_SECS` (2), `TELEGRAM_API_URL` and
///   `TELEGRAM_REPORT_MARKER` are read
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env!("DB_POOL_MAX", u32, 5);
    let port = parse_env!("PORT", u16, 8080);

    let telegram = match env::var("TELEGRAM_BOT_TOKEN") {
        Ok(bot_token) if !bot_token.trim().is_empty() => Some(TelegramConfig {
            bot_token,
            chat_id: require_env!("TELEGRAM_CHAT_ID")
                .parse()
                .map_err(|e| anyhow!("Invalid TELEGRAM_CHAT_ID: {}", e))?,
            poll_interval: Duration::from_secs(parse_env!("TELEGRAM_POLL_INTERVAL_SECS", u64, 30)),
            long_poll: Duration::from_secs(parse_env!("TELEGRAM_LONG_POLL_SECS", u64, 2)),
            api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            report_marker: env::var("TELEGRAM_REPORT_MARKER")
                .unwrap_or_else(|_| REPORT_MARKER.to_string()),
        }),
        _ => None,
    };

    Ok(Config {
        db_url,
        db_pool_max,
        port,
        telegram,
    })
}

/// Replace the password of a connection URL with `****`.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `scheme://host@...` has no password; the colon is the scheme's.
            if !db_url[colon_pos..at_pos].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

/// Keep the bot id, hide the secret part of a bot token.
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _)) => format!("{bot_id}:****"),
        None => "****".to_string(),
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password and the bot token.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL   : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX    : {}", self.db_pool_max);
        tracing::info!("  PORT           : {}", self.port);

        match &self.telegram {
            Some(tg) => {
                tracing::info!("  TELEGRAM_BOT_TOKEN          : {}", mask_token(&tg.bot_token));
                tracing::info!("  TELEGRAM_CHAT_ID            : {}", tg.chat_id);
                tracing::info!("  TELEGRAM_POLL_INTERVAL_SECS : {}", tg.poll_interval.as_secs());
                tracing::info!("  TELEGRAM_LONG_POLL_SECS     : {}", tg.long_poll.as_secs());
                tracing::info!("  TELEGRAM_API_URL            : {}", tg.api_url);
                tracing::info!("  TELEGRAM_REPORT_MARKER      : {}", tg.report_marker);
            }
            None => tracing::info!("  TELEGRAM_BOT_TOKEN          : <unset, chat bot disabled>"),
        }
    }
}
