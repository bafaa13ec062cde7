//! # Configuration Module
//!
//! Runtime settings for the bot, loaded from environment variables
//! (usually via a `.env` file). All quota thresholds and paywall
//! constants live here so handlers never hard-code limits.

use std::env;

use anyhow::{Context, Result};

// Defaults mirror the production deployment
pub const DEFAULT_ACTIONS_THRESHOLD: i64 = 5;
pub const DEFAULT_PICTURES_THRESHOLD: i64 = 3;
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 3500;
pub const PAYWALL_SKIP_GRANT: i64 = 3;
pub const EXHAUSTED_ACTION_COUNT: i64 = 5;

/// Settings for the AI relay service
#[derive(Debug, Clone)]
pub struct AiSettings {
    /// Base URL of the relay API (no trailing slash)
    pub base_url: String,
    /// Bearer token sent with every request
    pub api_key: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Top-level bot settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram bot token
    pub bot_token: String,
    /// SQLite database URL
    pub database_url: String,
    /// Operator log chat: inbound messages and funnel events are mirrored here
    pub chat_log_id: i64,
    /// Privileged user ids exempt from all quotas
    pub admins: Vec<i64>,
    /// Free AI-consuming actions before the subscription paywall
    pub actions_threshold: i64,
    /// Photo analyses allowed before the picture-refresh paywall
    pub pictures_threshold: i64,
    /// Maximum accepted inbound message length, in characters
    pub max_message_chars: usize,
    /// Onboarding variant name, resolved through the variant registry
    pub onboarding_variant: String,
    /// Cancel a pending home-time reminder once the user reaches the
    /// photo-waiting state through another path
    pub cancel_stale_reminders: bool,
    /// Directory holding rotated stat log files
    pub stats_log_dir: String,
    /// AI relay settings
    pub ai: AiSettings,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// `TELEGRAM_BOT_TOKEN`, `DATABASE_URL`, `CHAT_LOG_ID` and `AI_BASE_URL`
    /// are required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let chat_log_id = env::var("CHAT_LOG_ID")
            .context("CHAT_LOG_ID must be set")?
            .parse::<i64>()
            .context("CHAT_LOG_ID must be an integer chat id")?;

        let admins = env::var("ADMIN_IDS")
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<i64>()
                    .with_context(|| format!("bad admin id: {s}"))
            })
            .collect::<Result<Vec<i64>>>()?;

        let ai = AiSettings {
            base_url: env::var("AI_BASE_URL")
                .context("AI_BASE_URL must be set")?
                .trim_end_matches('/')
                .to_string(),
            api_key: env::var("AI_API_KEY").unwrap_or_default(),
            request_timeout_secs: parse_or("AI_TIMEOUT_SECS", 90)?.max(1) as u64,
        };

        Ok(Self {
            bot_token,
            database_url,
            chat_log_id,
            admins,
            actions_threshold: parse_or("ACTIONS_THRESHOLD", DEFAULT_ACTIONS_THRESHOLD)?,
            pictures_threshold: parse_or("PICTURES_THRESHOLD", DEFAULT_PICTURES_THRESHOLD)?,
            max_message_chars: parse_or("MAX_MESSAGE_CHARS", DEFAULT_MAX_MESSAGE_CHARS as i64)?
                as usize,
            onboarding_variant: env::var("ONBOARDING_VARIANT")
                .unwrap_or_else(|_| "intro_choice".to_string()),
            cancel_stale_reminders: env::var("CANCEL_STALE_REMINDERS")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            stats_log_dir: env::var("STATS_LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            ai,
        })
    }

    /// Check whether a Telegram user id belongs to the privileged set
    pub fn is_admin(&self, tg_id: i64) -> bool {
        self.admins.contains(&tg_id)
    }

    /// Action-count value that fails the quota gate regardless of how
    /// high `actions_threshold` is configured
    pub fn exhausted_action_count(&self) -> i64 {
        self.actions_threshold.max(EXHAUSTED_ACTION_COUNT)
    }
}

fn parse_or(key: &str, default: i64) -> Result<i64> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{key} must be an integer")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_reasonable() {
        assert!(DEFAULT_ACTIONS_THRESHOLD > 0);
        assert!(DEFAULT_PICTURES_THRESHOLD > 0);
        assert!(DEFAULT_PICTURES_THRESHOLD <= DEFAULT_ACTIONS_THRESHOLD);
        assert!(EXHAUSTED_ACTION_COUNT >= DEFAULT_ACTIONS_THRESHOLD);
    }

    #[test]
    fn test_exhausted_count_tracks_configured_threshold() {
        let mut settings = test_settings();
        assert_eq!(settings.exhausted_action_count(), EXHAUSTED_ACTION_COUNT);

        // a raised threshold must still be exhausted by the paid flows
        settings.actions_threshold = 10;
        assert_eq!(settings.exhausted_action_count(), 10);
        assert!(settings.exhausted_action_count() >= settings.actions_threshold);
    }

    fn test_settings() -> Settings {
        Settings {
            bot_token: String::new(),
            database_url: String::new(),
            chat_log_id: 0,
            admins: vec![42, 77],
            actions_threshold: DEFAULT_ACTIONS_THRESHOLD,
            pictures_threshold: DEFAULT_PICTURES_THRESHOLD,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            onboarding_variant: "intro_choice".to_string(),
            cancel_stale_reminders: true,
            stats_log_dir: "logs".to_string(),
            ai: AiSettings {
                base_url: String::new(),
                api_key: String::new(),
                request_timeout_secs: 90,
            },
        }
    }

    #[test]
    fn test_is_admin() {
        let settings = test_settings();
        assert!(settings.is_admin(42));
        assert!(!settings.is_admin(43));
    }
}
