//! # Usage Limits Module
//!
//! Quota decisions for AI-consuming actions. These are pure checks: the
//! caller increments counters after a successful action and routes denied
//! requests to the paywall.

use crate::config::Settings;
use crate::db::{User, UserCounters};

/// May this user perform another AI-consuming action?
///
/// Subscribers and admins always pass; everyone else is limited by
/// `actions_threshold`.
pub fn check_action_limit(user: &User, settings: &Settings) -> bool {
    user.is_subscribed || settings.is_admin(user.tg_id) || user.action_count < settings.actions_threshold
}

/// May this user run another photo analysis?
///
/// Photos go through a separate, stricter counter that even subscribers
/// consume; only admins bypass it.
pub fn check_photo_limit(user: &User, counters: &UserCounters, settings: &Settings) -> bool {
    settings.is_admin(user.tg_id) || counters.image_count < settings.pictures_threshold
}

/// Reject inbound text that would blow the prompt budget
pub fn validate_message_length(text: &str, settings: &Settings) -> bool {
    text.chars().count() <= settings.max_message_chars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AiSettings, Settings};
    use crate::db::{User, UserCounters};

    fn test_settings() -> Settings {
        Settings {
            bot_token: String::new(),
            database_url: String::new(),
            chat_log_id: 0,
            admins: vec![99],
            actions_threshold: 5,
            pictures_threshold: 3,
            max_message_chars: 3500,
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

    fn test_user(tg_id: i64, action_count: i64, is_subscribed: bool) -> User {
        User {
            tg_id,
            username: None,
            fullname: "Test User".to_string(),
            action_count,
            is_subscribed,
            expired_at: None,
            geography: None,
            ai_thread: None,
            is_context_added: false,
        }
    }

    #[test]
    fn test_subscribed_user_always_allowed() {
        let settings = test_settings();
        let user = test_user(1, 999, true);
        assert!(check_action_limit(&user, &settings));
    }

    #[test]
    fn test_user_at_threshold_denied() {
        let settings = test_settings();
        let user = test_user(1, 5, false);
        assert!(!check_action_limit(&user, &settings));
    }

    #[test]
    fn test_user_below_threshold_allowed() {
        let settings = test_settings();
        let user = test_user(1, 4, false);
        assert!(check_action_limit(&user, &settings));
    }

    #[test]
    fn test_admin_at_threshold_allowed() {
        let settings = test_settings();
        let user = test_user(99, 5, false);
        assert!(check_action_limit(&user, &settings));
    }

    #[test]
    fn test_photo_limit_stricter_than_actions() {
        let settings = test_settings();
        let user = test_user(1, 0, true);
        let counters = UserCounters {
            tg_id: 1,
            image_count: 3,
        };
        // subscription does not bypass the photo counter
        assert!(!check_photo_limit(&user, &counters, &settings));
    }

    #[test]
    fn test_free_actions_do_not_excuse_exhausted_photo_quota() {
        let settings = test_settings();
        // actions to spare, photo credits gone: image work stays gated
        let user = test_user(1, 0, false);
        let counters = UserCounters {
            tg_id: 1,
            image_count: 3,
        };
        assert!(check_action_limit(&user, &settings));
        assert!(!check_photo_limit(&user, &counters, &settings));
    }

    #[test]
    fn test_admin_bypasses_photo_limit() {
        let settings = test_settings();
        let user = test_user(99, 0, false);
        let counters = UserCounters {
            tg_id: 99,
            image_count: 100,
        };
        assert!(check_photo_limit(&user, &counters, &settings));
    }

    #[test]
    fn test_message_length_validation() {
        let settings = test_settings();
        assert!(validate_message_length("short", &settings));
        assert!(!validate_message_length(&"x".repeat(3501), &settings));
    }
}
