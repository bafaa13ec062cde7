//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::dialogue::Scenario;
use crate::lexicon;

// Callback data values shared between keyboards and the callback handler
pub const CB_ONBOARDING_SEND_PHOTO: &str = "onb:send_photo";
pub const CB_ONBOARDING_DEMO: &str = "onb:demo";
pub const CB_HOME_IN_2H: &str = "home:2";
pub const CB_HOME_IN_4H: &str = "home:4";
pub const CB_HOME_CONFIRM: &str = "home:yes";
pub const CB_PAYWALL_SKIP: &str = "skip";
pub const CB_PAY_RESCUE: &str = "pay:rescue";
pub const CB_PAY_RESCUE_ONCE: &str = "pay:rescue_once";
pub const CB_PAY_GROWTH: &str = "pay:growth";
pub const CB_PAY_MONTH: &str = "pay:month";
pub const CB_PAY_YEAR: &str = "pay:year";
pub const CB_PAY_REFRESH: &str = "pay:refresh";

/// First message keyboard: send a photo now, or watch the demo
pub fn create_intro_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            lexicon::INTRO_BTN_SEND_PHOTO,
            CB_ONBOARDING_SEND_PHOTO,
        )],
        vec![InlineKeyboardButton::callback(
            lexicon::INTRO_BTN_DEMO,
            CB_ONBOARDING_DEMO,
        )],
    ])
}

/// Two fixed delay choices for the home-time reminder
pub fn create_home_time_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(lexicon::HOME_TIME_IN_2H, CB_HOME_IN_2H),
        InlineKeyboardButton::callback(lexicon::HOME_TIME_IN_4H, CB_HOME_IN_4H),
    ]])
}

/// Confirmation button attached to the reminder message
pub fn create_reminder_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        lexicon::REMINDER_BTN_HOME,
        CB_HOME_CONFIRM,
    )]])
}

/// Paywall keyboard for the post-diagnosis screen, branched by scenario
pub fn create_scenario_paywall_keyboard(scenario: Scenario) -> InlineKeyboardMarkup {
    let rows = match scenario {
        Scenario::Rescue => vec![
            vec![InlineKeyboardButton::callback(
                lexicon::BTN_PAY_RESCUE,
                CB_PAY_RESCUE,
            )],
            vec![InlineKeyboardButton::callback(
                lexicon::BTN_PAY_RESCUE_ONCE,
                CB_PAY_RESCUE_ONCE,
            )],
            vec![InlineKeyboardButton::callback(
                lexicon::BTN_SKIP,
                CB_PAYWALL_SKIP,
            )],
        ],
        Scenario::Growth => vec![
            vec![InlineKeyboardButton::callback(
                lexicon::BTN_PAY_GROWTH,
                CB_PAY_GROWTH,
            )],
            vec![InlineKeyboardButton::callback(
                lexicon::BTN_SKIP,
                CB_PAYWALL_SKIP,
            )],
        ],
    };
    InlineKeyboardMarkup::new(rows)
}

/// Subscription paywall shown when the action quota runs out
pub fn create_subscription_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(lexicon::BTN_SUBSCRIBE_MONTH, CB_PAY_MONTH),
        InlineKeyboardButton::callback(lexicon::BTN_SUBSCRIBE_YEAR, CB_PAY_YEAR),
    ]])
}

/// Paywall shown when the photo quota runs out
pub fn create_photo_refresh_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        lexicon::BTN_REFRESH_PICTURES,
        CB_PAY_REFRESH,
    )]])
}

/// Fill a `{placeholder}` template
pub fn render_template(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in args {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}
