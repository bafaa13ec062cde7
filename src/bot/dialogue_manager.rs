//! Dialogue Manager module for the onboarding and diagnosis flow
//!
//! The message and callback handlers stay thin; the actual state
//! transitions, quota gates and AI round-trips live here.

use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use sqlx::sqlite::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, FileId};
use tracing::{error, info, warn};

use crate::ai_client::{get_or_create_thread, AiClient, AiError};
use crate::chunker::split_message;
use crate::config::Settings;
use crate::db::{self, User};
use crate::dialogue::{ChatDialogue, ChatState, Scenario, WaitReason};
use crate::flags::extract_signals;
use crate::lexicon;
use crate::limits::{check_action_limit, check_photo_limit};
use crate::scheduler::ReminderScheduler;
use crate::stats::{build_stat_message, EventKind};

use super::onboarding::OnboardingVariant;
use super::ui_builder::{
    create_home_time_keyboard, create_photo_refresh_keyboard, create_reminder_keyboard,
    create_scenario_paywall_keyboard, create_subscription_keyboard, render_template,
};

/// Show the typing indicator and pause briefly so replies feel composed
/// rather than instantaneous
pub async fn imitate_typing(bot: &Bot, chat_id: ChatId) -> Result<()> {
    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    let delay_ms = rand::thread_rng().gen_range(400..1200);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    Ok(())
}

/// Download a Telegram file's raw bytes
pub async fn download_file_bytes(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Best-effort mirror of a notable event into the operator log chat
pub async fn mirror_to_log_chat(bot: &Bot, settings: &Settings, text: &str) {
    if let Err(e) = bot.send_message(ChatId(settings.chat_log_id), text).await {
        warn!(error = %e, "Failed to mirror message to log chat");
    }
}

/// Best-effort forward of an inbound message into the operator log chat
pub async fn forward_to_log_chat(bot: &Bot, settings: &Settings, msg: &Message) {
    if let Err(e) = bot
        .forward_message(ChatId(settings.chat_log_id), msg.chat.id, msg.id)
        .await
    {
        warn!(chat_id = msg.chat.id.0, error = %e, "Failed to forward message to log chat");
    }
}

/// Run the configured onboarding variant for a fresh `/start`
pub async fn start_onboarding(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ChatDialogue,
    settings: &Settings,
) -> Result<()> {
    let variant = match OnboardingVariant::from_name(&settings.onboarding_variant) {
        Some(variant) => variant,
        None => {
            warn!(
                variant = %settings.onboarding_variant,
                "Unknown onboarding variant, using the default"
            );
            OnboardingVariant::DEFAULT
        }
    };
    variant.run(bot, chat_id, dialogue).await
}

/// Move the chat into the photo-waiting state and prompt for a photo.
///
/// A reminder pending for this chat is now stale; drop it when configured
/// to, so it cannot fire after the user has already moved on.
pub async fn begin_photo_wait(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ChatDialogue,
    scheduler: &ReminderScheduler,
    settings: &Settings,
) -> Result<()> {
    if settings.cancel_stale_reminders {
        scheduler.cancel(chat_id.0);
    }
    bot.send_message(chat_id, lexicon::ENTER_PHOTO_PROMPT).await?;
    dialogue
        .update(ChatState::WaitingPlantPhoto {
            wait_reason: WaitReason::OnboardingPlantPhoto,
        })
        .await?;
    Ok(())
}

/// Walk the user through the canned demo case, then ask when they'll be
/// home so the real analysis can happen later
pub async fn run_demo_sequence(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ChatDialogue,
) -> Result<()> {
    bot.send_message(chat_id, lexicon::DEMO_LEAD_IN).await?;
    bot.send_message(chat_id, lexicon::DEMO_CASE_CAPTION).await?;
    bot.send_message(chat_id, lexicon::DEMO_RECOVERY_CAPTION).await?;
    bot.send_message(chat_id, lexicon::DEMO_HOME_TIME_PROMPT)
        .reply_markup(create_home_time_keyboard())
        .await?;
    dialogue.update(ChatState::WaitingHomeTime).await?;
    Ok(())
}

/// Schedule the home-time reminder and confirm to the user.
///
/// The chat stays in the waiting state; the reminder message carries a
/// confirmation button that moves it forward.
pub async fn schedule_home_reminder(
    bot: &Bot,
    chat_id: ChatId,
    scheduler: &ReminderScheduler,
    hours: u64,
) -> Result<()> {
    let reminder_bot = bot.clone();
    scheduler.schedule(chat_id.0, Duration::from_secs(hours * 3600), async move {
        let result = reminder_bot
            .send_message(chat_id, lexicon::REMINDER_TEXT)
            .reply_markup(create_reminder_keyboard())
            .await;
        // Unreachable users are dropped silently
        if let Err(e) = result {
            warn!(chat_id = chat_id.0, error = %e, "Failed to deliver home-time reminder");
        }
    });

    let confirmation = render_template(
        lexicon::HOME_TIME_CONFIRMED,
        &[("hours", &hours.to_string())],
    );
    bot.send_message(chat_id, confirmation).await?;
    Ok(())
}

/// Send the subscription paywall and record the view
pub async fn send_subscription_paywall(
    bot: &Bot,
    chat_id: ChatId,
    settings: &Settings,
    user_id: i64,
) -> Result<()> {
    info!(
        "{} {}: {}",
        lexicon::LOG_ACTION_LIMIT,
        user_id,
        build_stat_message(EventKind::PaywallView, user_id, &[])
    );
    mirror_to_log_chat(
        bot,
        settings,
        &format!("{} {}", lexicon::LOG_ACTION_LIMIT, user_id),
    )
    .await;
    bot.send_message(chat_id, lexicon::ACTION_LIMIT_EXCEEDED)
        .reply_markup(create_subscription_keyboard())
        .await?;
    Ok(())
}

/// Send the photo-refresh paywall and record the view
pub async fn send_photo_refresh_paywall(
    bot: &Bot,
    chat_id: ChatId,
    settings: &Settings,
    user_id: i64,
) -> Result<()> {
    info!(
        "{} {}: {}",
        lexicon::LOG_PICTURES_LIMIT,
        user_id,
        build_stat_message(EventKind::PaywallView, user_id, &[])
    );
    mirror_to_log_chat(
        bot,
        settings,
        &format!("{} {}", lexicon::LOG_PICTURES_LIMIT, user_id),
    )
    .await;
    bot.send_message(chat_id, lexicon::PHOTO_LIMIT_EXCEEDED)
        .reply_markup(create_photo_refresh_keyboard())
        .await?;
    Ok(())
}

/// Deliver a long response as a sequence of chunks
pub async fn deliver_chunks(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    settings: &Settings,
) -> Result<()> {
    for chunk in split_message(text, settings.max_message_chars) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Analyze the first plant photo and move the chat toward the paywall.
///
/// The chat stays in the photo-waiting state on every failure path; only
/// a usable diagnosis advances it.
pub async fn handle_plant_photo(
    bot: &Bot,
    msg: &Message,
    dialogue: ChatDialogue,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    user: &User,
) -> Result<()> {
    let chat_id = msg.chat.id;

    let counters = db::get_or_create_counter(pool, user.tg_id).await?;
    if !check_photo_limit(user, &counters, settings) {
        return send_photo_refresh_paywall(bot, chat_id, settings, user.tg_id).await;
    }

    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        bot.send_message(chat_id, lexicon::WAITING_PHOTO_TEXT_REPLY).await?;
        return Ok(());
    };

    imitate_typing(bot, chat_id).await?;

    let image = match download_file_bytes(bot, photo.file.id.clone()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(user_id = user.tg_id, error = %e, "Failed to download plant photo");
            bot.send_message(chat_id, lexicon::PHOTO_ANALYSIS_FAILED).await?;
            return Ok(());
        }
    };

    let thread = get_or_create_thread(pool, user, ai).await?;
    let raw = match ai
        .get_response_with_image(&thread, lexicon::PHOTO_ANALYSIS_PROMPT, image, "plant.jpg")
        .await
    {
        Ok(Some(text)) => text,
        // No response from the relay is a silent no-op
        Ok(None) => return Ok(()),
        Err(AiError::RateLimited) => {
            warn!(user_id = user.tg_id, "Photo analysis rate limited");
            bot.send_message(chat_id, lexicon::AI_RATE_LIMITED).await?;
            return Ok(());
        }
        Err(e) => {
            error!(user_id = user.tg_id, error = %e, "Photo analysis failed");
            bot.send_message(chat_id, lexicon::AI_IMAGE_ERROR).await?;
            return Ok(());
        }
    };

    let signals = extract_signals(&raw);
    if !signals.plant_detected {
        bot.send_message(chat_id, lexicon::NOT_A_PLANT).await?;
        return Ok(());
    }
    let Some(score) = signals.health_score else {
        bot.send_message(chat_id, lexicon::SCORE_MISSING).await?;
        return Ok(());
    };

    db::record_diagnosis(
        pool,
        user.tg_id,
        &thread,
        &photo.file.id.0,
        &signals.cleaned_text,
        score,
    )
    .await?;

    let scenario = Scenario::for_score(score);
    info!(
        user_id = user.tg_id,
        score,
        scenario = scenario.as_str(),
        "{} {}: {}",
        lexicon::LOG_DIAGNOSIS_RESULT,
        user.tg_id,
        build_stat_message(EventKind::DiagnosisResult, user.tg_id, &[])
    );

    deliver_chunks(bot, chat_id, &signals.cleaned_text, settings).await?;

    let city_prompt = match scenario {
        Scenario::Rescue => lexicon::CITY_PROMPT_RESCUE,
        Scenario::Growth => lexicon::CITY_PROMPT_GROWTH,
    };
    bot.send_message(chat_id, city_prompt).await?;

    dialogue
        .update(ChatState::WaitingCity {
            scenario,
            health_score: score,
        })
        .await?;
    Ok(())
}

/// Store the user's city and show the scenario paywall
pub async fn handle_city_input(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: ChatDialogue,
    pool: &SqlitePool,
    settings: &Settings,
    user: &User,
    city: &str,
    scenario: Scenario,
) -> Result<()> {
    db::set_geography(pool, user.tg_id, city.trim()).await?;
    db::set_context_added(pool, user.tg_id).await?;

    info!(
        user_id = user.tg_id,
        scenario = scenario.as_str(),
        "{}",
        build_stat_message(EventKind::PaywallView, user.tg_id, &[("scenario", scenario.as_str())])
    );

    let screen = match scenario {
        Scenario::Rescue => lexicon::RESCUE_SCREEN.to_string(),
        Scenario::Growth => render_template(lexicon::GROWTH_SCREEN, &[("city", city.trim())]),
    };
    bot.send_message(chat_id, screen)
        .reply_markup(create_scenario_paywall_keyboard(scenario))
        .await?;

    dialogue.update(ChatState::AiDialog).await?;
    Ok(())
}

/// One turn of the free-form assistant dialog, gated by the action quota
pub async fn run_ai_dialog_turn(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    user: &User,
    text: &str,
    image: Option<Vec<u8>>,
) -> Result<()> {
    if !check_action_limit(user, settings) {
        return send_subscription_paywall(bot, chat_id, settings, user.tg_id).await;
    }
    // Images additionally draw on the stricter photo counter
    let has_image = image.is_some();
    if has_image {
        let counters = db::get_or_create_counter(pool, user.tg_id).await?;
        if !check_photo_limit(user, &counters, settings) {
            return send_photo_refresh_paywall(bot, chat_id, settings, user.tg_id).await;
        }
    }

    imitate_typing(bot, chat_id).await?;

    let thread = get_or_create_thread(pool, user, ai).await?;
    let response = match image {
        Some(bytes) => {
            ai.get_response_with_image(&thread, text, bytes, "photo.jpg")
                .await
        }
        None => ai.get_response(&thread, text).await,
    };

    let reply = match response {
        Ok(Some(text)) => text,
        Ok(None) => return Ok(()),
        Err(AiError::RateLimited) => {
            warn!(user_id = user.tg_id, "Dialog turn rate limited");
            bot.send_message(chat_id, lexicon::AI_RATE_LIMITED).await?;
            return Ok(());
        }
        Err(AiError::BadRequest(msg)) => {
            // A rejected thread is unrecoverable; drop it so the next
            // turn starts a fresh one
            error!(user_id = user.tg_id, error = %msg, "Dialog turn rejected, dropping thread");
            ai.delete_thread(&thread).await;
            db::set_ai_thread(pool, user.tg_id, None).await?;
            bot.send_message(chat_id, lexicon::AI_GENERIC_ERROR).await?;
            return Ok(());
        }
        Err(e) => {
            error!(user_id = user.tg_id, error = %e, "Dialog turn failed");
            bot.send_message(chat_id, lexicon::AI_GENERIC_ERROR).await?;
            return Ok(());
        }
    };

    deliver_chunks(bot, chat_id, &reply, settings).await?;

    if !settings.is_admin(user.tg_id) {
        if !user.is_subscribed {
            db::increment_action_count(pool, user.tg_id, 1).await?;
        }
        if has_image {
            db::increment_image_count(pool, user.tg_id).await?;
        }
    }
    Ok(())
}
