//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::ai_client::{AiClient, AiError};
use crate::config::Settings;
use crate::db::{self, User};
use crate::dialogue::{ChatDialogue, ChatState, ProfileField, Scenario};
use crate::lexicon;
use crate::limits::validate_message_length;
use crate::scheduler::ReminderScheduler;
use crate::stats::{build_stat_message, EventKind};

use super::broadcast::{broadcast_payload, handle_broadcast, handle_broadcast_photo};
use super::dialogue_manager::{
    download_file_bytes, forward_to_log_chat, handle_city_input, handle_plant_photo,
    mirror_to_log_chat, run_ai_dialog_turn, schedule_home_reminder, start_onboarding,
};
use super::onboarding::{decide_start, StartDecision};
use super::ui_builder::create_home_time_keyboard;

/// Top-level message entry point with the error boundary.
///
/// Handler failures are logged, mirrored to the operator chat and turned
/// into an apology; they never crash the dispatcher.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pool: SqlitePool,
    ai: Arc<AiClient>,
    settings: Arc<Settings>,
    scheduler: Arc<ReminderScheduler>,
    dialogue: ChatDialogue,
) -> Result<()> {
    if let Err(e) = handle_message(&bot, &msg, &pool, &ai, &settings, &scheduler, dialogue).await {
        error!(chat_id = msg.chat.id.0, error = ?e, "Message handler failed");
        let _ = bot.send_message(msg.chat.id, lexicon::UNEXPECTED_ERROR).await;
        mirror_to_log_chat(
            &bot,
            &settings,
            &format!("handler error in chat {}: {e:#}", msg.chat.id.0),
        )
        .await;
    }
    Ok(())
}

async fn handle_message(
    bot: &Bot,
    msg: &Message,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    scheduler: &ReminderScheduler,
    dialogue: ChatDialogue,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    // Albums arrive as separate messages sharing a media group id; the
    // flow only ever works with a single photo
    if msg.media_group_id().is_some() && msg.photo().is_some() {
        bot.send_message(msg.chat.id, lexicon::MEDIA_GROUP_REJECTED).await?;
        return Ok(());
    }

    let user = db::get_or_create_user(
        pool,
        from.id.0 as i64,
        from.username.as_deref(),
        &from.full_name(),
    )
    .await?;
    let state = dialogue.get().await?.unwrap_or_default();

    if msg.text().is_some() {
        handle_text_message(bot, msg, pool, ai, settings, scheduler, dialogue, &user, state).await
    } else if msg.photo().is_some() {
        handle_photo_message(bot, msg, pool, ai, settings, dialogue, &user, state).await
    } else if msg.voice().is_some() {
        handle_voice_message(bot, msg, pool, ai, settings, dialogue, &user, state).await
    } else {
        debug!(user_id = user.tg_id, "Ignoring unsupported message type");
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    scheduler: &ReminderScheduler,
    dialogue: ChatDialogue,
    user: &User,
    state: ChatState,
) -> Result<()> {
    let text = msg.text().unwrap_or_default();
    let chat_id = msg.chat.id;

    if text.starts_with("/start") {
        return handle_start(bot, msg, settings, dialogue.clone(), user, &state).await;
    }
    if text == "/support" {
        return handle_support(bot, chat_id, pool, settings, user).await;
    }
    if text == "/share" {
        bot.send_message(chat_id, lexicon::SHARE_PROMPT).await?;
        return Ok(());
    }
    if let Some(payload) = broadcast_payload(text) {
        return handle_broadcast(bot, chat_id, pool, settings, user, payload).await;
    }
    if text == "/broadcast_photo" {
        return handle_broadcast_photo(bot, msg, pool, settings, user).await;
    }

    match state {
        ChatState::Start => {
            if user.is_context_added {
                // Session state was lost (e.g. a restart); the user is
                // already past onboarding, so treat this as dialog input
                dialogue.update(ChatState::AiDialog).await?;
                dispatch_dialog_text(bot, msg, pool, ai, settings, user, text).await
            } else {
                bot.send_message(chat_id, lexicon::START_FIRST).await?;
                Ok(())
            }
        }
        ChatState::OnboardingQuestion {
            field: ProfileField::Geography,
        } => {
            // Legacy variant never ran a diagnosis, so the paywall
            // defaults to the rescue branch
            handle_city_input(
                bot,
                chat_id,
                dialogue,
                pool,
                settings,
                user,
                text,
                Scenario::Rescue,
            )
            .await
        }
        ChatState::WaitingPlantPhoto { .. } => {
            bot.send_message(chat_id, lexicon::WAITING_PHOTO_TEXT_REPLY).await?;
            Ok(())
        }
        ChatState::WaitingHomeTime => {
            let hours = match text {
                t if t == lexicon::HOME_TIME_IN_2H => Some(2),
                t if t == lexicon::HOME_TIME_IN_4H => Some(4),
                _ => None,
            };
            match hours {
                Some(hours) => schedule_home_reminder(bot, chat_id, scheduler, hours).await,
                None => {
                    bot.send_message(chat_id, lexicon::HOME_TIME_REPROMPT)
                        .reply_markup(create_home_time_keyboard())
                        .await?;
                    Ok(())
                }
            }
        }
        ChatState::WaitingCity { scenario, .. } => {
            handle_city_input(bot, chat_id, dialogue, pool, settings, user, text, scenario).await
        }
        ChatState::AiDialog => {
            dispatch_dialog_text(bot, msg, pool, ai, settings, user, text).await
        }
    }
}

async fn dispatch_dialog_text(
    bot: &Bot,
    msg: &Message,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    user: &User,
    text: &str,
) -> Result<()> {
    let chat_id = msg.chat.id;
    if !validate_message_length(text, settings) {
        bot.send_message(chat_id, lexicon::MESSAGE_TOO_LONG).await?;
        return Ok(());
    }
    forward_to_log_chat(bot, settings, msg).await;
    run_ai_dialog_turn(bot, chat_id, pool, ai, settings, user, text, None).await
}

async fn handle_start(
    bot: &Bot,
    msg: &Message,
    settings: &Settings,
    dialogue: ChatDialogue,
    user: &User,
    state: &ChatState,
) -> Result<()> {
    let chat_id = msg.chat.id;
    tracing::info!(
        "{}",
        build_stat_message(EventKind::Start, user.tg_id, &[])
    );

    // Keep the operator chat aware of every /start
    forward_to_log_chat(bot, settings, msg).await;

    match decide_start(user.is_context_added, state) {
        StartDecision::ResumeDialog => {
            bot.send_message(chat_id, lexicon::ALREADY_KNOWN).await?;
            dialogue.update(ChatState::AiDialog).await?;
            Ok(())
        }
        StartDecision::ContinueOnboarding => {
            bot.send_message(chat_id, lexicon::ALREADY_STARTED).await?;
            Ok(())
        }
        StartDecision::RunVariant => start_onboarding(bot, chat_id, dialogue, settings).await,
    }
}

async fn handle_support(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    settings: &Settings,
    user: &User,
) -> Result<()> {
    let reply = if user.is_subscribed {
        let days = user
            .expired_at
            .map(|at| (at - chrono::Utc::now()).num_days().max(0))
            .unwrap_or(0);
        let counters = db::get_or_create_counter(pool, user.tg_id).await?;
        let photos_left = (settings.pictures_threshold - counters.image_count).max(0);
        lexicon::SUPPORT_SUBSCRIBED
            .replace("{days}", &days.to_string())
            .replace("{photos}", &photos_left.to_string())
    } else {
        let actions_left = (settings.actions_threshold - user.action_count).max(0);
        lexicon::SUPPORT_UNSUBSCRIBED.replace("{actions}", &actions_left.to_string())
    };
    bot.send_message(chat_id, reply).await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_photo_message(
    bot: &Bot,
    msg: &Message,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    dialogue: ChatDialogue,
    user: &User,
    state: ChatState,
) -> Result<()> {
    let chat_id = msg.chat.id;
    tracing::info!(
        "{}",
        build_stat_message(EventKind::PhotoUpload, user.tg_id, &[])
    );

    match state {
        ChatState::WaitingPlantPhoto { .. } => {
            // Keep a copy of incoming plant photos in the operator chat
            forward_to_log_chat(bot, settings, msg).await;
            handle_plant_photo(bot, msg, dialogue, pool, ai, settings, user).await
        }
        ChatState::AiDialog => {
            let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
                return Ok(());
            };
            forward_to_log_chat(bot, settings, msg).await;
            let image = download_file_bytes(bot, photo.file.id.clone()).await?;
            let prompt = msg.caption().unwrap_or(lexicon::DIALOG_IMAGE_PROMPT);
            run_ai_dialog_turn(bot, chat_id, pool, ai, settings, user, prompt, Some(image)).await
        }
        ChatState::WaitingHomeTime => {
            bot.send_message(chat_id, lexicon::HOME_TIME_REPROMPT)
                .reply_markup(create_home_time_keyboard())
                .await?;
            Ok(())
        }
        _ => {
            bot.send_message(chat_id, lexicon::START_FIRST).await?;
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_voice_message(
    bot: &Bot,
    msg: &Message,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    _dialogue: ChatDialogue,
    user: &User,
    state: ChatState,
) -> Result<()> {
    let chat_id = msg.chat.id;

    match state {
        ChatState::WaitingPlantPhoto { .. } => {
            bot.send_message(chat_id, lexicon::WAITING_PHOTO_VOICE_REPLY).await?;
            Ok(())
        }
        ChatState::AiDialog => {
            let Some(voice) = msg.voice() else {
                return Ok(());
            };
            forward_to_log_chat(bot, settings, msg).await;
            let audio = download_file_bytes(bot, voice.file.id.clone()).await?;
            let transcript = match ai.transcribe(audio, "voice.ogg").await {
                Ok(text) => text,
                Err(AiError::RateLimited) => {
                    bot.send_message(chat_id, lexicon::AI_RATE_LIMITED).await?;
                    return Ok(());
                }
                Err(e) => {
                    error!(user_id = user.tg_id, error = %e, "Voice transcription failed");
                    bot.send_message(chat_id, lexicon::AI_GENERIC_ERROR).await?;
                    return Ok(());
                }
            };
            run_ai_dialog_turn(bot, chat_id, pool, ai, settings, user, &transcript, None).await
        }
        _ => {
            bot.send_message(chat_id, lexicon::START_FIRST).await?;
            Ok(())
        }
    }
}
