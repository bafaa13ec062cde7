//! Callback Handler module for processing inline keyboard callback queries

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::sqlite::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, error, info};

use crate::ai_client::{reset_ai_thread, AiClient};
use crate::config::{Settings, PAYWALL_SKIP_GRANT};
use crate::db::{self, User};
use crate::dialogue::{ChatDialogue, ChatState};
use crate::lexicon;
use crate::plan::{plan_text, PlanRenderer};
use crate::scheduler::ReminderScheduler;
use crate::stats::{build_stat_message, EventKind};

use super::dialogue_manager::{
    begin_photo_wait, mirror_to_log_chat, run_demo_sequence, schedule_home_reminder,
    send_subscription_paywall,
};
use super::ui_builder::{
    CB_HOME_CONFIRM, CB_HOME_IN_2H, CB_HOME_IN_4H, CB_ONBOARDING_DEMO, CB_ONBOARDING_SEND_PHOTO,
    CB_PAYWALL_SKIP, CB_PAY_GROWTH, CB_PAY_MONTH, CB_PAY_REFRESH, CB_PAY_RESCUE,
    CB_PAY_RESCUE_ONCE, CB_PAY_YEAR,
};

/// Top-level callback entry point with the error boundary
#[allow(clippy::too_many_arguments)]
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    pool: SqlitePool,
    ai: Arc<AiClient>,
    settings: Arc<Settings>,
    scheduler: Arc<ReminderScheduler>,
    renderer: Arc<dyn PlanRenderer + Send + Sync>,
    dialogue: ChatDialogue,
) -> Result<()> {
    let query_id = q.id.clone();
    if let Err(e) =
        handle_callback(&bot, &q, &pool, &ai, &settings, &scheduler, renderer, dialogue).await
    {
        error!(user_id = %q.from.id, error = ?e, "Callback handler failed");
        let chat_id = q
            .message
            .as_ref()
            .map(|m| m.chat().id)
            .unwrap_or(ChatId(q.from.id.0 as i64));
        let _ = bot.send_message(chat_id, lexicon::UNEXPECTED_ERROR).await;
        mirror_to_log_chat(
            &bot,
            &settings,
            &format!("callback error from user {}: {e:#}", q.from.id),
        )
        .await;
    }

    // Answer even on failure so the button stops spinning
    bot.answer_callback_query(query_id).await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_callback(
    bot: &Bot,
    q: &CallbackQuery,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    scheduler: &ReminderScheduler,
    renderer: Arc<dyn PlanRenderer + Send + Sync>,
    dialogue: ChatDialogue,
) -> Result<()> {
    let data = q.data.as_deref().unwrap_or("");
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(q.from.id.0 as i64));

    debug!(user_id = %q.from.id, data, "Received callback query");

    let user = db::get_or_create_user(
        pool,
        q.from.id.0 as i64,
        q.from.username.as_deref(),
        &q.from.full_name(),
    )
    .await?;

    match data {
        CB_ONBOARDING_SEND_PHOTO => {
            begin_photo_wait(bot, chat_id, dialogue, scheduler, settings).await
        }
        CB_ONBOARDING_DEMO => run_demo_sequence(bot, chat_id, dialogue).await,
        CB_HOME_IN_2H => schedule_home_reminder(bot, chat_id, scheduler, 2).await,
        CB_HOME_IN_4H => schedule_home_reminder(bot, chat_id, scheduler, 4).await,
        CB_HOME_CONFIRM => begin_photo_wait(bot, chat_id, dialogue, scheduler, settings).await,
        CB_PAYWALL_SKIP => handle_skip(bot, chat_id, pool, ai, dialogue, &user).await,
        CB_PAY_RESCUE | CB_PAY_GROWTH => {
            handle_scenario_payment(bot, chat_id, pool, ai, settings, dialogue, &user, data).await
        }
        CB_PAY_RESCUE_ONCE => {
            handle_one_time_plan(bot, chat_id, pool, settings, dialogue, &user, renderer).await
        }
        CB_PAY_MONTH => handle_subscription(bot, chat_id, pool, settings, &user, 30).await,
        CB_PAY_YEAR => handle_subscription(bot, chat_id, pool, settings, &user, 365).await,
        CB_PAY_REFRESH => handle_photo_refresh(bot, chat_id, pool, settings, &user).await,
        other => {
            debug!(user_id = user.tg_id, data = other, "Ignoring unknown callback");
            Ok(())
        }
    }
}

/// Skipping the paywall burns a fixed slice of the free quota and drops
/// the user into the open dialog with a fresh conversation thread
async fn handle_skip(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    ai: &AiClient,
    dialogue: ChatDialogue,
    user: &User,
) -> Result<()> {
    db::increment_action_count(pool, user.tg_id, PAYWALL_SKIP_GRANT).await?;
    reset_ai_thread(pool, user, ai).await?;
    bot.send_message(chat_id, lexicon::SKIP_MESSAGE).await?;
    dialogue.update(ChatState::AiDialog).await?;
    Ok(())
}

fn log_payment(user: &User, kind: &str) -> String {
    info!(
        plan = kind,
        "{} {}: {}",
        lexicon::LOG_PAYMENT_SUCCESS,
        user.tg_id,
        build_stat_message(EventKind::PaymentSuccess, user.tg_id, &[("plan", kind)])
    );
    format!("{} {} ({})", lexicon::LOG_PAYMENT_SUCCESS, user.tg_id, kind)
}

/// A scenario payment marks the free quota as spent, so the very next
/// action lands on the subscription paywall
#[allow(clippy::too_many_arguments)]
async fn handle_scenario_payment(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    ai: &AiClient,
    settings: &Settings,
    dialogue: ChatDialogue,
    user: &User,
    kind: &str,
) -> Result<()> {
    db::set_action_count(pool, user.tg_id, settings.exhausted_action_count()).await?;
    reset_ai_thread(pool, user, ai).await?;
    mirror_to_log_chat(bot, settings, &log_payment(user, kind)).await;
    dialogue.update(ChatState::AiDialog).await?;
    send_subscription_paywall(bot, chat_id, settings, user.tg_id).await
}

/// One-time plan purchase: exhaust the quota and deliver the rendered
/// plan document built from the latest diagnosis
#[allow(clippy::too_many_arguments)]
async fn handle_one_time_plan(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    settings: &Settings,
    dialogue: ChatDialogue,
    user: &User,
    renderer: Arc<dyn PlanRenderer + Send + Sync>,
) -> Result<()> {
    db::set_action_count(pool, user.tg_id, settings.exhausted_action_count()).await?;
    mirror_to_log_chat(bot, settings, &log_payment(user, "rescue_once")).await;
    dialogue.update(ChatState::AiDialog).await?;

    let Some(diagnosis) = db::latest_diagnosis(pool, user.tg_id).await? else {
        bot.send_message(chat_id, lexicon::PLAN_UNAVAILABLE).await?;
        return Ok(());
    };

    let temp = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .context("Failed to create plan temp file")?;
    renderer.render_plan(&plan_text(&diagnosis), temp.path(), "Plant rescue plan")?;
    let document = fs::read(temp.path()).context("Failed to read rendered plan")?;

    bot.send_message(chat_id, lexicon::PLAN_READY).await?;
    bot.send_document(
        chat_id,
        InputFile::memory(document).file_name("care-plan.txt"),
    )
    .await?;
    Ok(())
}

async fn handle_subscription(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    settings: &Settings,
    user: &User,
    days: i64,
) -> Result<()> {
    let expires = Utc::now() + ChronoDuration::days(days);
    db::set_subscription(pool, user.tg_id, expires).await?;
    let kind = if days >= 365 { "year" } else { "month" };
    mirror_to_log_chat(bot, settings, &log_payment(user, kind)).await;
    bot.send_message(chat_id, lexicon::SUBSCRIPTION_SUCCESS).await?;
    Ok(())
}

async fn handle_photo_refresh(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    settings: &Settings,
    user: &User,
) -> Result<()> {
    db::reset_image_counter(pool, user.tg_id).await?;
    mirror_to_log_chat(bot, settings, &log_payment(user, "refresh")).await;
    bot.send_message(chat_id, lexicon::REFRESH_PICTURES_SUCCESS).await?;
    Ok(())
}
