//! Admin broadcast commands: plain-text and photo blasts to every
//! known user, reported back with a sent/failed tally.

use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile};
use tracing::info;

use crate::config::Settings;
use crate::db::{self, User};
use crate::lexicon;

use super::ui_builder::render_template;

// Pause between deliveries so the blast stays under the API flood limits
const SEND_GAP: Duration = Duration::from_millis(50);

enum BroadcastContent<'a> {
    Text(&'a str),
    Photo { file_id: FileId, caption: String },
}

/// Payload of a `/broadcast` command.
///
/// `Some("")` means the command was given without text; any other
/// message, including `/broadcast_photo`, is `None`.
pub fn broadcast_payload(text: &str) -> Option<&str> {
    match text.strip_prefix("/broadcast") {
        Some("") => Some(""),
        Some(rest) => rest.strip_prefix(' ').map(str::trim),
        None => None,
    }
}

/// `/broadcast <text>` — send `payload` to every user
pub async fn handle_broadcast(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    settings: &Settings,
    user: &User,
    payload: &str,
) -> Result<()> {
    if !settings.is_admin(user.tg_id) {
        bot.send_message(chat_id, lexicon::BROADCAST_DENIED).await?;
        return Ok(());
    }
    if payload.is_empty() {
        bot.send_message(chat_id, lexicon::BROADCAST_USAGE).await?;
        return Ok(());
    }
    run_broadcast(bot, chat_id, pool, BroadcastContent::Text(payload)).await
}

/// `/broadcast_photo` in reply to a photo message — send that photo
/// (with its caption) to every user
pub async fn handle_broadcast_photo(
    bot: &Bot,
    msg: &Message,
    pool: &SqlitePool,
    settings: &Settings,
    user: &User,
) -> Result<()> {
    let chat_id = msg.chat.id;
    if !settings.is_admin(user.tg_id) {
        bot.send_message(chat_id, lexicon::BROADCAST_DENIED).await?;
        return Ok(());
    }

    let photo = msg
        .reply_to_message()
        .and_then(|reply| reply.photo())
        .and_then(|sizes| sizes.last());
    let Some(photo) = photo else {
        bot.send_message(chat_id, lexicon::BROADCAST_PHOTO_USAGE).await?;
        return Ok(());
    };
    let caption = msg
        .reply_to_message()
        .and_then(|reply| reply.caption())
        .unwrap_or_default()
        .to_string();

    let content = BroadcastContent::Photo {
        file_id: photo.file.id.clone(),
        caption,
    };
    run_broadcast(bot, chat_id, pool, content).await
}

async fn run_broadcast(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    content: BroadcastContent<'_>,
) -> Result<()> {
    let user_ids = db::all_user_ids(pool).await?;
    if user_ids.is_empty() {
        bot.send_message(chat_id, lexicon::BROADCAST_NO_USERS).await?;
        return Ok(());
    }

    let mut sent: usize = 0;
    let mut failed: usize = 0;
    for tg_id in &user_ids {
        let delivered = match &content {
            BroadcastContent::Text(text) => {
                bot.send_message(ChatId(*tg_id), *text).await.is_ok()
            }
            BroadcastContent::Photo { file_id, caption } => {
                let mut request = bot.send_photo(ChatId(*tg_id), InputFile::file_id(file_id.clone()));
                if !caption.is_empty() {
                    request = request.caption(caption.clone());
                }
                request.await.is_ok()
            }
        };
        if delivered {
            sent += 1;
        } else {
            failed += 1;
        }
        tokio::time::sleep(SEND_GAP).await;
    }

    info!(total = user_ids.len(), sent, failed, "Broadcast finished");
    let report = render_template(
        lexicon::BROADCAST_DONE,
        &[
            ("total", &user_ids.len().to_string()),
            ("sent", &sent.to_string()),
            ("failed", &failed.to_string()),
        ],
    );
    bot.send_message(chat_id, report).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_payload_extracted() {
        assert_eq!(broadcast_payload("/broadcast hello all"), Some("hello all"));
        assert_eq!(broadcast_payload("/broadcast  spaced "), Some("spaced"));
    }

    #[test]
    fn test_broadcast_without_text_is_empty_payload() {
        assert_eq!(broadcast_payload("/broadcast"), Some(""));
    }

    #[test]
    fn test_other_commands_are_not_broadcasts() {
        assert_eq!(broadcast_payload("/broadcast_photo"), None);
        assert_eq!(broadcast_payload("/start"), None);
        assert_eq!(broadcast_payload("broadcast hi"), None);
    }
}
