//! # Database Module
//!
//! SQLite persistence for users, photo counters and diagnosis records.
//! Quota-sensitive writes that belong together (diagnosis + counter) run
//! inside a single transaction.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use tracing::info;

/// Persistent user record
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub tg_id: i64,
    pub username: Option<String>,
    pub fullname: String,
    pub action_count: i64,
    pub is_subscribed: bool,
    pub expired_at: Option<DateTime<Utc>>,
    pub geography: Option<String>,
    pub ai_thread: Option<String>,
    pub is_context_added: bool,
}

/// Photo-specific usage counter, tracked separately from `action_count`
#[derive(Debug, Clone, FromRow)]
pub struct UserCounters {
    pub tg_id: i64,
    pub image_count: i64,
}

/// Stored result of one successful photo analysis
#[derive(Debug, Clone, FromRow)]
pub struct Diagnosis {
    pub id: i64,
    pub tg_id: i64,
    pub thread_id: String,
    pub file_id: String,
    pub response_text: String,
    pub health_score: i64,
    pub created_at: DateTime<Utc>,
}

/// Initialize the database schema
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            tg_id INTEGER PRIMARY KEY,
            username TEXT,
            fullname TEXT NOT NULL DEFAULT '',
            action_count INTEGER NOT NULL DEFAULT 0,
            is_subscribed INTEGER NOT NULL DEFAULT 0,
            expired_at TEXT,
            geography TEXT,
            ai_thread TEXT,
            is_context_added INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_counters (
            tg_id INTEGER PRIMARY KEY,
            image_count INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create user_counters table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS diagnoses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tg_id INTEGER NOT NULL,
            thread_id TEXT NOT NULL,
            file_id TEXT NOT NULL,
            response_text TEXT NOT NULL,
            health_score INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create diagnoses table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Fetch a user, creating the record on first contact
pub async fn get_or_create_user(
    pool: &SqlitePool,
    tg_id: i64,
    username: Option<&str>,
    fullname: &str,
) -> Result<User> {
    if let Some(user) = get_user(pool, tg_id).await? {
        return Ok(user);
    }

    info!(tg_id, "Creating new user record");
    sqlx::query("INSERT INTO users (tg_id, username, fullname) VALUES (?, ?, ?)")
        .bind(tg_id)
        .bind(username)
        .bind(fullname)
        .execute(pool)
        .await
        .context("Failed to insert new user")?;

    get_user(pool, tg_id)
        .await?
        .context("User vanished right after insert")
}

pub async fn get_user(pool: &SqlitePool, tg_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE tg_id = ?")
        .bind(tg_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read user")
}

/// Add `by` actions to the user's counter. The core never subtracts here;
/// paid flows use [`set_action_count`] and the refresh path resets the
/// image counter instead.
pub async fn increment_action_count(pool: &SqlitePool, tg_id: i64, by: i64) -> Result<()> {
    sqlx::query("UPDATE users SET action_count = action_count + ? WHERE tg_id = ?")
        .bind(by)
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to increment action count")?;
    Ok(())
}

pub async fn set_action_count(pool: &SqlitePool, tg_id: i64, value: i64) -> Result<()> {
    sqlx::query("UPDATE users SET action_count = ? WHERE tg_id = ?")
        .bind(value)
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to set action count")?;
    Ok(())
}

pub async fn set_context_added(pool: &SqlitePool, tg_id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET is_context_added = 1 WHERE tg_id = ?")
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to mark context added")?;
    Ok(())
}

pub async fn set_geography(pool: &SqlitePool, tg_id: i64, city: &str) -> Result<()> {
    sqlx::query("UPDATE users SET geography = ? WHERE tg_id = ?")
        .bind(city)
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to save geography")?;
    Ok(())
}

pub async fn set_ai_thread(pool: &SqlitePool, tg_id: i64, thread: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE users SET ai_thread = ? WHERE tg_id = ?")
        .bind(thread)
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to save AI thread")?;
    Ok(())
}

/// Activate a subscription until `expired_at`
pub async fn set_subscription(
    pool: &SqlitePool,
    tg_id: i64,
    expired_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE users SET is_subscribed = 1, expired_at = ? WHERE tg_id = ?")
        .bind(expired_at)
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to activate subscription")?;
    Ok(())
}

/// Fetch the photo counter, creating a zeroed row on first use
pub async fn get_or_create_counter(pool: &SqlitePool, tg_id: i64) -> Result<UserCounters> {
    sqlx::query("INSERT OR IGNORE INTO user_counters (tg_id, image_count) VALUES (?, 0)")
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to ensure counter row")?;

    sqlx::query_as::<_, UserCounters>("SELECT * FROM user_counters WHERE tg_id = ?")
        .bind(tg_id)
        .fetch_one(pool)
        .await
        .context("Failed to read counter row")
}

/// Consume one photo credit outside the diagnosis flow
pub async fn increment_image_count(pool: &SqlitePool, tg_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO user_counters (tg_id, image_count) VALUES (?, 0)")
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to ensure counter row")?;
    sqlx::query("UPDATE user_counters SET image_count = image_count + 1 WHERE tg_id = ?")
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to increment image counter")?;
    Ok(())
}

/// Reset the photo counter. Triggered only by the paid refresh event.
pub async fn reset_image_counter(pool: &SqlitePool, tg_id: i64) -> Result<()> {
    info!(tg_id, "Resetting image counter after paid refresh");
    sqlx::query("UPDATE user_counters SET image_count = 0 WHERE tg_id = ?")
        .bind(tg_id)
        .execute(pool)
        .await
        .context("Failed to reset image counter")?;
    Ok(())
}

/// Store a completed photo analysis and consume one photo credit.
///
/// Both writes commit atomically or not at all.
pub async fn record_diagnosis(
    pool: &SqlitePool,
    tg_id: i64,
    thread_id: &str,
    file_id: &str,
    response_text: &str,
    health_score: u8,
) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to open transaction")?;

    let result = sqlx::query(
        "INSERT INTO diagnoses (tg_id, thread_id, file_id, response_text, health_score, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(tg_id)
    .bind(thread_id)
    .bind(file_id)
    .bind(response_text)
    .bind(health_score as i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .context("Failed to insert diagnosis")?;

    sqlx::query("INSERT OR IGNORE INTO user_counters (tg_id, image_count) VALUES (?, 0)")
        .bind(tg_id)
        .execute(&mut *tx)
        .await
        .context("Failed to ensure counter row")?;
    sqlx::query("UPDATE user_counters SET image_count = image_count + 1 WHERE tg_id = ?")
        .bind(tg_id)
        .execute(&mut *tx)
        .await
        .context("Failed to increment image counter")?;

    tx.commit().await.context("Failed to commit diagnosis")?;
    Ok(result.last_insert_rowid())
}

/// All known user ids, in registration order. Used by admin broadcasts.
pub async fn all_user_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>("SELECT tg_id FROM users ORDER BY tg_id")
        .fetch_all(pool)
        .await
        .context("Failed to list user ids")
}

/// Most recent diagnosis for a user, used to regenerate the paid plan
pub async fn latest_diagnosis(pool: &SqlitePool, tg_id: i64) -> Result<Option<Diagnosis>> {
    sqlx::query_as::<_, Diagnosis>(
        "SELECT * FROM diagnoses WHERE tg_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(tg_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read latest diagnosis")
}
