use anyhow::Result;
use chrono::{Duration, Utc};
use plantdoc::db::*;
use sqlx::sqlite::SqlitePool;

async fn setup_test_db() -> Result<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:").await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Creating a user twice returns the same record
#[tokio::test]
async fn test_get_or_create_user_idempotent() -> Result<()> {
    let pool = setup_test_db().await?;

    let first = get_or_create_user(&pool, 5, Some("ada"), "Ada L").await?;
    assert_eq!(first.tg_id, 5);
    assert_eq!(first.action_count, 0);
    assert!(!first.is_subscribed);
    assert!(!first.is_context_added);

    let second = get_or_create_user(&pool, 5, None, "someone else").await?;
    assert_eq!(second.username.as_deref(), Some("ada"));
    assert_eq!(second.fullname, "Ada L");
    Ok(())
}

/// Action counter arithmetic used by the skip and payment flows
#[tokio::test]
async fn test_action_count_updates() -> Result<()> {
    let pool = setup_test_db().await?;
    get_or_create_user(&pool, 5, None, "u").await?;

    increment_action_count(&pool, 5, 1).await?;
    increment_action_count(&pool, 5, 3).await?;
    let user = get_user(&pool, 5).await?.unwrap();
    assert_eq!(user.action_count, 4);

    set_action_count(&pool, 5, 5).await?;
    let user = get_user(&pool, 5).await?.unwrap();
    assert_eq!(user.action_count, 5);
    Ok(())
}

/// Profile fields persist across reads
#[tokio::test]
async fn test_profile_updates() -> Result<()> {
    let pool = setup_test_db().await?;
    get_or_create_user(&pool, 5, None, "u").await?;

    set_geography(&pool, 5, "Lisbon").await?;
    set_context_added(&pool, 5).await?;
    set_ai_thread(&pool, 5, Some("thread-1")).await?;

    let user = get_user(&pool, 5).await?.unwrap();
    assert_eq!(user.geography.as_deref(), Some("Lisbon"));
    assert!(user.is_context_added);
    assert_eq!(user.ai_thread.as_deref(), Some("thread-1"));

    set_ai_thread(&pool, 5, None).await?;
    let user = get_user(&pool, 5).await?.unwrap();
    assert!(user.ai_thread.is_none());
    Ok(())
}

/// Subscription activation stores both flag and expiry
#[tokio::test]
async fn test_subscription_activation() -> Result<()> {
    let pool = setup_test_db().await?;
    get_or_create_user(&pool, 5, None, "u").await?;

    let expires = Utc::now() + Duration::days(30);
    set_subscription(&pool, 5, expires).await?;

    let user = get_user(&pool, 5).await?.unwrap();
    assert!(user.is_subscribed);
    let stored = user.expired_at.unwrap();
    assert!((stored - expires).num_seconds().abs() < 2);
    Ok(())
}

/// Recording a diagnosis consumes one photo credit in the same commit
#[tokio::test]
async fn test_record_diagnosis_consumes_photo_credit() -> Result<()> {
    let pool = setup_test_db().await?;
    get_or_create_user(&pool, 5, None, "u").await?;

    let counters = get_or_create_counter(&pool, 5).await?;
    assert_eq!(counters.image_count, 0);

    record_diagnosis(&pool, 5, "thread-1", "file-1", "Needs light.", 4).await?;
    record_diagnosis(&pool, 5, "thread-1", "file-2", "Better now.", 7).await?;

    let counters = get_or_create_counter(&pool, 5).await?;
    assert_eq!(counters.image_count, 2);

    let latest = latest_diagnosis(&pool, 5).await?.unwrap();
    assert_eq!(latest.file_id, "file-2");
    assert_eq!(latest.health_score, 7);
    Ok(())
}

/// The paid refresh resets the photo counter without touching actions
#[tokio::test]
async fn test_reset_image_counter() -> Result<()> {
    let pool = setup_test_db().await?;
    get_or_create_user(&pool, 5, None, "u").await?;
    increment_action_count(&pool, 5, 2).await?;
    record_diagnosis(&pool, 5, "t", "f", "text", 3).await?;

    reset_image_counter(&pool, 5).await?;

    let counters = get_or_create_counter(&pool, 5).await?;
    assert_eq!(counters.image_count, 0);
    let user = get_user(&pool, 5).await?.unwrap();
    assert_eq!(user.action_count, 2);
    Ok(())
}

/// A user with no diagnoses has no plan source
#[tokio::test]
async fn test_latest_diagnosis_empty() -> Result<()> {
    let pool = setup_test_db().await?;
    get_or_create_user(&pool, 5, None, "u").await?;
    assert!(latest_diagnosis(&pool, 5).await?.is_none());
    Ok(())
}

/// Dialog images consume photo credits outside the diagnosis flow
#[tokio::test]
async fn test_increment_image_count_consumes_credit() -> Result<()> {
    let pool = setup_test_db().await?;
    get_or_create_user(&pool, 5, None, "u").await?;

    // works before any counter row exists
    increment_image_count(&pool, 5).await?;
    increment_image_count(&pool, 5).await?;

    let counters = get_or_create_counter(&pool, 5).await?;
    assert_eq!(counters.image_count, 2);
    let user = get_user(&pool, 5).await?.unwrap();
    assert_eq!(user.action_count, 0);
    Ok(())
}

/// Broadcasts iterate every registered user
#[tokio::test]
async fn test_all_user_ids_lists_everyone() -> Result<()> {
    let pool = setup_test_db().await?;
    assert!(all_user_ids(&pool).await?.is_empty());

    get_or_create_user(&pool, 9, None, "c").await?;
    get_or_create_user(&pool, 5, None, "a").await?;
    get_or_create_user(&pool, 7, None, "b").await?;

    assert_eq!(all_user_ids(&pool).await?, vec![5, 7, 9]);
    Ok(())
}
