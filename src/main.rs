use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plantdoc::ai_client::AiClient;
use plantdoc::bot::{callback_handler, message_handler};
use plantdoc::config::Settings;
use plantdoc::db;
use plantdoc::dialogue::ChatState;
use plantdoc::plan::{PlanRenderer, TextPlanRenderer};
use plantdoc::scheduler::ReminderScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting plant-health Telegram bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let settings = Arc::new(Settings::from_env()?);

    info!("Initializing database at: {}", settings.database_url);
    let connect_options = settings
        .database_url
        .parse::<SqliteConnectOptions>()
        .context("DATABASE_URL is not a valid SQLite URL")?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .context("Failed to open database")?;
    db::init_schema(&pool).await?;

    let ai = Arc::new(AiClient::new(&settings.ai)?);
    let scheduler = Arc::new(ReminderScheduler::new());
    let renderer: Arc<dyn PlanRenderer + Send + Sync> = Arc::new(TextPlanRenderer);

    let bot = Bot::new(settings.bot_token.clone());

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<ChatState>, ChatState>()
                .endpoint(message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<ChatState>, ChatState>()
                .endpoint(callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            InMemStorage::<ChatState>::new(),
            pool,
            ai,
            settings,
            scheduler,
            renderer
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
