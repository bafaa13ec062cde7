//! # AI Relay Client
//!
//! Thin HTTP client for the assistant relay that powers photo analysis,
//! the free-form dialog and voice transcription. Conversations are keyed
//! by an opaque thread id that the relay issues and we persist per user.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, warn};

use crate::config::AiSettings;
use crate::db::{self, User};

/// Errors surfaced by the relay API
#[derive(Debug)]
pub enum AiError {
    /// The relay refused the request because of rate limiting (HTTP 429)
    RateLimited,
    /// The relay rejected the request payload (4xx other than 429)
    BadRequest(String),
    /// Network failure or unexpected relay response
    Transport(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::RateLimited => write!(f, "AI relay rate limit reached"),
            AiError::BadRequest(msg) => write!(f, "AI relay rejected request: {}", msg),
            AiError::Transport(msg) => write!(f, "AI relay transport error: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    thread_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for the assistant relay
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AiClient {
    pub fn new(settings: &AiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(&self, resp: reqwest::Response) -> Result<reqwest::Response, AiError> {
        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(AiError::RateLimited);
        }
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::BadRequest(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            return Err(AiError::Transport(format!("unexpected status {}", status)));
        }
        Ok(resp)
    }

    /// Open a fresh conversation thread
    pub async fn create_thread(&self) -> Result<String, AiError> {
        let resp = self
            .http
            .post(self.url("/threads"))
            .bearer_auth(&self.api_key)
            .json(&json!({}))
            .send()
            .await?;
        let resp = self.check(resp).await?;
        let parsed: ThreadResponse = resp.json().await?;
        debug!(thread_id = %parsed.thread_id, "Created AI thread");
        Ok(parsed.thread_id)
    }

    /// Discard a conversation thread, logging failures without raising
    pub async fn delete_thread(&self, thread_id: &str) {
        let result = self
            .http
            .delete(self.url(&format!("/threads/{}", thread_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await;
        if let Err(err) = result {
            warn!(thread_id, %err, "Failed to delete AI thread");
        }
    }

    /// Send a text message into the thread and wait for the reply.
    ///
    /// `Ok(None)` means the relay produced no answer; callers stay silent.
    pub async fn get_response(
        &self,
        thread_id: &str,
        text: &str,
    ) -> Result<Option<String>, AiError> {
        let resp = self
            .http
            .post(self.url(&format!("/threads/{}/messages", thread_id)))
            .bearer_auth(&self.api_key)
            .json(&json!({ "text": text }))
            .send()
            .await?;
        let resp = self.check(resp).await?;
        let parsed: MessageResponse = resp.json().await?;
        Ok(parsed.text.filter(|t| !t.trim().is_empty()))
    }

    /// Send a photo with an instruction prompt and wait for the analysis
    pub async fn get_response_with_image(
        &self,
        thread_id: &str,
        prompt: &str,
        image: Vec<u8>,
        filename: &str,
    ) -> Result<Option<String>, AiError> {
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| AiError::BadRequest(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("text", prompt.to_string())
            .part("image", part);

        let resp = self
            .http
            .post(self.url(&format!("/threads/{}/messages", thread_id)))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = self.check(resp).await?;
        let parsed: MessageResponse = resp.json().await?;
        Ok(parsed.text.filter(|t| !t.trim().is_empty()))
    }

    /// Transcribe a voice recording to text
    pub async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, AiError> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("audio/ogg")
            .map_err(|e| AiError::BadRequest(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let resp = self
            .http
            .post(self.url("/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = self.check(resp).await?;
        let parsed: TranscriptionResponse = resp.json().await?;
        Ok(parsed.text)
    }
}

/// Resolve the user's conversation thread, creating and persisting one
/// on first use.
pub async fn get_or_create_thread(
    pool: &SqlitePool,
    user: &User,
    client: &AiClient,
) -> Result<String> {
    if let Some(thread) = &user.ai_thread {
        return Ok(thread.clone());
    }
    let thread = client
        .create_thread()
        .await
        .context("Failed to create AI thread")?;
    db::set_ai_thread(pool, user.tg_id, Some(&thread)).await?;
    Ok(thread)
}

/// Drop the user's conversation thread so the next turn starts fresh.
///
/// The relay-side delete is best effort; the persisted id is always
/// cleared.
pub async fn reset_ai_thread(pool: &SqlitePool, user: &User, client: &AiClient) -> Result<()> {
    if let Some(thread) = &user.ai_thread {
        client.delete_thread(thread).await;
        db::set_ai_thread(pool, user.tg_id, None).await?;
    }
    Ok(())
}
