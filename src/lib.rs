//! Plant-health Telegram bot: onboarding, AI-backed photo diagnosis,
//! usage quotas with paywalls, and offline funnel analytics.

pub mod ai_client;
pub mod bot;
pub mod chunker;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod flags;
pub mod lexicon;
pub mod limits;
pub mod plan;
pub mod scheduler;
pub mod stats;
