//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles incoming text, photo, and voice messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Manages dialogue state transitions and AI round-trips
//! - `onboarding`: Scripted introductory flows selected by configuration
//! - `broadcast`: Admin commands blasting a message to every user

pub mod broadcast;
pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod onboarding;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;
