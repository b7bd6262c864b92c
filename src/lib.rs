//! # Grid Guru Telegram Bot
//!
//! A Telegram bot that answers Formula 1 questions with data from an
//! Ergast-compatible API. Each chat keeps a single active reply: the bot
//! deletes its previous message before sending the next one.

pub mod api_client;
pub mod api_errors;
pub mod bot;
pub mod config;
pub mod errors;
pub mod localization;
pub mod models;
pub mod observability;
pub mod observability_config;
pub mod session;
pub mod trivia;

// Re-export types for easier access
pub use api_client::{Endpoint, F1ApiClient};
pub use bot::router::CommandRequest;
pub use session::SessionStore;
