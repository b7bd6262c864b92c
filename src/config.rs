//! # Unified Application Configuration
//!
//! This module provides a centralized configuration system that consolidates
//! all application settings into a single, structured configuration object.
//! Values are loaded from environment variables (after `dotenvy` has read any
//! `.env` file) and validated before the bot starts polling.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Bot-specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// HTTP client timeout in seconds for Telegram requests
    pub http_timeout_secs: u64,
    /// Long-polling timeout passed to getUpdates
    pub poll_timeout_secs: u32,
    /// How long the transient "processing" notice stays visible
    pub processing_notice_secs: u64,
    /// Link sent by the video command
    pub video_url: String,
    /// Link sent by the contact command
    pub contact_url: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_timeout_secs: 30,
            poll_timeout_secs: 10,
            processing_notice_secs: 2,
            video_url: "https://www.youtube.com/@Formula1".to_string(),
            contact_url: "https://t.me/GridGuruSupport".to_string(),
        }
    }
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config("Bot token cannot be empty".to_string()));
        }

        let parts: Vec<&str> = self.token.split(':').collect();
        if parts.len() != 2 {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        }

        if parts[0].parse::<u64>().is_err() {
            return Err(AppError::Config(
                "Bot token bot ID must be numeric".to_string(),
            ));
        }

        if parts[1].len() < 20 {
            return Err(AppError::Config(
                "Bot token appears to be too short. Please verify it's a valid token".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(AppError::Config("HTTP timeout cannot be 0".to_string()));
        }

        if self.http_timeout_secs > 300 {
            return Err(AppError::Config(
                "HTTP timeout cannot be greater than 300 seconds".to_string(),
            ));
        }

        if self.poll_timeout_secs == 0 {
            return Err(AppError::Config(
                "Poll timeout must be at least 1 second".to_string(),
            ));
        }

        // The long poll must finish before the HTTP client gives up on it
        if u64::from(self.poll_timeout_secs) >= self.http_timeout_secs {
            return Err(AppError::Config(format!(
                "Poll timeout ({}s) must be lower than the HTTP timeout ({}s)",
                self.poll_timeout_secs, self.http_timeout_secs
            )));
        }

        if self.processing_notice_secs == 0 || self.processing_notice_secs > 60 {
            return Err(AppError::Config(
                "Processing notice duration must be between 1 and 60 seconds".to_string(),
            ));
        }

        for (name, url) in [("VIDEO_URL", &self.video_url), ("CONTACT_URL", &self.contact_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "{} must start with 'http://' or 'https://'",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn processing_notice_delay(&self) -> Duration {
        Duration::from_secs(self.processing_notice_secs)
    }
}

/// Remote F1 data API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Ergast-compatible API, without trailing slash
    pub base_url: String,
    /// Season segment ("current" or a four-digit year)
    pub season: String,
    /// Round segment used by qualifying/results ("last" or a round number)
    pub round: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jolpi.ca/ergast/f1".to_string(),
            season: "current".to_string(),
            round: "last".to_string(),
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    /// Validate API configuration
    pub fn validate(&self) -> AppResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AppError::Config(
                "F1 API base URL must start with 'http://' or 'https://'".to_string(),
            ));
        }

        let season_is_year =
            self.season.len() == 4 && self.season.chars().all(|c| c.is_ascii_digit());
        if self.season != "current" && !season_is_year {
            return Err(AppError::Config(format!(
                "F1 season must be 'current' or a four-digit year, got '{}'",
                self.season
            )));
        }

        let round_is_number = self.round.parse::<u32>().map(|r| r > 0).unwrap_or(false);
        if self.round != "last" && !round_is_number {
            return Err(AppError::Config(format!(
                "F1 round must be 'last' or a positive number, got '{}'",
                self.round
            )));
        }

        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(AppError::Config(
                "F1 API timeout must be between 1 and 120 seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Base URL with any trailing slash removed
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Bot configuration
    pub bot: BotConfig,
    /// F1 data API configuration
    pub api: ApiConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        // Load bot configuration
        config.bot.token = env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
            AppError::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        config.bot.http_timeout_secs = parse_env("HTTP_CLIENT_TIMEOUT_SECS", "30")?;
        config.bot.poll_timeout_secs = parse_env("POLL_TIMEOUT_SECS", "10")?;
        config.bot.processing_notice_secs = parse_env("PROCESSING_NOTICE_SECS", "2")?;
        if let Ok(url) = env::var("VIDEO_URL") {
            config.bot.video_url = url;
        }
        if let Ok(url) = env::var("CONTACT_URL") {
            config.bot.contact_url = url;
        }

        // Load F1 data API configuration
        if let Ok(base_url) = env::var("F1_API_BASE_URL") {
            config.api.base_url = base_url;
        }
        if let Ok(season) = env::var("F1_SEASON") {
            config.api.season = season;
        }
        if let Ok(round) = env::var("F1_ROUND") {
            config.api.round = round;
        }
        config.api.timeout_secs = parse_env("F1_API_TIMEOUT_SECS", "15")?;

        config.observability = ObservabilityConfig::from_env().map_err(AppError::Config)?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.bot.validate()?;
        self.api.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: bot_token=[REDACTED], api_base_url={}, season={}, round={}, metrics_port={}, environment={}",
            self.api.base(),
            self.api.season,
            self.api.round,
            self.observability.metrics_port,
            self.observability.environment
        )
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> AppResult<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a valid number", key)))
}
