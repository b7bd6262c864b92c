//! # Application Error Types
//!
//! This module defines the startup error type of the Grid Guru bot and the
//! structured logging helpers shared by the API client, the router and the
//! delivery loop. Runtime failures have their own types next to the code
//! that raises them (`FetchError`, `DeliveryError`, `PollError`).

use std::fmt;

/// Application error raised while loading and checking startup settings
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::{error, warn};

    /// Log network/communication errors with connection context
    pub fn log_network_error(
        error: &impl std::fmt::Display,
        operation: &str,
        endpoint: Option<&str>,
        attempt_count: Option<u32>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            endpoint = ?endpoint,
            attempt_count = ?attempt_count,
            "Network operation failed"
        );
    }

    /// Log a best-effort Telegram operation that failed and was discarded
    pub fn log_delivery_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: i64,
        message_id: Option<i32>,
    ) {
        warn!(
            error = %error,
            operation = %operation,
            chat_id = %chat_id,
            message_id = ?message_id,
            "Telegram operation failed, continuing"
        );
    }

    /// Log internal application errors with component context
    pub fn log_internal_error(
        error: &impl std::fmt::Display,
        component: &str,
        operation: &str,
        user_id: Option<i64>,
    ) {
        error!(
            error = %error,
            component = %component,
            operation = %operation,
            user_id = ?user_id,
            "Internal application error"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display_tag() {
        assert_eq!(
            AppError::Config("missing token".to_string()).to_string(),
            "[CONFIG] missing token"
        );
    }

    #[test]
    fn test_app_error_converts_to_anyhow() {
        let err: anyhow::Error = AppError::Config("bad port".to_string()).into();
        assert_eq!(err.to_string(), "[CONFIG] bad port");
        assert!(err.downcast_ref::<AppError>().is_some());
    }
}
