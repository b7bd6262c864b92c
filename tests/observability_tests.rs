//! # Observability Tests Module
//!
//! Recorders and spans must be usable without an installed metrics
//! recorder or subscriber, and the readiness check must reject bad tokens.

#[cfg(test)]
mod tests {
    use grid_guru_bot::errors::AppError;
    use grid_guru_bot::observability;
    use grid_guru_bot::observability_config::ObservabilityConfig;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    /// In-memory log sink
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    /// Test that metrics recording functions work without a recorder
    #[test]
    fn test_metrics_recording() {
        observability::record_telegram_message("callback");
        observability::record_command_metrics("pilotos", "handled", Duration::from_millis(120));
        observability::record_fetch_metrics("drivers", false, Duration::from_millis(30));
        observability::record_delivery_failure("delete_previous_reply");
        observability::record_poll_retry("transport");
    }

    /// Test span creation functions
    #[test]
    fn test_span_creation() {
        let telegram = observability::telegram_span("route", Some(12345));
        let api = observability::api_span("next_race");

        let _guard = telegram.enter();
        drop(api);
    }

    #[test]
    fn test_bot_token_health() {
        assert!(observability::check_bot_token_health("123456:abcdef").is_ok());
        assert!(observability::check_bot_token_health("").is_err());
        assert!(observability::check_bot_token_health("no-colon").is_err());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_setup() {
        let config = ObservabilityConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };

        let result = observability::init_observability(&config, "123456:abcdef".to_string()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_startup_error_is_logged_without_global_subscriber() {
        let captured = Captured::default();
        let sink = captured.clone();
        let error = AppError::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string());

        observability::log_startup_error_with_writer(&error, "app_config", move || sink.clone());

        let output = captured.text();
        assert!(output.contains("Configuration error"), "got: {}", output);
        assert!(output.contains("[CONFIG] TELEGRAM_BOT_TOKEN environment variable is required"));
        assert!(output.contains("app_config"));
    }
}
