//! # Observability Configuration
//!
//! Environment-specific settings for logging, metrics export and the
//! health/metrics HTTP endpoint.

use std::env;

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Prometheus metrics endpoint port
    pub metrics_port: u16,
    /// Log level for the bot's own targets
    pub log_level: String,
    /// Output format override ("pretty" or "json")
    pub log_format: String,
    /// Whether to serve the metrics/health endpoint at all
    pub enable_metrics_export: bool,
    /// Whether to allow privileged ports (< 1024)
    pub allow_privileged_ports: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            metrics_port: 9090,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            enable_metrics_export: true,
            allow_privileged_ports: false,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    ///
    /// Unset keys take their defaults; set keys that don't parse are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_port: parse_var(&lookup, "METRICS_PORT", defaults.metrics_port)?,
            log_level: lookup("OBSERVABILITY_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),
            enable_metrics_export: parse_var(
                &lookup,
                "ENABLE_METRICS_EXPORT",
                defaults.enable_metrics_export,
            )?,
            allow_privileged_ports: parse_var(
                &lookup,
                "ALLOW_PRIVILEGED_PORTS",
                defaults.allow_privileged_ports,
            )?,
        })
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Whether log output should be human-readable rather than JSON
    pub fn use_pretty_logs(&self) -> bool {
        self.is_development() || self.log_format == "pretty"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!("Invalid log level: {}", self.log_level));
        }

        if self.log_format != "json" && self.log_format != "pretty" {
            return Err(format!("Invalid log format: {}", self.log_format));
        }

        if self.metrics_port == 0 {
            return Err(format!("Invalid metrics port: {}", self.metrics_port));
        }

        if self.metrics_port < 1024 && !self.allow_privileged_ports {
            return Err(format!(
                "Metrics port {} is privileged. Set ALLOW_PRIVILEGED_PORTS=true or use port >= 1024",
                self.metrics_port
            ));
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, String> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
