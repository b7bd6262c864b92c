//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Metrics collection and Prometheus export
//! - Liveness/readiness endpoints served next to `/metrics`

use std::net::SocketAddr;

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tracing_subscriber::prelude::*;

use crate::errors::error_logging;
use crate::observability_config::ObservabilityConfig;

/// Initialize logging, metrics and the metrics/health server
pub async fn init_observability(config: &ObservabilityConfig, bot_token: String) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    init_tracing_with_config(config)?;

    if config.enable_metrics_export {
        let metrics_handle = init_metrics()?;
        start_metrics_server(metrics_handle, config.metrics_port, bot_token).await?;
    } else {
        tracing::info!("Metrics export disabled");
    }

    tracing::info!(
        environment = %config.environment,
        metrics_port = %config.metrics_port,
        metrics_enabled = %config.enable_metrics_export,
        "Observability stack initialized successfully"
    );
    Ok(())
}

/// Log a startup failure that happens before [`init_observability`] has
/// installed the global subscriber. The event goes to stderr through a
/// subscriber that only lives for this call.
pub fn log_startup_error(error: &impl std::fmt::Display, config_key: &str) {
    log_startup_error_with_writer(error, config_key, std::io::stderr);
}

pub fn log_startup_error_with_writer<W>(error: &impl std::fmt::Display, config_key: &str, writer: W)
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false),
    );
    tracing::subscriber::with_default(subscriber, || {
        error_logging::log_config_error(error, config_key, "startup");
    });
}

/// Initialize structured logging with tracing and configuration
fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("grid_guru_bot={}", config.log_level.to_lowercase()).parse()?)
        .add_directive("teloxide=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .init();
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Install the Prometheus recorder
fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics collection initialized");
    Ok(handle)
}

async fn start_metrics_server(
    metrics_handle: PrometheusHandle,
    port: u16,
    bot_token: String,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let metrics_handle = metrics_handle.clone();
                    let bot_token = bot_token.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                let bot_token = bot_token.clone();
                                async move {
                                    match (req.method(), req.uri().path()) {
                                        (&hyper::Method::GET, "/metrics") => {
                                            let mut response =
                                                hyper::Response::new(metrics_handle.render());
                                            response.headers_mut().insert(
                                                "content-type",
                                                hyper::header::HeaderValue::from_static(
                                                    "text/plain; version=0.0.4; charset=utf-8",
                                                ),
                                            );
                                            Ok::<_, std::convert::Infallible>(response)
                                        }
                                        (&hyper::Method::GET, "/health/live") => {
                                            Ok(hyper::Response::new("OK".to_string()))
                                        }
                                        (&hyper::Method::GET, "/health/ready") => {
                                            match check_bot_token_health(&bot_token) {
                                                Ok(()) => Ok(hyper::Response::new("OK".to_string())),
                                                Err(e) => {
                                                    let mut response = hyper::Response::new(
                                                        format!("NOT READY: {}", e),
                                                    );
                                                    *response.status_mut() =
                                                        hyper::StatusCode::SERVICE_UNAVAILABLE;
                                                    Ok(response)
                                                }
                                            }
                                        }
                                        _ => {
                                            let mut response =
                                                hyper::Response::new("Not Found".to_string());
                                            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
                                            Ok(response)
                                        }
                                    }
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            tracing::error!("Error serving connection: {:?}", err);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                }
            }
        }
    });

    Ok(())
}

/// Check the bot token looks usable
pub fn check_bot_token_health(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(anyhow::anyhow!("Bot token is empty"));
    }

    if !token.contains(':') {
        return Err(anyhow::anyhow!("Bot token format is invalid"));
    }

    Ok(())
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, user_id: Option<i64>) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        user_id = user_id,
        component = "telegram"
    )
}

/// Create a span for F1 data API calls
pub fn api_span(endpoint: &str) -> tracing::Span {
    tracing::info_span!("f1_api_request", endpoint = endpoint, component = "f1_api")
}

/// Record one handled command and how it ended
pub fn record_command_metrics(command: &str, outcome: &str, duration: std::time::Duration) {
    let command = command.to_string();
    let outcome = outcome.to_string();
    metrics::counter!("bot_commands_total", "command" => command, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("bot_command_duration_seconds").record(duration.as_secs_f64());
}

/// Record an F1 data API request
pub fn record_fetch_metrics(endpoint: &str, success: bool, duration: std::time::Duration) {
    let endpoint = endpoint.to_string();
    metrics::counter!(
        "f1_api_requests_total",
        "endpoint" => endpoint,
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::histogram!("f1_api_request_duration_seconds").record(duration.as_secs_f64());
}

/// Record a best-effort Telegram operation that failed
pub fn record_delivery_failure(operation: &str) {
    let operation = operation.to_string();
    metrics::counter!("telegram_delivery_failures_total", "operation" => operation).increment(1);
}

/// Record a failed polling cycle
pub fn record_poll_retry(kind: &str) {
    let kind = kind.to_string();
    metrics::counter!("telegram_poll_failures_total", "kind" => kind).increment(1);
}

/// Record Telegram message processing metrics
pub fn record_telegram_message(message_type: &str) {
    let message_type = message_type.to_string();
    metrics::counter!("telegram_messages_total", "type" => message_type).increment(1);
}
