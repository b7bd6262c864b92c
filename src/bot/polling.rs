//! Long-polling delivery loop
//!
//! Pulls batches of updates, hands each one to the [`Router`] in its own
//! task and keeps going whatever happens. Transport failures back off
//! linearly up to a minute; anything unexpected is logged as critical and
//! retried after a short pause.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use teloxide::RequestError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::router::{CommandRequest, Router};
use crate::errors::error_logging;
use crate::observability;

/// Pause after an unexpected failure
pub const UNEXPECTED_PAUSE: Duration = Duration::from_secs(5);
/// Ceiling for the transport backoff
pub const MAX_BACKOFF_SECS: u64 = 60;
const BACKOFF_STEP_SECS: u64 = 5;

/// Why a poll failed
#[derive(Debug, Clone, PartialEq)]
pub enum PollError {
    /// Network or IO trouble; retried with backoff
    Transport(String),
    /// Flood control; wait at least this long before polling again
    RateLimited(Duration),
    /// Anything else the platform returned
    Unexpected(String),
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::Transport(msg) => write!(f, "[TRANSPORT] {}", msg),
            PollError::RateLimited(wait) => write!(f, "[RATE_LIMITED] retry after {:?}", wait),
            PollError::Unexpected(msg) => write!(f, "[UNEXPECTED] {}", msg),
        }
    }
}

impl std::error::Error for PollError {}

impl From<RequestError> for PollError {
    fn from(err: RequestError) -> Self {
        let msg = err.to_string();
        match err {
            RequestError::RetryAfter(wait) => {
                PollError::RateLimited(Duration::from_secs(u64::from(wait.seconds())))
            }
            RequestError::Network(_) | RequestError::Io(_) => PollError::Transport(msg),
            _ => PollError::Unexpected(msg),
        }
    }
}

/// Source of inbound requests
#[async_trait]
pub trait UpdateSource: Send {
    async fn next_batch(&mut self) -> Result<Vec<CommandRequest>, PollError>;
}

/// `getUpdates` long polling with a moving offset
pub struct TelegramUpdateSource {
    bot: Bot,
    offset: i32,
    timeout_secs: u32,
}

impl TelegramUpdateSource {
    pub fn new(bot: Bot, timeout_secs: u32) -> Self {
        Self {
            bot,
            offset: 0,
            timeout_secs,
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramUpdateSource {
    async fn next_batch(&mut self) -> Result<Vec<CommandRequest>, PollError> {
        let updates = self
            .bot
            .get_updates()
            .offset(self.offset)
            .timeout(self.timeout_secs)
            .await?;

        let mut requests = Vec::with_capacity(updates.len());
        for update in updates {
            self.offset = update.id.as_offset();
            let request = match &update.kind {
                UpdateKind::Message(msg) => CommandRequest::from_message(msg),
                UpdateKind::CallbackQuery(query) => CommandRequest::from_callback(query),
                _ => None,
            };
            match request {
                Some(request) => requests.push(request),
                None => debug!(update_id = update.id.0, "Skipping unsupported update"),
            }
        }
        Ok(requests)
    }
}

/// Result of one polling cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Poll succeeded and every request was dispatched
    Delivered {
        handled: usize,
        failed: usize,
        panicked: usize,
    },
    /// Poll failed with a transport error; `retries` is the updated counter
    TransportFailure { retries: u32, backoff: Duration },
    /// Poll failed in an unexpected way
    UnexpectedFailure { pause: Duration },
}

impl CycleOutcome {
    /// How long to wait before the next cycle
    pub fn pause(&self) -> Duration {
        match self {
            CycleOutcome::Delivered { panicked: 0, .. } => Duration::ZERO,
            CycleOutcome::Delivered { .. } => UNEXPECTED_PAUSE,
            CycleOutcome::TransportFailure { backoff, .. } => *backoff,
            CycleOutcome::UnexpectedFailure { pause } => *pause,
        }
    }
}

/// `min(60, 5 * retries)` seconds
pub fn backoff_delay(retries: u32) -> Duration {
    let secs = BACKOFF_STEP_SECS.saturating_mul(u64::from(retries));
    Duration::from_secs(secs.min(MAX_BACKOFF_SECS))
}

pub struct DeliveryLoop<S> {
    source: S,
    router: Arc<Router>,
    retries: u32,
}

impl<S: UpdateSource> DeliveryLoop<S> {
    pub fn new(source: S, router: Arc<Router>) -> Self {
        Self {
            source,
            router,
            retries: 0,
        }
    }

    /// Consecutive transport failures so far
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Count a transport failure and wait the linear backoff, or `floor` if longer
    fn back_off(&mut self, error: &impl std::fmt::Display, kind: &str, floor: Duration) -> CycleOutcome {
        self.retries = self.retries.saturating_add(1);
        let backoff = backoff_delay(self.retries).max(floor);
        observability::record_poll_retry(kind);
        error_logging::log_network_error(error, "get_updates", None, Some(self.retries));
        warn!(retries = self.retries, backoff = ?backoff, kind, "Polling failed, backing off");
        CycleOutcome::TransportFailure {
            retries: self.retries,
            backoff,
        }
    }

    /// Run a single poll and dispatch cycle without sleeping
    pub async fn poll_once(&mut self) -> CycleOutcome {
        let requests = match self.source.next_batch().await {
            Ok(requests) => requests,
            Err(PollError::Transport(msg)) => {
                return self.back_off(&msg, "transport", Duration::ZERO);
            }
            Err(PollError::RateLimited(retry_after)) => {
                let reason = PollError::RateLimited(retry_after);
                return self.back_off(&reason, "rate_limited", retry_after);
            }
            Err(PollError::Unexpected(msg)) => {
                observability::record_poll_retry("unexpected");
                error!(severity = "critical", error = %msg, "Unexpected polling failure");
                return CycleOutcome::UnexpectedFailure {
                    pause: UNEXPECTED_PAUSE,
                };
            }
        };

        self.retries = 0;

        let (mut handled, mut failed, mut panicked) = (0, 0, 0);
        for request in requests {
            let router = Arc::clone(&self.router);
            let chat_id = request.chat_id;
            let user_id = request.user_id;
            let task = tokio::spawn(async move { router.route(&request).await });

            match task.await {
                Ok(Ok(())) => handled += 1,
                Ok(Err(e)) => {
                    failed += 1;
                    error!(chat_id = %chat_id, error = %format!("{:#}", e), "Handler failed");
                }
                Err(join_error) => {
                    panicked += 1;
                    error_logging::log_internal_error(&join_error, "delivery_loop", "dispatch", user_id);
                    error!(severity = "critical", chat_id = %chat_id, "Handler task aborted");
                }
            }
        }

        CycleOutcome::Delivered {
            handled,
            failed,
            panicked,
        }
    }

    /// Poll until `shutdown` is cancelled
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Delivery loop started");
        loop {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => break,
                outcome = self.poll_once() => outcome,
            };

            let pause = outcome.pause();
            if pause.is_zero() {
                continue;
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }
        info!("Delivery loop stopped");
    }
}
