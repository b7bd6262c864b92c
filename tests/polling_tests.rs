//! # Delivery Loop Tests
//!
//! Drives `DeliveryLoop::poll_once` with a scripted update source to check
//! backoff, recovery and dispatch.

mod common;

use async_trait::async_trait;
use common::{command, router, text, RecordingMessenger, CHAT};
use grid_guru_bot::bot::polling::{CycleOutcome, DeliveryLoop, PollError, UpdateSource};
use grid_guru_bot::bot::router::CommandRequest;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests {
    use super::*;

    const NO_API: &str = "http://127.0.0.1:1";

    /// Replays a fixed list of poll results, then returns empty batches
    struct ScriptedSource {
        script: VecDeque<Result<Vec<CommandRequest>, PollError>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<CommandRequest>, PollError>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn next_batch(&mut self) -> Result<Vec<CommandRequest>, PollError> {
            self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn transport() -> Result<Vec<CommandRequest>, PollError> {
        Err(PollError::Transport("connection reset".to_string()))
    }

    #[tokio::test]
    async fn test_transport_failures_back_off_then_reset() {
        let messenger = RecordingMessenger::new();
        let router = Arc::new(router(Arc::clone(&messenger), NO_API));
        let source = ScriptedSource::new(vec![transport(), transport(), transport(), Ok(vec![])]);
        let mut delivery = DeliveryLoop::new(source, router);

        for expected in [5, 10, 15] {
            match delivery.poll_once().await {
                CycleOutcome::TransportFailure { backoff, .. } => {
                    assert_eq!(backoff, Duration::from_secs(expected))
                }
                other => panic!("expected a transport failure, got {:?}", other),
            }
        }
        assert_eq!(delivery.retries(), 3);

        let outcome = delivery.poll_once().await;
        assert_eq!(
            outcome,
            CycleOutcome::Delivered {
                handled: 0,
                failed: 0,
                panicked: 0
            }
        );
        assert_eq!(delivery.retries(), 0);
    }

    #[tokio::test]
    async fn test_backoff_is_capped_at_a_minute() {
        let messenger = RecordingMessenger::new();
        let router = Arc::new(router(messenger, NO_API));
        let source = ScriptedSource::new((0..15).map(|_| transport()).collect());
        let mut delivery = DeliveryLoop::new(source, router);

        for _ in 0..14 {
            delivery.poll_once().await;
        }
        assert_eq!(delivery.poll_once().await.pause(), Duration::from_secs(60));
        assert_eq!(delivery.retries(), 15);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_at_least_retry_after() {
        let messenger = RecordingMessenger::new();
        let router = Arc::new(router(messenger, NO_API));
        let source = ScriptedSource::new(vec![
            Err(PollError::RateLimited(Duration::from_secs(30))),
            transport(),
            Err(PollError::RateLimited(Duration::from_secs(2))),
        ]);
        let mut delivery = DeliveryLoop::new(source, router);

        assert_eq!(delivery.poll_once().await.pause(), Duration::from_secs(30));
        assert_eq!(delivery.poll_once().await.pause(), Duration::from_secs(10));
        // A short retry_after never undercuts the linear backoff
        assert_eq!(delivery.poll_once().await.pause(), Duration::from_secs(15));
        assert_eq!(delivery.retries(), 3);
    }

    #[tokio::test]
    async fn test_unexpected_failure_pauses_without_touching_retries() {
        let messenger = RecordingMessenger::new();
        let router = Arc::new(router(messenger, NO_API));
        let source = ScriptedSource::new(vec![
            transport(),
            Err(PollError::Unexpected("Unauthorized".to_string())),
        ]);
        let mut delivery = DeliveryLoop::new(source, router);

        delivery.poll_once().await;
        let outcome = delivery.poll_once().await;

        assert_eq!(outcome.pause(), Duration::from_secs(5));
        assert!(matches!(outcome, CycleOutcome::UnexpectedFailure { .. }));
        assert_eq!(delivery.retries(), 1);
    }

    #[tokio::test]
    async fn test_batch_is_dispatched_in_order() {
        let messenger = RecordingMessenger::new();
        let router = Arc::new(router(Arc::clone(&messenger), NO_API));
        let source = ScriptedSource::new(vec![Ok(vec![
            command(CHAT, "help"),
            text(CHAT, "hola"),
            command(CHAT, "contacto"),
        ])]);
        let mut delivery = DeliveryLoop::new(source, Arc::clone(&router));

        let outcome = delivery.poll_once().await;

        assert_eq!(
            outcome,
            CycleOutcome::Delivered {
                handled: 3,
                failed: 0,
                panicked: 0
            }
        );
        let sent = messenger.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].1.starts_with("💡 Ayuda"));
        assert!(sent[1].1.starts_with("🚧 Comando no reconocido"));
        assert!(sent[2].1.starts_with("📞 Contacto"));
        // Each reply replaced the previous one
        assert_eq!(messenger.deleted(), vec![sent[0].0, sent[1].0]);
        assert_eq!(router.sessions().active_reply(CHAT).await, Some(sent[2].0));
    }

    #[tokio::test]
    async fn test_failed_handler_is_counted_and_loop_continues() {
        let messenger = RecordingMessenger::new();
        messenger.fail_sends(true);
        let router = Arc::new(router(Arc::clone(&messenger), NO_API));
        let source = ScriptedSource::new(vec![Ok(vec![command(CHAT, "help")])]);
        let mut delivery = DeliveryLoop::new(source, router);

        let outcome = delivery.poll_once().await;

        assert_eq!(
            outcome,
            CycleOutcome::Delivered {
                handled: 0,
                failed: 1,
                panicked: 0
            }
        );
        assert_eq!(outcome.pause(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancellation() {
        let messenger = RecordingMessenger::new();
        let router = Arc::new(router(messenger, NO_API));
        let delivery = DeliveryLoop::new(ScriptedSource::new(vec![transport()]), router);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(delivery.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
    }
}
