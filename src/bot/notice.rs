//! Transient notices that remove themselves after a delay

use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tokio::task::AbortHandle;
use tracing::debug;

use super::messenger::Messenger;
use crate::errors::error_logging;
use crate::observability;

/// A notice on screen with its pending removal
#[derive(Debug)]
pub struct Notice {
    message_id: MessageId,
    removal: AbortHandle,
}

impl Notice {
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Cancel the scheduled delete so the message can be reused
    pub fn keep(&self) {
        self.removal.abort();
    }
}

/// Sends short-lived messages and deletes them on a one-shot timer
#[derive(Clone)]
pub struct NoticeScheduler {
    messenger: Arc<dyn Messenger>,
    delay: Duration,
}

impl NoticeScheduler {
    pub fn new(messenger: Arc<dyn Messenger>, delay: Duration) -> Self {
        Self { messenger, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Delete `message_id` once the delay has elapsed.
    ///
    /// Aborting the returned handle keeps the message.
    pub fn schedule_delete(&self, chat_id: ChatId, message_id: MessageId) -> AbortHandle {
        let messenger = Arc::clone(&self.messenger);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(chat_id = %chat_id, message_id = message_id.0, "Removing transient notice");
            if let Err(e) = messenger.delete_message(chat_id, message_id).await {
                observability::record_delivery_failure("delete_notice");
                error_logging::log_delivery_error(&e, "delete_notice", chat_id.0, Some(message_id.0));
            }
        });
        task.abort_handle()
    }

    /// Send `text` and schedule its removal. Failures are logged and yield `None`.
    pub async fn show(&self, chat_id: ChatId, text: &str) -> Option<Notice> {
        match self.messenger.send_message(chat_id, text, None).await {
            Ok(message_id) => Some(Notice {
                message_id,
                removal: self.schedule_delete(chat_id, message_id),
            }),
            Err(e) => {
                observability::record_delivery_failure("send_notice");
                error_logging::log_delivery_error(&e, "send_notice", chat_id.0, None);
                None
            }
        }
    }
}
