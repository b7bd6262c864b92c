//! # Chat Session Tracking
//!
//! Keeps, per chat, the id of the last message the bot sent so it can be
//! removed before the next reply appears. At most one active reply is
//! tracked per chat.
//!
//! Each chat has its own async lock. Handlers hold a [`ChatSessionGuard`]
//! for their whole run, so the clear/send/record sequence for one chat never
//! interleaves with another handler working on the same chat. The map from
//! chat id to lock sits behind a single `parking_lot` mutex that is only held
//! long enough to look up or insert an entry.
//!
//! State is memory-only and is lost on restart.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::bot::messenger::Messenger;
use crate::errors::error_logging;
use crate::observability;

/// Per-chat state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    /// Most recent bot-sent message still tracked in this chat
    pub last_message_id: Option<MessageId>,
}

/// Process-wide store of chat sessions, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    chats: Arc<Mutex<HashMap<ChatId, Arc<AsyncMutex<ChatSession>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, chat_id: ChatId) -> Arc<AsyncMutex<ChatSession>> {
        let mut chats = self.chats.lock();
        Arc::clone(chats.entry(chat_id).or_default())
    }

    /// Acquire exclusive access to a chat's session, creating it lazily
    pub async fn lock(&self, chat_id: ChatId) -> ChatSessionGuard {
        let guard = self.entry(chat_id).lock_owned().await;
        ChatSessionGuard { chat_id, guard }
    }

    /// Store `message_id` as the chat's active reply, replacing any previous one
    pub async fn record_reply(&self, chat_id: ChatId, message_id: MessageId) {
        self.lock(chat_id).await.record_reply(message_id);
    }

    /// Delete the chat's active reply if one is recorded. Never fails.
    pub async fn clear_reply(&self, chat_id: ChatId, messenger: &dyn Messenger) {
        self.lock(chat_id).await.clear_reply(messenger).await;
    }

    pub async fn active_reply(&self, chat_id: ChatId) -> Option<MessageId> {
        self.lock(chat_id).await.active_reply()
    }

    /// Number of chats the bot has replied to since start
    pub fn tracked_chats(&self) -> usize {
        self.chats.lock().len()
    }
}

/// Exclusive handle on one chat's session
#[derive(Debug)]
pub struct ChatSessionGuard {
    chat_id: ChatId,
    guard: OwnedMutexGuard<ChatSession>,
}

impl ChatSessionGuard {
    pub fn active_reply(&self) -> Option<MessageId> {
        self.guard.last_message_id
    }

    pub fn record_reply(&mut self, message_id: MessageId) {
        debug!(chat_id = %self.chat_id, message_id = message_id.0, "Recording active reply");
        self.guard.last_message_id = Some(message_id);
    }

    /// Best-effort removal of the active reply.
    ///
    /// The id is forgotten even when the delete fails: an already deleted or
    /// undeletable message is not worth a second attempt.
    pub async fn clear_reply(&mut self, messenger: &dyn Messenger) {
        let Some(message_id) = self.guard.last_message_id.take() else {
            return;
        };

        if let Err(e) = messenger.delete_message(self.chat_id, message_id).await {
            observability::record_delivery_failure("delete_previous_reply");
            error_logging::log_delivery_error(
                &e,
                "delete_previous_reply",
                self.chat_id.0,
                Some(message_id.0),
            );
        }
    }
}
