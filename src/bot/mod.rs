//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `messenger`: The chat-platform operations the bot depends on
//! - `router`: Turns updates into `CommandRequest`s and picks a handler
//! - `command_handlers`: One handler per topic, all sharing the session contract
//! - `ui_builder`: Creates keyboards and formats F1 records
//! - `notice`: Transient "processing" notices that delete themselves
//! - `polling`: Long-polling delivery loop with backoff

pub mod command_handlers;
pub mod messenger;
pub mod notice;
pub mod polling;
pub mod router;
pub mod ui_builder;

use teloxide::types::{ChatAction, ChatId};

use crate::api_client::F1ApiClient;
use crate::config::BotConfig;
use crate::errors::error_logging;
use crate::localization::{detect_language, LocalizationManager};
use crate::observability;
use crate::session::SessionStore;

use messenger::Messenger;
use router::CommandRequest;

/// Common context for bot handlers containing shared dependencies
pub struct HandlerContext<'a> {
    pub messenger: &'a dyn Messenger,
    pub sessions: &'a SessionStore,
    pub api: &'a F1ApiClient,
    pub localization: &'a LocalizationManager,
    pub settings: &'a BotConfig,
    pub request: &'a CommandRequest,
    /// Resolved bundle language for this request
    pub lang: String,
    /// "Processing" notice shown for a button press, if any
    pub notice: Option<Notice>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        messenger: &'a dyn Messenger,
        sessions: &'a SessionStore,
        api: &'a F1ApiClient,
        localization: &'a LocalizationManager,
        settings: &'a BotConfig,
        request: &'a CommandRequest,
    ) -> Self {
        let lang = detect_language(localization, request.language_code.as_deref());
        Self {
            messenger,
            sessions,
            api,
            localization,
            settings,
            request,
            lang,
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: Option<Notice>) -> Self {
        self.notice = notice;
        self
    }

    pub fn chat_id(&self) -> ChatId {
        self.request.chat_id
    }

    /// Fire-and-forget "typing..." indicator
    pub async fn send_typing(&self) {
        if let Err(e) = self
            .messenger
            .send_chat_action(self.chat_id(), ChatAction::Typing)
            .await
        {
            observability::record_delivery_failure("send_chat_action");
            error_logging::log_delivery_error(&e, "send_chat_action", self.chat_id().0, None);
        }
    }
}

pub use command_handlers::{DataHandler, Handler};
pub use messenger::{DeliveryError, TelegramMessenger};
pub use notice::{Notice, NoticeScheduler};
pub use polling::{CycleOutcome, DeliveryLoop, PollError, TelegramUpdateSource, UpdateSource};
pub use router::{Origin, Router};
