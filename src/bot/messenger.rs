//! Messaging platform abstraction.
//!
//! [`Messenger`] is the only surface handlers and the router use to talk to
//! Telegram; [`TelegramMessenger`] implements it with teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatAction, InlineKeyboardMarkup, MessageId};
use teloxide::{ApiError, RequestError};

/// Failure of a Telegram operation
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// Target message no longer exists or can't be touched
    NotFound(String),
    /// Flood control kicked in
    RateLimited(String),
    /// Bot was blocked or lacks rights in the chat
    Forbidden(String),
    /// Network, IO or any other request failure
    Transport(String),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::NotFound(msg) => write!(f, "[NOT_FOUND] {}", msg),
            DeliveryError::RateLimited(msg) => write!(f, "[RATE_LIMITED] {}", msg),
            DeliveryError::Forbidden(msg) => write!(f, "[FORBIDDEN] {}", msg),
            DeliveryError::Transport(msg) => write!(f, "[TRANSPORT] {}", msg),
        }
    }
}

impl std::error::Error for DeliveryError {}

impl From<RequestError> for DeliveryError {
    fn from(err: RequestError) -> Self {
        let msg = err.to_string();
        match err {
            RequestError::Api(ApiError::MessageToDeleteNotFound)
            | RequestError::Api(ApiError::MessageCantBeDeleted)
            | RequestError::Api(ApiError::MessageToEditNotFound) => DeliveryError::NotFound(msg),
            RequestError::Api(ApiError::BotBlocked) | RequestError::Api(ApiError::BotKicked) => {
                DeliveryError::Forbidden(msg)
            }
            RequestError::RetryAfter(_) => DeliveryError::RateLimited(msg),
            _ => DeliveryError::Transport(msg),
        }
    }
}

/// Operations the bot needs from the chat platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message, optionally with an inline keyboard, and return its id
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, DeliveryError>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId)
        -> Result<(), DeliveryError>;

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction)
        -> Result<(), DeliveryError>;

    /// Stop the loading spinner on the pressed button
    async fn answer_callback(&self, query_id: &str) -> Result<(), DeliveryError>;
}

/// Teloxide-based implementation of [`Messenger`]
#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, DeliveryError> {
        let request = self.bot.send_message(chat_id, text);
        let sent = match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
        Ok(sent.id)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError> {
        let request = self.bot.edit_message_text(chat_id, message_id, text);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn send_chat_action(
        &self,
        chat_id: ChatId,
        action: ChatAction,
    ) -> Result<(), DeliveryError> {
        self.bot.send_chat_action(chat_id, action).await?;
        Ok(())
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), DeliveryError> {
        self.bot
            .answer_callback_query(CallbackQueryId(query_id.to_string()))
            .await?;
        Ok(())
    }
}
