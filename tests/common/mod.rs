//! Shared fakes and fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use grid_guru_bot::api_client::F1ApiClient;
use grid_guru_bot::bot::messenger::{DeliveryError, Messenger};
use grid_guru_bot::bot::router::{CommandRequest, Origin, Router};
use grid_guru_bot::config::{ApiConfig, BotConfig};
use grid_guru_bot::localization::create_localization_manager;
use grid_guru_bot::session::SessionStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use teloxide::types::{ChatAction, ChatId, InlineKeyboardMarkup, MessageId};

/// One call made against the fake messenger
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Action {
        chat_id: ChatId,
    },
    AnswerCallback {
        query_id: String,
    },
}

/// In-memory [`Messenger`] that hands out increasing message ids and keeps
/// every call for later inspection
#[derive(Debug)]
pub struct RecordingMessenger {
    next_id: AtomicI32,
    calls: Mutex<Vec<Call>>,
    fail_deletes: AtomicBool,
    fail_sends: AtomicBool,
    fail_edits: AtomicBool,
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self {
            next_id: AtomicI32::new(100),
            calls: Mutex::new(Vec::new()),
            fail_deletes: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            fail_edits: AtomicBool::new(false),
        }
    }
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// (id, text) of every message sent, in order
    pub fn sent(&self) -> Vec<(MessageId, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Send {
                    message_id, text, ..
                } => Some((*message_id, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_sent(&self) -> Option<(MessageId, String)> {
        self.sent().pop()
    }

    pub fn last_keyboard(&self) -> Option<InlineKeyboardMarkup> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            Call::Send { keyboard, .. } => Some(keyboard.clone()),
            _ => None,
        })?
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Delete { message_id, .. } => Some(*message_id),
                _ => None,
            })
            .collect()
    }

    /// (id, text) of every successful edit, in order
    pub fn edited(&self) -> Vec<(MessageId, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Edit {
                    message_id, text, ..
                } => Some((*message_id, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn answered_callbacks(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::AnswerCallback { query_id } => Some(query_id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, DeliveryError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(DeliveryError::Forbidden("bot was blocked by the user".to_string()));
        }
        let message_id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.calls.lock().push(Call::Send {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(message_id)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        self.calls.lock().push(Call::Delete {
            chat_id,
            message_id,
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DeliveryError::NotFound("message to delete not found".to_string()));
        }
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(DeliveryError::NotFound("message to edit not found".to_string()));
        }
        self.calls.lock().push(Call::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn send_chat_action(
        &self,
        chat_id: ChatId,
        _action: ChatAction,
    ) -> Result<(), DeliveryError> {
        self.calls.lock().push(Call::Action { chat_id });
        Ok(())
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), DeliveryError> {
        self.calls.lock().push(Call::AnswerCallback {
            query_id: query_id.to_string(),
        });
        Ok(())
    }
}

pub const CHAT: ChatId = ChatId(4242);

pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        season: "current".to_string(),
        round: "last".to_string(),
        timeout_secs: 5,
    }
}

pub fn bot_settings() -> BotConfig {
    BotConfig {
        token: "123456789:AAFakeTokenForTestingPurposes1234567890".to_string(),
        processing_notice_secs: 30,
        ..BotConfig::default()
    }
}

/// Router with every command registered, talking to `base_url`
pub fn router(messenger: Arc<RecordingMessenger>, base_url: &str) -> Router {
    let api = F1ApiClient::new(api_config(base_url)).expect("client builds");
    Router::with_default_handlers(
        messenger,
        SessionStore::new(),
        Arc::new(api),
        create_localization_manager().expect("locales load"),
        Arc::new(bot_settings()),
    )
}

pub fn command(chat_id: ChatId, key: &str) -> CommandRequest {
    CommandRequest {
        chat_id,
        user_id: Some(7),
        user_name: "Ana".to_string(),
        language_code: Some("es".to_string()),
        command_key: key.to_string(),
        argument: None,
        origin: Origin::Command,
    }
}

pub fn callback(chat_id: ChatId, key: &str, argument: Option<&str>, message_id: i32) -> CommandRequest {
    CommandRequest {
        argument: argument.map(str::to_string),
        origin: Origin::Callback {
            query_id: format!("query-{}", message_id),
            message_id: MessageId(message_id),
        },
        ..command(chat_id, key)
    }
}

pub fn text(chat_id: ChatId, body: &str) -> CommandRequest {
    CommandRequest {
        command_key: String::new(),
        argument: Some(body.to_string()),
        origin: Origin::Text,
        ..command(chat_id, "")
    }
}

pub const TWO_DRIVERS: &str = r#"{
  "MRData": {
    "DriverTable": {
      "season": "2024",
      "Drivers": [
        {
          "driverId": "max_verstappen",
          "permanentNumber": "33",
          "givenName": "Max",
          "familyName": "Verstappen",
          "dateOfBirth": "1997-09-30",
          "nationality": "Dutch"
        },
        {
          "driverId": "bearman",
          "givenName": "Oliver",
          "familyName": "Bearman",
          "dateOfBirth": "2005-05-08",
          "nationality": "British"
        }
      ]
    }
  }
}"#;

pub const QUALIFYING_MISSING_Q2: &str = r#"{
  "MRData": {
    "RaceTable": {
      "Races": [
        {
          "raceName": "Abu Dhabi Grand Prix",
          "QualifyingResults": [
            {
              "position": "1",
              "Driver": { "givenName": "Lando", "familyName": "Norris" },
              "Constructor": { "name": "McLaren" },
              "Q1": "1:23.2",
              "Q2": "1:22.9",
              "Q3": "1:22.5"
            },
            {
              "position": "16",
              "Driver": { "givenName": "Yuki", "familyName": "Tsunoda" },
              "Constructor": { "name": "RB F1 Team" },
              "Q1": "1:23.9"
            }
          ]
        }
      ]
    }
  }
}"#;

pub const NEXT_RACE: &str = r#"{
  "MRData": {
    "RaceTable": {
      "Races": [
        {
          "raceName": "Australian Grand Prix",
          "date": "2099-03-16",
          "Circuit": {
            "circuitName": "Albert Park Grand Prix Circuit",
            "Location": { "locality": "Melbourne", "country": "Australia" }
          }
        }
      ]
    }
  }
}"#;

pub const EMPTY_DRIVERS: &str = r#"{ "MRData": { "DriverTable": { "Drivers": [] } } }"#;
pub const EMPTY_CONSTRUCTORS: &str =
    r#"{ "MRData": { "ConstructorTable": { "Constructors": [] } } }"#;
pub const EMPTY_RACES: &str = r#"{ "MRData": { "RaceTable": { "Races": [] } } }"#;
