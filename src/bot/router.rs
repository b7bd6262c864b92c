//! Callback and command dispatch
//!
//! Typed commands, button callbacks and plain text are normalized into a
//! [`CommandRequest`] and routed to exactly one registered [`Handler`].
//! Unknown keys fall back to a placeholder reply and never fail the update.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use teloxide::types::{CallbackQuery, ChatId, MaybeInaccessibleMessage, Message, MessageId};
use tracing::{debug, info, Instrument};

use super::command_handlers::{
    ComingSoonHandler, DataHandler, Handler, MenuHandler, StaticHandler, StaticPage,
    TriviaAnswerHandler, TriviaHandler, UnrecognizedHandler,
};
use super::messenger::Messenger;
use super::notice::{Notice, NoticeScheduler};
use super::HandlerContext;
use crate::api_client::F1ApiClient;
use crate::config::BotConfig;
use crate::errors::error_logging;
use crate::localization::{detect_language, t_lang, LocalizationManager};
use crate::observability;
use crate::session::SessionStore;

/// Where a request came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// `/command` typed by the user
    Command,
    /// Inline button press on one of the bot's messages
    Callback {
        query_id: String,
        message_id: MessageId,
    },
    /// Any other text message
    Text,
}

impl Origin {
    pub fn kind(&self) -> &'static str {
        match self {
            Origin::Command => "command",
            Origin::Callback { .. } => "callback",
            Origin::Text => "text",
        }
    }
}

/// Normalized inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub chat_id: ChatId,
    pub user_id: Option<i64>,
    /// First name of the sender, empty when unknown
    pub user_name: String,
    pub language_code: Option<String>,
    /// Handler key; empty for plain text
    pub command_key: String,
    pub argument: Option<String>,
    pub origin: Origin,
}

/// Split a callback payload at its first `:` into key and argument
pub fn parse_payload(payload: &str) -> (String, Option<String>) {
    match payload.split_once(':') {
        Some((key, argument)) => (key.to_string(), Some(argument.to_string())),
        None => (payload.to_string(), None),
    }
}

/// Split `/command@BotName rest` into a lowercased key and optional argument
pub fn parse_command(text: &str) -> Option<(String, Option<String>)> {
    let body = text.strip_prefix('/')?;
    let (head, rest) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (body, ""),
    };
    let key = head.split('@').next().unwrap_or(head).to_lowercase();
    if key.is_empty() {
        return None;
    }
    let argument = (!rest.is_empty()).then(|| rest.to_string());
    Some((key, argument))
}

impl CommandRequest {
    /// Build a request from a text message. Non-text messages are ignored.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let text = msg.text()?;
        let user = msg.from.as_ref();

        let (command_key, argument, origin) = match parse_command(text) {
            Some((key, argument)) => (key, argument, Origin::Command),
            None => (String::new(), Some(text.to_string()), Origin::Text),
        };

        Some(Self {
            chat_id: msg.chat.id,
            user_id: user.map(|u| u.id.0 as i64),
            user_name: user.map(|u| u.first_name.clone()).unwrap_or_default(),
            language_code: user.and_then(|u| u.language_code.clone()),
            command_key,
            argument,
            origin,
        })
    }

    /// Build a request from a button press. Presses without data or an
    /// accessible message are ignored.
    pub fn from_callback(query: &CallbackQuery) -> Option<Self> {
        let data = query.data.as_deref()?;
        let (chat_id, message_id) = match query.message.as_ref()? {
            MaybeInaccessibleMessage::Regular(msg) => (msg.chat.id, msg.id),
            MaybeInaccessibleMessage::Inaccessible(msg) => (msg.chat.id, msg.message_id),
        };
        let (command_key, argument) = parse_payload(data);

        Some(Self {
            chat_id,
            user_id: Some(query.from.id.0 as i64),
            user_name: query.from.first_name.clone(),
            language_code: query.from.language_code.clone(),
            command_key,
            argument,
            origin: Origin::Callback {
                query_id: query.id.0.clone(),
                message_id,
            },
        })
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.origin, Origin::Callback { .. })
    }
}

/// Registry of handlers plus the shared services they run with
pub struct Router {
    handlers: HashMap<String, Arc<dyn Handler>>,
    coming_soon: Arc<dyn Handler>,
    unrecognized: Arc<dyn Handler>,
    messenger: Arc<dyn Messenger>,
    sessions: SessionStore,
    api: Arc<F1ApiClient>,
    localization: Arc<LocalizationManager>,
    settings: Arc<BotConfig>,
    notices: NoticeScheduler,
}

impl Router {
    /// Router with an empty registry
    pub fn new(
        messenger: Arc<dyn Messenger>,
        sessions: SessionStore,
        api: Arc<F1ApiClient>,
        localization: Arc<LocalizationManager>,
        settings: Arc<BotConfig>,
    ) -> Self {
        let notices = NoticeScheduler::new(Arc::clone(&messenger), settings.processing_notice_delay());
        Self {
            handlers: HashMap::new(),
            coming_soon: Arc::new(ComingSoonHandler),
            unrecognized: Arc::new(UnrecognizedHandler),
            messenger,
            sessions,
            api,
            localization,
            settings,
            notices,
        }
    }

    /// Router with every bot command registered
    pub fn with_default_handlers(
        messenger: Arc<dyn Messenger>,
        sessions: SessionStore,
        api: Arc<F1ApiClient>,
        localization: Arc<LocalizationManager>,
        settings: Arc<BotConfig>,
    ) -> Self {
        let mut router = Self::new(messenger, sessions, api, localization, settings);
        router.register(&["start", "main_menu", "menu"], Arc::new(MenuHandler));
        router.register(&["pilotos", "pilots"], Arc::new(DataHandler::drivers()));
        router.register(&["constructores"], Arc::new(DataHandler::constructors()));
        router.register(&["calendario", "sesiones2024"], Arc::new(DataHandler::schedule()));
        router.register(&["clasificacion"], Arc::new(DataHandler::qualifying()));
        router.register(&["ult_carrera", "resultados"], Arc::new(DataHandler::last_race()));
        router.register(&["sprint"], Arc::new(DataHandler::sprint()));
        router.register(&["prox_carrera"], Arc::new(DataHandler::next_race()));
        router.register(&["help", "ayuda"], Arc::new(StaticHandler::new(StaticPage::Help)));
        router.register(&["contacto"], Arc::new(StaticHandler::new(StaticPage::Contact)));
        router.register(&["video"], Arc::new(StaticHandler::new(StaticPage::Video)));
        router.register(&["trivia"], Arc::new(TriviaHandler));
        router.register(&["trivia_answer"], Arc::new(TriviaAnswerHandler));
        router
    }

    /// Register `handler` under every key in `keys`
    pub fn register(&mut self, keys: &[&str], handler: Arc<dyn Handler>) {
        for key in keys {
            self.handlers.insert(key.to_string(), Arc::clone(&handler));
        }
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn resolve(&self, request: &CommandRequest) -> (&Arc<dyn Handler>, &'static str) {
        match self.handlers.get(&request.command_key) {
            Some(handler) => (handler, "handled"),
            None if request.is_callback() => (&self.coming_soon, "coming_soon"),
            None => (&self.unrecognized, "unrecognized"),
        }
    }

    /// Dispatch one request to exactly one handler
    pub async fn route(&self, request: &CommandRequest) -> Result<()> {
        let span = observability::telegram_span("route", request.user_id);
        async {
            observability::record_telegram_message(request.origin.kind());
            let start = Instant::now();

            let notice = match &request.origin {
                Origin::Callback {
                    query_id,
                    message_id,
                } => self.acknowledge_callback(request, query_id, *message_id).await,
                _ => None,
            };

            let (handler, outcome) = self.resolve(request);
            info!(
                chat_id = %request.chat_id,
                command = %request.command_key,
                origin = request.origin.kind(),
                outcome,
                "Dispatching request"
            );

            let ctx = HandlerContext::new(
                self.messenger.as_ref(),
                &self.sessions,
                &self.api,
                &self.localization,
                &self.settings,
                request,
            )
            .with_notice(notice);
            let result = handler.execute(&ctx).await;

            let outcome = if result.is_ok() { outcome } else { "failed" };
            observability::record_command_metrics(&request.command_key, outcome, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    /// Remove the pressed message, stop the button spinner and show a
    /// transient "processing" notice. All steps are best-effort.
    async fn acknowledge_callback(
        &self,
        request: &CommandRequest,
        query_id: &str,
        message_id: MessageId,
    ) -> Option<Notice> {
        let chat_id = request.chat_id;

        {
            let mut session = self.sessions.lock(chat_id).await;
            if session.active_reply() == Some(message_id) {
                session.clear_reply(self.messenger.as_ref()).await;
            } else if let Err(e) = self.messenger.delete_message(chat_id, message_id).await {
                observability::record_delivery_failure("delete_callback_message");
                error_logging::log_delivery_error(
                    &e,
                    "delete_callback_message",
                    chat_id.0,
                    Some(message_id.0),
                );
            }
        }

        if let Err(e) = self.messenger.answer_callback(query_id).await {
            observability::record_delivery_failure("answer_callback");
            error_logging::log_delivery_error(&e, "answer_callback", chat_id.0, None);
        }

        let lang = detect_language(&self.localization, request.language_code.as_deref());
        let text = t_lang(&self.localization, "processing", Some(lang.as_str()));
        let notice = self.notices.show(chat_id, &text).await;
        if notice.is_some() {
            debug!(chat_id = %chat_id, delay = ?self.notices.delay(), "Processing notice scheduled");
        }
        notice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_with_argument() {
        assert_eq!(
            parse_payload("trivia_answer:3:1"),
            ("trivia_answer".to_string(), Some("3:1".to_string()))
        );
    }

    #[test]
    fn test_parse_payload_without_argument() {
        assert_eq!(parse_payload("pilotos"), ("pilotos".to_string(), None));
    }

    #[test]
    fn test_parse_command_strips_bot_name() {
        assert_eq!(
            parse_command("/pilotos@GridGuruBot 2023"),
            Some(("pilotos".to_string(), Some("2023".to_string())))
        );
        assert_eq!(parse_command("/Help"), Some(("help".to_string(), None)));
    }

    #[test]
    fn test_parse_command_rejects_plain_text() {
        assert_eq!(parse_command("hola"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn test_origin_kind() {
        assert_eq!(Origin::Text.kind(), "text");
        let origin = Origin::Callback {
            query_id: "q".to_string(),
            message_id: MessageId(7),
        };
        assert_eq!(origin.kind(), "callback");
    }
}
