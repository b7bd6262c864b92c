//! Command Handlers module for processing bot commands
//!
//! Every handler follows the same session contract: lock the chat, clear the
//! previous reply, send exactly one new reply and record it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use teloxide::types::InlineKeyboardMarkup;
use tracing::debug;

use crate::api_client::Endpoint;
use crate::errors::error_logging;
use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::models::{Constructor, Driver, QualifyingResult, Race, RaceResult};
use crate::observability;
use crate::session::ChatSessionGuard;
use crate::trivia;

use super::ui_builder::{
    back_to_menu_keyboard, format_constructor, format_driver, format_next_race,
    format_qualifying, format_race, format_race_result, main_menu_keyboard,
    trivia_question_keyboard, trivia_result_keyboard,
};
use super::HandlerContext;

/// A unit of logic answering one command or button with one reply
#[async_trait]
pub trait Handler: Send + Sync {
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()>;
}

/// Send `text` and make it the chat's active reply
async fn send_and_record(
    ctx: &HandlerContext<'_>,
    session: &mut ChatSessionGuard,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let message_id = ctx
        .messenger
        .send_message(ctx.chat_id(), text, keyboard)
        .await
        .with_context(|| format!("Failed to send reply to chat {}", ctx.chat_id()))?;
    session.record_reply(message_id);
    Ok(())
}

/// Clear the previous reply, then send and record `text`
async fn replace_reply(
    ctx: &HandlerContext<'_>,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let mut session = ctx.sessions.lock(ctx.chat_id()).await;
    session.clear_reply(ctx.messenger).await;
    send_and_record(ctx, &mut session, text, keyboard).await
}

type Formatter<T> = fn(&T, &LocalizationManager, &str) -> String;

/// Fetch-format-send template shared by every data command
pub struct DataHandler<T> {
    endpoint: Endpoint,
    empty_key: &'static str,
    error_key: &'static str,
    formatter: Formatter<T>,
}

impl<T> DataHandler<T> {
    pub fn new(
        endpoint: Endpoint,
        empty_key: &'static str,
        error_key: &'static str,
        formatter: Formatter<T>,
    ) -> Self {
        Self {
            endpoint,
            empty_key,
            error_key,
            formatter,
        }
    }
}

impl DataHandler<Driver> {
    pub fn drivers() -> Self {
        Self::new(Endpoint::Drivers, "empty-drivers", "error-drivers", format_driver)
    }
}

impl DataHandler<Constructor> {
    pub fn constructors() -> Self {
        Self::new(
            Endpoint::Constructors,
            "empty-constructors",
            "error-constructors",
            format_constructor,
        )
    }
}

impl DataHandler<Race> {
    pub fn schedule() -> Self {
        Self::new(Endpoint::Schedule, "empty-schedule", "error-schedule", format_race)
    }

    pub fn next_race() -> Self {
        Self::new(
            Endpoint::NextRace,
            "empty-next-race",
            "error-next-race",
            format_next_race,
        )
    }
}

impl DataHandler<QualifyingResult> {
    pub fn qualifying() -> Self {
        Self::new(
            Endpoint::Qualifying,
            "empty-qualifying",
            "error-qualifying",
            format_qualifying,
        )
    }
}

impl DataHandler<RaceResult> {
    pub fn last_race() -> Self {
        Self::new(
            Endpoint::LastRace,
            "empty-last-race",
            "error-last-race",
            format_race_result,
        )
    }

    pub fn sprint() -> Self {
        Self::new(Endpoint::Sprint, "empty-sprint", "error-sprint", format_race_result)
    }
}

#[async_trait]
impl<T> Handler for DataHandler<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()> {
        let mut session = ctx.sessions.lock(ctx.chat_id()).await;
        session.clear_reply(ctx.messenger).await;
        ctx.send_typing().await;

        let lang = ctx.lang.as_str();
        let (text, keyboard) = match ctx.api.fetch_list::<T>(self.endpoint).await {
            Err(e) => (
                format!("{}: {}", t_lang(ctx.localization, self.error_key, Some(lang)), e),
                None,
            ),
            Ok(records) if records.is_empty() => {
                debug!(endpoint = self.endpoint.name(), "No records returned");
                (t_lang(ctx.localization, self.empty_key, Some(lang)), None)
            }
            Ok(records) => {
                let text = records
                    .iter()
                    .map(|record| (self.formatter)(record, ctx.localization, lang))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                (text, Some(back_to_menu_keyboard(ctx.localization, lang)))
            }
        };

        send_and_record(ctx, &mut session, &text, keyboard).await
    }
}

/// Welcome message with the main menu keyboard
pub struct MenuHandler;

#[async_trait]
impl Handler for MenuHandler {
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()> {
        let lang = Some(ctx.lang.as_str());
        let l10n = ctx.localization;
        let text = format!(
            "{}\n\n{}\n\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n\n{}",
            t_args_lang(l10n, "welcome-title", &[("name", ctx.request.user_name.as_str())], lang),
            t_lang(l10n, "welcome-description", lang),
            t_lang(l10n, "welcome-features", lang),
            t_lang(l10n, "welcome-drivers", lang),
            t_lang(l10n, "welcome-constructors", lang),
            t_lang(l10n, "welcome-calendar", lang),
            t_lang(l10n, "welcome-results", lang),
            t_lang(l10n, "welcome-video", lang),
            t_lang(l10n, "welcome-trivia", lang),
            t_lang(l10n, "welcome-contact", lang),
            t_lang(l10n, "welcome-select", lang),
        );
        replace_reply(ctx, &text, Some(main_menu_keyboard(l10n, &ctx.lang))).await
    }
}

/// Fixed-text pages with no remote data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticPage {
    Help,
    Contact,
    Video,
}

pub struct StaticHandler {
    page: StaticPage,
}

impl StaticHandler {
    pub fn new(page: StaticPage) -> Self {
        Self { page }
    }

    fn render(&self, ctx: &HandlerContext<'_>) -> String {
        let lang = Some(ctx.lang.as_str());
        let l10n = ctx.localization;
        match self.page {
            StaticPage::Help => {
                let commands = [
                    ("/start", "cmd-start"),
                    ("/pilotos", "cmd-pilotos"),
                    ("/constructores", "cmd-constructores"),
                    ("/calendario", "cmd-calendario"),
                    ("/clasificacion", "cmd-clasificacion"),
                    ("/ult_carrera", "cmd-ult-carrera"),
                    ("/sprint", "cmd-sprint"),
                    ("/prox_carrera", "cmd-prox-carrera"),
                    ("/video", "cmd-video"),
                    ("/trivia", "cmd-trivia"),
                    ("/contacto", "cmd-contacto"),
                    ("/help", "cmd-help"),
                ]
                .iter()
                .map(|(command, key)| format!("{} - {}", command, t_lang(l10n, key, lang)))
                .collect::<Vec<_>>()
                .join("\n");

                format!(
                    "{}\n\n{}\n{}\n\n{}",
                    t_lang(l10n, "help-title", lang),
                    t_lang(l10n, "help-commands", lang),
                    commands,
                    t_lang(l10n, "help-footer", lang)
                )
            }
            StaticPage::Contact => format!(
                "{}\n\n{}",
                t_lang(l10n, "contact-title", lang),
                t_args_lang(l10n, "contact-body", &[("url", ctx.settings.contact_url.as_str())], lang)
            ),
            StaticPage::Video => format!(
                "{}\n\n{}",
                t_lang(l10n, "video-title", lang),
                t_args_lang(l10n, "video-body", &[("url", ctx.settings.video_url.as_str())], lang)
            ),
        }
    }
}

#[async_trait]
impl Handler for StaticHandler {
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()> {
        let text = self.render(ctx);
        replace_reply(ctx, &text, Some(back_to_menu_keyboard(ctx.localization, &ctx.lang))).await
    }
}

/// Ask a random TrivialF1 question
pub struct TriviaHandler;

#[async_trait]
impl Handler for TriviaHandler {
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()> {
        let (index, question) = trivia::random_question();
        let l10n = ctx.localization;
        let text = format!(
            "{}\n\n{}",
            t_lang(l10n, "trivia-title", Some(ctx.lang.as_str())),
            question.text(l10n, &ctx.lang)
        );
        let keyboard = trivia_question_keyboard(index, question, l10n, &ctx.lang);
        replace_reply(ctx, &text, Some(keyboard)).await
    }
}

/// Check a `trivia_answer:<question>:<option>` press
pub struct TriviaAnswerHandler;

#[async_trait]
impl Handler for TriviaAnswerHandler {
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()> {
        let lang = Some(ctx.lang.as_str());
        let l10n = ctx.localization;

        let answer = ctx
            .request
            .argument
            .as_deref()
            .and_then(trivia::parse_answer)
            .and_then(|(q, option)| Some((trivia::question(q)?, option)));

        let text = match answer {
            Some((question, option)) if question.is_correct(option) => {
                t_lang(l10n, "trivia-correct", lang)
            }
            Some((question, _)) => {
                let answer = question.correct_option(l10n, &ctx.lang);
                t_args_lang(l10n, "trivia-wrong", &[("answer", answer.as_str())], lang)
            }
            None => t_lang(l10n, "trivia-invalid", lang),
        };

        replace_reply(ctx, &text, Some(trivia_result_keyboard(l10n, &ctx.lang))).await
    }
}

/// Placeholder for buttons whose feature isn't built yet.
///
/// When the press left a "processing" notice on screen, the notice is
/// edited into the placeholder and becomes the active reply. Otherwise a new
/// message is sent.
pub struct ComingSoonHandler;

#[async_trait]
impl Handler for ComingSoonHandler {
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()> {
        let text = t_lang(ctx.localization, "coming-soon", Some(ctx.lang.as_str()));
        let keyboard = back_to_menu_keyboard(ctx.localization, &ctx.lang);

        let mut session = ctx.sessions.lock(ctx.chat_id()).await;
        session.clear_reply(ctx.messenger).await;

        if let Some(notice) = &ctx.notice {
            notice.keep();
            let message_id = notice.message_id();
            match ctx
                .messenger
                .edit_message_text(ctx.chat_id(), message_id, &text, Some(keyboard.clone()))
                .await
            {
                Ok(()) => {
                    session.record_reply(message_id);
                    return Ok(());
                }
                Err(e) => {
                    observability::record_delivery_failure("edit_notice");
                    error_logging::log_delivery_error(
                        &e,
                        "edit_notice",
                        ctx.chat_id().0,
                        Some(message_id.0),
                    );
                    // Its timer is gone, so remove it here before replying afresh
                    if let Err(e) = ctx.messenger.delete_message(ctx.chat_id(), message_id).await {
                        observability::record_delivery_failure("delete_notice");
                        error_logging::log_delivery_error(
                            &e,
                            "delete_notice",
                            ctx.chat_id().0,
                            Some(message_id.0),
                        );
                    }
                }
            }
        }

        send_and_record(ctx, &mut session, &text, Some(keyboard)).await
    }
}

/// Reply for typed commands and free text the bot doesn't understand
pub struct UnrecognizedHandler;

#[async_trait]
impl Handler for UnrecognizedHandler {
    async fn execute(&self, ctx: &HandlerContext<'_>) -> Result<()> {
        let lang = Some(ctx.lang.as_str());
        let l10n = ctx.localization;
        let text = format!(
            "{}\n\n{}\n\n{}",
            t_lang(l10n, "unrecognized-title", lang),
            t_args_lang(
                l10n,
                "unrecognized-body",
                &[("name", ctx.request.user_name.as_str())],
                lang
            ),
            t_lang(l10n, "unrecognized-tip", lang)
        );
        replace_reply(ctx, &text, Some(back_to_menu_keyboard(l10n, &ctx.lang))).await
    }
}
