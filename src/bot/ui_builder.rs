//! UI Builder module for creating keyboards and formatting F1 records

use chrono::NaiveDate;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::models::{Constructor, Driver, QualifyingResult, Race, RaceResult};
use crate::trivia::TriviaQuestion;

/// Shown in place of any field the API left out
pub const MISSING_FIELD: &str = "N/A";

fn or_missing(value: Option<&str>) -> &str {
    value.unwrap_or(MISSING_FIELD)
}

fn button(localization: &LocalizationManager, key: &str, lang: &str, data: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(t_lang(localization, key, Some(lang)), data.to_string())
}

/// Main menu with one button per topic
pub fn main_menu_keyboard(localization: &LocalizationManager, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button(localization, "button-calendar", lang, "calendario"),
            button(localization, "button-drivers", lang, "pilotos"),
        ],
        vec![
            button(localization, "button-constructors", lang, "constructores"),
            button(localization, "button-qualifying", lang, "clasificacion"),
        ],
        vec![
            button(localization, "button-last-race", lang, "ult_carrera"),
            button(localization, "button-next-race", lang, "prox_carrera"),
        ],
        vec![
            button(localization, "button-sprint", lang, "sprint"),
            button(localization, "button-video", lang, "video"),
        ],
        vec![
            button(localization, "button-trivia", lang, "trivia"),
            button(localization, "button-help", lang, "help"),
        ],
        vec![button(localization, "button-contact", lang, "contacto")],
    ])
}

/// Single "main menu" button attached to every data reply
pub fn back_to_menu_keyboard(localization: &LocalizationManager, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        localization,
        "button-main-menu",
        lang,
        "main_menu",
    )]])
}

/// One button per option, payload `trivia_answer:<question>:<option>`
pub fn trivia_question_keyboard(
    question_index: usize,
    question: &TriviaQuestion,
    localization: &LocalizationManager,
    lang: &str,
) -> InlineKeyboardMarkup {
    let rows = (0..question.option_count)
        .map(|i| {
            vec![InlineKeyboardButton::callback(
                question.option_text(i, localization, lang),
                format!("trivia_answer:{}:{}", question_index, i),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Buttons shown after a trivia answer
pub fn trivia_result_keyboard(localization: &LocalizationManager, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button(localization, "button-another-question", lang, "trivia"),
        button(localization, "button-main-menu", lang, "main_menu"),
    ]])
}

fn line(localization: &LocalizationManager, lang: &str, label_key: &str, value: &str) -> String {
    format!("{}: {}", t_lang(localization, label_key, Some(lang)), value)
}

pub fn format_driver(driver: &Driver, localization: &LocalizationManager, lang: &str) -> String {
    [
        line(localization, lang, "label-name", &driver.full_name()),
        line(
            localization,
            lang,
            "label-number",
            or_missing(driver.permanent_number.as_deref()),
        ),
        line(
            localization,
            lang,
            "label-nationality",
            or_missing(driver.nationality.as_deref()),
        ),
        line(
            localization,
            lang,
            "label-birth-date",
            or_missing(driver.date_of_birth.as_deref()),
        ),
    ]
    .join("\n")
}

pub fn format_constructor(
    constructor: &Constructor,
    localization: &LocalizationManager,
    lang: &str,
) -> String {
    [
        line(localization, lang, "label-name", &constructor.name),
        line(
            localization,
            lang,
            "label-nationality",
            or_missing(constructor.nationality.as_deref()),
        ),
    ]
    .join("\n")
}

pub fn format_race(race: &Race, localization: &LocalizationManager, lang: &str) -> String {
    let location = race.location();
    [
        line(localization, lang, "label-grand-prix", &race.race_name),
        line(localization, lang, "label-date", or_missing(race.date.as_deref())),
        line(localization, lang, "label-location", or_missing(location.as_deref())),
    ]
    .join("\n")
}

pub fn format_qualifying(
    result: &QualifyingResult,
    localization: &LocalizationManager,
    lang: &str,
) -> String {
    [
        line(localization, lang, "label-driver", &result.driver.full_name()),
        line(
            localization,
            lang,
            "label-position",
            or_missing(result.position.as_deref()),
        ),
        line(localization, lang, "label-constructor", &result.constructor.name),
        format!("Q1: {}", or_missing(result.q1.as_deref())),
        format!("Q2: {}", or_missing(result.q2.as_deref())),
        format!("Q3: {}", or_missing(result.q3.as_deref())),
    ]
    .join("\n")
}

/// Used for both the last race and the sprint classification
pub fn format_race_result(
    result: &RaceResult,
    localization: &LocalizationManager,
    lang: &str,
) -> String {
    [
        line(
            localization,
            lang,
            "label-position",
            or_missing(result.position.as_deref()),
        ),
        line(localization, lang, "label-driver", &result.driver.full_name()),
        line(localization, lang, "label-constructor", &result.constructor.name),
        line(localization, lang, "label-time", or_missing(result.finishing_time())),
    ]
    .join("\n")
}

/// Whole days from `today` until the race date, negative once it has passed
pub fn days_until(date: &str, today: NaiveDate) -> Option<i64> {
    let race_day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((race_day - today).num_days())
}

fn countdown_text(localization: &LocalizationManager, lang: &str, days: Option<i64>) -> String {
    match days {
        None => MISSING_FIELD.to_string(),
        Some(d) if d < 0 => t_lang(localization, "countdown-past", Some(lang)),
        Some(0) => t_lang(localization, "countdown-today", Some(lang)),
        Some(1) => t_lang(localization, "countdown-tomorrow", Some(lang)),
        Some(d) => {
            let days = d.to_string();
            t_args_lang(localization, "countdown-days", &[("days", days.as_str())], Some(lang))
        }
    }
}

/// Schedule lines plus a countdown relative to `today`
pub fn format_next_race_on(
    race: &Race,
    localization: &LocalizationManager,
    lang: &str,
    today: NaiveDate,
) -> String {
    let days = race.date.as_deref().and_then(|d| days_until(d, today));
    format!(
        "{}\n{}",
        format_race(race, localization, lang),
        line(
            localization,
            lang,
            "label-countdown",
            &countdown_text(localization, lang, days)
        )
    )
}

pub fn format_next_race(race: &Race, localization: &LocalizationManager, lang: &str) -> String {
    format_next_race_on(race, localization, lang, chrono::Utc::now().date_naive())
}
