//! TrivialF1 question bank
//!
//! Only keys and answers live here. Question and option texts come from the
//! Fluent bundles under `trivia-q<N>` and `trivia-q<N>-opt<M>`.

use rand::Rng;

use crate::localization::{t_lang, LocalizationManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriviaQuestion {
    /// Fluent key of the question text
    pub key: &'static str,
    pub option_count: usize,
    /// Index of the right option
    pub answer: usize,
}

impl TriviaQuestion {
    const fn new(key: &'static str, answer: usize) -> Self {
        Self {
            key,
            option_count: 3,
            answer,
        }
    }

    pub fn text(&self, localization: &LocalizationManager, lang: &str) -> String {
        t_lang(localization, self.key, Some(lang))
    }

    pub fn option_key(&self, option: usize) -> String {
        format!("{}-opt{}", self.key, option)
    }

    pub fn option_text(&self, option: usize, localization: &LocalizationManager, lang: &str) -> String {
        t_lang(localization, &self.option_key(option), Some(lang))
    }

    pub fn correct_option(&self, localization: &LocalizationManager, lang: &str) -> String {
        self.option_text(self.answer, localization, lang)
    }

    pub fn is_correct(&self, option: usize) -> bool {
        option == self.answer
    }
}

pub const QUESTIONS: &[TriviaQuestion] = &[
    TriviaQuestion::new("trivia-q1", 1),
    TriviaQuestion::new("trivia-q2", 1),
    TriviaQuestion::new("trivia-q3", 0),
    TriviaQuestion::new("trivia-q4", 2),
    TriviaQuestion::new("trivia-q5", 0),
    TriviaQuestion::new("trivia-q6", 1),
    TriviaQuestion::new("trivia-q7", 2),
    TriviaQuestion::new("trivia-q8", 1),
];

/// Question at `index`, if the bank has one
pub fn question(index: usize) -> Option<&'static TriviaQuestion> {
    QUESTIONS.get(index)
}

/// Pick a random question and return it together with its index
pub fn random_question() -> (usize, &'static TriviaQuestion) {
    let index = rand::rng().random_range(0..QUESTIONS.len());
    (index, &QUESTIONS[index])
}

/// Parse a `<question>:<option>` answer argument
pub fn parse_answer(argument: &str) -> Option<(usize, usize)> {
    let (question, option) = argument.split_once(':')?;
    Some((question.trim().parse().ok()?, option.trim().parse().ok()?))
}
