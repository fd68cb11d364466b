use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::question::Difficulty;

pub const DEFAULT_TIME_PER_QUESTION: u32 = 30;
pub const MIN_TIME_PER_QUESTION: u32 = 5;
pub const MAX_TIME_PER_QUESTION: u32 = 300;

pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const MIN_QUESTION_COUNT: u32 = 1;
pub const MAX_QUESTION_COUNT: u32 = 50;

/// Practice reveals correctness per answer; test holds all feedback for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Practice,
    Test,
}

impl QuizMode {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "practice" => Some(Self::Practice),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Test => "test",
        }
    }

    #[must_use]
    pub fn reveals_immediately(self) -> bool {
        matches!(self, Self::Practice)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where questions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    #[default]
    Local,
    Remote,
}

impl QuestionSource {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "remote" | "opentdb" => Some(Self::Remote),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("time per question must be between 5 and 300 seconds, got {0}")]
    InvalidTimePerQuestion(u32),

    #[error("question count must be between 1 and 50, got {0}")]
    InvalidQuestionCount(u32),

    #[error("category filter must be a positive id")]
    InvalidCategory,

    #[error("difficulty filter must be easy, medium or hard")]
    InvalidDifficulty,
}

/// Settings a quiz is started with.
///
/// The session keeps its own copy so a resumed quiz shuffles and times
/// questions the same way it did before the reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct QuizConfig {
    mode: QuizMode,
    time_per_question: u32,
    question_count: u32,
    shuffle_questions: bool,
    shuffle_choices: bool,
    source: QuestionSource,
    category: Option<u32>,
    difficulty: Option<Difficulty>,
    sound_enabled: bool,
}

/// Unvalidated settings, filled from CLI flags or environment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuizConfigDraft {
    pub mode: QuizMode,
    pub time_per_question: u32,
    pub question_count: u32,
    pub shuffle_questions: bool,
    pub shuffle_choices: bool,
    pub source: QuestionSource,
    pub category: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub sound_enabled: bool,
}

impl Default for QuizConfigDraft {
    fn default() -> Self {
        Self {
            mode: QuizMode::Practice,
            time_per_question: DEFAULT_TIME_PER_QUESTION,
            question_count: DEFAULT_QUESTION_COUNT,
            shuffle_questions: true,
            shuffle_choices: true,
            source: QuestionSource::Local,
            category: None,
            difficulty: None,
            sound_enabled: false,
        }
    }
}

impl QuizConfigDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a limit is out of range or a filter is unusable.
    pub fn validate(self) -> Result<QuizConfig, ConfigError> {
        if !(MIN_TIME_PER_QUESTION..=MAX_TIME_PER_QUESTION).contains(&self.time_per_question) {
            return Err(ConfigError::InvalidTimePerQuestion(self.time_per_question));
        }
        if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&self.question_count) {
            return Err(ConfigError::InvalidQuestionCount(self.question_count));
        }
        if self.category == Some(0) {
            return Err(ConfigError::InvalidCategory);
        }
        if matches!(self.difficulty, Some(d) if !d.is_known()) {
            return Err(ConfigError::InvalidDifficulty);
        }

        Ok(QuizConfig {
            mode: self.mode,
            time_per_question: self.time_per_question,
            question_count: self.question_count,
            shuffle_questions: self.shuffle_questions,
            shuffle_choices: self.shuffle_choices,
            source: self.source,
            category: self.category,
            difficulty: self.difficulty,
            sound_enabled: self.sound_enabled,
        })
    }
}

impl QuizConfig {
    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn time_per_question(&self) -> u32 {
        self.time_per_question
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn shuffle_choices(&self) -> bool {
        self.shuffle_choices
    }

    #[must_use]
    pub fn source(&self) -> QuestionSource {
        self.source
    }

    #[must_use]
    pub fn category(&self) -> Option<u32> {
        self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            mode: QuizMode::Practice,
            time_per_question: DEFAULT_TIME_PER_QUESTION,
            question_count: DEFAULT_QUESTION_COUNT,
            shuffle_questions: true,
            shuffle_choices: true,
            source: QuestionSource::Local,
            category: None,
            difficulty: None,
            sound_enabled: false,
        }
    }
}
