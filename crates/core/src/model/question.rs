use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least two choices, got {len}")]
    TooFewChoices { len: usize },

    #[error("duplicate choice: {0}")]
    DuplicateChoice(String),

    #[error("correct answer {0:?} is not one of the choices")]
    CorrectNotAmongChoices(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty label attached to a question.
///
/// Parsing is lenient: anything that is not easy/medium/hard becomes `Unknown`
/// so a sloppy question file never fails on this field alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Unknown,
}

impl Difficulty {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Difficulty> for &'static str {
    fn from(value: Difficulty) -> Self {
        value.as_str()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question shape, as read from a question file or a persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: String,
    pub question: String,
    pub choices: Vec<String>,
    pub correct: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl QuestionDraft {
    /// Validate the draft into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id or text is blank, there are fewer than
    /// two choices, a choice repeats, or `correct` is not one of the choices.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = QuestionId::new(self.id.trim());
        if id.is_blank() {
            return Err(QuestionError::EmptyId);
        }
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.choices.len() < 2 {
            return Err(QuestionError::TooFewChoices {
                len: self.choices.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.choices.len());
        for choice in &self.choices {
            if !seen.insert(choice.as_str()) {
                return Err(QuestionError::DuplicateChoice(choice.clone()));
            }
        }
        if !seen.contains(self.correct.as_str()) {
            return Err(QuestionError::CorrectNotAmongChoices(self.correct));
        }

        Ok(Question {
            id,
            question: self.question,
            choices: self.choices,
            correct: self.correct,
            category: self.category,
            difficulty: self.difficulty,
            time_limit: self.time_limit.filter(|secs| *secs > 0),
        })
    }
}

/// A validated multiple-choice question.
///
/// `correct` is always one of `choices`; the constructor is the only way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    question: String,
    choices: Vec<String>,
    correct: String,
    category: String,
    difficulty: Difficulty,
    time_limit: Option<u32>,
}

impl Question {
    /// Build and validate a question.
    ///
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        choices: Vec<String>,
        correct: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            id: id.into(),
            question: question.into(),
            choices,
            correct: correct.into(),
            category: String::new(),
            difficulty: Difficulty::Unknown,
            time_limit: None,
        }
        .validate()
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, secs: Option<u32>) -> Self {
        self.time_limit = secs.filter(|secs| *secs > 0);
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct(&self) -> &str {
        &self.correct
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Per-question override of the session's time per question.
    #[must_use]
    pub fn time_limit(&self) -> Option<u32> {
        self.time_limit
    }

    #[must_use]
    pub fn has_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|choice| choice == value)
    }

    #[must_use]
    pub fn is_correct(&self, value: &str) -> bool {
        self.correct == value
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(question: Question) -> Self {
        Self {
            id: question.id.as_str().to_owned(),
            question: question.question,
            choices: question.choices,
            correct: question.correct,
            category: question.category,
            difficulty: question.difficulty,
            time_limit: question.time_limit,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
