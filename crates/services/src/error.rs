//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizMode, SessionError};

/// Errors emitted by question providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("invalid trivia base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("trivia request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("trivia API answered with response code {0}")]
    Api(i64),
    #[error("trivia API returned no usable questions")]
    Empty,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `QuizEngine` operations.
///
/// None of these end a session; they reject a single operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz in progress")]
    NotStarted,
    #[error("quiz already finished")]
    Finished,
    #[error("quiz is paused")]
    SessionPaused,
    #[error("operation is only available in {expected} mode")]
    WrongMode { expected: QuizMode },
    #[error("answer can no longer be changed")]
    AnswerLocked,
    #[error("{0:?} is not one of the choices")]
    InvalidChoice(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Export(#[from] serde_json::Error),
}
