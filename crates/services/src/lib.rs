#![forbid(unsafe_code)]

pub mod error;
pub mod provider;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::{ProviderError, QuizError};
pub use provider::{QuestionProvider, TriviaConfig, TriviaProvider, fallback_questions};
pub use quiz::{
    Cue, NextOrSubmit, QuestionSnapshot, QuizEngine, QuizPresenter, QuizState, ResultsExport,
    Resume, SilentPresenter, StartReport, TickReport, Ticker,
};
