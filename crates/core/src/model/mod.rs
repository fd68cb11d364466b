mod answer;
mod config;
mod ids;
mod question;
mod session;

pub use answer::Answer;
pub use config::{
    ConfigError, DEFAULT_QUESTION_COUNT, DEFAULT_TIME_PER_QUESTION, MAX_QUESTION_COUNT,
    MAX_TIME_PER_QUESTION, MIN_QUESTION_COUNT, MIN_TIME_PER_QUESTION, QuestionSource, QuizConfig,
    QuizConfigDraft, QuizMode,
};
pub use ids::{ParseIdError, QuestionId};
pub use question::{Difficulty, Question, QuestionDraft, QuestionError};
pub use session::{Advance, Session, SessionError};
