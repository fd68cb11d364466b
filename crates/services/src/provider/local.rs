use std::collections::HashSet;
use std::path::Path;

use quiz_core::model::{Difficulty, Question, QuestionDraft};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum LocalLoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
    #[error("question file contains no valid questions")]
    Empty,
}

/// Read a JSON array of questions; invalid entries are skipped.
pub(crate) async fn read_question_file(path: &Path) -> Result<Vec<Question>, LocalLoadError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let drafts: Vec<QuestionDraft> = serde_json::from_str(&raw)?;

    let mut seen = HashSet::new();
    let questions: Vec<Question> = drafts
        .into_iter()
        .enumerate()
        .filter_map(|(position, draft)| match draft.validate() {
            Ok(question) if !seen.insert(question.id().clone()) => {
                tracing::warn!(
                    position,
                    id = %question.id(),
                    "skipping repeated local question id"
                );
                None
            }
            Ok(question) => Some(question),
            Err(err) => {
                tracing::warn!(position, error = %err, "skipping invalid local question");
                None
            }
        })
        .collect();

    if questions.is_empty() {
        return Err(LocalLoadError::Empty);
    }
    Ok(questions)
}

fn embedded(
    id: &str,
    question: &str,
    choices: [&str; 4],
    correct: &str,
    category: &str,
) -> QuestionDraft {
    QuestionDraft {
        id: id.into(),
        question: question.into(),
        choices: choices.iter().map(ToString::to_string).collect(),
        correct: correct.into(),
        category: category.into(),
        difficulty: Difficulty::Easy,
        time_limit: Some(30),
    }
}

/// Built-in questions used when no other source is available.
#[must_use]
pub fn fallback_questions() -> Vec<Question> {
    [
        embedded(
            "q1",
            "What is the capital of France?",
            ["Paris", "London", "Rome", "Berlin"],
            "Paris",
            "Geography",
        ),
        embedded(
            "q2",
            "2 + 2 equals?",
            ["3", "4", "5", "22"],
            "4",
            "Mathematics",
        ),
        embedded(
            "q3",
            "Which language runs in a web browser?",
            ["Java", "C", "Python", "JavaScript"],
            "JavaScript",
            "Technology",
        ),
    ]
    .into_iter()
    .filter_map(|draft| draft.validate().ok())
    .collect()
}
