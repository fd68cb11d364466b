use std::borrow::Cow;

use quiz_core::model::{Difficulty, Question, QuestionDraft};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ProviderError;

/// Body of an Open Trivia DB `api.php` response (`encode=url3986`).
#[derive(Debug, Deserialize)]
pub(crate) struct TriviaResponse {
    pub response_code: i64,
    #[serde(default)]
    pub results: Vec<TriviaRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TriviaRecord {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Percent-decode a field; text that is not valid encoding is kept verbatim.
pub(crate) fn decode_text(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_owned())
}

pub(crate) fn into_questions<R: Rng + ?Sized>(
    response: TriviaResponse,
    rng: &mut R,
) -> Result<Vec<Question>, ProviderError> {
    if response.response_code != 0 {
        return Err(ProviderError::Api(response.response_code));
    }
    let questions = normalize_records(response.results, rng);
    if questions.is_empty() {
        return Err(ProviderError::Empty);
    }
    Ok(questions)
}

/// Decode records and merge the correct answer into a shuffled choice list.
///
/// Records that do not form a valid question (e.g. duplicate choices after
/// decoding) are dropped.
pub(crate) fn normalize_records<R: Rng + ?Sized>(
    records: Vec<TriviaRecord>,
    rng: &mut R,
) -> Vec<Question> {
    records
        .into_iter()
        .filter_map(|record| {
            let correct = decode_text(&record.correct_answer);
            let mut choices: Vec<String> = record
                .incorrect_answers
                .iter()
                .map(|answer| decode_text(answer))
                .collect();
            choices.push(correct.clone());
            choices.shuffle(rng);

            let draft = QuestionDraft {
                id: Uuid::new_v4().to_string(),
                question: decode_text(&record.question),
                choices,
                correct,
                category: decode_text(&record.category),
                difficulty: Difficulty::parse(&decode_text(&record.difficulty)),
                time_limit: None,
            };
            match draft.validate() {
                Ok(question) => Some(question),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed trivia record");
                    None
                }
            }
        })
        .collect()
}
