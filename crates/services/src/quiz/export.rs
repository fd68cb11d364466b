use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, Difficulty, QuestionId, QuizMode, Session};
use quiz_core::summary::QuizSummary;
use serde::{Deserialize, Serialize};

pub const EXPORT_APP_NAME: &str = "QuizzyBee";
pub const EXPORT_VERSION: &str = "2.0";

/// Self-contained results document.
///
/// Carries no choice lists, display order or timer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsExport {
    pub meta: ExportMeta,
    pub questions: Vec<ExportQuestion>,
    pub answers: BTreeMap<QuestionId, Answer>,
    pub summary: ExportSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub app: String,
    pub version: String,
    /// Epoch milliseconds.
    pub started_at: i64,
    /// Epoch milliseconds; export time when the session is unfinished.
    pub finished_at: i64,
    pub mode: QuizMode,
    pub time_per_question: u32,
    pub total_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuestion {
    pub id: QuestionId,
    pub question: String,
    pub correct: String,
    pub category: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub correct: u32,
    pub total: u32,
    pub accuracy: u32,
    pub total_time: u64,
}

impl ResultsExport {
    #[must_use]
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        let summary = QuizSummary::from_session(session);
        let config = session.config();
        Self {
            meta: ExportMeta {
                app: EXPORT_APP_NAME.to_string(),
                version: EXPORT_VERSION.to_string(),
                started_at: session.started_at().timestamp_millis(),
                finished_at: session.finished_at().unwrap_or(now).timestamp_millis(),
                mode: config.mode(),
                time_per_question: config.time_per_question(),
                total_questions: session.total(),
            },
            questions: session
                .questions()
                .iter()
                .map(|q| ExportQuestion {
                    id: q.id().clone(),
                    question: q.text().to_owned(),
                    correct: q.correct().to_owned(),
                    category: q.category().to_owned(),
                    difficulty: q.difficulty(),
                })
                .collect(),
            answers: session.answers().clone(),
            summary: ExportSummary {
                correct: summary.correct,
                total: summary.total,
                accuracy: summary.accuracy,
                total_time: summary.total_time,
            },
        }
    }

    /// # Errors
    ///
    /// Returns `serde_json::Error` if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Suggested file name, e.g. `quizzybee-results-2023-11-14T22-13-20.json`.
#[must_use]
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!(
        "quizzybee-results-{}.json",
        now.format("%Y-%m-%dT%H-%M-%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuizConfig};
    use quiz_core::time::fixed_now;

    fn session() -> Session {
        let questions = ["q1", "q2", "q3"]
            .into_iter()
            .map(|id| {
                Question::new(
                    id,
                    format!("Question {id}"),
                    vec!["Paris".into(), "Rome".into()],
                    "Paris",
                )
                .unwrap()
                .with_category("Geography")
            })
            .collect();
        Session::new(QuizConfig::default(), questions, fixed_now()).unwrap()
    }

    #[test]
    fn two_of_three_rounds_to_sixty_seven() {
        let mut s = session();
        s.timer_mut().start(30);
        s.set_answer(&QuestionId::new("q1"), "Paris");
        s.set_answer(&QuestionId::new("q2"), "Paris");

        let export = ResultsExport::from_session(&s, fixed_now());
        assert_eq!(export.summary.correct, 2);
        assert_eq!(export.summary.total, 3);
        assert_eq!(export.summary.accuracy, 67);
        assert_eq!(export.answers.len(), 2);
    }

    #[test]
    fn unfinished_session_uses_export_time() {
        let s = session();
        let later = fixed_now() + chrono::Duration::seconds(90);
        let export = ResultsExport::from_session(&s, later);
        assert_eq!(export.meta.started_at, fixed_now().timestamp_millis());
        assert_eq!(export.meta.finished_at, later.timestamp_millis());
        assert_eq!(export.meta.app, EXPORT_APP_NAME);
        assert_eq!(export.meta.total_questions, 3);
    }

    #[test]
    fn json_uses_camel_case_and_omits_choices() {
        let export = ResultsExport::from_session(&session(), fixed_now());
        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["meta"]["version"], "2.0");
        assert_eq!(value["meta"]["mode"], "practice");
        assert_eq!(value["meta"]["timePerQuestion"], 30);
        assert!(value["summary"].get("totalTime").is_some());
        assert!(value["questions"][0].get("choices").is_none());
        assert_eq!(value["questions"][0]["difficulty"], "unknown");
    }

    #[test]
    fn file_name_is_filesystem_safe() {
        assert_eq!(
            export_file_name(fixed_now()),
            "quizzybee-results-2023-11-14T22-13-20.json"
        );
    }
}
