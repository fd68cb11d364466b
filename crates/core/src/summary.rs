use serde::{Deserialize, Serialize};

use crate::model::{Answer, QuestionId, Session};

/// Accuracy at or above which a finished quiz is worth celebrating.
pub const CELEBRATE_ACCURACY: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Correct,
    Incorrect,
    Unanswered,
}

impl QuestionStatus {
    /// Classify a question by its recorded answer.
    ///
    /// Timeout answers (`selected == None`) count as unanswered.
    #[must_use]
    pub fn classify(answer: Option<&Answer>) -> Self {
        match answer {
            Some(a) if a.correct => Self::Correct,
            Some(a) if a.selected.is_some() => Self::Incorrect,
            _ => Self::Unanswered,
        }
    }
}

/// One row of the per-question breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    pub index: usize,
    pub id: QuestionId,
    pub question: String,
    pub status: QuestionStatus,
    pub selected: Option<String>,
    pub time_taken: Option<u32>,
}

/// Derived results for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
    /// Rounded percentage, 0 when there are no questions.
    pub accuracy: u32,
    /// Sum of `time_taken` over recorded answers, in seconds.
    pub total_time: u64,
    pub breakdown: Vec<BreakdownItem>,
}

impl QuizSummary {
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let mut correct = 0_u32;
        let mut incorrect = 0_u32;
        let mut unanswered = 0_u32;
        let mut total_time = 0_u64;
        let mut breakdown = Vec::with_capacity(session.total());

        for (index, question) in session.questions().iter().enumerate() {
            let answer = session.answer(question.id());
            let status = QuestionStatus::classify(answer);
            match status {
                QuestionStatus::Correct => correct += 1,
                QuestionStatus::Incorrect => incorrect += 1,
                QuestionStatus::Unanswered => unanswered += 1,
            }
            if let Some(answer) = answer {
                total_time += u64::from(answer.time_taken);
            }
            breakdown.push(BreakdownItem {
                index,
                id: question.id().clone(),
                question: question.text().to_owned(),
                status,
                selected: answer.and_then(|a| a.selected.clone()),
                time_taken: answer.map(|a| a.time_taken),
            });
        }

        let total = correct + incorrect + unanswered;
        Self {
            total,
            correct,
            incorrect,
            unanswered,
            accuracy: accuracy_percent(correct, total),
            total_time,
            breakdown,
        }
    }

    #[must_use]
    pub fn celebrate(&self) -> bool {
        self.total > 0 && self.accuracy >= CELEBRATE_ACCURACY
    }
}

/// `round(correct / total * 100)` with halves rounded up; 0 when `total == 0`.
#[must_use]
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(correct) * 200 + u64::from(total);
    let percent = scaled / (u64::from(total) * 2);
    u32::try_from(percent).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuizConfig};
    use crate::time::fixed_now;

    fn session(len: usize) -> Session {
        let questions = (1..=len)
            .map(|i| {
                Question::new(
                    format!("q{i}"),
                    format!("Question {i}"),
                    vec!["Paris".into(), "London".into(), "Rome".into()],
                    "Paris",
                )
                .unwrap()
            })
            .collect();
        Session::new(QuizConfig::default(), questions, fixed_now()).unwrap()
    }

    #[test]
    fn accuracy_rounds_instead_of_truncating() {
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(1, 8), 13);
        assert_eq!(accuracy_percent(3, 3), 100);
        assert_eq!(accuracy_percent(0, 0), 0);
    }

    #[test]
    fn classifies_each_question() {
        let mut s = session(4);
        s.timer_mut().start(30);
        s.set_answer(&QuestionId::new("q1"), "Paris");
        s.set_answer(&QuestionId::new("q2"), "Rome");
        s.record_timeout_answer(&QuestionId::new("q3"));

        let summary = QuizSummary::from_session(&s);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.unanswered, 2);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.accuracy, 25);
        assert_eq!(summary.total_time, 30);

        let statuses: Vec<_> = summary.breakdown.iter().map(|b| b.status).collect();
        assert_eq!(
            statuses,
            vec![
                QuestionStatus::Correct,
                QuestionStatus::Incorrect,
                QuestionStatus::Unanswered,
                QuestionStatus::Unanswered,
            ]
        );
        assert_eq!(summary.breakdown[3].time_taken, None);
    }

    #[test]
    fn counts_always_add_up() {
        let picks = ["Paris", "Rome", "London"];
        for len in 1..=6 {
            let mut s = session(len);
            s.timer_mut().start(20);
            for (i, q) in s.questions().to_vec().iter().enumerate() {
                match i % 4 {
                    0 => {}
                    1 => {
                        s.record_timeout_answer(q.id());
                    }
                    n => {
                        s.set_answer(q.id(), picks[n % picks.len()]);
                    }
                }
            }
            let summary = QuizSummary::from_session(&s);
            assert_eq!(
                summary.correct + summary.incorrect + summary.unanswered,
                summary.total
            );
            assert_eq!(summary.total as usize, len);
        }
    }

    #[test]
    fn celebrates_high_scores_only() {
        let mut s = session(5);
        s.timer_mut().start(30);
        for q in s.questions().to_vec().iter().take(4) {
            s.set_answer(q.id(), "Paris");
        }
        assert!(QuizSummary::from_session(&s).celebrate());

        let s = session(5);
        assert!(!QuizSummary::from_session(&s).celebrate());
    }
}
