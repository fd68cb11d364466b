use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::model::{Answer, Question, QuestionId, QuizConfig, QuizMode};
use crate::timer::QuestionTimer;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a session needs at least one question")]
    NoQuestions,

    #[error("current index {index} is out of bounds for {len} questions")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(QuestionId),

    #[error("saved state refers to unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("timer has {remaining}s left of a {limit}s limit")]
    TimerOutOfRange { remaining: u32, limit: u32 },
}

fn check_unique_ids(questions: &[Question]) -> Result<(), SessionError> {
    if questions.is_empty() {
        return Err(SessionError::NoQuestions);
    }
    let mut seen = BTreeSet::new();
    for question in questions {
        if !seen.insert(question.id()) {
            return Err(SessionError::DuplicateQuestionId(question.id().clone()));
        }
    }
    Ok(())
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved { from: usize, to: usize },
    /// Already at the edge; nothing changed.
    Boundary,
}

impl Advance {
    #[must_use]
    pub fn moved(self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a quiz: question order, position, answers, timer and flags.
///
/// Every mutator keeps `current_index` in bounds. Deserialization goes through
/// the same check, so a corrupt saved session never becomes a live one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionRecord")]
pub struct Session {
    config: QuizConfig,
    questions: Vec<Question>,
    current_index: usize,
    answers: BTreeMap<QuestionId, Answer>,
    review: BTreeMap<QuestionId, bool>,
    #[serde(rename = "displayChoicesMap")]
    display_choices: BTreeMap<QuestionId, Vec<String>>,
    locked: BTreeSet<QuestionId>,
    timer: QuestionTimer,
    paused: bool,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    resume_pending: bool,
}

impl Session {
    /// Start a fresh session over an already ordered question list.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` if `questions` is empty and
    /// `SessionError::DuplicateQuestionId` if two questions share an id.
    pub fn new(
        config: QuizConfig,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        check_unique_ids(&questions)?;
        Ok(Self {
            config,
            questions,
            current_index: 0,
            answers: BTreeMap::new(),
            review: BTreeMap::new(),
            display_choices: BTreeMap::new(),
            locked: BTreeSet::new(),
            timer: QuestionTimer::new(),
            paused: false,
            started_at,
            finished_at: None,
            resume_pending: false,
        })
    }

    // ─── read side ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.config.mode()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, Answer> {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, id: &QuestionId) -> Option<&Answer> {
        self.answers.get(id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn review_flags(&self) -> &BTreeMap<QuestionId, bool> {
        &self.review
    }

    #[must_use]
    pub fn is_flagged(&self, id: &QuestionId) -> bool {
        self.review.get(id).copied().unwrap_or(false)
    }

    /// Indices of questions currently marked for review, in quiz order.
    #[must_use]
    pub fn flagged_indices(&self) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, q)| self.is_flagged(q.id()))
            .map(|(idx, _)| idx)
            .collect()
    }

    #[must_use]
    pub fn display_choices(&self, id: &QuestionId) -> Option<&[String]> {
        self.display_choices.get(id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_locked(&self, id: &QuestionId) -> bool {
        self.locked.contains(id)
    }

    #[must_use]
    pub fn timer(&self) -> &QuestionTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut QuestionTimer {
        &mut self.timer
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn resume_pending(&self) -> bool {
        self.resume_pending
    }

    /// `(current_index + 1) / total`; 0 for an empty list.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = (self.current_index + 1) as f64 / self.questions.len() as f64;
        fraction
    }

    // ─── mutators ───────────────────────────────────────────────────────────

    /// Record a pick for `id`, overwriting any earlier pick.
    ///
    /// Time taken is measured against the running countdown. Returns `None`
    /// for an unknown id.
    pub fn set_answer(&mut self, id: &QuestionId, selected: &str) -> Option<&Answer> {
        let question = self.questions.iter().find(|q| q.id() == id)?;
        let answer = Answer::chosen(selected, question.is_correct(selected), self.timer.elapsed());
        self.answers.insert(id.clone(), answer);
        self.answers.get(id)
    }

    /// Flip the review flag. Returns the new value, or `None` for an unknown id.
    pub fn toggle_review(&mut self, id: &QuestionId) -> Option<bool> {
        if self.question(id).is_none() {
            return None;
        }
        let flag = self.review.entry(id.clone()).or_insert(false);
        *flag = !*flag;
        Some(*flag)
    }

    /// Move by `delta`, clamped to the question list.
    pub fn advance(&mut self, delta: isize) -> Advance {
        let last = self.questions.len().saturating_sub(1);
        let target = self.current_index.saturating_add_signed(delta).min(last);
        self.move_to(target)
    }

    /// Move to an absolute position. Out-of-range targets are a no-op.
    pub fn jump_to(&mut self, index: usize) -> Advance {
        if index >= self.questions.len() {
            return Advance::Boundary;
        }
        self.move_to(index)
    }

    fn move_to(&mut self, target: usize) -> Advance {
        if target == self.current_index {
            return Advance::Boundary;
        }
        let from = self.current_index;
        self.current_index = target;
        Advance::Moved { from, to: target }
    }

    /// Insert a timeout answer unless the question already has one.
    ///
    /// Returns true when an answer was inserted.
    pub fn record_timeout_answer(&mut self, id: &QuestionId) -> bool {
        if self.question(id).is_none() || self.answers.contains_key(id) {
            return false;
        }
        let limit = self.timer.per_question_limit();
        self.answers.insert(id.clone(), Answer::timeout(limit));
        true
    }

    /// Freeze the answer for `id` if one exists.
    pub fn lock_if_answered(&mut self, id: &QuestionId) {
        if self.answers.contains_key(id) {
            self.locked.insert(id.clone());
        }
    }

    /// Fix the display order for `id` the first time it is seen.
    ///
    /// `arrange` receives a copy of the question's choices and may reorder it;
    /// later calls return the stored order untouched.
    pub fn fix_display_choices(
        &mut self,
        id: &QuestionId,
        arrange: impl FnOnce(&mut [String]),
    ) -> Option<&[String]> {
        if !self.display_choices.contains_key(id) {
            let mut choices = self.question(id)?.choices().to_vec();
            arrange(&mut choices);
            self.display_choices.insert(id.clone(), choices);
        }
        self.display_choices(id)
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Mark the session finished. Only the first call has an effect.
    pub fn finish(&mut self, at: DateTime<Utc>) -> bool {
        if self.finished_at.is_some() {
            return false;
        }
        self.timer.stop();
        self.finished_at = Some(at);
        true
    }

    pub fn mark_resume_pending(&mut self) {
        self.resume_pending = true;
    }

    /// Consume the resume flag, returning its previous value.
    pub fn take_resume_pending(&mut self) -> bool {
        std::mem::take(&mut self.resume_pending)
    }
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    config: QuizConfig,
    questions: Vec<Question>,
    current_index: usize,
    answers: BTreeMap<QuestionId, Answer>,
    review: BTreeMap<QuestionId, bool>,
    #[serde(rename = "displayChoicesMap")]
    display_choices: BTreeMap<QuestionId, Vec<String>>,
    #[serde(default)]
    locked: BTreeSet<QuestionId>,
    timer: QuestionTimer,
    paused: bool,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    resume_pending: bool,
}

impl TryFrom<SessionRecord> for Session {
    type Error = SessionError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        check_unique_ids(&record.questions)?;
        if record.current_index >= record.questions.len() {
            return Err(SessionError::IndexOutOfBounds {
                index: record.current_index,
                len: record.questions.len(),
            });
        }

        let known: BTreeSet<&QuestionId> = record.questions.iter().map(Question::id).collect();
        let referenced = record
            .answers
            .keys()
            .chain(record.review.keys())
            .chain(record.display_choices.keys())
            .chain(record.locked.iter());
        for id in referenced {
            if !known.contains(id) {
                return Err(SessionError::UnknownQuestion(id.clone()));
            }
        }

        let (remaining, limit) = (record.timer.remaining(), record.timer.per_question_limit());
        if remaining > limit {
            return Err(SessionError::TimerOutOfRange { remaining, limit });
        }

        Ok(Self {
            config: record.config,
            questions: record.questions,
            current_index: record.current_index,
            answers: record.answers,
            review: record.review,
            display_choices: record.display_choices,
            locked: record.locked,
            timer: record.timer,
            paused: record.paused,
            started_at: record.started_at,
            finished_at: record.finished_at,
            resume_pending: record.resume_pending,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuizConfigDraft;
    use crate::time::fixed_now;

    fn question(id: &str) -> Question {
        Question::new(
            id,
            format!("Question {id}"),
            vec!["Paris".into(), "London".into(), "Rome".into(), "Berlin".into()],
            "Paris",
        )
        .unwrap()
    }

    fn session(len: usize) -> Session {
        let questions = (1..=len).map(|i| question(&format!("q{i}"))).collect();
        Session::new(QuizConfig::default(), questions, fixed_now()).unwrap()
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = Session::new(QuizConfig::default(), Vec::new(), fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::NoQuestions);
    }

    #[test]
    fn advance_clamps_at_both_ends() {
        let mut s = session(3);
        assert_eq!(s.advance(-1), Advance::Boundary);
        assert_eq!(s.advance(1), Advance::Moved { from: 0, to: 1 });
        assert_eq!(s.advance(5), Advance::Moved { from: 1, to: 2 });
        assert_eq!(s.advance(1), Advance::Boundary);
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.advance(-10), Advance::Moved { from: 2, to: 0 });
    }

    #[test]
    fn index_stays_in_bounds_for_any_sequence() {
        let mut s = session(4);
        let deltas = [3, -7, 1, 1, 1, 1, 1, -2, 9, -1, 0, isize::MIN, isize::MAX];
        for delta in deltas {
            s.advance(delta);
            assert!(s.current_index() < s.total());
        }
    }

    #[test]
    fn jump_to_ignores_out_of_range() {
        let mut s = session(3);
        assert_eq!(s.jump_to(7), Advance::Boundary);
        assert_eq!(s.jump_to(2), Advance::Moved { from: 0, to: 2 });
        assert_eq!(s.jump_to(2), Advance::Boundary);
    }

    #[test]
    fn set_answer_scores_and_measures_time() {
        let mut s = session(1);
        s.timer_mut().start(30);
        for _ in 0..4 {
            s.timer_mut().tick();
        }
        let id = QuestionId::new("q1");

        let answer = s.set_answer(&id, "Paris").unwrap().clone();
        assert!(answer.correct);
        assert_eq!(answer.time_taken, 4);

        let answer = s.set_answer(&id, "Rome").unwrap().clone();
        assert!(!answer.correct);
        assert_eq!(answer.selected.as_deref(), Some("Rome"));
        assert_eq!(s.answered_count(), 1);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut s = session(1);
        let ghost = QuestionId::new("ghost");
        assert!(s.set_answer(&ghost, "Paris").is_none());
        assert!(s.toggle_review(&ghost).is_none());
        assert!(!s.record_timeout_answer(&ghost));
        assert!(s.answers().is_empty());
        assert!(s.review_flags().is_empty());
    }

    #[test]
    fn toggle_review_flips() {
        let mut s = session(2);
        let id = QuestionId::new("q2");
        assert_eq!(s.toggle_review(&id), Some(true));
        assert_eq!(s.flagged_indices(), vec![1]);
        assert_eq!(s.toggle_review(&id), Some(false));
        assert!(s.flagged_indices().is_empty());
    }

    #[test]
    fn timeout_answer_only_fills_gaps() {
        let mut s = session(2);
        s.timer_mut().start(30);
        let q1 = QuestionId::new("q1");
        assert!(s.record_timeout_answer(&q1));
        assert_eq!(s.answer(&q1), Some(&Answer::timeout(30)));

        let q2 = QuestionId::new("q2");
        s.set_answer(&q2, "Rome");
        assert!(!s.record_timeout_answer(&q2));
        assert_eq!(s.answer(&q2).unwrap().selected.as_deref(), Some("Rome"));
    }

    #[test]
    fn display_choices_are_fixed_on_first_visit() {
        let mut s = session(1);
        let id = QuestionId::new("q1");
        s.fix_display_choices(&id, |choices| choices.reverse());
        let first = s.display_choices(&id).unwrap().to_vec();
        assert_eq!(first[0], "Berlin");

        s.fix_display_choices(&id, |choices| choices.sort());
        assert_eq!(s.display_choices(&id).unwrap(), first.as_slice());
    }

    #[test]
    fn finish_happens_once() {
        let mut s = session(1);
        s.timer_mut().start(30);
        assert!(s.finish(fixed_now()));
        assert!(!s.timer().is_running());
        assert!(!s.finish(fixed_now() + chrono::Duration::seconds(5)));
        assert_eq!(s.finished_at(), Some(fixed_now()));
    }

    #[test]
    fn progress_is_one_based() {
        let mut s = session(4);
        assert!((s.progress() - 0.25).abs() < f64::EPSILON);
        s.advance(3);
        assert!((s.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serde_round_trips_every_field() {
        let config = QuizConfigDraft {
            mode: QuizMode::Test,
            time_per_question: 45,
            ..QuizConfigDraft::default()
        }
        .validate()
        .unwrap();
        let questions = vec![question("q1"), question("q2").with_time_limit(Some(12))];
        let mut s = Session::new(config, questions, fixed_now()).unwrap();
        s.timer_mut().start(45);
        s.timer_mut().tick();
        let q1 = QuestionId::new("q1");
        s.set_answer(&q1, "Rome");
        s.toggle_review(&q1);
        s.fix_display_choices(&q1, |c| c.rotate_left(1));
        s.lock_if_answered(&q1);
        s.advance(1);
        s.set_paused(true);
        s.mark_resume_pending();

        let json = serde_json::to_string(&s).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, s);
    }

    #[test]
    fn deserialize_rejects_out_of_bounds_index() {
        let s = session(2);
        let mut value = serde_json::to_value(&s).unwrap();
        value["currentIndex"] = serde_json::json!(5);
        let err = serde_json::from_value::<Session>(value).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let questions = vec![question("q1"), question("q2"), question("q1")];
        let err = Session::new(QuizConfig::default(), questions, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::DuplicateQuestionId(QuestionId::new("q1")));
    }

    #[test]
    fn deserialize_rejects_duplicate_ids() {
        let s = session(2);
        let mut value = serde_json::to_value(&s).unwrap();
        value["questions"][1]["id"] = serde_json::json!("q1");
        let err = serde_json::from_value::<Session>(value).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn deserialize_rejects_unknown_keys() {
        let mut s = session(2);
        let q1 = QuestionId::new("q1");
        s.set_answer(&q1, "Paris");
        s.toggle_review(&q1);
        let clean = serde_json::to_value(&s).unwrap();

        for field in ["answers", "review", "displayChoicesMap"] {
            let mut value = clean.clone();
            let entry = match field {
                "answers" => value["answers"]["q1"].clone(),
                "review" => serde_json::json!(true),
                _ => serde_json::json!(["Paris", "London", "Rome", "Berlin"]),
            };
            value[field]["ghost"] = entry;
            let err = serde_json::from_value::<Session>(value).unwrap_err();
            assert!(err.to_string().contains("unknown question ghost"), "{field}: {err}");
        }

        let mut value = clean;
        value["locked"] = serde_json::json!(["ghost"]);
        assert!(serde_json::from_value::<Session>(value).is_err());
    }

    #[test]
    fn deserialize_rejects_remaining_above_limit() {
        let mut s = session(1);
        s.timer_mut().start(30);
        let mut value = serde_json::to_value(&s).unwrap();
        value["timer"]["remaining"] = serde_json::json!(31);
        let err = serde_json::from_value::<Session>(value).unwrap_err();
        assert!(err.to_string().contains("31s left of a 30s limit"));
    }
}
