use quiz_core::model::{Answer, Difficulty, QuestionId, QuizMode, Session};
use quiz_core::timer::{QuestionTimer, TimerPhase};

/// Engine lifecycle: `NotStarted -> InProgress <-> Paused -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizState {
    NotStarted,
    InProgress,
    Paused,
    Finished,
}

impl QuizState {
    #[must_use]
    pub fn of(session: Option<&Session>) -> Self {
        match session {
            None => Self::NotStarted,
            Some(s) if s.is_finished() => Self::Finished,
            Some(s) if s.is_paused() => Self::Paused,
            Some(_) => Self::InProgress,
        }
    }
}

/// How a single choice should be marked when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceMark {
    Plain,
    Selected,
    /// Practice-mode reveal: the selected choice was right.
    Correct,
    /// Practice-mode reveal: the selected choice was wrong.
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub text: String,
    pub mark: ChoiceMark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub remaining: u32,
    pub limit: u32,
    pub fraction: f64,
    pub low: bool,
}

impl From<&QuestionTimer> for TimerSnapshot {
    fn from(timer: &QuestionTimer) -> Self {
        Self {
            phase: timer.phase(),
            remaining: timer.remaining(),
            limit: timer.per_question_limit(),
            fraction: timer.fraction(),
            low: timer.is_low(),
        }
    }
}

/// Presentation-agnostic view of the current question.
///
/// Carries no formatted strings beyond the question content itself.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSnapshot {
    pub state: QuizState,
    pub mode: QuizMode,
    pub index: usize,
    pub total: usize,
    pub progress: f64,
    pub id: QuestionId,
    pub text: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub choices: Vec<ChoiceView>,
    pub answer: Option<Answer>,
    pub flagged: bool,
    pub locked: bool,
    pub flagged_indices: Vec<usize>,
    pub answered: usize,
    pub timer: TimerSnapshot,
}

impl QuestionSnapshot {
    #[must_use]
    pub fn from_session(session: &Session) -> Option<Self> {
        let question = session.current_question()?;
        let id = question.id();
        let answer = session.answer(id).cloned();
        let selected = answer.as_ref().and_then(|a| a.selected.as_deref());
        let reveal = session.mode().reveals_immediately();

        let order = session
            .display_choices(id)
            .unwrap_or_else(|| question.choices());
        let choices = order
            .iter()
            .map(|text| {
                let mark = match selected {
                    Some(pick) if pick == text && reveal => {
                        if question.is_correct(pick) {
                            ChoiceMark::Correct
                        } else {
                            ChoiceMark::Incorrect
                        }
                    }
                    Some(pick) if pick == text => ChoiceMark::Selected,
                    _ => ChoiceMark::Plain,
                };
                ChoiceView {
                    text: text.clone(),
                    mark,
                }
            })
            .collect();

        Some(Self {
            state: QuizState::of(Some(session)),
            mode: session.mode(),
            index: session.current_index(),
            total: session.total(),
            progress: session.progress(),
            id: id.clone(),
            text: question.text().to_owned(),
            category: question.category().to_owned(),
            difficulty: question.difficulty(),
            choices,
            answer,
            flagged: session.is_flagged(id),
            locked: session.is_locked(id),
            flagged_indices: session.flagged_indices(),
            answered: session.answered_count(),
            timer: TimerSnapshot::from(session.timer()),
        })
    }

    /// Choice text at a zero-based display position.
    #[must_use]
    pub fn choice_at(&self, position: usize) -> Option<&str> {
        self.choices.get(position).map(|c| c.text.as_str())
    }
}
