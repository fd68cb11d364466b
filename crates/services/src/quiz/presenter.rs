use quiz_core::summary::QuizSummary;

use super::view::QuestionSnapshot;

/// Sound cue requests. Only emitted when the session has sound enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Correct,
    Incorrect,
    Complete,
}

/// Output side of the engine.
///
/// The engine never renders anything itself; it reports what happened through
/// this port and the front-end decides how to show it.
pub trait QuizPresenter: Send + Sync {
    /// Status line for screen readers / the terminal footer.
    fn announce(&self, message: &str);

    /// The current question changed or needs redrawing.
    fn question_entered(&self, _snapshot: &QuestionSnapshot) {}

    /// Immediate correctness feedback (practice mode only).
    fn answer_feedback(&self, _correct: bool) {}

    fn play_cue(&self, _cue: Cue) {}

    fn session_finished(&self, _summary: &QuizSummary) {}
}

/// Presenter that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPresenter;

impl QuizPresenter for SilentPresenter {
    fn announce(&self, _message: &str) {}
}
