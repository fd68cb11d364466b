use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Advance, Answer, Question, QuestionSource, QuizConfig, QuizMode, Session};
use quiz_core::summary::QuizSummary;
use quiz_core::timer::{QuestionTimer, Tick};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use storage::repository::SessionStore;

use super::export::ResultsExport;
use super::presenter::{Cue, QuizPresenter};
use super::view::{QuestionSnapshot, QuizState};
use crate::error::QuizError;
use crate::provider::{QuestionProvider, fallback_questions};

const MSG_FALLBACK: &str = "Error loading questions. Using fallback questions.";
const MSG_TIMEOUT: &str = "Time is up. Moving to next question.";
const MSG_RESUMED: &str = "Session resumed successfully";
const MSG_NOTHING_SAVED: &str = "No saved session found";
const MSG_EXPORTED: &str = "Results exported successfully";

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartReport {
    pub total: usize,
    /// The configured source failed and the fallback list was used.
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReport {
    /// No countdown was running.
    Ignored,
    Counted { remaining: u32 },
    /// The countdown hit zero; a timeout answer was recorded if needed.
    TimedOut { advance: Advance },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOrSubmit {
    Advanced(Advance),
    Submitted(QuizSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Restored { index: usize },
    NothingSaved,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    By(isize),
    To(usize),
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives one quiz session at a time.
///
/// Owned by a single task; every operation takes `&mut self`, so a timer tick
/// and a user action can never interleave. State is written to the session
/// store after each change. Store failures are logged and otherwise ignored.
pub struct QuizEngine {
    clock: Clock,
    provider: Arc<dyn QuestionProvider>,
    store: Arc<dyn SessionStore>,
    presenter: Arc<dyn QuizPresenter>,
    rng: StdRng,
    session: Option<Session>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        clock: Clock,
        provider: Arc<dyn QuestionProvider>,
        store: Arc<dyn SessionStore>,
        presenter: Arc<dyn QuizPresenter>,
    ) -> Self {
        Self {
            clock,
            provider,
            store,
            presenter,
            rng: StdRng::from_os_rng(),
            session: None,
        }
    }

    /// Use a seeded RNG so question and choice order are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ─── read side ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> QuizState {
        QuizState::of(self.session.as_ref())
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn timer(&self) -> Option<&QuestionTimer> {
        self.session.as_ref().map(Session::timer)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<QuestionSnapshot> {
        self.session.as_ref().and_then(QuestionSnapshot::from_session)
    }

    #[must_use]
    pub fn compute_summary(&self) -> Option<QuizSummary> {
        self.session.as_ref().map(QuizSummary::from_session)
    }

    /// Whether the store currently holds a session.
    pub async fn has_saved_session(&self) -> bool {
        match self.store.load().await {
            Ok(saved) => saved.is_some(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read saved session");
                false
            }
        }
    }

    // ─── lifecycle ──────────────────────────────────────────────────────────

    /// Fetch questions and begin a new session, replacing any current one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if no questions could be produced at all.
    pub async fn start_session(&mut self, config: QuizConfig) -> Result<StartReport, QuizError> {
        self.stop_timer();

        let (mut questions, used_fallback) = self.load_questions(&config).await;
        if config.shuffle_questions() {
            questions.shuffle(&mut self.rng);
        }
        questions.truncate(usize::try_from(config.question_count()).unwrap_or(usize::MAX));

        let mode = config.mode();
        let session = Session::new(config, questions, self.clock.now())?;
        let total = session.total();
        self.session = Some(session);

        self.enter_current_question();
        self.persist().await;

        tracing::info!(total, %mode, used_fallback, "quiz started");
        self.presenter
            .announce(&format!("Quiz started with {total} questions in {mode} mode"));
        self.present_current();

        Ok(StartReport {
            total,
            used_fallback,
        })
    }

    /// Restore the stored session, continuing its countdown where it stopped.
    pub async fn resume_session(&mut self) -> Resume {
        let saved = match self.store.load().await {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(error = %err, "could not load saved session");
                None
            }
        };
        let Some(mut session) = saved else {
            self.presenter.announce(MSG_NOTHING_SAVED);
            return Resume::NothingSaved;
        };

        self.stop_timer();
        let index = session.current_index();
        let finished = session.is_finished();
        if !finished {
            session.mark_resume_pending();
        }
        self.session = Some(session);

        self.enter_current_question();
        self.persist().await;

        tracing::info!(index, finished, "quiz session resumed");
        self.presenter.announce(MSG_RESUMED);
        self.present_current();
        Resume::Restored { index }
    }

    /// Drop the current session and clear the store.
    pub async fn start_new(&mut self) {
        self.stop_timer();
        self.session = None;
        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "could not clear saved session");
        }
    }

    /// Same as [`QuizEngine::start_new`]; offered from the results screen.
    pub async fn restart(&mut self) {
        self.start_new().await;
    }

    /// Finish a test-mode session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::WrongMode` in practice mode, plus the lifecycle
    /// errors of [`QuizEngine::end`].
    pub async fn submit(&mut self) -> Result<QuizSummary, QuizError> {
        let session = self.active()?;
        if session.mode() != QuizMode::Test {
            return Err(QuizError::WrongMode {
                expected: QuizMode::Test,
            });
        }
        self.end().await
    }

    /// Finish the session in either mode and return its summary.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` or `QuizError::Finished`.
    pub async fn end(&mut self) -> Result<QuizSummary, QuizError> {
        let now = self.clock.now();
        let session = self.active_mut()?;
        session.set_paused(false);
        session.finish(now);
        let summary = QuizSummary::from_session(session);
        let sound = session.config().sound_enabled();

        self.persist().await;

        tracing::info!(
            correct = summary.correct,
            total = summary.total,
            accuracy = summary.accuracy,
            "quiz finished"
        );
        if sound {
            self.presenter.play_cue(Cue::Complete);
        }
        self.presenter.session_finished(&summary);
        Ok(summary)
    }

    // ─── answering ──────────────────────────────────────────────────────────

    /// Record `value` as the answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidChoice` if `value` is not a choice,
    /// `QuizError::AnswerLocked` for a locked test-mode answer, or a lifecycle
    /// error.
    pub async fn select_choice(&mut self, value: &str) -> Result<Answer, QuizError> {
        let session = self.running_mut()?;
        let Some(question) = session.current_question() else {
            return Err(QuizError::NotStarted);
        };
        let id = question.id().clone();
        if session.is_locked(&id) {
            return Err(QuizError::AnswerLocked);
        }
        if !question.has_choice(value) {
            return Err(QuizError::InvalidChoice(value.to_owned()));
        }

        let answer = session
            .set_answer(&id, value)
            .cloned()
            .ok_or_else(|| QuizError::InvalidChoice(value.to_owned()))?;
        let reveal = session.mode().reveals_immediately();
        let sound = session.config().sound_enabled();
        tracing::debug!(question = %id, correct = answer.correct, "answer recorded");

        if reveal {
            self.presenter.answer_feedback(answer.correct);
            if sound {
                self.presenter.play_cue(if answer.correct {
                    Cue::Correct
                } else {
                    Cue::Incorrect
                });
            }
        }
        self.persist().await;
        self.present_current();
        Ok(answer)
    }

    /// Flip the review flag on the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` or `QuizError::Finished`.
    pub async fn toggle_review(&mut self) -> Result<bool, QuizError> {
        let session = self.active_mut()?;
        let Some(id) = session.current_question().map(|q| q.id().clone()) else {
            return Err(QuizError::NotStarted);
        };
        let flagged = session.toggle_review(&id).unwrap_or(false);
        self.persist().await;
        self.present_current();
        Ok(flagged)
    }

    // ─── navigation ─────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns a lifecycle error (`NotStarted`, `Finished`, `SessionPaused`).
    pub async fn next(&mut self) -> Result<Advance, QuizError> {
        self.navigate(Step::By(1)).await
    }

    /// # Errors
    ///
    /// Returns a lifecycle error (`NotStarted`, `Finished`, `SessionPaused`).
    pub async fn prev(&mut self) -> Result<Advance, QuizError> {
        self.navigate(Step::By(-1)).await
    }

    /// Move on without answering. No placeholder answer is stored.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error (`NotStarted`, `Finished`, `SessionPaused`).
    pub async fn skip(&mut self) -> Result<Advance, QuizError> {
        self.navigate(Step::By(1)).await
    }

    /// Jump to an absolute question index. Out-of-range targets do nothing.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error (`NotStarted`, `Finished`, `SessionPaused`).
    pub async fn jump_to(&mut self, index: usize) -> Result<Advance, QuizError> {
        self.navigate(Step::To(index)).await
    }

    /// Submit on the last test-mode question, otherwise move forward.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error (`NotStarted`, `Finished`, `SessionPaused`).
    pub async fn next_or_submit(&mut self) -> Result<NextOrSubmit, QuizError> {
        let session = self.running_mut()?;
        if session.mode() == QuizMode::Test && session.is_last() {
            return self.submit().await.map(NextOrSubmit::Submitted);
        }
        self.next().await.map(NextOrSubmit::Advanced)
    }

    async fn navigate(&mut self, step: Step) -> Result<Advance, QuizError> {
        let session = self.running_mut()?;
        let left = session.current_question().map(|q| q.id().clone());
        let outcome = match step {
            Step::By(delta) => session.advance(delta),
            Step::To(index) => session.jump_to(index),
        };
        if !outcome.moved() {
            return Ok(outcome);
        }
        if session.mode() == QuizMode::Test {
            if let Some(id) = left {
                session.lock_if_answered(&id);
            }
        }

        self.enter_current_question();
        self.persist().await;
        self.present_current();
        Ok(outcome)
    }

    // ─── pause / timer ──────────────────────────────────────────────────────

    /// Freeze the session. Returns false if it was already paused.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` or `QuizError::Finished`.
    pub async fn pause(&mut self) -> Result<bool, QuizError> {
        let session = self.active_mut()?;
        if session.is_paused() {
            return Ok(false);
        }
        session.set_paused(true);
        session.timer_mut().pause();
        tracing::debug!(remaining = session.timer().remaining(), "quiz paused");
        self.persist().await;
        self.present_current();
        Ok(true)
    }

    /// Continue a paused session. Returns false if it was not paused.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` or `QuizError::Finished`.
    pub async fn resume(&mut self) -> Result<bool, QuizError> {
        let session = self.active_mut()?;
        if !session.is_paused() {
            return Ok(false);
        }
        session.set_paused(false);
        session.timer_mut().resume();
        tracing::debug!(remaining = session.timer().remaining(), "quiz resumed");
        self.persist().await;
        self.present_current();
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` or `QuizError::Finished`.
    pub async fn toggle_pause(&mut self) -> Result<QuizState, QuizError> {
        if self.active()?.is_paused() {
            self.resume().await?;
        } else {
            self.pause().await?;
        }
        Ok(self.state())
    }

    /// Apply one second of countdown to the current question.
    pub async fn tick(&mut self) -> TickReport {
        let Some(session) = self.session.as_mut().filter(|s| !s.is_finished()) else {
            return TickReport::Ignored;
        };
        match session.timer_mut().tick() {
            Tick::Ignored => TickReport::Ignored,
            Tick::Counted { remaining } => {
                self.persist().await;
                TickReport::Counted { remaining }
            }
            Tick::Expired => self.on_timer_expired().await,
        }
    }

    async fn on_timer_expired(&mut self) -> TickReport {
        if let Some(session) = self.session.as_mut() {
            if let Some(id) = session.current_question().map(|q| q.id().clone()) {
                let recorded = session.record_timeout_answer(&id);
                tracing::info!(question = %id, recorded, "question timed out");
            }
        }
        self.presenter.announce(MSG_TIMEOUT);

        let advance = self
            .navigate(Step::By(1))
            .await
            .unwrap_or(Advance::Boundary);
        if !advance.moved() {
            // Last question: keep the timeout and wait for a manual submit.
            self.persist().await;
            self.present_current();
        }
        TickReport::TimedOut { advance }
    }

    // ─── export ─────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` when there is no session.
    pub fn export_results(&self) -> Result<ResultsExport, QuizError> {
        let session = self.session.as_ref().ok_or(QuizError::NotStarted)?;
        Ok(ResultsExport::from_session(session, self.clock.now()))
    }

    /// Pretty-printed results document.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotStarted` when there is no session, or
    /// `QuizError::Export` if encoding fails.
    pub fn export_json(&self) -> Result<String, QuizError> {
        let export = self.export_results()?;
        let json = export.to_json_pretty()?;
        self.presenter.announce(MSG_EXPORTED);
        Ok(json)
    }

    // ─── internals ──────────────────────────────────────────────────────────

    fn active(&self) -> Result<&Session, QuizError> {
        match self.session.as_ref() {
            None => Err(QuizError::NotStarted),
            Some(s) if s.is_finished() => Err(QuizError::Finished),
            Some(s) => Ok(s),
        }
    }

    fn active_mut(&mut self) -> Result<&mut Session, QuizError> {
        match self.session.as_mut() {
            None => Err(QuizError::NotStarted),
            Some(s) if s.is_finished() => Err(QuizError::Finished),
            Some(s) => Ok(s),
        }
    }

    /// Active and not paused.
    fn running_mut(&mut self) -> Result<&mut Session, QuizError> {
        let session = self.active_mut()?;
        if session.is_paused() {
            return Err(QuizError::SessionPaused);
        }
        Ok(session)
    }

    fn stop_timer(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.timer_mut().stop();
        }
    }

    async fn load_questions(&self, config: &QuizConfig) -> (Vec<Question>, bool) {
        let (questions, used_fallback) = match config.source() {
            QuestionSource::Local => (self.provider.fetch_local().await, false),
            QuestionSource::Remote => {
                match self
                    .provider
                    .fetch_remote(
                        config.question_count(),
                        config.category(),
                        config.difficulty(),
                    )
                    .await
                {
                    Ok(questions) if !questions.is_empty() => (questions, false),
                    Ok(_) => {
                        tracing::warn!("trivia source returned no questions, using fallback");
                        self.presenter.announce(MSG_FALLBACK);
                        (self.provider.fetch_local().await, true)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "trivia source failed, using fallback");
                        self.presenter.announce(MSG_FALLBACK);
                        (self.provider.fetch_local().await, true)
                    }
                }
            }
        };
        if questions.is_empty() {
            return (fallback_questions(), true);
        }
        (questions, used_fallback)
    }

    /// Fix the display order and start (or continue) the countdown for the
    /// question at `current_index`.
    fn enter_current_question(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_finished() {
            return;
        }
        let Some(question) = session.current_question() else {
            return;
        };
        let id = question.id().clone();
        let limit = question
            .time_limit()
            .unwrap_or_else(|| session.config().time_per_question());

        let shuffle = session.config().shuffle_choices();
        let rng = &mut self.rng;
        session.fix_display_choices(&id, |choices| {
            if shuffle {
                choices.shuffle(rng);
            }
        });

        let resumed = session.take_resume_pending();
        let saved = session.timer().remaining();
        if resumed && saved > 0 {
            session.timer_mut().resume_from(limit, saved);
        } else {
            session.timer_mut().start(limit);
        }
        if session.is_paused() {
            session.timer_mut().pause();
        }
    }

    fn present_current(&self) {
        if self.state() == QuizState::Finished {
            return;
        }
        if let Some(snapshot) = self.snapshot() {
            self.presenter.question_entered(&snapshot);
        }
    }

    async fn persist(&self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if let Err(err) = self.store.save(session).await {
            tracing::warn!(error = %err, "could not save quiz session");
        }
    }
}
