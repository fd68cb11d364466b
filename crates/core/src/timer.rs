//! Per-question countdown.
//!
//! `QuestionTimer` is a pure state machine: it never sleeps or spawns. Something
//! outside (the services `Ticker`) calls [`QuestionTimer::tick`] once per second
//! and reacts to [`Tick::Expired`].

use serde::{Deserialize, Serialize};

/// Remaining seconds at or below which the countdown counts as "low".
pub const LOW_TIME_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
    Expired,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The timer was not running; nothing changed.
    Ignored,
    Counted { remaining: u32 },
    /// This tick brought `remaining` to zero.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTimer {
    phase: TimerPhase,
    remaining: u32,
    per_question_limit: u32,
    /// Bumped on every start so tick sources can tell countdowns apart.
    epoch: u64,
}

impl QuestionTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn per_question_limit(&self) -> u32 {
        self.per_question_limit
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.phase == TimerPhase::Expired
    }

    /// Seconds used so far on the current question, never negative.
    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.per_question_limit.saturating_sub(self.remaining)
    }

    /// `remaining / limit`, or 0 when no limit is set.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.per_question_limit == 0 {
            return 0.0;
        }
        f64::from(self.remaining) / f64::from(self.per_question_limit)
    }

    #[must_use]
    pub fn is_low(&self) -> bool {
        self.remaining <= LOW_TIME_THRESHOLD
    }

    /// Start a fresh countdown of `seconds`.
    ///
    /// Any countdown in progress is stopped first.
    pub fn start(&mut self, seconds: u32) {
        self.resume_from(seconds, seconds);
    }

    /// Start a countdown that continues from a saved `remaining` value.
    pub fn resume_from(&mut self, limit: u32, remaining: u32) {
        self.stop();
        self.per_question_limit = limit;
        self.remaining = remaining.min(limit);
        self.phase = TimerPhase::Running;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Freeze the countdown. Returns false if it was not running.
    pub fn pause(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.phase = TimerPhase::Paused;
        true
    }

    /// Continue from the frozen `remaining`. Returns false if it was not paused.
    pub fn resume(&mut self) -> bool {
        if self.phase != TimerPhase::Paused {
            return false;
        }
        self.phase = TimerPhase::Running;
        true
    }

    pub fn stop(&mut self) {
        if matches!(self.phase, TimerPhase::Running | TimerPhase::Paused) {
            self.phase = TimerPhase::Idle;
        }
    }

    pub fn tick(&mut self) -> Tick {
        if self.phase != TimerPhase::Running {
            return Tick::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = TimerPhase::Expired;
            return Tick::Expired;
        }
        Tick::Counted {
            remaining: self.remaining,
        }
    }
}
