//! One-second tick source for the question timer.

use std::time::Duration;

use quiz_core::timer::QuestionTimer;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owned tick source, re-armed whenever the timer starts a new countdown.
///
/// Call [`Ticker::sync`] after every engine operation. A countdown is
/// identified by the timer epoch; when the epoch changes the old interval is
/// dropped, so a tick scheduled for a previous question is never delivered.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    armed: Option<Armed>,
}

#[derive(Debug)]
struct Armed {
    epoch: u64,
    interval: Interval,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            armed: None,
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Arm, re-arm or disarm to match `timer`.
    pub fn sync(&mut self, timer: Option<&QuestionTimer>) {
        let Some(timer) = timer.filter(|t| t.is_running()) else {
            self.armed = None;
            return;
        };
        if self
            .armed
            .as_ref()
            .is_some_and(|armed| armed.epoch == timer.epoch())
        {
            return;
        }
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.armed = Some(Armed {
            epoch: timer.epoch(),
            interval,
        });
    }

    /// Wait for the next tick. Never completes while disarmed.
    pub async fn tick(&mut self) {
        match self.armed.as_mut() {
            Some(armed) => {
                armed.interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn running(seconds: u32) -> QuestionTimer {
        let mut timer = QuestionTimer::new();
        timer.start(seconds);
        timer
    }

    #[tokio::test(start_paused = true)]
    async fn armed_ticker_fires_once_per_period() {
        let timer = running(30);
        let mut ticker = Ticker::new();
        ticker.sync(Some(&timer));
        assert!(ticker.is_armed());

        let started = Instant::now();
        ticker.tick().await;
        assert_eq!(started.elapsed(), TICK_PERIOD);
        ticker.tick().await;
        assert_eq!(started.elapsed(), TICK_PERIOD * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_ticker_never_fires() {
        let mut timer = running(30);
        timer.pause();
        let mut ticker = Ticker::new();
        ticker.sync(Some(&timer));
        assert!(!ticker.is_armed());
        assert!(timeout(Duration::from_secs(5), ticker.tick()).await.is_err());

        ticker.sync(None);
        assert!(!ticker.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn new_epoch_rearms_from_scratch() {
        let mut timer = running(30);
        let mut ticker = Ticker::new();
        ticker.sync(Some(&timer));

        tokio::time::advance(Duration::from_millis(700)).await;
        timer.start(30);
        ticker.sync(Some(&timer));

        let rearmed = Instant::now();
        ticker.tick().await;
        assert_eq!(rearmed.elapsed(), TICK_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn same_epoch_keeps_schedule() {
        let timer = running(30);
        let mut ticker = Ticker::new();
        ticker.sync(Some(&timer));
        let started = Instant::now();

        tokio::time::advance(Duration::from_millis(400)).await;
        ticker.sync(Some(&timer));
        ticker.tick().await;
        assert_eq!(started.elapsed(), TICK_PERIOD);
    }
}
