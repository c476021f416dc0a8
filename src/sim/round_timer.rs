//! Round countdown
//!
//! A finite round arms two schedules: a 100ms refresh that recomputes the
//! remaining time from the absolute end instant, and a one-shot at the end
//! instant itself. Either one may observe the round ending; the engine only
//! acts on the first.

use super::clock::{TimerId, TimerQueue, Wake};
use crate::config::DurationRule;
use crate::consts::COUNTDOWN_TICK_MS;

#[derive(Debug, Clone, Default)]
pub struct RoundTimer {
    /// None while the duration is infinite or nothing is running
    end_at_ms: Option<u64>,
    /// None means infinite
    time_left_ms: Option<u64>,
    interval: Option<TimerId>,
    deadline: Option<TimerId>,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time; None when infinite
    pub fn time_left_ms(&self) -> Option<u64> {
        self.time_left_ms
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some() || self.deadline.is_some()
    }

    /// Show a full, idle countdown without arming anything
    pub fn seed_idle(&mut self, rule: DurationRule) {
        self.end_at_ms = None;
        self.time_left_ms = rule.as_millis();
    }

    pub fn start(&mut self, timers: &mut TimerQueue<Wake>, rule: DurationRule) {
        self.stop(timers);
        self.seed_idle(rule);

        if let Some(duration_ms) = rule.as_millis() {
            self.end_at_ms = Some(timers.now() + duration_ms);
            self.interval = Some(timers.schedule_every(
                COUNTDOWN_TICK_MS,
                COUNTDOWN_TICK_MS,
                Wake::CountdownTick,
            ));
            self.deadline = Some(timers.schedule_in(duration_ms, Wake::Deadline));
        }
    }

    /// Cancel both schedules, freezing the displayed time
    pub fn stop(&mut self, timers: &mut TimerQueue<Wake>) {
        for timer in [self.interval.take(), self.deadline.take()]
            .into_iter()
            .flatten()
        {
            timers.cancel(timer);
        }
    }

    /// Recompute remaining time at `now_ms`. Returns true once time is up.
    pub fn refresh(&mut self, now_ms: u64) -> bool {
        let Some(end_at) = self.end_at_ms else {
            return false;
        };
        let left = end_at.saturating_sub(now_ms);
        self.time_left_ms = Some(left);
        left == 0
    }

    /// Pin the display to zero (round completed)
    pub fn expire(&mut self) {
        if self.time_left_ms.is_some() {
            self.time_left_ms = Some(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infinite_arms_nothing() {
        let mut timers = TimerQueue::new();
        let mut rt = RoundTimer::new();
        rt.start(&mut timers, DurationRule::Infinite);
        assert_eq!(rt.time_left_ms(), None);
        assert!(timers.is_empty());
        assert!(!rt.is_running());
        assert!(!rt.refresh(1_000_000));
    }

    #[test]
    fn test_finite_counts_down_to_zero() {
        let mut timers = TimerQueue::new();
        let mut rt = RoundTimer::new();
        rt.start(&mut timers, DurationRule::Finite { secs: 5 });
        assert_eq!(rt.time_left_ms(), Some(5000));
        assert_eq!(timers.len(), 2);

        assert!(!rt.refresh(1234));
        assert_eq!(rt.time_left_ms(), Some(3766));
        assert!(rt.refresh(5000));
        assert_eq!(rt.time_left_ms(), Some(0));
        assert!(rt.refresh(9000));
    }

    #[test]
    fn test_deadline_fires_at_end_instant() {
        let mut timers = TimerQueue::new();
        timers.set_now(250);
        let mut rt = RoundTimer::new();
        rt.start(&mut timers, DurationRule::Finite { secs: 5 });

        let mut deadline_at = None;
        while let Some((_, wake)) = timers.pop_due(10_000) {
            if wake == Wake::Deadline {
                deadline_at = Some(timers.now());
                break;
            }
        }
        assert_eq!(deadline_at, Some(5250));
    }

    #[test]
    fn test_stop_freezes_and_is_idempotent() {
        let mut timers = TimerQueue::new();
        let mut rt = RoundTimer::new();
        rt.start(&mut timers, DurationRule::Finite { secs: 10 });
        rt.refresh(4000);
        rt.stop(&mut timers);
        rt.stop(&mut timers);
        assert!(timers.is_empty());
        assert!(!rt.is_running());
        assert_eq!(rt.time_left_ms(), Some(6000));
    }
}
