// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame-polled timers.
//!
//! egui has no callback timers, so the app polls these once per frame and
//! asks for a repaint when the next deadline is due.

use std::time::{Duration, Instant};

/// A cancellable one-shot timer.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, replacing any pending deadline.
    pub fn schedule(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    /// Disarm the timer. Cancelling an idle timer does nothing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the deadline passed. A timer fires at most once per schedule.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time until the deadline, if armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

/// A timer that re-arms itself after each fire. A zero interval disables it.
#[derive(Debug, Clone)]
pub struct RepeatingTimer {
    interval: Duration,
    timer: Timer,
}

impl RepeatingTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: Timer::new(),
        }
    }

    pub fn start(&mut self, now: Instant) {
        if self.interval.is_zero() {
            self.timer.cancel();
        } else {
            self.timer.schedule(now, self.interval);
        }
    }

    pub fn stop(&mut self) {
        self.timer.cancel();
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if self.timer.fire_if_due(now) {
            self.timer.schedule(now, self.interval);
            true
        } else {
            false
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.schedule(t0, Duration::from_millis(100));

        assert!(!timer.fire_if_due(t0));
        assert!(timer.fire_if_due(t0 + Duration::from_millis(100)));
        assert!(!timer.fire_if_due(t0 + Duration::from_millis(500)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.cancel();
        timer.schedule(t0, Duration::from_secs(1));
        timer.cancel();
        timer.cancel();
        assert!(!timer.fire_if_due(t0 + Duration::from_secs(2)));

        // Cancelling after it already fired is fine too.
        timer.schedule(t0, Duration::ZERO);
        assert!(timer.fire_if_due(t0));
        timer.cancel();
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.schedule(t0, Duration::from_millis(100));
        timer.schedule(t0 + Duration::from_millis(80), Duration::from_millis(100));
        assert!(!timer.fire_if_due(t0 + Duration::from_millis(120)));
        assert!(timer.fire_if_due(t0 + Duration::from_millis(180)));
    }

    #[test]
    fn test_repeating_rearms_and_zero_disables() {
        let t0 = Instant::now();
        let mut every = RepeatingTimer::new(Duration::from_secs(10));
        every.start(t0);
        assert!(every.poll(t0 + Duration::from_secs(10)));
        assert!(!every.poll(t0 + Duration::from_secs(15)));
        assert!(every.poll(t0 + Duration::from_secs(20)));

        let mut never = RepeatingTimer::new(Duration::ZERO);
        never.start(t0);
        assert!(!never.poll(t0 + Duration::from_secs(3600)));
        assert_eq!(never.remaining(t0), None);
    }
}
