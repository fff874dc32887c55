// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Periodic timers owned by a node executor.

use std::time::{Duration, Instant};

/// Identifier of a timer created on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

impl TimerId {
    /// Raw identifier value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct Timer {
    pub(crate) id: TimerId,
    period: Duration,
    next_due: Instant,
}

impl Timer {
    pub(crate) fn new(id: TimerId, period: Duration, now: Instant) -> Self {
        Self {
            id,
            period,
            next_due: now + period,
        }
    }

    pub(crate) fn next_due(&self) -> Instant {
        self.next_due
    }

    pub(crate) fn is_due(&self, now: Instant) -> bool {
        self.next_due <= now
    }

    /// Schedule the next tick.
    ///
    /// A timer that fell more than one period behind restarts from `now`
    /// instead of firing a burst of catch-up ticks.
    pub(crate) fn advance(&mut self, now: Instant) {
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
    }
}

/// Index of the earliest due timer, if any.
pub(crate) fn earliest_due(timers: &[Timer], now: Instant) -> Option<usize> {
    timers
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_due(now))
        .min_by_key(|(_, t)| t.next_due())
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_advance() {
        let start = Instant::now();
        let mut timer = Timer::new(TimerId(1), Duration::from_millis(100), start);

        assert!(!timer.is_due(start));
        assert!(timer.is_due(start + Duration::from_millis(100)));

        timer.advance(start + Duration::from_millis(100));
        assert_eq!(timer.next_due(), start + Duration::from_millis(200));
    }

    #[test]
    fn test_timer_skips_missed_ticks() {
        let start = Instant::now();
        let mut timer = Timer::new(TimerId(1), Duration::from_millis(100), start);

        let late = start + Duration::from_millis(550);
        timer.advance(late);
        assert_eq!(timer.next_due(), late + Duration::from_millis(100));
    }

    #[test]
    fn test_earliest_due() {
        let start = Instant::now();
        let timers = vec![
            Timer::new(TimerId(1), Duration::from_millis(300), start),
            Timer::new(TimerId(2), Duration::from_millis(100), start),
            Timer::new(TimerId(3), Duration::from_millis(200), start),
        ];

        assert_eq!(earliest_due(&timers, start), None);
        assert_eq!(earliest_due(&timers, start + Duration::from_millis(250)), Some(1));
    }
}
