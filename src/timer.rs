//! Per-task stopwatch tick sources.
//!
//! Each running task owns exactly one tick source with a fixed period. The
//! registry is polled from the event loop with the current instant and
//! reports how many whole periods each source has completed since it was
//! last polled. Removing a source is immediate, so a stopped or deleted
//! task can never receive another tick.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::task::TaskId;

/// Fixed tick period for every stopwatch.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct TickSource {
    next_due: Instant,
}

/// Registry of live tick sources, keyed by task.
#[derive(Debug, Default)]
pub struct Timers {
    sources: HashMap<TaskId, TickSource>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tick source for `id`, first due one period after `now`.
    ///
    /// Returns false and leaves the existing source alone when the task is
    /// already running.
    pub fn start(&mut self, id: TaskId, now: Instant) -> bool {
        if self.sources.contains_key(&id) {
            return false;
        }
        self.sources.insert(
            id,
            TickSource {
                next_due: now + TICK_PERIOD,
            },
        );
        true
    }

    /// Cancel the tick source for `id`. Returns false if none was live.
    pub fn stop(&mut self, id: TaskId) -> bool {
        self.sources.remove(&id).is_some()
    }

    pub fn is_running(&self, id: TaskId) -> bool {
        self.sources.contains_key(&id)
    }

    /// Number of live tick sources.
    pub fn active_count(&self) -> usize {
        self.sources.len()
    }

    /// Earliest instant at which any source is due, for poll timeouts.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sources.values().map(|s| s.next_due).min()
    }

    /// Advance every source to `now` and return the ticks each one fired.
    ///
    /// A source that has fallen several periods behind fires once per
    /// missed period, so elapsed time is not lost when the loop stalls.
    pub fn poll(&mut self, now: Instant) -> Vec<(TaskId, u64)> {
        let period_ms = TICK_PERIOD.as_millis();
        let mut fired = Vec::new();
        for (&id, source) in self.sources.iter_mut() {
            if now < source.next_due {
                continue;
            }
            let behind_ms = (now - source.next_due).as_millis();
            let ticks = behind_ms / period_ms + 1;
            source.next_due += Duration::from_millis((ticks * period_ms) as u64);
            fired.push((id, ticks as u64));
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn total_for(fired: &[(TaskId, u64)], id: TaskId) -> u64 {
        fired.iter().filter(|(t, _)| *t == id).map(|(_, n)| n).sum()
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut timers = Timers::new();
        let id = Uuid::new_v4();
        let t0 = Instant::now();
        assert!(timers.start(id, t0));
        assert!(!timers.start(id, t0 + Duration::from_millis(500)));
        assert_eq!(timers.active_count(), 1);

        // Second start must not have shifted or duplicated the schedule.
        let fired = timers.poll(t0 + Duration::from_secs(3));
        assert_eq!(total_for(&fired, id), 3);
    }

    #[test]
    fn test_no_tick_before_first_period() {
        let mut timers = Timers::new();
        let id = Uuid::new_v4();
        let t0 = Instant::now();
        timers.start(id, t0);
        assert!(timers.poll(t0 + Duration::from_millis(999)).is_empty());
        assert_eq!(total_for(&timers.poll(t0 + Duration::from_secs(1)), id), 1);
    }

    #[test]
    fn test_polling_each_second_fires_once_per_poll() {
        let mut timers = Timers::new();
        let id = Uuid::new_v4();
        let t0 = Instant::now();
        timers.start(id, t0);
        let mut total = 0;
        for s in 1..=5 {
            total += total_for(&timers.poll(t0 + Duration::from_secs(s)), id);
        }
        assert_eq!(total, 5);
    }

    #[test]
    fn test_stop_prevents_further_ticks() {
        let mut timers = Timers::new();
        let id = Uuid::new_v4();
        let t0 = Instant::now();
        timers.start(id, t0);
        assert!(timers.stop(id));
        assert!(!timers.stop(id));
        assert!(timers.poll(t0 + Duration::from_secs(10)).is_empty());
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_sources_tick_independently() {
        let mut timers = Timers::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let t0 = Instant::now();
        timers.start(a, t0);
        timers.start(b, t0 + Duration::from_secs(2));
        let fired = timers.poll(t0 + Duration::from_secs(4));
        assert_eq!(total_for(&fired, a), 4);
        assert_eq!(total_for(&fired, b), 2);
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_secs(5)));
    }
}
