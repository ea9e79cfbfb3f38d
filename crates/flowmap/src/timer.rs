//! Cancelable delayed tasks for a single-threaded event loop.
//!
//! Nothing runs by itself: the owner calls [`Timers::due`] with the current time and
//! executes whatever comes back.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
pub struct Timers<T> {
    next: u64,
    pending: Vec<(TaskId, Instant, T)>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            next: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Timers<T> {
    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) -> TaskId {
        let id = TaskId(self.next);
        self.next += 1;
        self.pending.push((id, now + delay, task));
        id
    }

    /// Returns `true` when the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(t, _, _)| *t != id);
        self.pending.len() != before
    }

    /// Removes and returns every task whose deadline is at or before `now`, earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<(TaskId, T)> {
        let mut fired = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].1 <= now {
                fired.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        fired.sort_by_key(|(id, at, _)| (*at, id.0));
        fired.into_iter().map(|(id, _, task)| (id, task)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_fire_once_their_deadline_passes() {
        let t0 = Instant::now();
        let mut timers = Timers::default();
        timers.schedule(t0, Duration::from_millis(300), "late");
        timers.schedule(t0, Duration::from_millis(100), "early");

        assert!(timers.due(t0 + Duration::from_millis(99)).is_empty());
        let fired: Vec<&str> = timers
            .due(t0 + Duration::from_millis(300))
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(fired, vec!["early", "late"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn canceled_tasks_never_fire() {
        let t0 = Instant::now();
        let mut timers = Timers::default();
        let id = timers.schedule(t0, Duration::from_millis(10), 1);
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.due(t0 + Duration::from_secs(1)).is_empty());
    }
}
