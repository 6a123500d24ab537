//! Deferred work scheduled by key actions.
//!
//! Actions never block. Anything that has to happen later (focus repair on the
//! next frame, retrying until search results have rendered) is queued here as
//! a [`Deferred`] task with a due time on a logical clock. The embedding event
//! loop drives the clock through `InputHandler::advance`.

use std::time::Duration;

/// Handle of a scheduled task, usable to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Work that runs after the dispatch that scheduled it has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// Try to put the caret on the first search hit; reschedules itself until
    /// the hit exists.
    FocusFirstSearchResult { attempt: u32 },
    /// Refocus an entry when the host left nothing focused.
    FixFocus,
}

#[derive(Debug, Clone)]
struct Scheduled {
    handle: TimerHandle,
    scheduled_at: Duration,
    due: Duration,
    task: Deferred,
}

/// Queue of pending [`Deferred`] tasks.
#[derive(Debug, Default)]
pub struct Timers {
    now: Duration,
    next_handle: u64,
    pending: Vec<Scheduled>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queues `task` to run `delay` after the current logical time.
    pub fn schedule(&mut self, delay: Duration, task: Deferred) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(Scheduled {
            handle,
            scheduled_at: self.now,
            due: self.now + delay,
            task,
        });
        handle
    }

    /// Runs on the next frame, i.e. the next time the clock is advanced.
    pub fn next_frame(&mut self, task: Deferred) -> TimerHandle {
        self.schedule(Duration::ZERO, task)
    }

    /// Returns true when the task was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.handle != handle);
        self.pending.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Handle the next scheduled task will get. Pass it to [`Timers::pop_due`]
    /// to mark where a run of due tasks started.
    pub fn horizon(&self) -> TimerHandle {
        TimerHandle(self.next_handle)
    }

    /// Removes the earliest task due at or before `until`, moving the clock to
    /// its due time so anything it reschedules is timed from there.
    ///
    /// Tasks scheduled at or after `horizon` with no delay are left for the
    /// next run, so a task that keeps rescheduling itself on the next frame
    /// cannot starve the caller.
    pub fn pop_due(
        &mut self,
        until: Duration,
        horizon: TimerHandle,
    ) -> Option<(TimerHandle, Deferred)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .filter(|(_, s)| s.handle < horizon || s.due > s.scheduled_at)
            .min_by_key(|(_, s)| (s.due, s.handle))
            .map(|(i, _)| i)?;

        let scheduled = self.pending.remove(index);
        self.now = self.now.max(scheduled.due);
        Some((scheduled.handle, scheduled.task))
    }

    /// Moves the clock forward; it never runs backwards.
    pub fn advance_clock(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pop_in_due_order() {
        let mut timers = Timers::new();
        let late = timers.schedule(ms(200), Deferred::FixFocus);
        let early = timers.next_frame(Deferred::FixFocus);

        let horizon = timers.horizon();

        assert_eq!(timers.pop_due(ms(500), horizon).map(|(h, _)| h), Some(early));
        assert_eq!(timers.pop_due(ms(500), horizon).map(|(h, _)| h), Some(late));
        assert_eq!(timers.pop_due(ms(500), horizon), None);
        assert_eq!(timers.now(), ms(200));
    }

    #[test]
    fn test_not_due_yet() {
        let mut timers = Timers::new();
        timers.schedule(ms(200), Deferred::FixFocus);
        let horizon = timers.horizon();
        assert!(timers.pop_due(ms(199), horizon).is_none());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_next_frame_work_waits_for_next_run() {
        let mut timers = Timers::new();
        timers.next_frame(Deferred::FixFocus);
        let horizon = timers.horizon();

        assert!(timers.pop_due(ms(10), horizon).is_some());
        timers.next_frame(Deferred::FixFocus);
        assert!(timers.pop_due(ms(10), horizon).is_none());

        let horizon = timers.horizon();
        assert!(timers.pop_due(ms(10), horizon).is_some());
    }

    #[test]
    fn test_delayed_work_scheduled_mid_run_still_fires() {
        let mut timers = Timers::new();
        let horizon = timers.horizon();
        timers.schedule(ms(100), Deferred::FixFocus);

        assert!(timers.pop_due(ms(500), horizon).is_some());
        assert_eq!(timers.now(), ms(100));
        timers.schedule(ms(100), Deferred::FixFocus);
        assert!(timers.pop_due(ms(500), horizon).is_some());
        assert_eq!(timers.now(), ms(200));
    }

    #[test]
    fn test_cancel() {
        let mut timers = Timers::new();
        let handle = timers.schedule(ms(10), Deferred::FixFocus);
        assert!(timers.is_pending(handle));
        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut timers = Timers::new();
        timers.advance_clock(ms(100));
        timers.advance_clock(ms(50));
        assert_eq!(timers.now(), ms(100));
    }
}
