use std::time::Duration;

/// Opaque id of an armed timer. Handles are never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Per-trial response window.
    ResponseWindow,
    /// Pause between scoring one trial and presenting the next.
    InterTrial,
}

/// A timer whose deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub handle: TimerHandle,
    pub kind: TimerKind,
    pub deadline_ns: u64,
}

/// Pending single-shot timers ordered by deadline.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: Vec<Expiry>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, now_ns: u64, after: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let after_ns = u64::try_from(after.as_nanos()).unwrap_or(u64::MAX);
        self.pending.push(Expiry {
            handle,
            kind,
            deadline_ns: now_ns.saturating_add(after_ns),
        });
        handle
    }

    /// Removes the timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.pending.iter().position(|e| e.handle == handle) {
            Some(idx) => {
                self.pending.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Pops the earliest timer whose deadline is at or before `now_ns`.
    /// Equal deadlines fire in the order they were armed.
    pub fn pop_due(&mut self, now_ns: u64) -> Option<Expiry> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline_ns <= now_ns)
            .min_by_key(|(_, e)| (e.deadline_ns, e.handle))
            .map(|(idx, _)| idx)?;
        Some(self.pending.swap_remove(idx))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|e| e.deadline_ns).min()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        let late = q.schedule(TimerKind::ResponseWindow, 0, Duration::from_millis(20));
        let early = q.schedule(TimerKind::InterTrial, 0, Duration::from_millis(5));

        assert_eq!(q.pop_due(4 * MS), None);
        assert_eq!(q.next_deadline(), Some(5 * MS));

        let first = q.pop_due(30 * MS).unwrap();
        assert_eq!((first.handle, first.kind), (early, TimerKind::InterTrial));
        assert_eq!(q.pop_due(30 * MS).unwrap().handle, late);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_deadlines_fire_in_arming_order() {
        let mut q = TimerQueue::new();
        let a = q.schedule(TimerKind::ResponseWindow, 0, Duration::from_millis(10));
        let b = q.schedule(TimerKind::InterTrial, 0, Duration::from_millis(10));
        assert_eq!(q.pop_due(10 * MS).unwrap().handle, a);
        assert_eq!(q.pop_due(10 * MS).unwrap().handle, b);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut q = TimerQueue::new();
        let h = q.schedule(TimerKind::ResponseWindow, 0, Duration::from_millis(1));
        assert!(q.is_pending(h));
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert_eq!(q.pop_due(u64::MAX), None);
        assert_eq!(q.next_deadline(), None);
    }

    #[test]
    fn handles_are_not_reused() {
        let mut q = TimerQueue::new();
        let a = q.schedule(TimerKind::InterTrial, 0, Duration::ZERO);
        q.pop_due(0);
        let b = q.schedule(TimerKind::InterTrial, 0, Duration::ZERO);
        assert_ne!(a, b);
    }
}
