use crate::queue::TimerQueue;
use crate::timer::TrialClock;
use std::time::Duration;

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: u64,
    timers: TimerQueue,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        let by_ns = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.now_ns = self.now_ns.saturating_add(by_ns);
    }

    /// Jumps to the earliest pending deadline. Returns the new time, or
    /// `None` when nothing is armed.
    pub fn advance_to_next_deadline(&mut self) -> Option<u64> {
        let deadline = self.timers.next_deadline()?;
        self.now_ns = self.now_ns.max(deadline);
        Some(self.now_ns)
    }
}

impl TrialClock for ManualClock {
    fn now(&self) -> u64 {
        self.now_ns
    }

    fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    fn timers_mut(&mut self) -> &mut TimerQueue {
        &mut self.timers
    }
}
