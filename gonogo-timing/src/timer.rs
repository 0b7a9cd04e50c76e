use crate::queue::{Expiry, TimerHandle, TimerKind, TimerQueue};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

/// Monotonic time source with cancellable single-shot timers.
///
/// Timestamps are nanoseconds since the clock was created. Only the
/// timestamp source and the queue accessors are required; arming,
/// cancelling and expiry polling are shared.
pub trait TrialClock {
    fn now(&self) -> u64;
    fn timers(&self) -> &TimerQueue;
    fn timers_mut(&mut self) -> &mut TimerQueue;

    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }

    fn arm_timeout(&mut self, duration: Duration) -> TimerHandle {
        let now = self.now();
        let handle = self
            .timers_mut()
            .schedule(TimerKind::ResponseWindow, now, duration);
        trace!(?handle, ?duration, "response window armed");
        handle
    }

    fn arm_delay(&mut self, duration: Duration) -> TimerHandle {
        let now = self.now();
        let handle = self.timers_mut().schedule(TimerKind::InterTrial, now, duration);
        trace!(?handle, ?duration, "inter-trial delay armed");
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers_mut().cancel(handle)
    }

    /// Next timer that is due at the current time, earliest first.
    fn next_expired(&mut self) -> Option<Expiry> {
        let now = self.now();
        self.timers_mut().pop_due(now)
    }

    fn next_deadline(&self) -> Option<u64> {
        self.timers().next_deadline()
    }
}

/// Frame pacing statistics of the presentation loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTimingStats {
    pub samples: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
    timers: TimerQueue,
    frame_times: VecDeque<Duration>,
    max_samples: usize,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            timers: TimerQueue::new(),
            frame_times: VecDeque::with_capacity(1000),
            max_samples: 1000,
        }
    }

    /// Converts a clock timestamp back to an [`Instant`], e.g. to park an
    /// event loop until the next deadline.
    pub fn instant_at(&self, timestamp_ns: u64) -> Instant {
        self.start + Duration::from_nanos(timestamp_ns)
    }

    pub fn next_deadline_instant(&self) -> Option<Instant> {
        self.timers.next_deadline().map(|ns| self.instant_at(ns))
    }

    pub fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(d);
    }

    pub fn frame_stats(&self) -> FrameTimingStats {
        if self.frame_times.is_empty() {
            return FrameTimingStats::default();
        }
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        FrameTimingStats {
            samples: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: times.iter().copied().fold(f64::INFINITY, f64::min),
            max_frame_time_ns: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TrialClock for MonotonicClock {
    fn now(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    fn timers_mut(&mut self) -> &mut TimerQueue {
        &mut self.timers
    }
}
