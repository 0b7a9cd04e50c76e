//! Timing primitives for the trial engine: a monotonic timestamp source and
//! cancellable single-shot timers.
//!
//! Timers never call back into the engine. The clock reports expired handles
//! and the owner dispatches them, which keeps a single thread of control and
//! lets [`ManualClock`] drive sessions deterministically in tests.

pub mod manual;
pub mod queue;
pub mod timer;

pub use manual::ManualClock;
pub use queue::{Expiry, TimerHandle, TimerKind, TimerQueue};
pub use timer::{FrameTimingStats, MonotonicClock, TrialClock};
