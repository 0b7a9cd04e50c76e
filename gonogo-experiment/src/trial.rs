use gonogo_core::Stimulus;
use gonogo_timing::TimerHandle;

/// The stimulus currently on screen.
#[derive(Debug, Clone)]
pub struct ActiveTrial {
    /// Position in the stimulus sequence.
    pub index: usize,
    pub stimulus: Stimulus,
    pub timestamps: TrialTimestamps,
    /// Response window timer, cancelled when a response is accepted.
    pub timeout: TimerHandle,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrialTimestamps {
    pub presented_ns: u64,
    pub response_ns: Option<u64>,
}

impl TrialTimestamps {
    /// Reaction time in whole milliseconds, truncated.
    pub fn reaction_time_ms(&self) -> Option<u64> {
        self.response_ns
            .map(|r| r.saturating_sub(self.presented_ns) / 1_000_000)
    }
}
