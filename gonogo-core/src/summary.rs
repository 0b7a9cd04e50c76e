use crate::trial::SessionLog;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Mean over correct, non-omitted trials; `0.0` when there are none.
    pub mean_correct_reaction_time_ms: f64,
    pub total_errors: usize,
}

impl SessionSummary {
    pub fn from_log(log: &SessionLog) -> Self {
        let (sum, count) = log
            .iter()
            .filter(|r| !r.is_error)
            .filter_map(|r| r.reaction_time_ms)
            .fold((0u64, 0usize), |(sum, count), rt| (sum + rt, count + 1));

        let mean_correct_reaction_time_ms = if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        };

        Self {
            mean_correct_reaction_time_ms,
            total_errors: log.iter().filter(|r| r.is_error).count(),
        }
    }
}
