use crate::category::{Color, Shape};
use serde::{Deserialize, Serialize};

/// Trial engine states.
///
/// `Responded` and `TimedOut` are transient: the engine passes through them
/// while scoring and settles in `Settling` before the next event can arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Idle,
    Presenting,
    Responded,
    TimedOut,
    Settling,
    Finished,
}

impl TrialState {
    pub fn accepts_response(&self) -> bool {
        matches!(self, TrialState::Presenting)
    }
}

/// Recorded result per consumed stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    pub shape: Shape,
    pub color: Color,
    /// `None` if and only if the trial ended by timeout.
    pub reaction_time_ms: Option<u64>,
    pub is_error: bool,
}

impl TrialResult {
    pub fn is_omission(&self) -> bool {
        self.reaction_time_ms.is_none()
    }
}

/// Append-only, ordered record of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    results: Vec<TrialResult>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: TrialResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrialResult> {
        self.results.iter()
    }

    pub fn last(&self) -> Option<&TrialResult> {
        self.results.last()
    }
}

impl FromIterator<TrialResult> for SessionLog {
    fn from_iter<I: IntoIterator<Item = TrialResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SessionLog {
    type Item = &'a TrialResult;
    type IntoIter = std::slice::Iter<'a, TrialResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
