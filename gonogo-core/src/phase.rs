/// Application-level screens around the trial engine.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Goal message is shown before the first stimulus.
    #[default]
    Briefing,
    Testing,
    Debrief,
}

impl SessionPhase {
    /// Whether a response key press is forwarded to the trial engine.
    pub fn allows_input(&self) -> bool {
        matches!(self, Self::Testing)
    }

    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Briefing => Testing,
            Testing => Debrief,
            Debrief => return None,
        })
    }
}
