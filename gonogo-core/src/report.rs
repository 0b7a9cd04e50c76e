use crate::summary::SessionSummary;
use crate::trial::SessionLog;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write session report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode session report: {0}")]
    Encode(String),
}

/// Receives the finished session exactly once.
pub trait Reporter {
    fn session_finished(
        &mut self,
        log: &SessionLog,
        summary: &SessionSummary,
    ) -> Result<(), ReportError>;
}

impl<P: Reporter + ?Sized> Reporter for &mut P {
    fn session_finished(
        &mut self,
        log: &SessionLog,
        summary: &SessionSummary,
    ) -> Result<(), ReportError> {
        (**self).session_finished(log, summary)
    }
}
