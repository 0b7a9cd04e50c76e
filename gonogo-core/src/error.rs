use crate::report::ReportError;
use thiserror::Error;

/// Errors raised while setting up or running a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Rejected before any stimulus is generated or presented.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),

    /// An exclusion sample was requested from a domain with nothing left to
    /// draw. The fixed shape and color sets never trigger this.
    #[error("cannot sample a {category} from an empty domain")]
    EmptyDomain { category: &'static str },

    #[error("session already started")]
    NotIdle,

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Errors raised while reading categories, modes or exported records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown shape '{0}'")]
    UnknownShape(String),

    #[error("unknown color '{0}'")]
    UnknownColor(String),

    #[error("unknown test mode '{0}' (expected 'icon' or 'color')")]
    UnknownMode(String),

    #[error("malformed record on line {line}: {reason}")]
    Record { line: usize, reason: String },
}
