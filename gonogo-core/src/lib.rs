pub mod category;
pub mod error;
pub mod phase;
pub mod render;
pub mod report;
pub mod stimulus;
pub mod summary;
pub mod trial;

pub use category::{Color, Shape};
pub use error::{ParseError, SessionError};
pub use phase::SessionPhase;
pub use render::Renderer;
pub use report::{ReportError, Reporter};
pub use stimulus::{Mode, Role, Stimulus};
pub use summary::SessionSummary;
pub use trial::{SessionLog, TrialResult, TrialState};
