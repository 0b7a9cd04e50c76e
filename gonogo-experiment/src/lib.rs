pub mod builder;
pub mod config;
pub mod engine;
pub mod export;
pub mod pool;
pub mod trial;

pub use builder::StimulusSetBuilder;
pub use config::SessionConfig;
pub use engine::{EngineStatus, ResponseOutcome, TrialEngine};
pub use export::{CsvReporter, ExportRow, CSV_HEADER, parse_csv, to_csv};
pub use pool::{Category, RandomPool};
pub use trial::{ActiveTrial, TrialTimestamps};
