//! Subspecies dataset preparation library.
//!
//! This crate provides the three passes that turn a raw folder of labeled
//! photographs into training data: cleaning undecodable files, standardizing
//! image dimensions, and a stratified train/validation/test split.

pub mod clean;
pub mod loader;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod split;
pub mod standardize;
pub mod statistics;

pub use clean::Cleaner;
pub use loader::{decode_image, DatasetScanner};
pub use pipeline::{Pipeline, PipelineReport};
pub use progress::{NoProgress, ProgressSink};
pub use report::{ClassReport, FileOutcome, FileRecord, Stage, StageReport, StageSummary};
pub use split::{ClassSplit, SplitReport, SplitStats, Splitter};
pub use standardize::Standardizer;
pub use statistics::{ClassStatistics, DatasetStatistics};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clean::*;
    pub use crate::loader::*;
    pub use crate::pipeline::*;
    pub use crate::progress::*;
    pub use crate::report::*;
    pub use crate::split::*;
    pub use crate::standardize::*;
    pub use crate::statistics::*;
}
