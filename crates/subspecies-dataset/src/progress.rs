//! Progress hooks for long-running passes.

use subspecies_core::ClassLabel;

/// Receives per-class progress from a running stage.
///
/// All methods default to doing nothing.
pub trait ProgressSink {
    /// A stage is about to process `classes` class directories
    fn start(&self, _stage: &str, _classes: usize) {}

    /// One class directory has been fully processed
    fn class_done(&self, _label: &ClassLabel, _files: usize) {}

    /// The stage is complete
    fn finish(&self) {}
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}
