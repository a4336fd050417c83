//! In-place removal of files that do not decode as images.
//!
//! Nothing is repaired and nothing is backed up: a file that the decoder
//! rejects is deleted.

use std::fs;
use std::path::Path;
use subspecies_core::{ClassDirectory, Error, Result};
use tracing::{debug, info, warn};

use crate::loader::{decode_image, DatasetScanner};
use crate::progress::{NoProgress, ProgressSink};
use crate::report::{ClassReport, FileOutcome, Stage, StageReport};

/// Deletes undecodable files from every class directory of a dataset root
#[derive(Debug, Clone, Copy, Default)]
pub struct Cleaner;

impl Cleaner {
    pub fn new() -> Self {
        Self
    }

    /// Cleans every class directory below `root`
    pub fn run(&self, root: &Path) -> Result<StageReport> {
        self.run_with_progress(root, &NoProgress)
    }

    pub fn run_with_progress(&self, root: &Path, progress: &dyn ProgressSink) -> Result<StageReport> {
        info!("Cleaning images in {:?}", root);

        let classes = DatasetScanner::new(root).scan()?;
        info!("Found {} class directories", classes.len());
        progress.start("clean", classes.len());

        let mut report = StageReport::new(Stage::Clean, root, None);

        for class in &classes {
            let class_report = self.clean_class(class)?;
            progress.class_done(&class.label, class.len());
            report.classes.push(class_report);
        }

        progress.finish();

        let summary = report.summary();
        info!("{}", summary);

        Ok(report)
    }

    /// Decodes every file of one class, deleting those that fail
    pub fn clean_class(&self, class: &ClassDirectory) -> Result<ClassReport> {
        let mut report = ClassReport::new(class.label.clone());

        for file in &class.files {
            match decode_image(&file.path) {
                Ok(_) => {
                    debug!("Valid image: {}", file.path.display());
                    report.push(&file.file_name, &file.path, FileOutcome::Kept);
                }
                Err(Error::Image(reason)) => {
                    fs::remove_file(&file.path)?;
                    warn!(
                        path = %file.path.display(),
                        reason = %reason,
                        "Removed corrupted image"
                    );
                    report.push(&file.file_name, &file.path, FileOutcome::Removed { reason });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "  {}: {} kept, {} removed",
            class.label,
            report.succeeded(),
            report.failed()
        );

        Ok(report)
    }
}
