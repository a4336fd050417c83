//! Runs clean → standardize → split over a [`DataLayout`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use subspecies_core::{PipelineConfig, Result};
use tracing::info;

use crate::clean::Cleaner;
use crate::progress::{NoProgress, ProgressSink};
use crate::report::StageReport;
use crate::split::{SplitReport, Splitter};
use crate::standardize::Standardizer;

/// Reports of a full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub clean: StageReport,
    pub standardize: StageReport,
    pub split: SplitReport,
}

impl PipelineReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineReport> {
        self.run_with_progress(&NoProgress)
    }

    /// Runs the three stages in order; the first error aborts the run
    pub fn run_with_progress(&self, progress: &dyn ProgressSink) -> Result<PipelineReport> {
        let layout = &self.config.layout;
        let started_at = Utc::now();

        info!("[1/3] Cleaning {:?}", layout.raw);
        let clean = Cleaner::new().run_with_progress(&layout.raw, progress)?;

        info!("[2/3] Standardizing {:?} -> {:?}", layout.raw, layout.processed);
        let standardize = Standardizer::new(self.config.standardize.clone())?
            .run_with_progress(&layout.raw, &layout.processed, progress)?;

        info!("[3/3] Splitting {:?}", layout.processed);
        let split = Splitter::new(self.config.split.clone())?.run_with_progress(
            &layout.processed,
            &layout.split_targets(),
            progress,
        )?;

        let finished_at = Utc::now();
        info!(
            "Pipeline finished in {:.1}s",
            (finished_at - started_at).num_milliseconds() as f64 / 1000.0
        );

        Ok(PipelineReport {
            started_at,
            finished_at,
            clean,
            standardize,
            split,
        })
    }
}
