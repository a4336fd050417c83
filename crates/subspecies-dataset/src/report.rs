//! Per-file outcome records collected by the cleaning and standardization stages.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use subspecies_core::{ClassLabel, Result};

/// Which stage produced a report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Clean,
    Standardize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Clean => write!(f, "clean"),
            Stage::Standardize => write!(f, "standardize"),
        }
    }
}

/// What happened to a single file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Decoded successfully and left in place
    Kept,
    /// Failed to decode and was deleted
    Removed { reason: String },
    /// Resized output written
    Written { width: u32, height: u32 },
    /// Failed to decode, resize or encode; no output written
    Skipped { reason: String },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Kept | FileOutcome::Written { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            FileOutcome::Removed { reason } | FileOutcome::Skipped { reason } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_name: String,
    /// Source path the outcome refers to
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Records for one class directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassReport {
    pub label: ClassLabel,
    pub records: Vec<FileRecord>,
}

impl ClassReport {
    pub fn new(label: ClassLabel) -> Self {
        Self {
            label,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, file_name: impl Into<String>, path: impl Into<PathBuf>, outcome: FileOutcome) {
        self.records.push(FileRecord {
            file_name: file_name.into(),
            path: path.into(),
            outcome,
        });
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    /// File names whose outcome was successful, in processing order
    pub fn successful_files(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.outcome.is_success())
            .map(|r| r.file_name.as_str())
            .collect()
    }
}

/// Report of a cleaning or standardization pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub source: PathBuf,
    pub target: Option<PathBuf>,
    pub classes: Vec<ClassReport>,
}

impl StageReport {
    pub fn new(stage: Stage, source: impl Into<PathBuf>, target: Option<PathBuf>) -> Self {
        Self {
            stage,
            source: source.into(),
            target,
            classes: Vec::new(),
        }
    }

    pub fn class(&self, label: &str) -> Option<&ClassReport> {
        self.classes.iter().find(|c| c.label.as_str() == label)
    }

    /// Every failed record with its class
    pub fn failures(&self) -> impl Iterator<Item = (&ClassLabel, &FileRecord)> {
        self.classes.iter().flat_map(|c| {
            c.records
                .iter()
                .filter(|r| !r.outcome.is_success())
                .map(move |r| (&c.label, r))
        })
    }

    pub fn summary(&self) -> StageSummary {
        let files: usize = self.classes.iter().map(|c| c.records.len()).sum();
        let succeeded: usize = self.classes.iter().map(|c| c.succeeded()).sum();

        StageSummary {
            stage: self.stage,
            classes: self.classes.len(),
            files,
            succeeded,
            failed: files - succeeded,
        }
    }

    /// Save the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Aggregate counts of a [`StageReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub classes: usize,
    pub files: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl std::fmt::Display for StageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (ok, failed) = match self.stage {
            Stage::Clean => ("kept", "removed"),
            Stage::Standardize => ("written", "skipped"),
        };
        write!(
            f,
            "{}: {} classes, {} files ({} {}, {} {})",
            self.stage, self.classes, self.files, self.succeeded, ok, self.failed, failed
        )
    }
}
