//! Stratified train/validation/test split of a class tree.
//!
//! Each class is split on its own, in two stages:
//! 1. **Train / holdout** - the holdout share (`validation + test`) is drawn
//!    from a RNG seeded with [`SplitConfig::seed`], freshly for every class, so
//!    the train assignment of a class is reproducible.
//! 2. **Validation / test** - the holdout is divided with the test share
//!    recomputed relative to the holdout (`test / (validation + test)`). This
//!    stage uses [`SplitConfig::holdout_seed`] when set and OS entropy otherwise.
//!
//! Files are copied, never moved, into `<target>/<class>/<file>`.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use subspecies_core::{
    ClassDirectory, ClassLabel, DataSplit, ImageFile, Result, SplitConfig, SplitTargets,
};
use tracing::{debug, info, warn};

use crate::loader::DatasetScanner;
use crate::progress::{NoProgress, ProgressSink};

/// Absorbs floating point noise such as `(1.0 - 0.7) * 10.0 == 3.0000000000000004`
const COUNT_TOLERANCE: f64 = 1e-9;

/// Number of `n` items that go to the second side when dividing between two
/// sides weighted `first` and `second`.
///
/// The second side gets `ceil(n * second / (first + second))`. When `n >= 2`
/// and both weights are positive, neither side is left empty; a single item
/// goes to the heavier side (the first one on a tie). Weights below
/// `1e-9` count as zero.
pub fn second_share(n: usize, first: f64, second: f64) -> usize {
    if n == 0 || second < COUNT_TOLERANCE {
        return 0;
    }
    if first < COUNT_TOLERANCE {
        return n;
    }
    if n == 1 {
        return usize::from(second > first);
    }

    let fraction = second / (first + second);
    let count = (n as f64 * fraction - COUNT_TOLERANCE).ceil().max(0.0) as usize;

    count.clamp(1, n - 1)
}

/// Train/validation/test file names of one class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSplit {
    pub label: ClassLabel,
    pub train: Vec<String>,
    pub validation: Vec<String>,
    pub test: Vec<String>,
}

impl ClassSplit {
    pub fn files(&self, split: DataSplit) -> &[String] {
        match split {
            DataSplit::Train => &self.train,
            DataSplit::Validation => &self.validation,
            DataSplit::Test => &self.test,
        }
    }

    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    /// The split a file was assigned to
    pub fn split_of(&self, file_name: &str) -> Option<DataSplit> {
        DataSplit::ALL
            .into_iter()
            .find(|split| self.files(*split).iter().any(|f| f == file_name))
    }
}

/// Result of a split pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    pub config: SplitConfig,
    pub source: PathBuf,
    pub targets: SplitTargets,
    pub classes: Vec<ClassSplit>,
}

impl SplitReport {
    pub fn class(&self, label: &str) -> Option<&ClassSplit> {
        self.classes.iter().find(|c| c.label.as_str() == label)
    }

    pub fn stats(&self) -> SplitStats {
        let count = |split: DataSplit| -> usize {
            self.classes.iter().map(|c| c.files(split).len()).sum()
        };

        SplitStats {
            num_classes: self.classes.len(),
            train: count(DataSplit::Train),
            validation: count(DataSplit::Validation),
            test: count(DataSplit::Test),
        }
    }

    /// Save the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Split sizes summed over all classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitStats {
    pub num_classes: usize,
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl SplitStats {
    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }
}

impl std::fmt::Display for SplitStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.total().max(1) as f64;
        writeln!(f, "Dataset Split Statistics:")?;
        writeln!(f, "  Number of classes: {}", self.num_classes)?;
        writeln!(f, "  Total images: {}", self.total())?;
        writeln!(f, "  Train: {} ({:.1}%)", self.train, 100.0 * self.train as f64 / total)?;
        writeln!(
            f,
            "  Validation: {} ({:.1}%)",
            self.validation,
            100.0 * self.validation as f64 / total
        )?;
        write!(f, "  Test: {} ({:.1}%)", self.test, 100.0 * self.test as f64 / total)
    }
}

/// Stratified splitter
pub struct Splitter {
    config: SplitConfig,
}

impl Splitter {
    pub fn new(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Splits every class below `source` and copies the files into `targets`.
    ///
    /// Target directories are not emptied first. Without a `holdout_seed` a
    /// rerun into the same targets can leave a file in both `val` and `test`.
    pub fn run(&self, source: &Path, targets: &SplitTargets) -> Result<SplitReport> {
        self.run_with_progress(source, targets, &NoProgress)
    }

    pub fn run_with_progress(
        &self,
        source: &Path,
        targets: &SplitTargets,
        progress: &dyn ProgressSink,
    ) -> Result<SplitReport> {
        let ratios = self.config.ratios;
        info!("Splitting dataset from {:?}", source);
        info!(
            "Ratios - Train: {:.0}%, Val: {:.0}%, Test: {:.0}% (seed {})",
            ratios.train * 100.0,
            ratios.validation * 100.0,
            ratios.test * 100.0,
            self.config.seed
        );

        let classes = DatasetScanner::new(source).scan()?;
        info!("Found {} classes", classes.len());
        progress.start("split", classes.len());

        let mut report = SplitReport {
            config: self.config.clone(),
            source: source.to_path_buf(),
            targets: targets.clone(),
            classes: Vec::with_capacity(classes.len()),
        };

        for class in &classes {
            let class_split = self.split_class(class, targets)?;
            progress.class_done(&class.label, class.len());
            report.classes.push(class_split);
        }

        progress.finish();

        let stats = report.stats();
        info!(
            "Split complete - Train: {}, Val: {}, Test: {}",
            stats.train, stats.validation, stats.test
        );

        Ok(report)
    }

    /// Assigns and copies one class
    pub fn split_class(&self, class: &ClassDirectory, targets: &SplitTargets) -> Result<ClassSplit> {
        let assignment = self.assign(class);

        for split in DataSplit::ALL {
            let class_dir = targets.root_for(split).join(&class.label);
            if class_dir.is_dir() && fs::read_dir(&class_dir)?.next().is_some() {
                warn!(
                    path = %class_dir.display(),
                    "Target directory is not empty, files from earlier runs are kept"
                );
            }
            fs::create_dir_all(&class_dir)?;

            for file_name in assignment.files(split) {
                let src = class.path.join(file_name);
                let dest = class_dir.join(file_name);
                debug!("{} -> {}", src.display(), dest.display());
                fs::copy(&src, &dest)?;
            }
        }

        info!(
            "  {}: {} total (train: {}, val: {}, test: {})",
            class.label,
            assignment.total(),
            assignment.train.len(),
            assignment.validation.len(),
            assignment.test.len()
        );

        Ok(assignment)
    }

    /// Computes the assignment of one class without touching the filesystem
    pub fn assign(&self, class: &ClassDirectory) -> ClassSplit {
        let ratios = self.config.ratios;

        let mut shuffled: Vec<&ImageFile> = class.files.iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        shuffled.shuffle(&mut rng);

        let n_holdout = second_share(shuffled.len(), ratios.train, ratios.holdout());
        let (holdout, train) = shuffled.split_at(n_holdout);

        let mut holdout = holdout.to_vec();
        let mut holdout_rng = match self.config.holdout_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        holdout.shuffle(&mut holdout_rng);

        let test_share = ratios.test_within_holdout();
        let n_test = second_share(holdout.len(), 1.0 - test_share, test_share);
        let (test, validation) = holdout.split_at(n_test);

        ClassSplit {
            label: class.label.clone(),
            train: sorted_names(train),
            validation: sorted_names(validation),
            test: sorted_names(test),
        }
    }
}

fn sorted_names(files: &[&ImageFile]) -> Vec<String> {
    let mut names: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();
    names.sort();
    names
}
