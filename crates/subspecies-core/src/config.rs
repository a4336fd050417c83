//! Configuration structures for the preprocessing pipeline.

use crate::error::{Error, Result};
use crate::types::{DataSplit, ImageDimensions, ResizeFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full pipeline configuration, loadable from a TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory layout
    pub layout: DataLayout,
    /// Standardization parameters
    pub standardize: StandardizeConfig,
    /// Split parameters
    pub split: SplitConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.standardize.validate()?;
        self.split.validate()
    }
}

/// Directory layout of the dataset
///
/// `raw/<class>/<file>` → `processed/<class>/<file>` → `{train,val,test}/<class>/<file>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DataLayout {
    /// Raw images, cleaned in place
    pub raw: PathBuf,
    /// Standardized images
    pub processed: PathBuf,
    /// Training split
    pub train: PathBuf,
    /// Validation split
    pub val: PathBuf,
    /// Test split
    pub test: PathBuf,
}

impl DataLayout {
    /// Conventional layout below a single data root
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            raw: root.join("raw"),
            processed: root.join("processed"),
            train: root.join(DataSplit::Train.dir_name()),
            val: root.join(DataSplit::Validation.dir_name()),
            test: root.join(DataSplit::Test.dir_name()),
        }
    }

    pub fn split_targets(&self) -> SplitTargets {
        SplitTargets {
            train: self.train.clone(),
            val: self.val.clone(),
            test: self.test.clone(),
        }
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::under("data")
    }
}

/// Target roots for the three splits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitTargets {
    pub train: PathBuf,
    pub val: PathBuf,
    pub test: PathBuf,
}

impl SplitTargets {
    pub fn root_for(&self, split: DataSplit) -> &Path {
        match split {
            DataSplit::Train => &self.train,
            DataSplit::Validation => &self.val,
            DataSplit::Test => &self.test,
        }
    }
}

/// Configuration for image standardization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizeConfig {
    /// Output dimensions; aspect ratio is not preserved
    pub target_size: ImageDimensions,
    /// Resampling filter
    pub filter: ResizeFilter,
    /// Whether to convert to RGB (from RGBA, grayscale, etc.) before resizing
    pub force_rgb: bool,
}

impl Default for StandardizeConfig {
    fn default() -> Self {
        Self {
            target_size: ImageDimensions::imagenet(),
            filter: ResizeFilter::Lanczos3,
            force_rgb: true,
        }
    }
}

impl StandardizeConfig {
    pub fn validate(&self) -> Result<()> {
        self.target_size.validate()
    }
}

/// Ratios closer than this to zero are treated as zero
pub const RATIO_EPSILON: f64 = 1e-9;

/// Train/validation/test split ratios
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SplitRatios {
    /// Training data ratio
    pub train: f64,
    /// Validation data ratio
    pub validation: f64,
    /// Test data ratio
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation: 0.2,
            test: 0.1,
        }
    }
}

impl SplitRatios {
    /// Builds ratios from train and validation, the test share being the remainder
    pub fn from_train_val(train: f64, validation: f64) -> Result<Self> {
        let mut test = 1.0 - train - validation;
        if test.abs() < RATIO_EPSILON {
            test = 0.0;
        }
        let ratios = Self {
            train,
            validation,
            test,
        };
        ratios.validate()?;
        Ok(ratios)
    }

    /// Validates that every ratio lies in [0, 1] and that they sum to 1.0
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("train", self.train),
            ("validation", self.validation),
            ("test", self.test),
        ] {
            if !value.is_finite() || !(-RATIO_EPSILON..=1.0 + RATIO_EPSILON).contains(&value) {
                return Err(Error::Config(format!(
                    "Split ratio '{name}' must be between 0.0 and 1.0, got {value}"
                )));
            }
        }

        let sum = self.train + self.validation + self.test;
        if (sum - 1.0).abs() > 1e-5 {
            return Err(Error::Config(format!(
                "Split ratios must sum to 1.0, got {sum}"
            )));
        }

        if self.train <= 0.0 {
            return Err(Error::Config("Training ratio must be positive".to_string()));
        }

        Ok(())
    }

    /// Fraction held out from training in the first stage
    pub fn holdout(&self) -> f64 {
        (self.validation + self.test).max(0.0)
    }

    /// Test fraction relative to the holdout, used by the second stage.
    ///
    /// Shares below [`RATIO_EPSILON`] count as zero.
    pub fn test_within_holdout(&self) -> f64 {
        let holdout = self.holdout();
        if holdout < RATIO_EPSILON || self.test < RATIO_EPSILON {
            0.0
        } else {
            (self.test / holdout).clamp(0.0, 1.0)
        }
    }
}

/// Configuration for the stratified splitter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Target proportions
    pub ratios: SplitRatios,
    /// Seed for the train/holdout stage
    pub seed: u64,
    /// Seed for the validation/test stage; `None` draws from OS entropy
    pub holdout_seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            seed: 42,
            holdout_seed: None,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        self.ratios.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.split.seed, 42);
        assert!(config.split.holdout_seed.is_none());
        assert_eq!(config.standardize.target_size, ImageDimensions::new(224, 224));
        assert_eq!(config.layout.raw, PathBuf::from("data/raw"));
        assert_eq!(config.layout.val, PathBuf::from("data/val"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_ratios_validation() {
        assert!(SplitRatios::default().validate().is_ok());

        let invalid = SplitRatios {
            train: 0.5,
            validation: 0.3,
            test: 0.1,
        };
        assert!(invalid.validate().is_err());

        let negative = SplitRatios {
            train: 0.9,
            validation: 0.2,
            test: -0.1,
        };
        assert!(negative.validate().is_err());

        let no_train = SplitRatios {
            train: 0.0,
            validation: 0.5,
            test: 0.5,
        };
        assert!(no_train.validate().is_err());
    }

    #[test]
    fn test_ratios_from_train_val() {
        let ratios = SplitRatios::from_train_val(0.7, 0.2).unwrap();
        assert!((ratios.test - 0.1).abs() < 1e-9);
        assert!(SplitRatios::from_train_val(0.8, 0.3).is_err());
    }

    #[test]
    fn test_from_train_val_without_test_share() {
        // 1.0 - 0.7 - 0.3 leaves 5.55e-17 behind
        let ratios = SplitRatios::from_train_val(0.7, 0.3).unwrap();
        assert_eq!(ratios.test, 0.0);
        assert_eq!(ratios.test_within_holdout(), 0.0);

        let noisy = SplitRatios {
            train: 0.7,
            validation: 0.3,
            test: 1e-12,
        };
        assert_eq!(noisy.test_within_holdout(), 0.0);
    }

    #[test]
    fn test_second_stage_ratio() {
        let ratios = SplitRatios::default();
        assert!((ratios.holdout() - 0.3).abs() < 1e-9);
        assert!((ratios.test_within_holdout() - 1.0 / 3.0).abs() < 1e-9);

        let train_only = SplitRatios {
            train: 1.0,
            validation: 0.0,
            test: 0.0,
        };
        assert_eq!(train_only.test_within_holdout(), 0.0);
    }

    #[test]
    fn test_layout_under_root() {
        let layout = DataLayout::under("/tmp/zoo");
        assert_eq!(layout.processed, PathBuf::from("/tmp/zoo/processed"));
        let targets = layout.split_targets();
        assert_eq!(targets.root_for(DataSplit::Test), Path::new("/tmp/zoo/test"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [split]
            seed = 7

            [standardize.target_size]
            width = 128
            height = 96
            "#,
        )
        .unwrap();
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.split.ratios, SplitRatios::default());
        assert_eq!(config.standardize.target_size, ImageDimensions::new(128, 96));
        assert!(config.standardize.force_rgb);
    }
}
