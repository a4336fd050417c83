//! Core type definitions for subspecies dataset preparation.

use crate::error::{Error, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of a class subdirectory, used as the ground-truth label of every
/// image directly inside it (e.g. "red_fox", "arctic_fox").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ClassLabel(String);

impl ClassLabel {
    /// Creates a validated class label.
    ///
    /// Rejects empty names, `.`/`..`, names containing path separators and
    /// hidden names (leading `.`), which are never class directories.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::InvalidArgument("Class label cannot be empty".to_string()));
        }
        if name.starts_with('.') {
            return Err(Error::InvalidArgument(format!(
                "Class label cannot be hidden or relative: {name:?}"
            )));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(Error::InvalidArgument(format!(
                "Class label cannot contain path separators: {name:?}"
            )));
        }

        Ok(Self(name))
    }

    /// Derives the label from the last component of a directory path.
    pub fn from_dir(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "Directory name is not valid UTF-8: {}",
                    path.display()
                ))
            })?;
        Self::new(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClassLabel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ClassLabel> for String {
    fn from(label: ClassLabel) -> Self {
        label.0
    }
}

impl AsRef<Path> for ClassLabel {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A regular file inside a class directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File name, reused verbatim for every derived output
    pub file_name: String,
}

impl ImageFile {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("Path has no file name: {}", path.display()))
            })?;
        Ok(Self { path, file_name })
    }
}

/// One class subdirectory with its files in file-name order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDirectory {
    pub label: ClassLabel,
    pub path: PathBuf,
    pub files: Vec<ImageFile>,
}

impl ClassDirectory {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names in listing order
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.file_name.as_str())
    }
}

/// Data split type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataSplit {
    /// Training data
    Train,
    /// Validation data
    Validation,
    /// Test data
    Test,
}

impl DataSplit {
    pub const ALL: [DataSplit; 3] = [DataSplit::Train, DataSplit::Validation, DataSplit::Test];

    /// Conventional directory name under the data root
    pub fn dir_name(&self) -> &'static str {
        match self {
            DataSplit::Train => "train",
            DataSplit::Validation => "val",
            DataSplit::Test => "test",
        }
    }
}

impl std::fmt::Display for DataSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSplit::Train => write!(f, "train"),
            DataSplit::Validation => write!(f, "validation"),
            DataSplit::Test => write!(f, "test"),
        }
    }
}

/// Image dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDimensions {
    /// Creates new image dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Standard ImageNet input size (224x224) expected by the pretrained backbones
    pub fn imagenet() -> Self {
        Self::new(224, 224)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "Image dimensions must be non-zero, got {self}"
            )));
        }
        Ok(())
    }
}

impl Default for ImageDimensions {
    fn default() -> Self {
        Self::imagenet()
    }
}

impl std::fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resampling filter used when resizing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub fn to_filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl std::str::FromStr for ResizeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "triangle" | "bilinear" => Ok(ResizeFilter::Triangle),
            "catmull_rom" | "catmullrom" | "bicubic" => Ok(ResizeFilter::CatmullRom),
            "gaussian" => Ok(ResizeFilter::Gaussian),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(Error::InvalidArgument(format!(
                "Unknown resize filter: {other}. Use nearest, triangle, catmull_rom, gaussian or lanczos3"
            ))),
        }
    }
}

impl std::fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResizeFilter::Nearest => write!(f, "nearest"),
            ResizeFilter::Triangle => write!(f, "triangle"),
            ResizeFilter::CatmullRom => write!(f, "catmull_rom"),
            ResizeFilter::Gaussian => write!(f, "gaussian"),
            ResizeFilter::Lanczos3 => write!(f, "lanczos3"),
        }
    }
}
