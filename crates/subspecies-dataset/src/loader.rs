//! Directory scanning and image decoding.
//!
//! A dataset root holds one subdirectory per class; every regular file inside a
//! class directory is a candidate image. Listings are sorted by file name so
//! that every stage sees the same order on every run.

use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use subspecies_core::{ClassDirectory, ClassLabel, Error, ImageFile, Result};
use tracing::debug;
use walkdir::WalkDir;

/// Scans a dataset root for class directories
pub struct DatasetScanner {
    /// Root directory containing one subdirectory per class
    root_dir: PathBuf,
}

impl DatasetScanner {
    /// Creates a new scanner
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Lists every class directory below the root, sorted by label.
    ///
    /// Files at the root level and hidden directories are skipped.
    pub fn scan(&self) -> Result<Vec<ClassDirectory>> {
        self.ensure_directory(&self.root_dir)?;

        let mut classes = Vec::new();

        for entry in WalkDir::new(&self.root_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;

            if !entry.file_type().is_dir() {
                debug!("Skipping non-directory entry {}", entry.path().display());
                continue;
            }

            let label = match ClassLabel::from_dir(entry.path()) {
                Ok(label) => label,
                Err(e) => {
                    debug!("Skipping directory {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            classes.push(self.scan_class(entry.path(), label)?);
        }

        Ok(classes)
    }

    /// Lists the regular files directly inside one class directory
    pub fn scan_class(&self, class_dir: &Path, label: ClassLabel) -> Result<ClassDirectory> {
        self.ensure_directory(class_dir)?;

        let mut files = Vec::new();

        for entry in WalkDir::new(class_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;

            if entry.file_type().is_file() {
                files.push(ImageFile::new(entry.into_path())?);
            } else {
                debug!("Skipping nested entry {}", entry.path().display());
            }
        }

        Ok(ClassDirectory {
            label,
            path: class_dir.to_path_buf(),
            files,
        })
    }

    fn ensure_directory(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            return Err(Error::NotFound(format!(
                "Directory not found: {}",
                dir.display()
            )));
        }

        if !dir.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "Path is not a directory: {}",
                dir.display()
            )));
        }

        Ok(())
    }
}

/// Fully decodes the file at `path`.
///
/// The format is guessed from the content first and the extension second.
/// Failing to open or read the file yields [`Error::Io`]; anything the decoder
/// rejects yields [`Error::Image`].
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;

    reader
        .decode()
        .map_err(|e| Error::Image(format!("Failed to decode {}: {}", path.display(), e)))
}
