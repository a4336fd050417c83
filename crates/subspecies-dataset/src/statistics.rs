//! Dataset statistics computation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use subspecies_core::{ClassDirectory, ClassLabel, Result};
use tracing::debug;

use crate::loader::DatasetScanner;

/// Per-class statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStatistics {
    pub label: ClassLabel,
    pub count: usize,
    pub total_size_bytes: u64,
    pub avg_size_bytes: u64,
    /// Mean (width, height) over files whose header could be read
    pub mean_dimensions: Option<(f64, f64)>,
    /// Files whose image header could not be read
    pub unreadable: usize,
}

impl ClassStatistics {
    pub fn collect(class: &ClassDirectory) -> Result<Self> {
        let mut total_size_bytes = 0u64;
        let mut width_sum = 0f64;
        let mut height_sum = 0f64;
        let mut readable = 0usize;

        for file in &class.files {
            total_size_bytes += fs::metadata(&file.path)?.len();

            match image::image_dimensions(&file.path) {
                Ok((w, h)) => {
                    width_sum += w as f64;
                    height_sum += h as f64;
                    readable += 1;
                }
                Err(e) => debug!("Cannot read dimensions of {}: {}", file.path.display(), e),
            }
        }

        let count = class.len();

        Ok(Self {
            label: class.label.clone(),
            count,
            total_size_bytes,
            avg_size_bytes: if count > 0 {
                total_size_bytes / count as u64
            } else {
                0
            },
            mean_dimensions: (readable > 0)
                .then(|| (width_sum / readable as f64, height_sum / readable as f64)),
            unreadable: count - readable,
        })
    }
}

/// Dataset statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub root: PathBuf,
    pub num_classes: usize,
    pub num_samples: usize,
    pub total_size_bytes: u64,
    pub classes: Vec<ClassStatistics>,
}

impl DatasetStatistics {
    /// Scans `root` and gathers per-class counts, sizes and dimensions
    pub fn collect(root: &Path) -> Result<Self> {
        let classes = DatasetScanner::new(root)
            .scan()?
            .iter()
            .map(ClassStatistics::collect)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root: root.to_path_buf(),
            num_classes: classes.len(),
            num_samples: classes.iter().map(|c| c.count).sum(),
            total_size_bytes: classes.iter().map(|c| c.total_size_bytes).sum(),
            classes,
        })
    }

    pub fn avg_per_class(&self) -> usize {
        if self.num_classes > 0 {
            self.num_samples / self.num_classes
        } else {
            0
        }
    }

    /// Largest over smallest class size; infinite when some class is empty
    pub fn imbalance_ratio(&self) -> f64 {
        let min = self.classes.iter().map(|c| c.count).min().unwrap_or(0);
        let max = self.classes.iter().map(|c| c.count).max().unwrap_or(0);

        if min > 0 {
            max as f64 / min as f64
        } else if max == 0 {
            1.0
        } else {
            f64::INFINITY
        }
    }

    /// Save the statistics as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_support::create_test_image;
    use tempfile::TempDir;

    #[test]
    fn test_collect_statistics() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("fox")).unwrap();
        fs::create_dir_all(root.join("wolf")).unwrap();

        create_test_image(&root.join("fox/a.png"), 10, 20);
        create_test_image(&root.join("fox/b.png"), 30, 40);
        fs::write(root.join("fox/notes.txt"), "x").unwrap();
        create_test_image(&root.join("wolf/w.png"), 8, 8);

        let stats = DatasetStatistics::collect(root).unwrap();
        assert_eq!(stats.num_classes, 2);
        assert_eq!(stats.num_samples, 4);
        assert_eq!(stats.avg_per_class(), 2);
        assert!((stats.imbalance_ratio() - 3.0).abs() < 1e-9);

        let fox = &stats.classes[0];
        assert_eq!(fox.label.as_str(), "fox");
        assert_eq!(fox.count, 3);
        assert_eq!(fox.unreadable, 1);
        assert_eq!(fox.mean_dimensions, Some((20.0, 30.0)));
        assert!(fox.total_size_bytes > 0);
    }

    #[test]
    fn test_imbalance_with_empty_class() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::create_dir_all(root.join("fox")).unwrap();
        create_test_image(&root.join("fox/a.png"), 4, 4);

        let stats = DatasetStatistics::collect(root).unwrap();
        assert!(stats.imbalance_ratio().is_infinite());
        assert_eq!(stats.classes[0].mean_dimensions, None);
    }

    #[test]
    fn test_save_statistics() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        fs::create_dir_all(root.join("fox")).unwrap();
        create_test_image(&root.join("fox/a.png"), 4, 4);

        let stats = DatasetStatistics::collect(&root).unwrap();
        let out = temp_dir.path().join("stats.json");
        stats.save(&out).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(json["num_samples"], 1);
        assert_eq!(json["classes"][0]["label"], "fox");
    }
}
