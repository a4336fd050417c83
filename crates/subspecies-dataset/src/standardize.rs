//! Image standardization: every image of a class tree resized to one fixed size.
//!
//! The resize is direct (no crop, no padding) so the aspect ratio is not
//! preserved. Output goes to a mirrored tree under the same file names.

use image::{imageops, DynamicImage};
use std::fs;
use std::path::Path;
use subspecies_core::{ClassDirectory, Error, ImageDimensions, Result, StandardizeConfig};
use tracing::{debug, info, warn};

use crate::loader::{decode_image, DatasetScanner};
use crate::progress::{NoProgress, ProgressSink};
use crate::report::{ClassReport, FileOutcome, Stage, StageReport};

/// Image standardizer
pub struct Standardizer {
    config: StandardizeConfig,
}

impl Standardizer {
    /// Creates a new standardizer with the given configuration
    pub fn new(config: StandardizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn target_size(&self) -> ImageDimensions {
        self.config.target_size
    }

    /// Standardizes every class below `source` into `target`
    pub fn run(&self, source: &Path, target: &Path) -> Result<StageReport> {
        self.run_with_progress(source, target, &NoProgress)
    }

    pub fn run_with_progress(
        &self,
        source: &Path,
        target: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<StageReport> {
        info!("Standardizing images from {:?} to {:?}", source, target);
        info!("Target size: {} ({} filter)", self.config.target_size, self.config.filter);

        let classes = DatasetScanner::new(source).scan()?;
        info!("Found {} class directories", classes.len());
        progress.start("standardize", classes.len());

        let mut report = StageReport::new(Stage::Standardize, source, Some(target.to_path_buf()));

        for class in &classes {
            let class_report = self.standardize_class(class, target)?;
            progress.class_done(&class.label, class.len());
            report.classes.push(class_report);
        }

        progress.finish();

        let summary = report.summary();
        info!("{}", summary);

        Ok(report)
    }

    /// Resizes one class into `target/<class>`, creating the directory even
    /// when no file of the class survives
    pub fn standardize_class(&self, class: &ClassDirectory, target: &Path) -> Result<ClassReport> {
        let output_class_dir = target.join(&class.label);
        fs::create_dir_all(&output_class_dir)?;

        let mut report = ClassReport::new(class.label.clone());

        for file in &class.files {
            let output_path = output_class_dir.join(&file.file_name);

            match self.standardize_file(&file.path, &output_path) {
                Ok(dims) => {
                    debug!("Wrote {} ({})", output_path.display(), dims);
                    report.push(
                        &file.file_name,
                        &file.path,
                        FileOutcome::Written {
                            width: dims.width,
                            height: dims.height,
                        },
                    );
                }
                Err(e) => {
                    warn!(
                        path = %file.path.display(),
                        reason = %e,
                        "Skipped image"
                    );
                    report.push(
                        &file.file_name,
                        &file.path,
                        FileOutcome::Skipped {
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        info!(
            "  {}: {} written, {} skipped",
            class.label,
            report.succeeded(),
            report.failed()
        );

        Ok(report)
    }

    /// Decodes, resizes and writes one image; the output format follows the
    /// extension of `output_path`
    pub fn standardize_file(&self, input_path: &Path, output_path: &Path) -> Result<ImageDimensions> {
        let image = decode_image(input_path)?;
        let resized = self.resize(&image);

        resized.save(output_path).map_err(|e| {
            Error::Image(format!("Failed to save {}: {}", output_path.display(), e))
        })?;

        Ok(ImageDimensions::new(resized.width(), resized.height()))
    }

    /// Resizes an image to exactly the target dimensions
    pub fn resize(&self, image: &DynamicImage) -> DynamicImage {
        let target_w = self.config.target_size.width;
        let target_h = self.config.target_size.height;
        let filter = self.config.filter.to_filter_type();

        if self.config.force_rgb {
            let rgb = image.to_rgb8();
            if rgb.dimensions() == (target_w, target_h) {
                return DynamicImage::ImageRgb8(rgb);
            }
            DynamicImage::ImageRgb8(imageops::resize(&rgb, target_w, target_h, filter))
        } else {
            if (image.width(), image.height()) == (target_w, target_h) {
                return image.clone();
            }
            image.resize_exact(target_w, target_h, filter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_support::*;
    use image::{GenericImageView, ImageBuffer, Rgba};
    use subspecies_core::ResizeFilter;
    use tempfile::TempDir;

    fn standardizer(width: u32, height: u32) -> Standardizer {
        Standardizer::new(StandardizeConfig {
            target_size: ImageDimensions::new(width, height),
            ..StandardizeConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_zero_target_size() {
        let config = StandardizeConfig {
            target_size: ImageDimensions::new(0, 224),
            ..StandardizeConfig::default()
        };
        assert!(Standardizer::new(config).is_err());
    }

    #[test]
    fn test_resize_ignores_aspect_ratio() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(300, 100, image::Rgb([10, 20, 30])));
        let resized = standardizer(64, 64).resize(&img);
        assert_eq!(resized.dimensions(), (64, 64));
    }

    #[test]
    fn test_resize_converts_to_rgb() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(16, 16, Rgba([1, 2, 3, 255])));
        let resized = standardizer(8, 8).resize(&img);
        assert!(matches!(resized, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_resize_keeps_color_type_without_force_rgb() {
        let standardizer = Standardizer::new(StandardizeConfig {
            target_size: ImageDimensions::new(8, 8),
            filter: ResizeFilter::Nearest,
            force_rgb: false,
        })
        .unwrap();
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(16, 16, Rgba([1, 2, 3, 255])));
        let resized = standardizer.resize(&img);
        assert!(matches!(resized, DynamicImage::ImageRgba8(_)));
        assert_eq!(resized.dimensions(), (8, 8));
    }

    #[test]
    fn test_standardize_mirrors_tree() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("raw");
        let target = temp_dir.path().join("processed");
        fs::create_dir_all(source.join("fox")).unwrap();
        fs::create_dir_all(source.join("wolf")).unwrap();

        create_test_image(&source.join("fox/a.jpg"), 400, 300);
        create_test_image(&source.join("fox/c.png"), 50, 120);
        create_test_image(&source.join("wolf/w.png"), 224, 224);

        let report = standardizer(224, 224).run(&source, &target).unwrap();

        for rel in ["fox/a.jpg", "fox/c.png", "wolf/w.png"] {
            let dims = image::image_dimensions(target.join(rel)).unwrap();
            assert_eq!(dims, (224, 224), "{rel}");
        }
        assert_eq!(report.summary().succeeded, 3);
        assert_eq!(report.summary().failed, 0);
        assert_eq!(report.target.as_deref(), Some(target.as_path()));
    }

    #[test]
    fn test_standardize_skips_bad_files_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("raw");
        let target = temp_dir.path().join("processed");
        fs::create_dir_all(source.join("fox")).unwrap();

        fs::write(source.join("fox/a_broken.jpg"), b"garbage").unwrap();
        create_test_image(&source.join("fox/b.png"), 30, 30);

        let report = standardizer(16, 16).run(&source, &target).unwrap();

        assert!(source.join("fox/a_broken.jpg").exists());
        assert!(!target.join("fox/a_broken.jpg").exists());
        assert!(target.join("fox/b.png").exists());

        let fox = report.class("fox").unwrap();
        assert_eq!(fox.successful_files(), vec!["b.png"]);
        assert!(matches!(fox.records[0].outcome, FileOutcome::Skipped { .. }));
    }

    #[test]
    fn test_standardize_skips_unknown_output_format() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("raw");
        let target = temp_dir.path().join("processed");
        fs::create_dir_all(source.join("fox")).unwrap();

        // PNG content behind an extension no encoder is registered for
        create_test_image(&source.join("fox/photo.png"), 10, 10);
        fs::rename(source.join("fox/photo.png"), source.join("fox/photo.raw")).unwrap();

        let report = standardizer(8, 8).run(&source, &target).unwrap();

        assert_eq!(report.summary().failed, 1);
        assert!(!target.join("fox/photo.raw").exists());
    }

    #[test]
    fn test_standardize_creates_empty_class_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("raw");
        let target = temp_dir.path().join("processed");
        fs::create_dir_all(source.join("empty_class")).unwrap();

        standardizer(8, 8).run(&source, &target).unwrap();
        assert!(target.join("empty_class").is_dir());
    }
}
