//! Preprocessing tool for subspecies image datasets.
//!
//! This tool provides the dataset preparation passes:
//! - Removing files that do not decode as images
//! - Resizing every image to a fixed size
//! - Stratified train/val/test splitting
//! - Dataset statistics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use subspecies_core::{
    load_toml_config, setup_cli_logging, ClassLabel, DataLayout, ImageDimensions,
    PipelineConfig, ResizeFilter, SplitConfig, SplitRatios, SplitTargets, StandardizeConfig,
};
use subspecies_dataset::{
    Cleaner, DatasetStatistics, Pipeline, ProgressSink, Splitter, StageReport, Standardizer,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "preprocess")]
#[command(about = "Preprocessing tool for subspecies image datasets", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write the stage report as JSON to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete files that cannot be decoded as images (in place, no backup)
    Clean {
        /// Directory containing one folder per class
        #[arg(short, long, default_value = "data/raw")]
        data_dir: PathBuf,
    },

    /// Resize every image to a fixed size into a mirrored tree
    Standardize {
        /// Input directory containing class folders
        #[arg(short, long, default_value = "data/raw")]
        input_dir: PathBuf,

        /// Output directory for resized images
        #[arg(short, long, default_value = "data/processed")]
        output_dir: PathBuf,

        /// Target width in pixels
        #[arg(long, default_value = "224")]
        width: u32,

        /// Target height in pixels
        #[arg(long, default_value = "224")]
        height: u32,

        /// Resampling filter: nearest, triangle, catmull_rom, gaussian, lanczos3
        #[arg(long, default_value = "lanczos3")]
        filter: ResizeFilter,

        /// Keep the source color type instead of converting to RGB
        #[arg(long)]
        keep_color_type: bool,
    },

    /// Split dataset into train/val/test sets, stratified per class
    Split {
        /// Data directory containing class folders
        #[arg(short, long, default_value = "data/processed")]
        data_dir: PathBuf,

        /// Root under which train/, val/ and test/ are created
        #[arg(short, long, default_value = "data")]
        output_root: PathBuf,

        /// Override the training directory
        #[arg(long)]
        train_dir: Option<PathBuf>,

        /// Override the validation directory
        #[arg(long)]
        val_dir: Option<PathBuf>,

        /// Override the test directory
        #[arg(long)]
        test_dir: Option<PathBuf>,

        /// Training set ratio
        #[arg(long, default_value = "0.7")]
        train_ratio: f64,

        /// Validation set ratio (test gets the remainder)
        #[arg(long, default_value = "0.2")]
        val_ratio: f64,

        /// Random seed for the train/holdout stage
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Random seed for the validation/test stage (unseeded when omitted)
        #[arg(long)]
        holdout_seed: Option<u64>,
    },

    /// Run clean, standardize and split in order
    Run {
        /// Data root containing raw/ (processed/, train/, val/, test/ are created)
        #[arg(long, default_value = "data")]
        data_root: PathBuf,

        /// Pipeline configuration (TOML); its layout replaces --data-root
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Analyze dataset and generate statistics
    Analyze {
        /// Data directory to analyze
        #[arg(short, long, default_value = "data/raw")]
        data_dir: PathBuf,

        /// Output file for statistics (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_cli_logging(cli.verbose)?;

    let report = cli.report.as_deref();

    match cli.command {
        Commands::Clean { data_dir } => clean(&data_dir, report)?,

        Commands::Standardize {
            input_dir,
            output_dir,
            width,
            height,
            filter,
            keep_color_type,
        } => {
            let config = StandardizeConfig {
                target_size: ImageDimensions::new(width, height),
                filter,
                force_rgb: !keep_color_type,
            };
            standardize(&input_dir, &output_dir, config, report)?
        }

        Commands::Split {
            data_dir,
            output_root,
            train_dir,
            val_dir,
            test_dir,
            train_ratio,
            val_ratio,
            seed,
            holdout_seed,
        } => {
            let defaults = DataLayout::under(&output_root).split_targets();
            let targets = SplitTargets {
                train: train_dir.unwrap_or(defaults.train),
                val: val_dir.unwrap_or(defaults.val),
                test: test_dir.unwrap_or(defaults.test),
            };
            let config = SplitConfig {
                ratios: SplitRatios::from_train_val(train_ratio, val_ratio)
                    .context("Invalid split ratios")?,
                seed,
                holdout_seed,
            };
            split(&data_dir, &targets, config, report)?
        }

        Commands::Run { data_root, config } => {
            let config = match config {
                Some(path) => load_toml_config::<PipelineConfig>(&path)?,
                None => PipelineConfig {
                    layout: DataLayout::under(&data_root),
                    ..PipelineConfig::default()
                },
            };
            run_pipeline(config, report)?
        }

        Commands::Analyze { data_dir, output } => analyze(&data_dir, output.as_deref())?,
    }

    Ok(())
}

/// Progress bar over the class directories of the running stage
#[derive(Default)]
struct ClassProgress {
    bar: RefCell<Option<ProgressBar>>,
}

impl ProgressSink for ClassProgress {
    fn start(&self, stage: &str, classes: usize) {
        let pb = ProgressBar::new(classes as u64);
        pb.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {prefix:>11} {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_prefix(stage.to_string());
        *self.bar.borrow_mut() = Some(pb);
    }

    fn class_done(&self, label: &ClassLabel, files: usize) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.set_message(format!("{label} ({files} files)"));
            pb.inc(1);
        }
    }

    fn finish(&self) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_with_message("Done");
        }
    }
}

fn save_stage_report(report: &StageReport, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        report
            .save(path)
            .with_context(|| format!("Failed to write report {:?}", path))?;
        info!("Report saved to {:?}", path);
    }
    Ok(())
}

fn print_failures(report: &StageReport) {
    for (label, record) in report.failures() {
        println!(
            "  {}/{}: {}",
            label,
            record.file_name,
            record.outcome.reason().unwrap_or("unknown")
        );
    }
}

/// Delete undecodable files in place
fn clean(data_dir: &Path, report_path: Option<&Path>) -> Result<()> {
    let report = Cleaner::new()
        .run_with_progress(data_dir, &ClassProgress::default())
        .with_context(|| format!("Failed to clean {:?}", data_dir))?;

    println!("\n{}", report.summary());
    print_failures(&report);

    save_stage_report(&report, report_path)
}

/// Resize images into a mirrored tree
fn standardize(
    input_dir: &Path,
    output_dir: &Path,
    config: StandardizeConfig,
    report_path: Option<&Path>,
) -> Result<()> {
    let report = Standardizer::new(config)?
        .run_with_progress(input_dir, output_dir, &ClassProgress::default())
        .with_context(|| format!("Failed to standardize {:?}", input_dir))?;

    println!("\n{}", report.summary());
    print_failures(&report);

    save_stage_report(&report, report_path)
}

/// Split dataset into train/val/test sets
fn split(
    data_dir: &Path,
    targets: &SplitTargets,
    config: SplitConfig,
    report_path: Option<&Path>,
) -> Result<()> {
    let report = Splitter::new(config)?
        .run_with_progress(data_dir, targets, &ClassProgress::default())
        .with_context(|| format!("Failed to split {:?}", data_dir))?;

    println!("\n{}", report.stats());

    if let Some(path) = report_path {
        report
            .save(path)
            .with_context(|| format!("Failed to write report {:?}", path))?;
        info!("Split assignment saved to {:?}", path);
    }

    Ok(())
}

/// Run all stages
fn run_pipeline(config: PipelineConfig, report_path: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::new(config)?;
    let report = pipeline
        .run_with_progress(&ClassProgress::default())
        .context("Pipeline failed")?;

    println!();
    println!("{}", report.clean.summary());
    print_failures(&report.clean);
    println!("{}", report.standardize.summary());
    print_failures(&report.standardize);
    println!("{}", report.split.stats());

    if let Some(path) = report_path {
        report
            .save(path)
            .with_context(|| format!("Failed to write report {:?}", path))?;
        info!("Pipeline report saved to {:?}", path);
    }

    Ok(())
}

/// Analyze dataset statistics
fn analyze(data_dir: &Path, output: Option<&Path>) -> Result<()> {
    info!("Analyzing dataset at {:?}", data_dir);

    let stats = DatasetStatistics::collect(data_dir)
        .with_context(|| format!("Failed to analyze {:?}", data_dir))?;

    println!("\nDataset Statistics\n");
    println!("{:<32} {:>8} {:>12} {:>15}", "Class", "Images", "Avg Size", "Mean Dims");
    println!("{}", "=".repeat(70));

    for class in &stats.classes {
        let dims = class
            .mean_dimensions
            .map(|(w, h)| format!("{:.0}x{:.0}", w, h))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:>8} {:>9} KB {:>15}",
            class.label,
            class.count,
            class.avg_size_bytes / 1024,
            dims
        );
    }

    println!("{}", "=".repeat(70));
    println!(
        "{:<32} {:>8} {:>9} MB",
        "TOTAL",
        stats.num_samples,
        stats.total_size_bytes / (1024 * 1024)
    );

    println!("\nSummary:");
    println!("  Total classes:       {}", stats.num_classes);
    println!("  Total images:        {}", stats.num_samples);
    println!("  Avg images/class:    {}", stats.avg_per_class());
    println!("  Imbalance ratio:     {:.1}:1", stats.imbalance_ratio());
    println!(
        "  Total size:          {:.2} MB",
        stats.total_size_bytes as f64 / (1024.0 * 1024.0)
    );

    if let Some(output_path) = output {
        stats.save(output_path)?;
        info!("Statistics saved to {:?}", output_path);
    }

    Ok(())
}
