//! obblabel: oriented bounding-box labels for synthetic detection datasets.
//!
//! obblabel projects the 3D meshes of target objects through a camera,
//! takes the convex hull of the projected points, fits an oriented rectangle
//! around it and writes YOLO-OBB / DOTA-style label lines
//! (`class_id x1 y1 x2 y2 x3 y3 x4 y4`, normalized, six decimals).
//!
//! # Modules
//!
//! - [`project`]: Camera and mesh traits, projection to normalized points
//! - [`geom`]: Typed coordinates, convex hull, rectangle fitting, corner order
//! - [`label`]: Label records, label files and the dataset layout
//! - [`pipeline`]: Per-frame labeling and dataset generation
//! - [`scene`]: JSON scene files implementing the projector traits
//! - [`validation`]: Checks for existing label directories
//! - [`config`]: Generation settings
//! - [`error`]: Error types for obblabel operations

pub mod config;
pub mod error;
pub mod geom;
pub mod label;
pub mod pipeline;
pub mod project;
pub mod scene;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::ObbLabelError;

use config::GenerateConfig;
use geom::RectStrategy;
use validation::ValidationIssue;

/// The obblabel CLI application.
#[derive(Parser)]
#[command(name = "obblabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate label files from scene descriptions.
    Generate(GenerateArgs),
    /// Validate an existing labels directory.
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Scene JSON files or directories containing them.
    #[arg(required = true)]
    scenes: Vec<PathBuf>,

    /// Dataset root to write into.
    #[arg(short, long)]
    output: PathBuf,

    /// YAML file with generation settings.
    #[arg(long, env = "OBBLABEL_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset split (overrides the config file).
    #[arg(long)]
    split: Option<String>,

    /// Class name written to data.yaml (overrides the config file).
    #[arg(long)]
    class_name: Option<String>,

    /// Rectangle fitting strategy ('principal-axis' or 'min-area').
    #[arg(long)]
    strategy: Option<String>,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Dataset root containing labels/, or a labels directory.
    input: PathBuf,

    /// Fail on warnings too.
    #[arg(long)]
    strict: bool,

    /// Do not check that every label file has a matching image.
    #[arg(long)]
    no_images: bool,

    /// Report format: 'text' or 'json'.
    #[arg(long, default_value = "text")]
    output: String,
}

/// Parses the command line and runs the chosen subcommand.
pub fn run() -> Result<(), ObbLabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate(args)) => run_generate(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("obblabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Oriented bounding-box label generator.");
            println!();
            println!("Run 'obblabel --help' for usage information.");
            Ok(())
        }
    }
}

/// Applies CLI overrides to the loaded config and generates the dataset.
fn run_generate(args: GenerateArgs) -> Result<(), ObbLabelError> {
    let mut config = match &args.config {
        Some(path) => GenerateConfig::load(path)?,
        None => GenerateConfig::default(),
    };

    if let Some(split) = args.split {
        config.split = split;
    }
    if let Some(class_name) = args.class_name {
        config.class_name = class_name;
    }
    if let Some(name) = args.strategy.as_deref() {
        config.rect_strategy = RectStrategy::from_name(name).ok_or_else(|| {
            ObbLabelError::Unsupported(format!(
                "rect strategy '{}' (supported: principal-axis, min-area)",
                name
            ))
        })?;
    }

    let summary = pipeline::generate_dataset(&args.scenes, &args.output, &config)?;
    println!("{}", summary);
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    error_count: usize,
    warning_count: usize,
    issues: &'a [ValidationIssue],
}

/// Validates a labels tree and prints the report.
fn run_validate(args: ValidateArgs) -> Result<(), ObbLabelError> {
    let opts = validation::ValidateOptions {
        strict: args.strict,
        check_images: !args.no_images,
    };

    // Reject a bad --output before doing any work.
    let json = match args.output.as_str() {
        "json" => true,
        "text" => false,
        other => {
            return Err(ObbLabelError::Unsupported(format!(
                "output format '{}' (supported: text, json)",
                other
            )));
        }
    };

    let report = validation::validate_label_dir(&args.input, &opts)?;

    if json {
        let body = JsonReport {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            issues: &report.issues,
        };
        let text =
            serde_json::to_string_pretty(&body).map_err(|e| ObbLabelError::Io(e.into()))?;
        println!("{}", text);
    } else {
        print!("{}", report);
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (opts.strict && has_warnings) {
        Err(ObbLabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
