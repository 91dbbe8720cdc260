//! Validation of existing OBB label directories.
//!
//! Checks cover:
//! - Layout (label files present, `data.yaml` and images next to them)
//! - Record syntax and class ids
//! - Geometry (finite, inside the unit square, a real rectangle, canonical
//!   corner order)

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::ObbLabelError;
use crate::geom::BBoxXYXY;
use crate::label::io::{
    collect_files_with_extensions, discover_labels, find_image_for_label, read_data_yaml_names,
    rel_string, LABEL_EXTENSION,
};
use crate::label::{parse_label_line, LabelRecord, CLASS_ID};

/// How far outside `[0, 1]` a coordinate may stray before it is reported.
const BOUNDS_TOLERANCE: f64 = 1e-6;

/// Relative tolerance for the rectangle shape check.
const RECT_TOLERANCE: f64 = 1e-3;

/// Absolute error six-decimal rounding can add to a side or dot product.
const ROUNDING_SLACK: f64 = 2e-6;

/// Areas at or below this count as degenerate.
const MIN_AREA: f64 = 1e-12;

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
    /// If false, label files are not matched against images.
    pub check_images: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            check_images: true,
        }
    }
}

/// Validates a dataset root (containing `labels/`) or a labels directory.
///
/// Only layout problems that prevent reading anything at all are returned as
/// `Err`; everything else ends up in the report.
pub fn validate_label_dir(
    input: &Path,
    opts: &ValidateOptions,
) -> Result<ValidationReport, ObbLabelError> {
    let layout = discover_labels(input)?;
    let mut report = ValidationReport::new();

    let class_count = match &layout.data_yaml {
        Some(path) => Some(read_data_yaml_names(path)?.len()),
        None => {
            report.add(ValidationIssue::warning(
                IssueCode::MissingDataYaml,
                format!("no data.yaml in {}", layout.root.display()),
                IssueContext::Dataset,
            ));
            None
        }
    };

    let images_dir = if opts.check_images {
        if layout.images_dir.is_none() {
            report.add(ValidationIssue::warning(
                IssueCode::MissingImagesDir,
                format!("no images/ directory in {}", layout.root.display()),
                IssueContext::Dataset,
            ));
        }
        layout.images_dir.as_deref()
    } else {
        None
    };

    let label_files = collect_files_with_extensions(&layout.labels_dir, &[LABEL_EXTENSION])?;
    if label_files.is_empty() {
        report.add(ValidationIssue::warning(
            IssueCode::NoLabelFiles,
            format!("no .txt files under {}", layout.labels_dir.display()),
            IssueContext::Dataset,
        ));
    }

    for label_path in &label_files {
        let rel = rel_string(&layout.labels_dir, label_path);
        debug!("validating {}", rel);

        if let Some(images_dir) = images_dir {
            let rel_path = label_path
                .strip_prefix(&layout.labels_dir)
                .unwrap_or(label_path.as_path());
            if find_image_for_label(images_dir, rel_path).is_none() {
                report.add(ValidationIssue::warning(
                    IssueCode::MissingImage,
                    "no matching image".to_string(),
                    IssueContext::LabelFile { path: rel.clone() },
                ));
            }
        }

        let content = match fs::read_to_string(label_path) {
            Ok(content) => content,
            Err(err) => {
                report.add(ValidationIssue::error(
                    IssueCode::LabelParse,
                    format!("unreadable label file: {}", err),
                    IssueContext::LabelFile { path: rel.clone() },
                ));
                continue;
            }
        };
        for (line_idx, line) in content.lines().enumerate() {
            let line_num = line_idx + 1;
            let context = || IssueContext::Record {
                path: rel.clone(),
                line: line_num,
            };

            match parse_label_line(line, label_path, line_num) {
                Ok(Some(record)) => validate_record(&record, class_count, context, &mut report),
                Ok(None) => {}
                Err(ObbLabelError::LabelParse { message, .. }) => {
                    report.add(ValidationIssue::error(
                        IssueCode::LabelParse,
                        message,
                        context(),
                    ));
                }
                Err(other) => return Err(other),
            }
        }
    }

    Ok(report)
}

/// Checks one parsed record.
///
/// `class_count` is the number of names in `data.yaml`, if there is one;
/// without it only the generator's own class id is expected.
pub fn validate_record(
    record: &LabelRecord,
    class_count: Option<usize>,
    context: impl Fn() -> IssueContext,
    report: &mut ValidationReport,
) {
    match class_count {
        Some(count) if record.class_id >= count => {
            report.add(ValidationIssue::error(
                IssueCode::UnknownClass,
                format!(
                    "class_id {} not in data.yaml ({} class(es))",
                    record.class_id, count
                ),
                context(),
            ));
        }
        None if record.class_id != CLASS_ID => {
            report.add(ValidationIssue::warning(
                IssueCode::UnknownClass,
                format!(
                    "class_id {} without data.yaml to define it",
                    record.class_id
                ),
                context(),
            ));
        }
        _ => {}
    }

    let rect = &record.rect;
    if !rect.is_finite() {
        report.add(ValidationIssue::error(
            IssueCode::CoordNotFinite,
            "corner coordinates must be finite",
            context(),
        ));
        return;
    }

    let extent = rect.bounding_box();
    let unit = BBoxXYXY::from_xyxy(0.0, 0.0, 1.0, 1.0).expanded(BOUNDS_TOLERANCE);
    if !unit.contains_box(&extent) {
        report.add(ValidationIssue::warning(
            IssueCode::CoordOutOfBounds,
            format!("rectangle spans {:?}, outside [0, 1]", extent),
            context(),
        ));
    }

    if rect.area() <= MIN_AREA {
        report.add(ValidationIssue::warning(
            IssueCode::DegenerateRect,
            format!("rectangle has no area: {:?}", rect),
            context(),
        ));
        return;
    }

    let longest = rect.side_lengths().iter().cloned().fold(0.0_f64, f64::max);
    let tolerance = RECT_TOLERANCE.max(ROUNDING_SLACK / longest);
    if !rect.is_rectangular(tolerance) {
        report.add(ValidationIssue::error(
            IssueCode::NotRectangular,
            "corners do not form a rectangle",
            context(),
        ));
        return;
    }

    if rect.canonical() != *rect {
        report.add(ValidationIssue::warning(
            IssueCode::NonCanonicalOrder,
            "corners should start top-left and run with non-positive signed area",
            context(),
        ));
    }
}
