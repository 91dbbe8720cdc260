//! Issues found while validating a labels directory.
//!
//! A report prints as a text listing and serializes to JSON.

use std::fmt;

use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// Issues in discovery order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// No errors; warnings are allowed.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// No issues of any severity.
    pub fn is_ok_strict(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// One finding, with where it was found.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    pub code: IssueCode,

    pub message: String,

    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Suspicious but usable by a trainer.
    Warning,
    /// Invalid or corrupt data.
    Error,
}

/// Stable issue codes; the snake_case form is what JSON reports carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // Layout issues
    /// The labels directory contains no label files.
    NoLabelFiles,
    /// There is no `data.yaml` next to `labels/`.
    MissingDataYaml,
    /// There is no `images/` directory next to `labels/`.
    MissingImagesDir,
    /// A label file has no matching image.
    MissingImage,

    // Record issues
    /// A line does not parse as a label record.
    LabelParse,
    /// A record references a class not listed in `data.yaml`.
    UnknownClass,
    /// A corner has a NaN or infinite coordinate.
    CoordNotFinite,
    /// A corner lies outside the unit square. Fitted rectangles may overhang
    /// the image edge; trainers clip them.
    CoordOutOfBounds,
    /// The four corners enclose (numerically) no area.
    DegenerateRect,
    /// The four corners do not form a rectangle.
    NotRectangular,
    /// The corners are not in canonical order.
    NonCanonicalOrder,
}

/// Where a validation issue occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    /// The labels tree as a whole.
    Dataset,
    /// A label file, by path relative to the labels directory.
    LabelFile { path: String },
    /// One line of a label file.
    Record { path: String, line: usize },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Dataset => write!(f, "dataset"),
            IssueContext::LabelFile { path } => write!(f, "{}", path),
            IssueContext::Record { path, line } => write!(f, "{}:{}", path, line),
        }
    }
}
