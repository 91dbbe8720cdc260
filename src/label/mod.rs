//! OBB label records and label files.
//!
//! A label line is `class_id x1 y1 x2 y2 x3 y3 x4 y4`: a class index
//! followed by the four rectangle corners in normalized image coordinates,
//! formatted with six decimals. This is the layout read by YOLO-OBB trainers
//! and DOTA-derived tooling.

pub mod io;

use std::fmt;
use std::path::Path;

use crate::error::ObbLabelError;
use crate::geom::{Coord, Normalized, OrientedRect};

/// Class index written for every object; the generator is single-class.
pub const CLASS_ID: usize = 0;

/// Decimal places written per coordinate.
const LABEL_DECIMALS: i32 = 6;

const COORD_NAMES: [&str; 8] = ["x1", "y1", "x2", "y2", "x3", "y3", "x4", "y4"];

/// One object's label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRecord {
    pub class_id: usize,
    pub rect: OrientedRect<Normalized>,
}

impl LabelRecord {
    pub fn new(class_id: usize, rect: OrientedRect<Normalized>) -> Self {
        Self { class_id, rect }
    }

    /// The record written for a fitted rectangle.
    ///
    /// Corners are rounded to the written precision before they are put in
    /// canonical order, so a label file reads back in canonical order too.
    pub fn from_fitted(class_id: usize, rect: &OrientedRect<Normalized>) -> Self {
        let scale = 10f64.powi(LABEL_DECIMALS);
        let corners = rect
            .corners
            .map(|c| Coord::new((c.x * scale).round() / scale, (c.y * scale).round() / scale));
        Self::new(class_id, OrientedRect::new(corners).canonical())
    }
}

impl fmt::Display for LabelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_id)?;
        for corner in &self.rect.corners {
            write!(f, " {:.6} {:.6}", corner.x, corner.y)?;
        }
        Ok(())
    }
}

/// Renders records as label-file contents, one line each.
pub fn to_label_string(records: &[LabelRecord]) -> String {
    records.iter().map(|r| format!("{r}\n")).collect()
}

/// Parses one label line.
///
/// Blank lines yield `Ok(None)`.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelRecord>, ObbLabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 10 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(10).collect();

    if tokens.len() != 9 {
        let found = if tokens.len() > 9 {
            "more".to_string()
        } else {
            tokens.len().to_string()
        };
        return Err(ObbLabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 9 tokens (class_id + 4 corners), found {found}"),
        });
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| ObbLabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let mut values = [0.0; 8];
    for (i, value) in values.iter_mut().enumerate() {
        *value = parse_f64_token(tokens[i + 1], COORD_NAMES[i], file_path, line_num)?;
    }

    let corners = std::array::from_fn(|i| Coord::new(values[2 * i], values[2 * i + 1]));
    Ok(Some(LabelRecord::new(class_id, OrientedRect::new(corners))))
}

/// Fuzz-only entrypoint for single-line label parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), ObbLabelError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, ObbLabelError> {
    raw.parse::<f64>()
        .map_err(|_| ObbLabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}
