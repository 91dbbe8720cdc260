//! Generation settings.
//!
//! Settings come from an optional YAML file; any field left out keeps its
//! default. Command-line flags are applied on top by the CLI.
//!
//! ```yaml
//! class_name: forklift
//! split: val
//! stem_prefix: frame_
//! start_index: 0
//! rect_strategy: min-area
//! write_data_yaml: true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ObbLabelError;
use crate::geom::RectStrategy;

/// Settings for `obblabel generate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Name written to `data.yaml` for class 0.
    pub class_name: String,
    /// Dataset split directory under `images/` and `labels/`.
    pub split: String,
    /// Prefix for sequential image stems.
    pub stem_prefix: String,
    /// Index of the first sequential stem.
    pub start_index: usize,
    pub rect_strategy: RectStrategy,
    pub write_data_yaml: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            class_name: "car".to_string(),
            split: "train".to_string(),
            stem_prefix: "img".to_string(),
            start_index: 1,
            rect_strategy: RectStrategy::PrincipalAxis,
            write_data_yaml: true,
        }
    }
}

impl GenerateConfig {
    /// Loads settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ObbLabelError> {
        let text = fs::read_to_string(path).map_err(ObbLabelError::Io)?;
        Self::from_yaml(&text).map_err(|source| ObbLabelError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses settings from a YAML string. An empty document gives the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}
