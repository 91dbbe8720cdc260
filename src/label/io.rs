//! Dataset layout and label file I/O.
//!
//! Generated datasets follow the Ultralytics directory convention:
//!
//! ```text
//! <root>/
//!   data.yaml
//!   images/<split>/img0001.jpg   (written by the capture side)
//!   labels/<split>/img0001.txt
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use super::{parse_label_line, LabelRecord};
use crate::error::ObbLabelError;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];
pub const LABEL_EXTENSION: &str = "txt";

/// Largest class count accepted from a `data.yaml` mapping; gaps below the
/// highest index are filled, so the index bounds the allocation.
const MAX_CLASS_COUNT: usize = 65_536;

/// Output directories for one split of a generated dataset.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl DatasetLayout {
    /// Creates `images/<split>` and `labels/<split>` under `root`.
    pub fn create(root: &Path, split: &str) -> Result<Self, ObbLabelError> {
        let images_dir = root.join("images").join(split);
        let labels_dir = root.join("labels").join(split);
        fs::create_dir_all(&images_dir).map_err(ObbLabelError::Io)?;
        fs::create_dir_all(&labels_dir).map_err(ObbLabelError::Io)?;

        Ok(Self {
            root: root.to_path_buf(),
            images_dir,
            labels_dir,
        })
    }

    /// Path of the label file for image stem `stem`.
    pub fn label_path(&self, stem: &str) -> PathBuf {
        self.labels_dir.join(format!("{stem}.{LABEL_EXTENSION}"))
    }
}

/// Stem of the `index`-th generated image, e.g. `img0001`.
pub fn sequential_stem(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:04}")
}

/// Writes a label file, replacing any previous contents.
///
/// An empty `records` slice produces an empty file.
pub fn write_label_file(path: &Path, records: &[LabelRecord]) -> Result<(), ObbLabelError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ObbLabelError::Io)?;
    }

    let file = fs::File::create(path).map_err(ObbLabelError::Io)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writeln!(writer, "{record}").map_err(ObbLabelError::Io)?;
    }
    writer.flush().map_err(ObbLabelError::Io)
}

/// Reads every record of a label file, skipping blank lines.
pub fn read_label_file(path: &Path) -> Result<Vec<LabelRecord>, ObbLabelError> {
    let content = fs::read_to_string(path).map_err(ObbLabelError::Io)?;
    let mut records = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(record) = parse_label_line(line, path, line_idx + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Writes `data.yaml` with the class names in index order.
pub fn write_data_yaml(root: &Path, class_names: &[String]) -> Result<(), ObbLabelError> {
    let mut yaml = String::from("names:\n");
    for (idx, name) in class_names.iter().enumerate() {
        yaml.push_str(&format!("  {}: {}\n", idx, yaml_single_quoted(name)));
    }

    fs::write(root.join("data.yaml"), yaml).map_err(ObbLabelError::Io)
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Reads the class names from a `data.yaml` file.
///
/// Both the list form and the `index: name` mapping form are accepted; gaps
/// in a mapping are filled with `class_<index>`.
pub fn read_data_yaml_names(path: &Path) -> Result<Vec<String>, ObbLabelError> {
    let data = fs::read_to_string(path).map_err(ObbLabelError::Io)?;
    let parsed: DataYaml =
        serde_yaml::from_str(&data).map_err(|source| ObbLabelError::DataYamlParse {
            path: path.to_path_buf(),
            source,
        })?;

    let names = match parsed.names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            let Some(max_index) = mapping.keys().max().copied() else {
                return Ok(Vec::new());
            };
            if max_index >= MAX_CLASS_COUNT {
                return Err(ObbLabelError::LayoutInvalid {
                    path: path.to_path_buf(),
                    message: format!(
                        "class index {} in data.yaml exceeds the limit of {} classes",
                        max_index, MAX_CLASS_COUNT
                    ),
                });
            }
            let mut names = vec![String::new(); max_index + 1];
            for (index, name) in mapping {
                names[index] = name;
            }
            for (index, name) in names.iter_mut().enumerate() {
                if name.trim().is_empty() {
                    *name = format!("class_{}", index);
                }
            }
            names
        }
    };

    Ok(names)
}

/// An existing labels tree, as found by [`discover_labels`].
#[derive(Clone, Debug)]
pub struct LabelsLayout {
    pub root: PathBuf,
    pub labels_dir: PathBuf,
    /// `images/` next to `labels/`, if present.
    pub images_dir: Option<PathBuf>,
    /// `data.yaml` at the root, if present.
    pub data_yaml: Option<PathBuf>,
}

/// Locates the labels tree from a dataset root or a `labels/` directory.
pub fn discover_labels(input: &Path) -> Result<LabelsLayout, ObbLabelError> {
    if !input.is_dir() {
        return Err(ObbLabelError::LayoutInvalid {
            path: input.to_path_buf(),
            message: "input must be a directory".to_string(),
        });
    }

    let (root, labels_dir) = if input.join("labels").is_dir() {
        (input.to_path_buf(), input.join("labels"))
    } else if is_dir_named(input, "labels") {
        let root = input
            .parent()
            .ok_or_else(|| ObbLabelError::LayoutInvalid {
                path: input.to_path_buf(),
                message: "labels directory has no parent directory".to_string(),
            })?
            .to_path_buf();
        (root, input.to_path_buf())
    } else {
        return Err(ObbLabelError::LayoutInvalid {
            path: input.to_path_buf(),
            message: "expected a dataset root containing labels/ or a labels/ directory itself"
                .to_string(),
        });
    };

    let images_dir = Some(root.join("images")).filter(|dir| dir.is_dir());
    let data_yaml = Some(root.join("data.yaml")).filter(|path| path.is_file());

    Ok(LabelsLayout {
        root,
        labels_dir,
        images_dir,
        data_yaml,
    })
}

/// Recursively lists files under `root` with one of `extensions`, sorted by
/// relative path.
pub fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, ObbLabelError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| ObbLabelError::LayoutInvalid {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by_cached_key(|path| rel_string(root, path));
    Ok(files)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// Finds the image matching a label file's relative path, if any.
pub fn find_image_for_label(images_dir: &Path, label_rel_path: &Path) -> Option<PathBuf> {
    let stem_rel_path = label_rel_path.with_extension("");
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| images_dir.join(&stem_rel_path).with_extension(ext))
        .find(|candidate| candidate.is_file())
}

fn is_dir_named(path: &Path, dir_name: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.eq_ignore_ascii_case(dir_name))
        .unwrap_or(false)
}

/// `path` relative to `root`, with forward slashes.
pub fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
