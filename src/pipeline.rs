//! Frame labeling: projection, hull, rectangle fit and vertex order for every
//! object, plus dataset generation over a batch of scene files.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::GenerateConfig;
use crate::error::ObbLabelError;
use crate::geom::{convex_hull, RectStrategy};
use crate::label::io::{
    collect_files_with_extensions, sequential_stem, write_data_yaml, write_label_file,
    DatasetLayout,
};
use crate::label::{LabelRecord, CLASS_ID};
use crate::project::{project_object, Camera, TargetObject};
use crate::scene::read_scene_json;

/// Fewest projected points an object needs to get a label.
pub const MIN_LABEL_POINTS: usize = 3;

/// Labels one object, or `None` if too few of its points are visible.
pub fn label_object<O, C>(object: &O, camera: &C, strategy: RectStrategy) -> Option<LabelRecord>
where
    O: TargetObject + ?Sized,
    C: Camera + ?Sized,
{
    let cloud = project_object(object, camera);
    if cloud.len() < MIN_LABEL_POINTS {
        debug!(
            "'{}' has {} visible point(s); excluded",
            object.name(),
            cloud.len()
        );
        return None;
    }

    let hull = convex_hull(&cloud);
    let rect = strategy.fit(&hull)?;
    if rect.area() <= 0.0 {
        debug!(
            "'{}' fits a zero-area rectangle at {:?}; its points coincide or are collinear",
            object.name(),
            rect.bounding_box()
        );
    }
    Some(LabelRecord::from_fitted(CLASS_ID, &rect))
}

/// Labels produced for one frame.
#[derive(Clone, Debug, Default)]
pub struct FrameLabels {
    /// One record per labeled object, in object order.
    pub records: Vec<LabelRecord>,
    /// Names of objects that did not get a label.
    pub excluded: Vec<String>,
}

/// Labels every object of a frame.
pub fn label_frame<'a, O, C, I>(objects: I, camera: &C, strategy: RectStrategy) -> FrameLabels
where
    O: TargetObject + 'a,
    C: Camera + ?Sized,
    I: IntoIterator<Item = &'a O>,
{
    let mut frame = FrameLabels::default();
    for object in objects {
        match label_object(object, camera, strategy) {
            Some(record) => frame.records.push(record),
            None => frame.excluded.push(object.name().to_string()),
        }
    }
    frame
}

/// Result of labeling one scene file.
#[derive(Clone, Debug)]
pub struct ImageSummary {
    pub scene: PathBuf,
    pub stem: String,
    pub label_path: PathBuf,
    pub labeled: usize,
    pub excluded: Vec<String>,
}

impl fmt::Display for ImageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} label(s)", self.stem, self.labeled)?;
        if !self.excluded.is_empty() {
            write!(
                f,
                ", {} excluded ({})",
                self.excluded.len(),
                self.excluded.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Result of a whole `generate` run.
#[derive(Clone, Debug)]
pub struct GenerateSummary {
    pub root: PathBuf,
    pub images: Vec<ImageSummary>,
}

impl GenerateSummary {
    pub fn label_count(&self) -> usize {
        self.images.iter().map(|image| image.labeled).sum()
    }

    pub fn excluded_count(&self) -> usize {
        self.images.iter().map(|image| image.excluded.len()).sum()
    }
}

impl fmt::Display for GenerateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for image in &self.images {
            writeln!(f, "{}", image)?;
        }
        write!(
            f,
            "Wrote {} label(s) for {} image(s) to {} ({} object(s) excluded)",
            self.label_count(),
            self.images.len(),
            self.root.display(),
            self.excluded_count()
        )
    }
}

/// Expands the given scene paths into a list of scene files.
///
/// Files are taken as given; directories are walked for `*.json` files in
/// relative-path order.
pub fn collect_scene_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ObbLabelError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(collect_files_with_extensions(input, &["json"])?);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(ObbLabelError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("scene path not found: {}", input.display()),
            )));
        }
    }
    Ok(files)
}

/// Labels every scene and writes the dataset under `output_root`.
///
/// Each scene gets exactly one label file, rewritten from scratch; scenes
/// without labelable objects get an empty file.
pub fn generate_dataset(
    scenes: &[PathBuf],
    output_root: &Path,
    config: &GenerateConfig,
) -> Result<GenerateSummary, ObbLabelError> {
    let scene_files = collect_scene_files(scenes)?;
    let layout = DatasetLayout::create(output_root, &config.split)?;
    info!(
        "Labeling {} scene(s) into {}",
        scene_files.len(),
        layout.labels_dir.display()
    );

    let mut images = Vec::with_capacity(scene_files.len());
    for (offset, scene_path) in scene_files.iter().enumerate() {
        let scene = read_scene_json(scene_path)?;
        let stem = scene
            .image_stem
            .clone()
            .unwrap_or_else(|| sequential_stem(&config.stem_prefix, config.start_index + offset));

        let frame = label_frame(&scene.objects, &scene.camera, config.rect_strategy);
        let label_path = layout.label_path(&stem);
        write_label_file(&label_path, &frame.records)?;
        debug!(
            "{} -> {} ({} record(s))",
            scene_path.display(),
            label_path.display(),
            frame.records.len()
        );

        images.push(ImageSummary {
            scene: scene_path.clone(),
            stem,
            label_path,
            labeled: frame.records.len(),
            excluded: frame.excluded,
        });
    }

    if config.write_data_yaml {
        write_data_yaml(output_root, std::slice::from_ref(&config.class_name))?;
    }

    let summary = GenerateSummary {
        root: output_root.to_path_buf(),
        images,
    };
    info!(
        "Wrote {} label(s) for {} image(s)",
        summary.label_count(),
        summary.images.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{from_scene_str, Scene};
    use std::fs;

    fn scene_with_vertices(vertices: &str) -> String {
        format!(
            r#"{{
                "camera": {{
                    "width": 100, "height": 100,
                    "projection": {{ "orthographic": {{ "half_height": 1, "near": 0.1, "far": 100 }} }},
                    "view": {{ "look_at": {{ "eye": [0, 0, 5], "target": [0, 0, 0] }} }}
                }},
                "objects": [ {{ "name": "target", "surfaces": [ {{ "name": "mesh", "vertices": {vertices} }} ] }} ]
            }}"#
        )
    }

    fn load(json: &str) -> Scene {
        from_scene_str(json)
            .expect("parse scene")
            .into_scene()
            .expect("convert scene")
    }

    const UNIT_SQUARE: &str = "[[-0.5, -0.5, 0], [0.5, -0.5, 0], [0.5, 0.5, 0], [-0.5, 0.5, 0]]";

    #[test]
    fn unit_square_gives_axis_aligned_label_from_top_left() {
        let scene = load(&scene_with_vertices(UNIT_SQUARE));
        let record = label_object(&scene.objects[0], &scene.camera, RectStrategy::PrincipalAxis)
            .expect("square is labelable");

        assert_eq!(
            record.to_string(),
            "0 0.250000 0.250000 0.250000 0.750000 0.750000 0.750000 0.750000 0.250000"
        );
    }

    #[test]
    fn two_points_are_excluded() {
        let scene = load(&scene_with_vertices("[[-0.5, 0, 0], [0.5, 0, 0]]"));
        let frame = label_frame(
            &scene.objects,
            &scene.camera,
            RectStrategy::PrincipalAxis,
        );
        assert!(frame.records.is_empty());
        assert_eq!(frame.excluded, vec!["target".to_string()]);
    }

    #[test]
    fn object_behind_camera_is_excluded() {
        let scene = load(&scene_with_vertices(
            "[[0, 0, 6], [1, 0, 6], [1, 1, 6], [0, 1, 6]]",
        ));
        assert!(label_object(&scene.objects[0], &scene.camera, RectStrategy::MinArea).is_none());
    }

    #[test]
    fn off_screen_object_clamps_to_a_zero_area_corner() {
        let scene = load(&scene_with_vertices("[[5, 5, 0], [6, 5, 0], [6, 6, 0]]"));
        let record = label_object(&scene.objects[0], &scene.camera, RectStrategy::PrincipalAxis)
            .expect("three points in front of the camera");

        assert_eq!(record.rect.area(), 0.0);
        assert_eq!(
            record.to_string(),
            "0 1.000000 0.000000 1.000000 0.000000 1.000000 0.000000 1.000000 0.000000"
        );
    }

    #[test]
    fn bad_skin_costs_only_its_own_surface() {
        let json = r#"{
            "camera": {
                "width": 100, "height": 100,
                "projection": { "orthographic": { "half_height": 1, "near": 0.1, "far": 100 } },
                "view": { "look_at": { "eye": [0, 0, 5], "target": [0, 0, 0] } }
            },
            "objects": [
                { "name": "good", "surfaces": [ { "name": "a",
                    "vertices": [[-0.5, -0.5, 0], [0.5, -0.5, 0], [0.5, 0.5, 0], [-0.5, 0.5, 0]] } ] },
                { "name": "missing_weights", "surfaces": [ { "name": "b",
                    "vertices": [[0, 0, 0], [0.2, 0, 0], [0.2, 0.2, 0], [0, 0.2, 0]],
                    "skin": { "bones": [[1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]], "weights": [] } } ] },
                { "name": "negative_weights", "surfaces": [ { "name": "c",
                    "vertices": [[0, 0, 0], [0.2, 0, 0], [0.2, 0.2, 0]],
                    "skin": { "bones": [[1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]],
                              "weights": [[[0, -1]], [[0, -1]], [[0, -1]]] } } ] }
            ]
        }"#;
        let scene = load(json);
        let frame = label_frame(&scene.objects, &scene.camera, RectStrategy::PrincipalAxis);

        assert_eq!(frame.records.len(), 1);
        assert_eq!(
            frame.records[0].to_string(),
            "0 0.250000 0.250000 0.250000 0.750000 0.750000 0.750000 0.750000 0.250000"
        );
        assert_eq!(
            frame.excluded,
            vec!["missing_weights".to_string(), "negative_weights".to_string()]
        );
    }

    #[test]
    fn generate_writes_labels_and_data_yaml() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let scenes_dir = temp.path().join("scenes");
        fs::create_dir_all(&scenes_dir).expect("create scenes dir");
        fs::write(scenes_dir.join("a.json"), scene_with_vertices(UNIT_SQUARE)).expect("write a");
        fs::write(
            scenes_dir.join("b.json"),
            scene_with_vertices("[[0, 0, 0]]"),
        )
        .expect("write b");

        let out = temp.path().join("dataset");
        let summary = generate_dataset(&[scenes_dir], &out, &GenerateConfig::default())
            .expect("generate");

        assert_eq!(summary.images.len(), 2);
        assert_eq!(summary.label_count(), 1);
        assert_eq!(summary.excluded_count(), 1);

        let first = fs::read_to_string(out.join("labels/train/img0001.txt")).expect("read first");
        assert_eq!(first.lines().count(), 1);
        let second = fs::read_to_string(out.join("labels/train/img0002.txt")).expect("read second");
        assert!(second.is_empty());

        let data_yaml = fs::read_to_string(out.join("data.yaml")).expect("read data.yaml");
        assert_eq!(data_yaml, "names:\n  0: 'car'\n");
        assert!(out.join("images/train").is_dir());
    }

    #[test]
    fn missing_scene_path_is_an_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = collect_scene_files(&[temp.path().join("nope.json")]).unwrap_err();
        assert!(matches!(err, ObbLabelError::Io(_)));
    }
}
