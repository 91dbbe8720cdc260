//! JSON scene descriptions.
//!
//! A scene file describes one frame: the camera and the target objects in
//! front of it. Whatever renders the frame (a game engine, a simulator)
//! exports one of these next to each image; obblabel turns it into a label
//! file. The file types here are deserialized first and then converted into
//! [`Scene`], which implements the projector traits.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ObbLabelError;
use crate::project::camera::{look_at, orthographic_projection, perspective_projection};
use crate::project::{MatrixCamera, MeshSurface, SurfaceKind, TargetObject};

/// One frame ready for labeling.
#[derive(Debug)]
pub struct Scene {
    /// File stem to use for the label file, if the scene names one.
    pub image_stem: Option<String>,
    pub camera: MatrixCamera,
    pub objects: Vec<MeshObject>,
}

/// A target object made of one or more meshes.
#[derive(Clone, Debug)]
pub struct MeshObject {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

/// A mesh with its local-to-world transform and optional skin.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub readable: bool,
    pub local_to_world: Matrix4<f64>,
    pub vertices: Vec<Point3<f64>>,
    pub skin: Option<Skin>,
}

/// Linear-blend skinning data.
///
/// `bones` map bind-pose local space to current-pose local space; each
/// vertex carries `(bone index, weight)` influences.
#[derive(Clone, Debug)]
pub struct Skin {
    pub bones: Vec<Matrix4<f64>>,
    pub weights: Vec<Vec<(usize, f64)>>,
}

impl TargetObject for MeshObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn surfaces(&self) -> Vec<&dyn MeshSurface> {
        self.meshes.iter().map(|m| m as &dyn MeshSurface).collect()
    }
}

impl MeshSurface for Mesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_to_world(&self) -> Matrix4<f64> {
        self.local_to_world
    }

    fn kind(&self) -> SurfaceKind {
        if self.skin.is_some() {
            SurfaceKind::Skinned
        } else {
            SurfaceKind::Static
        }
    }

    fn is_readable(&self) -> bool {
        self.readable
    }

    fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    fn bake_pose(&self, out: &mut Vec<Point3<f64>>) -> Result<(), ObbLabelError> {
        let Some(skin) = &self.skin else {
            out.extend_from_slice(&self.vertices);
            return Ok(());
        };
        if skin.weights.len() != self.vertices.len() {
            return Err(invalid_skin(
                &self.name,
                format!(
                    "{} weight list(s) for {} vertices",
                    skin.weights.len(),
                    self.vertices.len()
                ),
            ));
        }

        for (vertex, influences) in self.vertices.iter().zip(&skin.weights) {
            out.push(skin_vertex(&self.name, skin, vertex, influences)?);
        }
        Ok(())
    }
}

/// Blends `vertex` through its bone influences.
///
/// A vertex without influences keeps its bind position. Weights must be
/// finite and non-negative with a positive sum; they are normalized here.
fn skin_vertex(
    surface: &str,
    skin: &Skin,
    vertex: &Point3<f64>,
    influences: &[(usize, f64)],
) -> Result<Point3<f64>, ObbLabelError> {
    if influences.is_empty() {
        return Ok(*vertex);
    }
    if let Some(&(bone, weight)) = influences
        .iter()
        .find(|(_, w)| !w.is_finite() || *w < 0.0)
    {
        return Err(invalid_skin(
            surface,
            format!("bone {} has invalid weight {}", bone, weight),
        ));
    }
    let total: f64 = influences.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(invalid_skin(surface, "bone weights sum to zero"));
    }

    let mut blended = Vector3::zeros();
    for &(bone, weight) in influences {
        let matrix = skin.bones.get(bone).ok_or_else(|| {
            invalid_skin(
                surface,
                format!(
                    "bone index {} is out of range for {} bone(s)",
                    bone,
                    skin.bones.len()
                ),
            )
        })?;
        blended += crate::project::transform_affine(matrix, vertex).coords * (weight / total);
    }
    Ok(Point3::from(blended))
}

fn invalid_skin(surface: &str, message: impl Into<String>) -> ObbLabelError {
    ObbLabelError::InvalidSkinning {
        surface: surface.to_string(),
        message: message.into(),
    }
}

/// Serialized form of a scene file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_stem: Option<String>,
    pub camera: CameraDesc,
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraDesc {
    pub width: u32,
    pub height: u32,
    pub projection: ProjectionDesc,
    pub view: ViewDesc,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionDesc {
    Perspective { fov_y_deg: f64, near: f64, far: f64 },
    Orthographic { half_height: f64, near: f64, far: f64 },
    /// Row-major 4x4 clip matrix.
    Matrix([f64; 16]),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewDesc {
    LookAt {
        eye: [f64; 3],
        target: [f64; 3],
        #[serde(default = "default_up")]
        up: [f64; 3],
    },
    /// Row-major 4x4 world-to-view matrix.
    Matrix([f64; 16]),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectDesc {
    pub name: String,
    pub surfaces: Vec<SurfaceDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceDesc {
    pub name: String,
    #[serde(default = "default_readable")]
    pub readable: bool,
    #[serde(default)]
    pub transform: TransformDesc,
    pub vertices: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<SkinDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformDesc {
    /// Row-major 4x4 local-to-world matrix.
    Matrix { matrix: [f64; 16] },
    /// Translation, Euler rotation and scale. `rotation_deg` is
    /// `[pitch, yaw, roll]` in degrees about the x, y and z axes, applied
    /// roll first, then pitch, then yaw.
    Trs {
        #[serde(default)]
        translation: [f64; 3],
        #[serde(default)]
        rotation_deg: [f64; 3],
        #[serde(default = "default_scale")]
        scale: [f64; 3],
    },
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self::Trs {
            translation: [0.0; 3],
            rotation_deg: [0.0; 3],
            scale: default_scale(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkinDesc {
    /// Row-major 4x4 skinning matrices.
    pub bones: Vec<[f64; 16]>,
    /// Per-vertex `[bone, weight]` influences.
    pub weights: Vec<Vec<(usize, f64)>>,
}

fn default_up() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

fn default_readable() -> bool {
    true
}

fn default_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl TransformDesc {
    pub fn to_matrix(&self) -> Matrix4<f64> {
        match self {
            Self::Matrix { matrix } => Matrix4::from_row_slice(matrix),
            Self::Trs {
                translation,
                rotation_deg,
                scale,
            } => {
                let [rx, ry, rz] = rotation_deg.map(f64::to_radians);
                let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), ry)
                    * Rotation3::from_axis_angle(&Vector3::x_axis(), rx)
                    * Rotation3::from_axis_angle(&Vector3::z_axis(), rz);
                Matrix4::new_translation(&Vector3::from(*translation))
                    * rotation.to_homogeneous()
                    * Matrix4::new_nonuniform_scaling(&Vector3::from(*scale))
            }
        }
    }
}

impl CameraDesc {
    pub fn to_camera(&self) -> Result<MatrixCamera, ObbLabelError> {
        let (width, height) = (self.width, self.height);
        let view = match &self.view {
            ViewDesc::LookAt { eye, target, up } => look_at(
                &Point3::from(*eye),
                &Point3::from(*target),
                &Vector3::from(*up),
            )?,
            ViewDesc::Matrix(matrix) => Matrix4::from_row_slice(matrix),
        };
        let projection = match &self.projection {
            ProjectionDesc::Perspective {
                fov_y_deg,
                near,
                far,
            } => perspective_projection(*fov_y_deg, *near, *far, width, height)?,
            ProjectionDesc::Orthographic {
                half_height,
                near,
                far,
            } => orthographic_projection(*half_height, *near, *far, width, height)?,
            ProjectionDesc::Matrix(matrix) => Matrix4::from_row_slice(matrix),
        };
        MatrixCamera::new(view, projection, width, height)
    }
}

impl SurfaceDesc {
    /// Skinning data is checked when the pose is baked, so a bad skin only
    /// costs its own surface.
    fn to_mesh(&self) -> Mesh {
        let skin = self.skin.as_ref().map(|skin| Skin {
            bones: skin.bones.iter().map(|m| Matrix4::from_row_slice(m)).collect(),
            weights: skin.weights.clone(),
        });

        Mesh {
            name: self.name.clone(),
            readable: self.readable,
            local_to_world: self.transform.to_matrix(),
            vertices: self.vertices.iter().map(|v| Point3::from(*v)).collect(),
            skin,
        }
    }
}

impl SceneFile {
    /// Converts the serialized form into a [`Scene`].
    pub fn into_scene(self) -> Result<Scene, ObbLabelError> {
        let camera = self.camera.to_camera()?;
        let objects = self
            .objects
            .iter()
            .map(|object| MeshObject {
                name: object.name.clone(),
                meshes: object.surfaces.iter().map(SurfaceDesc::to_mesh).collect(),
            })
            .collect();

        Ok(Scene {
            image_stem: self.image_stem,
            camera,
            objects,
        })
    }
}

/// Reads a scene from a JSON file.
pub fn read_scene_json(path: &Path) -> Result<Scene, ObbLabelError> {
    let file = File::open(path).map_err(ObbLabelError::Io)?;
    let reader = BufReader::new(file);

    let parsed: SceneFile =
        serde_json::from_reader(reader).map_err(|source| ObbLabelError::SceneParse {
            path: path.to_path_buf(),
            source,
        })?;
    parsed.into_scene()
}

/// Parses a scene file from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_scene_str(json: &str) -> Result<SceneFile, serde_json::Error> {
    serde_json::from_str(json)
}

/// Fuzz-only entrypoint for scene parsing and conversion.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_scene(input: &str) -> Result<(), ObbLabelError> {
    let parsed = from_scene_str(input).map_err(|source| ObbLabelError::SceneParse {
        path: "<fuzz>".into(),
        source,
    })?;
    let _ = parsed.into_scene()?;
    Ok(())
}
