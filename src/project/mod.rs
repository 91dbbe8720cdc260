//! Projection of 3D mesh geometry into normalized image space.
//!
//! The projector only needs two things from the outside world: a
//! [`Camera`] that maps world points to screen pixels, and the
//! [`MeshSurface`]s of each [`TargetObject`]. Engine scene graphs, the JSON
//! scene files in [`crate::scene`] and test fixtures are all adapters over
//! these traits.
//!
//! Screen space follows the usual engine convention: pixels with the origin
//! at the bottom-left and `z` holding the view depth. Projected points are
//! flipped to a top-left origin, normalized by the raster size and clamped
//! to `[0, 1]`.

pub mod camera;
mod snapshot;

pub use camera::MatrixCamera;
pub use snapshot::PoseSnapshot;

use log::{trace, warn};
use nalgebra::{Matrix4, Point3};

use crate::error::ObbLabelError;
use crate::geom::{Coord, Pixel, Point2D, PointCloud};

/// World-to-screen projection plus the raster it projects onto.
pub trait Camera {
    /// Maps a world-space point to screen space.
    ///
    /// `x` and `y` are pixels with the origin at the bottom-left of the
    /// raster; `z` is the depth in front of the camera (non-positive means
    /// behind it).
    fn world_to_screen(&self, world: &Point3<f64>) -> Point3<f64>;

    /// Output raster `(width, height)` in pixels.
    fn raster_size(&self) -> (u32, u32);
}

impl<C: Camera + ?Sized> Camera for &C {
    fn world_to_screen(&self, world: &Point3<f64>) -> Point3<f64> {
        (**self).world_to_screen(world)
    }

    fn raster_size(&self) -> (u32, u32) {
        (**self).raster_size()
    }
}

/// Whether a surface's vertices can be read directly or need baking first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    Static,
    /// Deformed at runtime; the current pose must be baked into a snapshot.
    Skinned,
}

/// One mesh of a target object.
pub trait MeshSurface {
    fn name(&self) -> &str;

    /// Transform from the surface's local space to world space.
    fn local_to_world(&self) -> Matrix4<f64>;

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Static
    }

    /// False when the vertex data is not accessible (the surface is skipped).
    fn is_readable(&self) -> bool {
        true
    }

    /// Local-space vertex positions; the bind pose for skinned surfaces.
    fn vertices(&self) -> &[Point3<f64>];

    /// Writes the current local-space pose into `out`.
    ///
    /// Only called for [`SurfaceKind::Skinned`] surfaces, always through a
    /// [`PoseSnapshot`] so that [`MeshSurface::release_pose`] follows.
    fn bake_pose(&self, out: &mut Vec<Point3<f64>>) -> Result<(), ObbLabelError> {
        out.extend_from_slice(self.vertices());
        Ok(())
    }

    /// Releases whatever [`MeshSurface::bake_pose`] acquired.
    fn release_pose(&self) {}
}

/// Something in the scene that should receive a label.
pub trait TargetObject {
    fn name(&self) -> &str;

    fn surfaces(&self) -> Vec<&dyn MeshSurface>;
}

/// Projects a single world-space point.
///
/// Returns `None` for points behind the camera or with non-finite screen
/// coordinates.
pub fn project_point<C: Camera + ?Sized>(world: &Point3<f64>, camera: &C) -> Option<Point2D> {
    let (width, height) = camera.raster_size();
    let screen = camera.world_to_screen(world);

    if screen.z.is_nan() || screen.z <= 0.0 {
        return None;
    }
    if !screen.x.is_finite() || !screen.y.is_finite() {
        trace!("dropping non-finite screen point {:?}", screen);
        return None;
    }

    let image: Coord<Pixel> = Coord::new(screen.x, height as f64 - screen.y);
    Some(image.to_normalized(width as f64, height as f64).clamp_unit())
}

/// Projects every readable surface of `object` into one point cloud.
///
/// Unreadable surfaces and surfaces whose pose fails to bake are skipped
/// with a warning; the rest of the object still contributes.
pub fn project_object<O, C>(object: &O, camera: &C) -> PointCloud
where
    O: TargetObject + ?Sized,
    C: Camera + ?Sized,
{
    let (width, height) = camera.raster_size();
    if width == 0 || height == 0 {
        warn!(
            "camera raster is {}x{}; nothing to project for '{}'",
            width,
            height,
            object.name()
        );
        return Vec::new();
    }

    let mut cloud = Vec::new();
    for surface in object.surfaces() {
        if !surface.is_readable() {
            warn!(
                "Unreadable mesh '{}' on '{}'; skipping",
                surface.name(),
                object.name()
            );
            continue;
        }

        let local_to_world = surface.local_to_world();
        match surface.kind() {
            SurfaceKind::Static => {
                project_vertices(surface.vertices(), &local_to_world, camera, &mut cloud);
            }
            SurfaceKind::Skinned => match PoseSnapshot::bake(surface) {
                Ok(snapshot) => {
                    project_vertices(snapshot.vertices(), &local_to_world, camera, &mut cloud);
                }
                Err(err) => {
                    warn!(
                        "Failed to bake pose of '{}' on '{}': {}; skipping",
                        surface.name(),
                        object.name(),
                        err
                    );
                }
            },
        }
    }

    cloud
}

fn project_vertices<C: Camera + ?Sized>(
    vertices: &[Point3<f64>],
    local_to_world: &Matrix4<f64>,
    camera: &C,
    out: &mut PointCloud,
) {
    out.reserve(vertices.len());
    for vertex in vertices {
        let world = transform_affine(local_to_world, vertex);
        if let Some(point) = project_point(&world, camera) {
            out.push(point);
        }
    }
}

/// Applies the affine part of `m` (the bottom row is ignored).
pub(crate) fn transform_affine(m: &Matrix4<f64>, p: &Point3<f64>) -> Point3<f64> {
    let h = m * p.to_homogeneous();
    Point3::new(h.x, h.y, h.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Looks down -Z from the origin; 1 world unit at depth 1 spans 100 px.
    struct PinholeCamera {
        width: u32,
        height: u32,
    }

    impl Camera for PinholeCamera {
        fn world_to_screen(&self, world: &Point3<f64>) -> Point3<f64> {
            let depth = -world.z;
            Point3::new(
                self.width as f64 / 2.0 + 100.0 * world.x / depth,
                self.height as f64 / 2.0 + 100.0 * world.y / depth,
                depth,
            )
        }

        fn raster_size(&self) -> (u32, u32) {
            (self.width, self.height)
        }
    }

    struct TestSurface {
        vertices: Vec<Point3<f64>>,
        kind: SurfaceKind,
        readable: bool,
        fail_bake: bool,
        baked: Cell<usize>,
        released: Cell<usize>,
    }

    impl TestSurface {
        fn new(vertices: Vec<Point3<f64>>) -> Self {
            Self {
                vertices,
                kind: SurfaceKind::Static,
                readable: true,
                fail_bake: false,
                baked: Cell::new(0),
                released: Cell::new(0),
            }
        }
    }

    impl MeshSurface for TestSurface {
        fn name(&self) -> &str {
            "test"
        }

        fn local_to_world(&self) -> Matrix4<f64> {
            Matrix4::new_translation(&nalgebra::Vector3::new(0.0, 0.0, -5.0))
        }

        fn kind(&self) -> SurfaceKind {
            self.kind
        }

        fn is_readable(&self) -> bool {
            self.readable
        }

        fn vertices(&self) -> &[Point3<f64>] {
            &self.vertices
        }

        fn bake_pose(&self, out: &mut Vec<Point3<f64>>) -> Result<(), ObbLabelError> {
            self.baked.set(self.baked.get() + 1);
            if self.fail_bake {
                return Err(ObbLabelError::InvalidSkinning {
                    surface: "test".into(),
                    message: "forced".into(),
                });
            }
            // Pose doubles the mesh in size.
            out.extend(self.vertices.iter().map(|v| Point3::from(v.coords * 2.0)));
            Ok(())
        }

        fn release_pose(&self) {
            self.released.set(self.released.get() + 1);
        }
    }

    struct TestObject(Vec<TestSurface>);

    impl TargetObject for TestObject {
        fn name(&self) -> &str {
            "object"
        }

        fn surfaces(&self) -> Vec<&dyn MeshSurface> {
            self.0.iter().map(|s| s as &dyn MeshSurface).collect()
        }
    }

    fn unit_square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
        ]
    }

    #[test]
    fn projects_with_vertical_flip() {
        let camera = PinholeCamera {
            width: 200,
            height: 100,
        };
        // 50 px above the centre in screen space -> 50 px above in image space.
        let p = project_point(&Point3::new(0.0, 0.5, -1.0), &camera).expect("in front");
        assert!((p.x - 0.5).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }

    #[test]
    fn points_behind_camera_are_dropped() {
        let camera = PinholeCamera {
            width: 100,
            height: 100,
        };
        assert!(project_point(&Point3::new(0.0, 0.0, 1.0), &camera).is_none());
        assert!(project_point(&Point3::new(0.0, 0.0, 0.0), &camera).is_none());
    }

    #[test]
    fn off_screen_points_are_clamped() {
        let camera = PinholeCamera {
            width: 100,
            height: 100,
        };
        let p = project_point(&Point3::new(10.0, -10.0, -1.0), &camera).expect("in front");
        assert_eq!(p.x, 1.0);
        assert_eq!(p.y, 1.0);
    }

    #[test]
    fn static_square_projects_to_four_points() {
        let camera = PinholeCamera {
            width: 100,
            height: 100,
        };
        let object = TestObject(vec![TestSurface::new(unit_square())]);
        let cloud = project_object(&object, &camera);
        assert_eq!(cloud.len(), 4);
        // Depth 5: half a unit is 10 px.
        assert!((cloud[0].x - 0.4).abs() < 1e-12);
        assert!((cloud[0].y - 0.6).abs() < 1e-12);
    }

    #[test]
    fn unreadable_surface_is_skipped() {
        let camera = PinholeCamera {
            width: 100,
            height: 100,
        };
        let mut hidden = TestSurface::new(unit_square());
        hidden.readable = false;
        let object = TestObject(vec![hidden, TestSurface::new(unit_square())]);
        assert_eq!(project_object(&object, &camera).len(), 4);
    }

    #[test]
    fn skinned_surface_bakes_and_releases() {
        let camera = PinholeCamera {
            width: 100,
            height: 100,
        };
        let mut skinned = TestSurface::new(unit_square());
        skinned.kind = SurfaceKind::Skinned;
        let object = TestObject(vec![skinned]);

        let cloud = project_object(&object, &camera);
        assert_eq!(cloud.len(), 4);
        assert!((cloud[0].x - 0.3).abs() < 1e-12);
        assert_eq!(object.0[0].baked.get(), 1);
        assert_eq!(object.0[0].released.get(), 1);
    }

    #[test]
    fn failed_bake_still_releases() {
        let camera = PinholeCamera {
            width: 100,
            height: 100,
        };
        let mut skinned = TestSurface::new(unit_square());
        skinned.kind = SurfaceKind::Skinned;
        skinned.fail_bake = true;
        let object = TestObject(vec![skinned]);

        assert!(project_object(&object, &camera).is_empty());
        assert_eq!(object.0[0].baked.get(), 1);
        assert_eq!(object.0[0].released.get(), 1);
    }

    #[test]
    fn zero_raster_projects_nothing() {
        let camera = PinholeCamera {
            width: 0,
            height: 100,
        };
        let object = TestObject(vec![TestSurface::new(unit_square())]);
        assert!(project_object(&object, &camera).is_empty());
    }
}
