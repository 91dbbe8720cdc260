//! Scoped pose snapshots for skinned surfaces.

use log::trace;
use nalgebra::Point3;

use super::MeshSurface;
use crate::error::ObbLabelError;

/// The baked pose of a skinned surface.
///
/// Dropping the snapshot calls [`MeshSurface::release_pose`], on the success
/// path as well as when baking fails part-way.
pub struct PoseSnapshot<'a, S: MeshSurface + ?Sized> {
    surface: &'a S,
    vertices: Vec<Point3<f64>>,
}

impl<'a, S: MeshSurface + ?Sized> PoseSnapshot<'a, S> {
    /// Acquires a snapshot for `surface` and bakes its current pose into it.
    pub fn bake(surface: &'a S) -> Result<Self, ObbLabelError> {
        trace!("acquiring pose snapshot for '{}'", surface.name());
        let mut snapshot = Self {
            surface,
            vertices: Vec::with_capacity(surface.vertices().len()),
        };
        surface.bake_pose(&mut snapshot.vertices)?;
        Ok(snapshot)
    }

    /// Local-space vertices of the baked pose.
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }
}

impl<S: MeshSurface + ?Sized> Drop for PoseSnapshot<'_, S> {
    fn drop(&mut self) {
        self.surface.release_pose();
        trace!("released pose snapshot for '{}'", self.surface.name());
    }
}
