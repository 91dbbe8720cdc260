//! Matrix-based camera.

use nalgebra::{Matrix4, Point3, Vector3};

use super::Camera;
use crate::error::ObbLabelError;

/// A camera defined by a view matrix and a projection matrix.
///
/// View space is right-handed and looks down -Z, so the depth reported in
/// screen space is `-z_view`. Projection matrices follow the OpenGL clip
/// convention (NDC in `[-1, 1]`).
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixCamera {
    view: Matrix4<f64>,
    projection: Matrix4<f64>,
    width: u32,
    height: u32,
}

impl MatrixCamera {
    /// Creates a camera from explicit matrices.
    pub fn new(
        view: Matrix4<f64>,
        projection: Matrix4<f64>,
        width: u32,
        height: u32,
    ) -> Result<Self, ObbLabelError> {
        if width == 0 || height == 0 {
            return Err(invalid(format!(
                "raster size must be positive, got {}x{}",
                width, height
            )));
        }
        if !view.iter().chain(projection.iter()).all(|v| v.is_finite()) {
            return Err(invalid("view and projection matrices must be finite"));
        }

        Ok(Self {
            view,
            projection,
            width,
            height,
        })
    }

    /// A perspective camera at `eye` looking at `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn perspective(
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        fov_y_deg: f64,
        near: f64,
        far: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, ObbLabelError> {
        let view = look_at(&eye, &target, &up)?;
        let projection = perspective_projection(fov_y_deg, near, far, width, height)?;
        Self::new(view, projection, width, height)
    }

    /// An orthographic camera whose view volume is `2 * half_height` tall.
    #[allow(clippy::too_many_arguments)]
    pub fn orthographic(
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        half_height: f64,
        near: f64,
        far: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, ObbLabelError> {
        let view = look_at(&eye, &target, &up)?;
        let projection = orthographic_projection(half_height, near, far, width, height)?;
        Self::new(view, projection, width, height)
    }
}

/// Right-handed view matrix for a camera at `eye` looking at `target`.
pub fn look_at(
    eye: &Point3<f64>,
    target: &Point3<f64>,
    up: &Vector3<f64>,
) -> Result<Matrix4<f64>, ObbLabelError> {
    let forward = target - eye;
    if forward.norm() <= f64::EPSILON {
        return Err(invalid("camera eye and target must differ"));
    }
    if forward.cross(up).norm() <= f64::EPSILON {
        return Err(invalid("camera up vector must not be parallel to the view direction"));
    }
    Ok(Matrix4::look_at_rh(eye, target, up))
}

/// Perspective clip matrix with the raster's aspect ratio.
///
/// Parameters are checked up front; nalgebra panics on some of them.
pub fn perspective_projection(
    fov_y_deg: f64,
    near: f64,
    far: f64,
    width: u32,
    height: u32,
) -> Result<Matrix4<f64>, ObbLabelError> {
    if !(fov_y_deg > 0.0 && fov_y_deg < 180.0) {
        return Err(invalid(format!(
            "vertical field of view must be in (0, 180) degrees, got {}",
            fov_y_deg
        )));
    }
    check_clip_planes(near, far)?;
    if near <= 0.0 {
        return Err(invalid(format!(
            "perspective near plane must be positive, got {}",
            near
        )));
    }
    check_raster(width, height)?;

    let aspect = width as f64 / height as f64;
    Ok(Matrix4::new_perspective(
        aspect,
        fov_y_deg.to_radians(),
        near,
        far,
    ))
}

/// Orthographic clip matrix `2 * half_height` tall with the raster's aspect ratio.
pub fn orthographic_projection(
    half_height: f64,
    near: f64,
    far: f64,
    width: u32,
    height: u32,
) -> Result<Matrix4<f64>, ObbLabelError> {
    if !(half_height > 0.0 && half_height.is_finite()) {
        return Err(invalid(format!(
            "orthographic half height must be positive, got {}",
            half_height
        )));
    }
    check_clip_planes(near, far)?;
    check_raster(width, height)?;

    let half_width = half_height * width as f64 / height as f64;
    if !distinct(-half_width, half_width) || !distinct(-half_height, half_height) {
        return Err(invalid(format!(
            "orthographic view volume {}x{} is too small",
            2.0 * half_width,
            2.0 * half_height
        )));
    }
    Ok(Matrix4::new_orthographic(
        -half_width,
        half_width,
        -half_height,
        half_height,
        near,
        far,
    ))
}

impl Camera for MatrixCamera {
    fn world_to_screen(&self, world: &Point3<f64>) -> Point3<f64> {
        let eye = self.view * world.to_homogeneous();
        let clip = self.projection * eye;
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;

        Point3::new(
            (ndc_x + 1.0) * 0.5 * self.width as f64,
            (ndc_y + 1.0) * 0.5 * self.height as f64,
            -eye.z,
        )
    }

    fn raster_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn check_clip_planes(near: f64, far: f64) -> Result<(), ObbLabelError> {
    if !(near.is_finite() && far.is_finite() && far > near && distinct(near, far)) {
        return Err(invalid(format!(
            "clip planes must satisfy near < far, got near={} far={}",
            near, far
        )));
    }
    Ok(())
}

fn check_raster(width: u32, height: u32) -> Result<(), ObbLabelError> {
    if width == 0 || height == 0 {
        return Err(invalid(format!(
            "raster size must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

/// False when nalgebra would treat `a` and `b` as the same plane.
fn distinct(a: f64, b: f64) -> bool {
    (b - a).abs() > f64::EPSILON * a.abs().max(b.abs()).max(1.0)
}

fn invalid(message: impl Into<String>) -> ObbLabelError {
    ObbLabelError::InvalidCamera {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_the_z_axis() -> (Point3<f64>, Point3<f64>, Vector3<f64>) {
        (
            Point3::new(0.0, 0.0, 10.0),
            Point3::origin(),
            Vector3::y(),
        )
    }

    #[test]
    fn perspective_centre_maps_to_raster_centre() {
        let (eye, target, up) = down_the_z_axis();
        let camera =
            MatrixCamera::perspective(eye, target, up, 60.0, 0.3, 1000.0, 1920, 1080).unwrap();

        let screen = camera.world_to_screen(&Point3::origin());
        assert!((screen.x - 960.0).abs() < 1e-9);
        assert!((screen.y - 540.0).abs() < 1e-9);
        assert!((screen.z - 10.0).abs() < 1e-9);
    }

    #[test]
    fn perspective_reports_negative_depth_behind() {
        let (eye, target, up) = down_the_z_axis();
        let camera =
            MatrixCamera::perspective(eye, target, up, 60.0, 0.3, 1000.0, 640, 480).unwrap();
        let screen = camera.world_to_screen(&Point3::new(0.0, 0.0, 20.0));
        assert!(screen.z < 0.0);
    }

    #[test]
    fn perspective_up_is_up_on_screen() {
        let (eye, target, up) = down_the_z_axis();
        let camera =
            MatrixCamera::perspective(eye, target, up, 60.0, 0.3, 1000.0, 640, 480).unwrap();
        let above = camera.world_to_screen(&Point3::new(0.0, 1.0, 0.0));
        let right = camera.world_to_screen(&Point3::new(1.0, 0.0, 0.0));
        assert!(above.y > 240.0);
        assert!(right.x > 320.0);
    }

    #[test]
    fn orthographic_scales_linearly() {
        let (eye, target, up) = down_the_z_axis();
        let camera =
            MatrixCamera::orthographic(eye, target, up, 5.0, 0.1, 100.0, 200, 100).unwrap();
        // Half width is 10 world units, so x = 1 sits 5% right of centre.
        let screen = camera.world_to_screen(&Point3::new(1.0, 0.0, 0.0));
        assert!((screen.x - 110.0).abs() < 1e-9);
        assert!((screen.y - 50.0).abs() < 1e-9);
        assert!((screen.z - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_parameters() {
        let (eye, target, up) = down_the_z_axis();
        assert!(MatrixCamera::perspective(eye, target, up, 0.0, 0.3, 10.0, 10, 10).is_err());
        assert!(MatrixCamera::perspective(eye, target, up, 60.0, 1.0, 1.0, 10, 10).is_err());
        assert!(MatrixCamera::perspective(eye, target, up, 60.0, 0.3, 10.0, 0, 10).is_err());
        assert!(MatrixCamera::perspective(eye, eye, up, 60.0, 0.3, 10.0, 10, 10).is_err());
        assert!(
            MatrixCamera::perspective(eye, target, Vector3::z(), 60.0, 0.3, 10.0, 10, 10).is_err()
        );
        assert!(MatrixCamera::orthographic(eye, target, up, -1.0, 0.1, 10.0, 10, 10).is_err());
        assert!(MatrixCamera::orthographic(eye, target, up, 1e-300, 0.1, 10.0, 1, 10).is_err());
        assert!(
            MatrixCamera::perspective(eye, target, up, 60.0, 1e6, 1e6 + 1e-12, 10, 10).is_err()
        );
    }
}
