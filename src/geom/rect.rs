//! Oriented rectangle fitting around a convex hull.
//!
//! The default fitter aligns the rectangle with the principal axes of the
//! hull vertices. It always yields an exact right-angled box and is stable on
//! slivers, at the cost of not being area-minimal. The edge-aligned
//! minimum-area fitter is available as [`RectStrategy::MinArea`].

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYXY;
use super::coord::Coord;
use super::hull::signed_area2;
use super::order::order_clockwise_top_left;

/// Relative size below which both covariance terms count as zero.
const ISOTROPIC_EPS: f64 = 1e-12;

/// How a rectangle is fitted around a hull.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RectStrategy {
    /// Rectangle aligned with the dominant covariance axis of the hull.
    #[default]
    PrincipalAxis,
    /// Smallest-area rectangle with one side collinear to a hull edge.
    MinArea,
}

impl RectStrategy {
    /// Parses the CLI/config spelling of a strategy.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "principal-axis" | "pca" => Some(Self::PrincipalAxis),
            "min-area" | "calipers" => Some(Self::MinArea),
            _ => None,
        }
    }

    /// Fits a rectangle around `hull` using this strategy.
    pub fn fit<TSpace>(self, hull: &[Coord<TSpace>]) -> Option<OrientedRect<TSpace>> {
        match self {
            Self::PrincipalAxis => fit_principal_rect(hull),
            Self::MinArea => fit_min_area_rect(hull),
        }
    }
}

/// A rectangle given by its four corners in polygon order.
///
/// Fitters produce exact rectangles; parsed label records may not be, which
/// is why [`OrientedRect::is_rectangular`] exists.
pub struct OrientedRect<TSpace> {
    pub corners: [Coord<TSpace>; 4],
}

impl<TSpace> OrientedRect<TSpace> {
    #[inline]
    pub fn new(corners: [Coord<TSpace>; 4]) -> Self {
        Self { corners }
    }

    /// Returns the same rectangle in canonical vertex order.
    pub fn canonical(&self) -> Self {
        Self::new(order_clockwise_top_left(self.corners))
    }

    /// Unsigned polygon area.
    pub fn area(&self) -> f64 {
        signed_area2(&self.corners).abs() * 0.5
    }

    /// Lengths of the four sides, starting with corner 0 -> corner 1.
    pub fn side_lengths(&self) -> [f64; 4] {
        std::array::from_fn(|i| self.corners[i].distance(&self.corners[(i + 1) % 4]))
    }

    /// Angle of the first side in radians, folded into `[0, pi/2)`.
    ///
    /// A rectangle is symmetric under quarter turns, so this is its
    /// orientation independent of which corner comes first.
    pub fn orientation(&self) -> f64 {
        let edge = self.corners[1].sub(&self.corners[0]);
        edge.y.atan2(edge.x).rem_euclid(std::f64::consts::FRAC_PI_2)
    }

    pub fn is_finite(&self) -> bool {
        self.corners.iter().all(Coord::is_finite)
    }

    /// Axis-aligned bounds of the four corners.
    pub fn bounding_box(&self) -> BBoxXYXY<TSpace> {
        BBoxXYXY::enclosing(&self.corners).unwrap_or_default()
    }

    /// Checks that adjacent sides are perpendicular and opposite sides match.
    ///
    /// `tolerance` is relative to the side lengths involved.
    pub fn is_rectangular(&self, tolerance: f64) -> bool {
        let edges: [Coord<TSpace>; 4] =
            std::array::from_fn(|i| self.corners[(i + 1) % 4].sub(&self.corners[i]));
        let lengths = self.side_lengths();
        let scale = lengths.iter().cloned().fold(0.0_f64, f64::max).max(f64::MIN_POSITIVE);

        let perpendicular = (0..4).all(|i| {
            let j = (i + 1) % 4;
            edges[i].dot(&edges[j]).abs() <= tolerance * scale * scale
        });
        let opposite_equal = (lengths[0] - lengths[2]).abs() <= tolerance * scale
            && (lengths[1] - lengths[3]).abs() <= tolerance * scale;

        perpendicular && opposite_equal
    }
}

impl<TSpace> std::fmt::Debug for OrientedRect<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.corners.iter()).finish()
    }
}

impl<TSpace> Clone for OrientedRect<TSpace> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<TSpace> Copy for OrientedRect<TSpace> {}

impl<TSpace> PartialEq for OrientedRect<TSpace> {
    fn eq(&self, other: &Self) -> bool {
        self.corners == other.corners
    }
}

/// Fits a principal-axis rectangle around the hull vertices.
///
/// The axis angle is `0.5 * atan2(2*Sxy, Sxx - Syy)` from the hull's
/// covariance. When the covariance is numerically isotropic or zero (a single
/// point, duplicates, a perfect square) the image x-axis is used instead.
/// Returns `None` only for an empty hull.
pub fn fit_principal_rect<TSpace>(hull: &[Coord<TSpace>]) -> Option<OrientedRect<TSpace>> {
    if hull.is_empty() {
        return None;
    }

    let n = hull.len() as f64;
    let cx = hull.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = hull.iter().map(|p| p.y).sum::<f64>() / n;
    let centroid = Coord::new(cx, cy);

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in hull {
        let (dx, dy) = (p.x - cx, p.y - cy);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let angle = principal_angle(sxx, sxy, syy);
    Some(rect_along_axis(hull, &centroid, angle))
}

fn principal_angle(sxx: f64, sxy: f64, syy: f64) -> f64 {
    let num = 2.0 * sxy;
    let den = sxx - syy;
    let scale = (sxx + syy).abs();

    if !num.is_finite() || !den.is_finite() {
        return 0.0;
    }
    if num.abs() <= ISOTROPIC_EPS * scale && den.abs() <= ISOTROPIC_EPS * scale {
        return 0.0;
    }

    0.5 * num.atan2(den)
}

/// Fits the minimum-area rectangle that has a side collinear with a hull edge.
///
/// `hull` must be convex (as returned by
/// [`convex_hull`](super::hull::convex_hull)); every edge direction is
/// tried, so this is quadratic in the hull size. Returns `None` only for an
/// empty hull.
pub fn fit_min_area_rect<TSpace>(hull: &[Coord<TSpace>]) -> Option<OrientedRect<TSpace>> {
    let first = hull.first()?;

    let mut best: Option<(f64, OrientedRect<TSpace>)> = None;
    for i in 0..hull.len() {
        let origin = &hull[i];
        let edge = hull[(i + 1) % hull.len()].sub(origin);
        if edge.x == 0.0 && edge.y == 0.0 {
            continue;
        }

        let rect = rect_along_axis(hull, origin, edge.y.atan2(edge.x));
        let area = rect.area();
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
            best = Some((area, rect));
        }
    }

    Some(match best {
        Some((_, rect)) => rect,
        None => rect_along_axis(hull, first, 0.0),
    })
}

/// Tightest rectangle around `points` whose first axis has angle `angle`.
fn rect_along_axis<TSpace>(
    points: &[Coord<TSpace>],
    origin: &Coord<TSpace>,
    angle: f64,
) -> OrientedRect<TSpace> {
    let (sin, cos) = angle.sin_cos();

    let (mut u_min, mut u_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        let (dx, dy) = (p.x - origin.x, p.y - origin.y);
        let du = dx * cos + dy * sin;
        let dv = -dx * sin + dy * cos;
        u_min = u_min.min(du);
        u_max = u_max.max(du);
        v_min = v_min.min(dv);
        v_max = v_max.max(dv);
    }

    let corner = |du: f64, dv: f64| {
        Coord::new(
            origin.x + du * cos - dv * sin,
            origin.y + du * sin + dv * cos,
        )
    };

    OrientedRect::new([
        corner(u_min, v_min),
        corner(u_max, v_min),
        corner(u_max, v_max),
        corner(u_min, v_max),
    ])
}
