//! Axis-aligned extents.

use super::coord::Coord;

/// An axis-aligned box in XYXY form, used for the extent of a rectangle or a
/// point set.
///
/// `min <= max` is not enforced.
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Smallest box enclosing `points`, or `None` for an empty slice.
    pub fn enclosing(points: &[Coord<TSpace>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(
            Self {
                min: *first,
                max: *first,
            },
            |acc, p| {
                Self::from_xyxy(
                    acc.min.x.min(p.x),
                    acc.min.y.min(p.y),
                    acc.max.x.max(p.x),
                    acc.max.y.max(p.y),
                )
            },
        ))
    }

    /// The box grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self::from_xyxy(
            self.min.x - margin,
            self.min.y - margin,
            self.max.x + margin,
            self.max.y + margin,
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &Coord<TSpace>) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x [{}, {}] y [{}, {}]",
            self.min.x, self.max.x, self.min.y, self.max.y
        )
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

impl<TSpace> Clone for BBoxXYXY<TSpace> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<TSpace> Copy for BBoxXYXY<TSpace> {}

impl<TSpace> PartialEq for BBoxXYXY<TSpace> {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }
}
