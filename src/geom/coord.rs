//! Typed 2D coordinates using PhantomData for compile-time safety.

use std::marker::PhantomData;

use super::{Normalized, Pixel};

/// A 2D point tagged with the space it lives in.
///
/// The `TSpace` parameter should be either [`Pixel`] or [`Normalized`],
/// ensuring that screen points and label points cannot be accidentally mixed.
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise difference `self - other`.
    #[inline]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Dot product, treating both coordinates as vectors.
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        let d = self.sub(other);
        d.dot(&d).sqrt()
    }
}

/// Z component of `(a - o) x (b - o)`.
///
/// Positive when `o -> a -> b` turns left (counter-clockwise in a y-up frame).
#[inline]
pub fn cross<TSpace>(o: &Coord<TSpace>, a: &Coord<TSpace>, b: &Coord<TSpace>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

// Manual impls so the marker type needs no bounds.
impl<TSpace> Clone for Coord<TSpace> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<TSpace> Copy for Coord<TSpace> {}

impl<TSpace> PartialEq for Coord<TSpace> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Coord<Pixel> {
    /// Converts a pixel coordinate to normalized image space.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> Coord<Normalized> {
        Coord::new(self.x / image_width, self.y / image_height)
    }
}

impl Coord<Normalized> {
    /// Converts a normalized coordinate to pixel space.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> Coord<Pixel> {
        Coord::new(self.x * image_width, self.y * image_height)
    }

    /// Clamps both components into `[0, 1]`.
    pub fn clamp_unit(&self) -> Self {
        Self::new(self.x.clamp(0.0, 1.0), self.y.clamp(0.0, 1.0))
    }

    /// Returns true if both components lie in `[-tolerance, 1 + tolerance]`.
    pub fn is_within_unit(&self, tolerance: f64) -> bool {
        let range = -tolerance..=1.0 + tolerance;
        range.contains(&self.x) && range.contains(&self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_components_are_detected() {
        let p: Coord<Pixel> = Coord::new(3.0, 4.0);
        assert!(p.is_finite());
        assert_eq!(p.distance(&Coord::default()), 5.0);
        assert!(!Coord::<Pixel>::new(f64::NAN, 0.0).is_finite());
        assert!(!Coord::<Pixel>::new(0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn test_cross_sign_follows_turn_direction() {
        let o: Coord<Normalized> = Coord::new(0.0, 0.0);
        let a = Coord::new(1.0, 0.0);
        assert!(cross(&o, &a, &Coord::new(1.0, 1.0)) > 0.0);
        assert!(cross(&o, &a, &Coord::new(1.0, -1.0)) < 0.0);
        assert_eq!(cross(&o, &a, &Coord::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_pixel_normalized_conversion() {
        let px: Coord<Pixel> = Coord::new(960.0, 270.0);
        let norm = px.to_normalized(1920.0, 1080.0);
        assert_eq!(norm.x, 0.5);
        assert_eq!(norm.y, 0.25);
        assert_eq!(norm.to_pixel(1920.0, 1080.0), px);
    }

    #[test]
    fn test_clamp_unit() {
        let p: Coord<Normalized> = Coord::new(-0.2, 1.7);
        let clamped = p.clamp_unit();
        assert_eq!(clamped.x, 0.0);
        assert_eq!(clamped.y, 1.0);
        assert!(clamped.is_within_unit(0.0));
        assert!(!p.is_within_unit(1e-6));
    }
}
