//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between screen-pixel and normalized image coordinates at compile time.

use std::fmt;

/// Marker type for image pixel coordinates (origin top-left, y down).
///
/// Raw camera output has its origin at the bottom-left; the projector flips
/// it before tagging a point as `Pixel`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for normalized image coordinates (0.0 to 1.0).
///
/// Label files are written in this space, relative to the output raster.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
