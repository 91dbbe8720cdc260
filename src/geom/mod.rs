//! 2D geometry for oriented bounding-box labels.
//!
//! This module holds the image-space half of the labeling pipeline: a point
//! cloud from the [`project`](crate::project) stage is reduced to its convex
//! hull, a rectangle is fitted around the hull, and the rectangle's corners
//! are put into a canonical order for output.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: coordinates carry a zero-sized space marker so pixel
//!    and normalized values cannot be mixed by accident.
//!
//! 2. **Pure functions**: every stage is a function of its input slice; no
//!    stage keeps state between objects.
//!
//! 3. **No NaN out**: degenerate inputs (single points, lines, duplicates)
//!    produce finite, possibly zero-area, rectangles.
//!
//! # Example
//!
//! ```
//! use obblabel::geom::{convex_hull, fit_principal_rect, Coord, Normalized};
//!
//! let cloud: Vec<Coord<Normalized>> = vec![
//!     Coord::new(0.2, 0.2),
//!     Coord::new(0.8, 0.2),
//!     Coord::new(0.5, 0.5),
//!     Coord::new(0.8, 0.8),
//!     Coord::new(0.2, 0.8),
//! ];
//! let hull = convex_hull(&cloud);
//! assert_eq!(hull.len(), 4);
//!
//! let rect = fit_principal_rect(&hull).unwrap().canonical();
//! assert!((rect.corners[0].x - 0.2).abs() < 1e-9);
//! assert!((rect.corners[0].y - 0.2).abs() < 1e-9);
//! ```

mod bbox;
mod coord;
mod hull;
mod order;
mod rect;
mod space;

pub use bbox::BBoxXYXY;
pub use coord::{cross, Coord};
pub use hull::{convex_hull, hull_contains, signed_area2};
pub use order::order_clockwise_top_left;
pub use rect::{fit_min_area_rect, fit_principal_rect, OrientedRect, RectStrategy};
pub use space::{Normalized, Pixel};

/// A normalized image-space point.
pub type Point2D = Coord<Normalized>;

/// Projected points of one object in one frame.
pub type PointCloud = Vec<Point2D>;
