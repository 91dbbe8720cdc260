//! Canonical corner order for label output.

use super::coord::Coord;
use super::hull::signed_area2;

/// Relative tolerance under which two y values count as the same row.
const TIE_EPS: f64 = 1e-9;

/// Orders four rectangle corners canonically.
///
/// If the shoelace sum is positive the sequence is reversed, so the output
/// always has a non-positive signed area. The sequence is then rotated to
/// start at the corner with the smallest y, ties broken by the smallest x.
/// Any cyclic rotation or reversal of the same rectangle gives the same
/// output.
pub fn order_clockwise_top_left<TSpace>(corners: [Coord<TSpace>; 4]) -> [Coord<TSpace>; 4] {
    let mut pts = corners;
    if signed_area2(&pts) > 0.0 {
        pts.reverse();
    }

    let start = (1..4).fold(0, |best, i| if precedes(&pts[i], &pts[best]) { i } else { best });
    std::array::from_fn(|i| pts[(start + i) % 4])
}

fn precedes<TSpace>(a: &Coord<TSpace>, b: &Coord<TSpace>) -> bool {
    if same_row(a.y, b.y) {
        a.x < b.x
    } else {
        a.y < b.y
    }
}

fn same_row(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIE_EPS * a.abs().max(b.abs()).max(1.0)
}
