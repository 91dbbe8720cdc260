//! Monotone-chain convex hull.

use super::coord::{cross, Coord};

/// Computes the 2D convex hull of `points`.
///
/// The hull is returned counter-clockwise (in a y-up frame) with strict left
/// turns only: collinear and duplicate points are dropped. Inputs with three
/// or fewer points are returned unchanged, so the result may be degenerate.
pub fn convex_hull<TSpace>(points: &[Coord<TSpace>]) -> Vec<Coord<TSpace>> {
    if points.len() <= 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));

    let mut lower: Vec<Coord<TSpace>> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        push_left_turn(&mut lower, *p);
    }

    let mut upper: Vec<Coord<TSpace>> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        push_left_turn(&mut upper, *p);
    }

    // Each chain ends where the other begins.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn push_left_turn<TSpace>(chain: &mut Vec<Coord<TSpace>>, p: Coord<TSpace>) {
    while chain.len() >= 2 && cross(&chain[chain.len() - 2], &chain[chain.len() - 1], &p) <= 0.0 {
        chain.pop();
    }
    chain.push(p);
}

/// Twice the signed area of a polygon (shoelace sum).
///
/// Positive for counter-clockwise order in a y-up frame.
pub fn signed_area2<TSpace>(polygon: &[Coord<TSpace>]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let a = &polygon[i];
            let b = &polygon[(i + 1) % n];
            a.x * b.y - a.y * b.x
        })
        .sum()
}

/// Returns true if `point` lies inside or on a counter-clockwise convex polygon.
///
/// `tolerance` is applied to the edge cross products, so points a hair
/// outside an edge still count as contained.
pub fn hull_contains<TSpace>(hull: &[Coord<TSpace>], point: &Coord<TSpace>, tolerance: f64) -> bool {
    let n = hull.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| cross(&hull[i], &hull[(i + 1) % n], point) >= -tolerance)
}
