#![allow(dead_code)]

use obblabel::geom::{Coord, Normalized, OrientedRect};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Relative tolerance for rectangle shape checks on fitted output.
pub const EPS_RECT: f64 = 1e-7;

/// Absolute tolerance for hull containment.
pub const EPS_CONTAIN: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A point in the unit square.
pub fn arb_point() -> BoxedStrategy<Coord<Normalized>> {
    (0.0..=1.0f64, 0.0..=1.0f64)
        .prop_map(|(x, y)| Coord::new(x, y))
        .boxed()
}

/// Between `min` and `max` points in the unit square, duplicates allowed.
pub fn arb_cloud(min: usize, max: usize) -> BoxedStrategy<Vec<Coord<Normalized>>> {
    prop::collection::vec(arb_point(), min..=max).boxed()
}

/// Points on a coarse grid, so collinear runs and exact duplicates are common.
pub fn arb_grid_cloud(max: usize) -> BoxedStrategy<Vec<Coord<Normalized>>> {
    prop::collection::vec((0u8..=8, 0u8..=8), 0..=max)
        .prop_map(|cells| {
            cells
                .into_iter()
                .map(|(i, j)| Coord::new(f64::from(i) / 8.0, f64::from(j) / 8.0))
                .collect()
        })
        .boxed()
}

/// A non-degenerate rectangle inside the unit square, corners in polygon order.
pub fn arb_rect() -> BoxedStrategy<OrientedRect<Normalized>> {
    (
        0.3..=0.7f64,
        0.3..=0.7f64,
        0.01..=0.2f64,
        0.01..=0.2f64,
        0.0..std::f64::consts::PI,
    )
        .prop_map(|(cx, cy, hw, hh, angle)| {
            let (sin, cos) = angle.sin_cos();
            let corner = |u: f64, v: f64| Coord::new(cx + u * cos - v * sin, cy + u * sin + v * cos);
            OrientedRect::new([
                corner(-hw, -hh),
                corner(hw, -hh),
                corner(hw, hh),
                corner(-hw, hh),
            ])
        })
        .boxed()
}
