//! Synthetic inputs for benchmarks and demos.

use crate::{Path, Paths, Point};

/// A `count` by `count` grid of squares with side `side`, repeating every
/// `pitch` units in both directions from `origin`.
///
/// A non-zero `shear` moves the right side of every square down by that much,
/// giving parallelograms with no horizontal edges.
fn grid(origin: Point, side: f64, pitch: f64, shear: f64, count: usize) -> Paths {
    let cell = |col: usize, row: usize| -> Path {
        let x = origin.x + col as f64 * pitch;
        let y = origin.y + row as f64 * pitch;
        vec![
            Point::new(x, y),
            Point::new(x, y + side),
            Point::new(x + side, y + side + shear),
            Point::new(x + side, y + shear),
        ]
    };
    (0..count)
        .flat_map(|col| (0..count).map(move |row| (col, row)))
        .map(|(col, row)| cell(col, row))
        .collect()
}

/// Two interleaved grids of 30-unit squares.
///
/// The first holds `n * n` squares on a 40-unit pitch, so they don't touch.
/// The second holds `(n - 1) * (n - 1)` squares shifted by 20 units, so each
/// of them overlaps a corner of four squares from the first.
pub fn checkerboard(n: usize) -> (Paths, Paths) {
    interleaved(n, 0.0)
}

/// [`checkerboard`], sheared so that no edge is horizontal.
///
/// Horizontal edges take a separate path through the sweep, so comparing the
/// two shows what that path costs.
pub fn slanted_checkerboard(n: usize) -> (Paths, Paths) {
    interleaved(n, 1.0)
}

fn interleaved(n: usize, shear: f64) -> (Paths, Paths) {
    (
        grid(Point::new(0.0, 0.0), 30.0, 40.0, shear, n),
        grid(Point::new(20.0, 20.0), 30.0, 40.0, shear, n.saturating_sub(1)),
    )
}

/// `n` thin bands leaning one way and `n` leaning the other, each 10 units
/// wide.
///
/// Every band of the first set crosses every band of the second, so there
/// are `n * n` crossings to find.
pub fn slanties(n: usize) -> (Paths, Paths) {
    let h = 20.0 * n as f64;
    let band = |top: f64, bottom: f64| -> Path {
        vec![
            Point::new(top, 0.0),
            Point::new(bottom, h),
            Point::new(bottom + 10.0, h),
            Point::new(top + 10.0, 0.0),
        ]
    };
    (0..n)
        .map(|i| {
            let x = 20.0 * i as f64;
            (band(x, x + h), band(x + h, x))
        })
        .unzip()
}

/// A self-intersecting star polygon: `n` points around a circle of radius
/// `r`, each joined to the one `k` steps further on.
///
/// With `gcd(n, k) == 1` this is a single closed path, like the pentagram
/// for `n = 5, k = 2`.
pub fn star_polygon(n: usize, k: usize, r: f64) -> Path {
    (0..n)
        .map(|i| {
            let theta = ((i * k) % n) as f64 / n as f64 * std::f64::consts::TAU;
            Point::new(r * theta.cos(), r * theta.sin())
        })
        .collect()
}

/// An open zig-zag polyline with `n` segments, for offsetting.
pub fn zigzag(n: usize, width: f64, height: f64) -> Path {
    (0..=n)
        .map(|i| {
            let y = if i % 2 == 0 { 0.0 } else { height };
            Point::new(i as f64 * width, y)
        })
        .collect()
}
