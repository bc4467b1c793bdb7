//! One-shot operations built on top of [`Clipper`] and [`ClipperOffset`].

use crate::{
    geom::distance_from_line_sq, BooleanOp, ClipOptions, Clipper, ClipperOffset, EndType, Error,
    FillRule, JoinType, OffsetOptions, Path, PathType, Paths, Point,
};

/// A reasonable default for [`clean_polygon`]: vertices within about one
/// diagonal unit of their neighbors are removed.
pub const DEFAULT_CLEAN_DISTANCE: f64 = 1.415;

/// Computes a Boolean operation between two sets of closed paths.
///
/// Both sets are filled according to `fill_rule`.
///
/// ```
/// use sweepclip::{area, boolean_op, BooleanOp, FillRule, Point};
///
/// let a = vec![vec![
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(10.0, 10.0),
///     Point::new(0.0, 10.0),
/// ]];
/// let b = vec![vec![
///     Point::new(5.0, 5.0),
///     Point::new(15.0, 5.0),
///     Point::new(15.0, 15.0),
///     Point::new(5.0, 15.0),
/// ]];
/// let union = boolean_op(&a, &b, FillRule::EvenOdd, BooleanOp::Union).unwrap();
/// assert_eq!(union.len(), 1);
/// assert!((area(&union[0]) - 175.0).abs() < 1e-9);
/// ```
pub fn boolean_op(
    subject: &[Path],
    clip: &[Path],
    fill_rule: FillRule,
    op: BooleanOp,
) -> Result<Paths, Error> {
    let mut c = Clipper::new();
    c.add_paths(subject, PathType::Subject, true)?;
    c.add_paths(clip, PathType::Clip, true)?;
    c.execute(op, fill_rule, fill_rule)
}

/// Offsets a set of paths by `delta`, all with the same join and end types.
pub fn offset_paths(
    paths: &[Path],
    delta: f64,
    join: JoinType,
    end: EndType,
    options: OffsetOptions,
) -> Result<Paths, Error> {
    let mut o = ClipperOffset::with_options(options);
    o.add_paths(paths, join, end)?;
    o.execute(delta)
}

/// Splits a possibly self-intersecting polygon into simple polygons covering
/// the region it fills under `fill_rule`.
pub fn simplify_polygon(path: &[Point], fill_rule: FillRule) -> Result<Paths, Error> {
    let mut c = strictly_simple_clipper();
    c.add_path(path, PathType::Subject, true)?;
    c.execute(BooleanOp::Union, fill_rule, fill_rule)
}

/// Like [`simplify_polygon`], for the region filled by several paths together.
pub fn simplify_polygons(paths: &[Path], fill_rule: FillRule) -> Result<Paths, Error> {
    let mut c = strictly_simple_clipper();
    c.add_paths(paths, PathType::Subject, true)?;
    c.execute(BooleanOp::Union, fill_rule, fill_rule)
}

fn strictly_simple_clipper() -> Clipper {
    Clipper::with_options(ClipOptions {
        strictly_simple: true,
        ..ClipOptions::default()
    })
}

/// Are the three points within `sqrt(dist_sq)` of lying on one line?
///
/// The point lying geometrically between the other two is the one measured.
fn near_collinear(p1: Point, p2: Point, p3: Point, dist_sq: f64) -> bool {
    let (a1, a2, a3) = if (p1.x - p2.x).abs() > (p1.y - p2.y).abs() {
        (p1.x, p2.x, p3.x)
    } else {
        (p1.y, p2.y, p3.y)
    };
    if (a1 > a2) == (a1 < a3) {
        distance_from_line_sq(p1, p2, p3) < dist_sq
    } else if (a2 > a1) == (a2 < a3) {
        distance_from_line_sq(p2, p1, p3) < dist_sq
    } else {
        distance_from_line_sq(p3, p1, p2) < dist_sq
    }
}

/// Unlinks `i` from the ring and returns its predecessor, which needs
/// checking again.
fn unlink(i: usize, next: &mut [usize], prev: &mut [usize], done: &mut [bool]) -> usize {
    let (p, nx) = (prev[i], next[i]);
    next[p] = nx;
    prev[nx] = p;
    done[p] = false;
    p
}

/// Removes vertices that are within `distance` of a neighbor, or of the
/// line through their two neighbors.
///
/// Returns an empty path if fewer than three vertices survive.
pub fn clean_polygon(path: &[Point], distance: f64) -> Path {
    let n = path.len();
    if n == 0 {
        return Vec::new();
    }
    let dist_sq = distance * distance;
    let close = |a: Point, b: Point| a.dist_sq(&b) <= dist_sq;

    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
    let mut done = vec![false; n];
    let mut size = n;

    let mut op = 0;
    while !done[op] && next[op] != prev[op] {
        let (pp, pn) = (path[prev[op]], path[next[op]]);
        if close(path[op], pp) {
            op = unlink(op, &mut next, &mut prev, &mut done);
            size -= 1;
        } else if close(pp, pn) {
            let nx = next[op];
            unlink(nx, &mut next, &mut prev, &mut done);
            op = unlink(op, &mut next, &mut prev, &mut done);
            size -= 2;
        } else if near_collinear(pp, path[op], pn, dist_sq) {
            op = unlink(op, &mut next, &mut prev, &mut done);
            size -= 1;
        } else {
            done[op] = true;
            op = next[op];
        }
    }

    if size < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        out.push(path[op]);
        op = next[op];
    }
    out
}

/// Applies [`clean_polygon`] to every path, dropping the ones that vanish.
pub fn clean_polygons(paths: &[Path], distance: f64) -> Paths {
    paths
        .iter()
        .map(|p| clean_polygon(p, distance))
        .filter(|p| !p.is_empty())
        .collect()
}

/// The quadrilaterals swept out by `pattern` as its origin moves along `path`.
///
/// With `sum`, the pattern is added to each path vertex; otherwise it is
/// subtracted.
fn minkowski_quads(pattern: &[Point], path: &[Point], sum: bool, closed: bool) -> Paths {
    if pattern.is_empty() || path.is_empty() {
        return Vec::new();
    }
    let placed: Vec<Path> = path
        .iter()
        .map(|q| {
            pattern
                .iter()
                .map(|p| {
                    if sum {
                        Point::new(q.x + p.x, q.y + p.y)
                    } else {
                        Point::new(q.x - p.x, q.y - p.y)
                    }
                })
                .collect()
        })
        .collect();

    let (m, n) = (path.len(), pattern.len());
    let segments = if closed { m } else { m - 1 };
    let mut quads = Vec::with_capacity(segments * n);
    for i in 0..segments {
        let (a, b) = (&placed[i], &placed[(i + 1) % m]);
        for j in 0..n {
            let mut quad = vec![a[j], b[j], b[(j + 1) % n], a[(j + 1) % n]];
            if !crate::orientation(&quad) {
                quad.reverse();
            }
            quads.push(quad);
        }
    }
    quads
}

/// The Minkowski sum of `pattern` with the path `path`, which is treated as
/// a closed outline if `closed` is set.
///
/// The result covers every point `p + q` with `p` in `pattern` and `q` on
/// `path`. For a closed path that is a band around its outline; use
/// [`minkowski_sum_paths`] to include the interior as well.
pub fn minkowski_sum(pattern: &[Point], path: &[Point], closed: bool) -> Result<Paths, Error> {
    let mut c = Clipper::new();
    c.add_paths(
        &minkowski_quads(pattern, path, true, closed),
        PathType::Subject,
        true,
    )?;
    c.execute(BooleanOp::Union, FillRule::NonZero, FillRule::NonZero)
}

/// The Minkowski sum of `pattern` with several paths.
///
/// When the paths are closed, the regions they enclose (moved by the first
/// vertex of `pattern`) are part of the result.
pub fn minkowski_sum_paths(pattern: &[Point], paths: &[Path], closed: bool) -> Result<Paths, Error> {
    let mut c = Clipper::new();
    for path in paths {
        c.add_paths(
            &minkowski_quads(pattern, path, true, closed),
            PathType::Subject,
            true,
        )?;
        if let (true, Some(origin)) = (closed, pattern.first()) {
            let moved: Path = path
                .iter()
                .map(|q| Point::new(q.x + origin.x, q.y + origin.y))
                .collect();
            c.add_path(&moved, PathType::Clip, true)?;
        }
    }
    c.execute(BooleanOp::Union, FillRule::NonZero, FillRule::NonZero)
}

/// The Minkowski difference of two closed polygons: every point `q - p`
/// with `p` on `a` and `q` on `b`.
///
/// The result touches the origin exactly when the outlines of `a` and `b`
/// touch.
pub fn minkowski_diff(a: &[Point], b: &[Point]) -> Result<Paths, Error> {
    let mut c = Clipper::new();
    c.add_paths(&minkowski_quads(a, b, false, true), PathType::Subject, true)?;
    c.execute(BooleanOp::Union, FillRule::NonZero, FillRule::NonZero)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::area;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        vec![p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)]
    }

    fn total_area(paths: &Paths) -> f64 {
        paths.iter().map(|p| area(p)).sum()
    }

    #[test]
    fn disjoint_squares() {
        let a = [rect(0.0, 0.0, 1.0, 1.0)];
        let b = [rect(5.0, 5.0, 6.0, 6.0)];
        assert!(boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Intersection)
            .unwrap()
            .is_empty());
        let union = boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Union).unwrap();
        assert_eq!(union.len(), 2);
        let xor = boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Xor).unwrap();
        assert!((total_area(&xor) - total_area(&union)).abs() < 1e-9);
    }

    #[test]
    fn simplify_bowtie() {
        let bowtie = [p(0.0, 0.0), p(10.0, 10.0), p(10.0, 0.0), p(0.0, 10.0)];
        let out = simplify_polygon(&bowtie, FillRule::NonZero).unwrap();
        assert_eq!(out.len(), 2);
        for tri in &out {
            assert_eq!(tri.len(), 3);
            assert!((area(tri) - 25.0).abs() < 1e-9);
        }
    }

    #[test]
    fn simplify_overlapping() {
        let out = simplify_polygons(
            &[rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 5.0, 15.0, 15.0)],
            FillRule::NonZero,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 175.0).abs() < 1e-9);
    }

    #[test]
    fn clean_removes_close_and_collinear() {
        let path = [
            p(0.0, 0.0),
            p(5.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 0.5),
            p(10.0, 10.0),
            p(0.0, 10.0),
        ];
        let out = clean_polygon(&path, DEFAULT_CLEAN_DISTANCE);
        assert_eq!(out.len(), 4, "{out:?}");
        assert!(out.contains(&p(10.0, 10.0)));
        assert!(!out.contains(&p(5.0, 0.0)));
    }

    #[test]
    fn clean_collapses_tiny_polygons() {
        let tiny = rect(0.0, 0.0, 0.5, 0.5);
        assert!(clean_polygon(&tiny, DEFAULT_CLEAN_DISTANCE).is_empty());
        assert!(clean_polygon(&[], 1.0).is_empty());
        let kept = clean_polygons(&[tiny, rect(0.0, 0.0, 10.0, 10.0)], 1.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].len(), 4);
    }

    #[test]
    fn minkowski_band_around_square() {
        let pattern = rect(-1.0, -1.0, 1.0, 1.0);
        let square = rect(0.0, 0.0, 10.0, 10.0);
        let band = minkowski_sum(&pattern, &square, true).unwrap();
        assert_eq!(band.len(), 2);
        assert!((total_area(&band) - 80.0).abs() < 1e-9, "{band:?}");

        let filled = minkowski_sum_paths(&pattern, &[square.clone()], true).unwrap();
        assert_eq!(filled.len(), 1);
        assert!((total_area(&filled) - 144.0).abs() < 1e-9);

        let diff = minkowski_diff(&pattern, &square).unwrap();
        assert!((total_area(&diff) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn minkowski_open_segment() {
        let pattern = rect(-1.0, -1.0, 1.0, 1.0);
        let out = minkowski_sum(&pattern, &[p(0.0, 0.0), p(10.0, 0.0)], false).unwrap();
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 24.0).abs() < 1e-9);
        assert!(minkowski_sum(&[], &[p(0.0, 0.0)], false).unwrap().is_empty());
    }

    #[test]
    fn offset_convenience() {
        let out = offset_paths(
            &[rect(0.0, 0.0, 10.0, 10.0)],
            1.0,
            JoinType::Miter,
            EndType::ClosedPolygon,
            OffsetOptions::default(),
        )
        .unwrap();
        assert!((total_area(&out) - 144.0).abs() < 1e-9);
    }

    /// A star-shaped polygon: vertices at increasing angles around the origin.
    fn star() -> impl Strategy<Value = Path> {
        prop::collection::vec((0.05f64..0.95, 1.0f64..10.0), 3..12).prop_map(|spokes| {
            let n = spokes.len() as f64;
            spokes
                .iter()
                .enumerate()
                .map(|(i, &(jitter, r))| {
                    let theta = (i as f64 + jitter) / n * std::f64::consts::TAU;
                    p(r * theta.cos(), r * theta.sin())
                })
                .collect()
        })
    }

    fn random_rect() -> impl Strategy<Value = Path> {
        (0.0f64..80.0, 0.0f64..80.0, 1.0f64..20.0, 1.0f64..20.0)
            .prop_map(|(x, y, w, h)| rect(x, y, x + w, y + h))
    }

    proptest! {
        #[test]
        fn union_with_itself(a in star()) {
            let out = boolean_op(
                &[a.clone()],
                &[a.clone()],
                FillRule::NonZero,
                BooleanOp::Union,
            )
            .unwrap();
            prop_assert_eq!(out.len(), 1);
            let expected = area(&a);
            prop_assert!((area(&out[0]) - expected).abs() <= 1e-6 * expected);
        }

        #[test]
        fn intersection_with_itself(a in star()) {
            let out = boolean_op(
                &[a.clone()],
                &[a.clone()],
                FillRule::NonZero,
                BooleanOp::Intersection,
            )
            .unwrap();
            let expected = area(&a);
            prop_assert!((total_area(&out) - expected).abs() <= 1e-6 * expected);
        }

        #[test]
        fn outers_positive_holes_negative(
            rects in prop::collection::vec(random_rect(), 1..8),
            clip in prop::collection::vec(random_rect(), 1..4),
        ) {
            let mut c = Clipper::new();
            c.add_paths(&rects, PathType::Subject, true).unwrap();
            c.add_paths(&clip, PathType::Clip, true).unwrap();
            let tree = c
                .execute_tree(BooleanOp::Xor, FillRule::NonZero, FillRule::NonZero)
                .unwrap();
            for node in tree.iter() {
                let a = area(tree.contour(node));
                if tree.is_hole(node) {
                    prop_assert!(a < 0.0);
                } else {
                    prop_assert!(a > 0.0);
                }
            }
        }

        #[test]
        fn difference_and_intersection_partition(
            a in prop::collection::vec(random_rect(), 1..5),
            b in prop::collection::vec(random_rect(), 1..5),
        ) {
            let union_a = total_area(&boolean_op(&a, &[], FillRule::NonZero, BooleanOp::Union).unwrap());
            let diff = total_area(&boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Difference).unwrap());
            let inter = total_area(&boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Intersection).unwrap());
            prop_assert!((diff + inter - union_a).abs() <= 1e-6 * union_a.max(1.0));
        }
    }
}
