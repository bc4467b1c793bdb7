//! Offsetting (inflating and deflating) polygons and polylines.
//!
//! Each input path is offset on its own: every edge is pushed out along its
//! unit normal, and the gaps (or overlaps) this opens up at the vertices are
//! filled in according to the path's [`JoinType`]. Open paths also get caps
//! according to their [`EndType`]. The raw offset contours can overlap
//! themselves and each other, so they're cleaned up by a union through the
//! sweep before being returned.

use std::f64::consts::PI;

use arrayvec::ArrayVec;

use crate::{
    geom::Rect, num::Tolerance, orientation, BooleanOp, ClipOptions, Clipper, EndType, Error,
    FillRule, JoinType, Path, PathType, Paths, Point, PolyTree,
};

const DEFAULT_ARC_TOLERANCE: f64 = 0.25;

/// Arcs are never approximated more finely than this fraction of the offset
/// distance.
const MIN_RELATIVE_ARC_TOLERANCE: f64 = 1e-4;

/// Options controlling a [`ClipperOffset`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OffsetOptions {
    /// How far a miter join may reach, as a multiple of the offset distance,
    /// before it's squared off instead. Values below 2 are treated as 2.
    pub miter_limit: f64,
    /// The largest distance an approximated round join or cap may deviate
    /// from the true arc, in the units of the input coordinates.
    ///
    /// Non-positive values select the default of 0.25. The tolerance is
    /// never allowed to exceed a quarter of the offset distance.
    pub arc_tolerance: f64,
    /// Relative tolerance for coordinate comparisons, as in
    /// [`ClipOptions::tolerance`].
    pub tolerance: f64,
    /// Split the result into strictly simple polygons.
    pub strictly_simple: bool,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        OffsetOptions {
            miter_limit: 2.0,
            arc_tolerance: DEFAULT_ARC_TOLERANCE,
            tolerance: ClipOptions::default().tolerance,
            strictly_simple: false,
        }
    }
}

#[derive(Clone, Debug)]
struct SourcePath {
    contour: Path,
    join: JoinType,
    end: EndType,
}

/// An offsetting engine.
///
/// Paths are added together with the way their corners and ends should be
/// treated, and then offset all at once by a signed distance. Positive
/// distances grow outer contours (and shrink holes); negative ones do the
/// opposite.
///
/// ```
/// use sweepclip::{area, ClipperOffset, EndType, JoinType, Point};
///
/// let square = vec![
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(10.0, 10.0),
///     Point::new(0.0, 10.0),
/// ];
/// let mut offset = ClipperOffset::new();
/// offset.add_path(&square, JoinType::Miter, EndType::ClosedPolygon).unwrap();
/// let grown = offset.execute(1.0).unwrap();
/// assert_eq!(grown.len(), 1);
/// assert!((area(&grown[0]) - 144.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ClipperOffset {
    options: OffsetOptions,
    paths: Vec<SourcePath>,
    /// The vertex with the largest `y` (then smallest `x`) among all closed
    /// polygons, as (path, vertex) indices. It always lies on an outer contour.
    bottom: Option<(usize, usize)>,
}

/// Further along the sweep's notion of "bottom": larger `y`, then smaller `x`.
fn is_below(p: Point, q: Point) -> bool {
    p.y > q.y || (p.y == q.y && p.x < q.x)
}

impl ClipperOffset {
    /// Creates an empty offsetter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty offsetter.
    pub fn with_options(options: OffsetOptions) -> Self {
        ClipperOffset {
            options,
            ..Self::default()
        }
    }

    /// The options this offsetter runs with.
    pub fn options(&self) -> &OffsetOptions {
        &self.options
    }

    /// Adds a path.
    ///
    /// Consecutive duplicate vertices are dropped (and for closed paths, so
    /// are copies of the first vertex at the end). Returns `Ok(false)` if
    /// nothing is left, or if a closed polygon has fewer than three vertices.
    pub fn add_path(&mut self, path: &[Point], join: JoinType, end: EndType) -> Result<bool, Error> {
        if path.iter().any(|p| !p.is_finite()) {
            return Err(Error::InvalidInput("non-finite coordinate"));
        }
        let Some(&first) = path.first() else {
            return Ok(false);
        };
        let magnitude = path
            .iter()
            .map(|p| p.x.abs().max(p.y.abs()))
            .fold(0.0, f64::max);
        let eps = Tolerance::scaled(self.options.tolerance, magnitude).eps;

        let mut end_idx = path.len();
        if end.is_closed() {
            while end_idx > 1 && path[0].approx_eq(&path[end_idx - 1], eps) {
                end_idx -= 1;
            }
        }
        let mut contour = vec![first];
        let mut bottom = 0;
        for &p in &path[1..end_idx] {
            if contour.last().is_some_and(|last| last.approx_eq(&p, eps)) {
                continue;
            }
            contour.push(p);
            if is_below(p, contour[bottom]) {
                bottom = contour.len() - 1;
            }
        }
        if end == EndType::ClosedPolygon && contour.len() < 3 {
            return Ok(false);
        }

        if end == EndType::ClosedPolygon {
            let lower = match self.bottom {
                None => true,
                Some((i, k)) => is_below(contour[bottom], self.paths[i].contour[k]),
            };
            if lower {
                self.bottom = Some((self.paths.len(), bottom));
            }
        }
        self.paths.push(SourcePath { contour, join, end });
        Ok(true)
    }

    /// Adds several paths with the same join and end types, returning
    /// `Ok(true)` if any of them survived.
    pub fn add_paths(&mut self, paths: &[Path], join: JoinType, end: EndType) -> Result<bool, Error> {
        let mut any = false;
        for path in paths {
            any |= self.add_path(path, join, end)?;
        }
        Ok(any)
    }

    /// Removes all paths.
    pub fn clear(&mut self) {
        self.paths.clear();
        self.bottom = None;
    }

    /// Offsets every path by `delta` and returns the resulting polygons.
    ///
    /// A zero `delta` returns the closed polygons, cleaned up into simple
    /// polygons but otherwise unchanged. Open paths can only be offset
    /// outwards.
    pub fn execute(&mut self, delta: f64) -> Result<Paths, Error> {
        let (mut clipper, fill) = self.prepare(delta)?;
        let mut out = clipper.execute(BooleanOp::Union, fill, fill)?;
        if delta < 0.0 {
            // The surrounding rectangle is the largest thing in the output.
            let outer = out
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| crate::area(a).abs().total_cmp(&crate::area(b).abs()))
                .map(|(i, _)| i);
            if let Some(i) = outer {
                out.remove(i);
            }
        }
        tracing::debug!(delta, paths = self.paths.len(), out = out.len(), "offset finished");
        Ok(out)
    }

    /// Like [`execute`](Self::execute), but returns the polygons arranged by
    /// nesting.
    pub fn execute_tree(&mut self, delta: f64) -> Result<PolyTree, Error> {
        let (mut clipper, fill) = self.prepare(delta)?;
        let tree = clipper.execute_tree(BooleanOp::Union, fill, fill)?;
        let tree = if delta < 0.0 {
            tree.without_outer_root()
        } else {
            tree
        };
        tracing::debug!(delta, paths = self.paths.len(), nodes = tree.total(), "offset finished");
        Ok(tree)
    }

    /// Computes the raw offset contours and loads them into a clipper,
    /// returning it along with the fill rule that cleans them up.
    fn prepare(&mut self, delta: f64) -> Result<(Clipper, FillRule), Error> {
        if !delta.is_finite() {
            return Err(Error::InvalidInput("non-finite offset distance"));
        }
        self.fix_orientations();
        let raw = self.offset_contours(delta);
        tracing::trace!(delta, contours = raw.len(), "raw offset contours");

        let mut clipper = Clipper::with_options(ClipOptions {
            reverse_solution: delta < 0.0,
            strictly_simple: self.options.strictly_simple,
            preserve_collinear: false,
            tolerance: self.options.tolerance,
        });
        clipper.add_paths(&raw, PathType::Subject, true)?;
        let fill = if delta > 0.0 {
            FillRule::Positive
        } else if delta == 0.0 {
            FillRule::NonZero
        } else {
            // Shrinking is growing the complement: surround everything with a
            // clockwise rectangle, and what's left inside it are the holes.
            if let Some(r) = clipper.bounds() {
                clipper.add_path(&outer_rect(&r), PathType::Subject, true)?;
            }
            FillRule::Negative
        };
        Ok((clipper, fill))
    }

    /// Makes the outermost closed polygon positively oriented, flipping the
    /// others along with it, and makes closed lines positively oriented.
    fn fix_orientations(&mut self) {
        let flip_all = self
            .bottom
            .is_some_and(|(i, _)| !orientation(&self.paths[i].contour));
        for p in &mut self.paths {
            let reverse = match p.end {
                EndType::ClosedPolygon => flip_all,
                EndType::ClosedLine => orientation(&p.contour) == flip_all,
                _ => false,
            };
            if reverse {
                p.contour.reverse();
            }
        }
        if flip_all {
            if let Some((i, k)) = self.bottom {
                let len = self.paths[i].contour.len();
                self.bottom = Some((i, len - 1 - k));
            }
        }
    }

    fn offset_contours(&self, delta: f64) -> Paths {
        if delta == 0.0 {
            return self
                .paths
                .iter()
                .filter(|p| p.end == EndType::ClosedPolygon)
                .map(|p| p.contour.clone())
                .collect();
        }

        let arcs = ArcSteps::new(delta, &self.options);
        let mut out = Vec::with_capacity(self.paths.len() * 2);
        for src in &self.paths {
            let len = src.contour.len();
            if len == 0 || (delta <= 0.0 && (len < 3 || src.end != EndType::ClosedPolygon)) {
                continue;
            }
            let mut o = PathOffsetter {
                src: &src.contour,
                join: src.join,
                delta,
                arcs,
                normals: Vec::with_capacity(len),
                dest: Vec::new(),
                sin_a: 0.0,
            };
            o.offset(src.end, &mut out);
        }
        out
    }
}

fn outer_rect(r: &Rect) -> Path {
    let m = (r.width() + r.height()).max(1.0) * 0.1;
    vec![
        Point::new(r.min_x - m, r.max_y + m),
        Point::new(r.max_x + m, r.max_y + m),
        Point::new(r.max_x + m, r.min_y - m),
        Point::new(r.min_x - m, r.min_y - m),
    ]
}

/// How finely arcs are approximated, and when a miter is too long.
#[derive(Clone, Copy, Debug)]
struct ArcSteps {
    /// Number of segments in a full circle.
    steps: f64,
    steps_per_rad: f64,
    /// Rotation by one step, in the direction the offset turns at a
    /// convex corner.
    sin: f64,
    cos: f64,
    /// Turns whose offset points are closer than this are not joined.
    precision: f64,
    /// Minimum of `1 + cos(angle)` for a miter join.
    miter_lim: f64,
}

impl ArcSteps {
    fn new(delta: f64, options: &OffsetOptions) -> Self {
        let abs = delta.abs();
        let tol = if options.arc_tolerance > 0.0 {
            options.arc_tolerance
        } else {
            DEFAULT_ARC_TOLERANCE
        };
        let tol = tol.clamp(
            abs * MIN_RELATIVE_ARC_TOLERANCE,
            abs * DEFAULT_ARC_TOLERANCE,
        );
        let steps = PI / (1.0 - tol / abs).acos();
        let angle = 2.0 * PI / steps;
        let sin = if delta < 0.0 { -angle.sin() } else { angle.sin() };
        let miter_lim = if options.miter_limit > 2.0 {
            2.0 / (options.miter_limit * options.miter_limit)
        } else {
            0.5
        };
        ArcSteps {
            steps,
            steps_per_rad: steps / (2.0 * PI),
            sin,
            cos: angle.cos(),
            precision: tol,
            miter_lim,
        }
    }
}

fn unit_normal(p1: Point, p2: Point) -> Point {
    if p1 == p2 {
        return Point::default();
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    // Dividing, rather than multiplying by the reciprocal, keeps tiny
    // segments finite.
    let len = dx.hypot(dy);
    if len == 0.0 {
        return Point::default();
    }
    Point::new(dy / len, -dx / len)
}

fn neg(p: Point) -> Point {
    Point::new(-p.x, -p.y)
}

/// The offsetting state for one source path.
struct PathOffsetter<'a> {
    src: &'a [Point],
    join: JoinType,
    delta: f64,
    arcs: ArcSteps,
    /// `normals[j]` is the normal of the edge leaving vertex `j`.
    normals: Vec<Point>,
    dest: Path,
    /// Cross product of the normals at the corner being joined.
    sin_a: f64,
}

impl PathOffsetter<'_> {
    fn offset(&mut self, end: EndType, out: &mut Paths) {
        let len = self.src.len();
        if len == 1 {
            self.offset_single_point();
            out.push(std::mem::take(&mut self.dest));
            return;
        }

        for w in self.src.windows(2) {
            self.normals.push(unit_normal(w[0], w[1]));
        }
        if end.is_closed() {
            self.normals.push(unit_normal(self.src[len - 1], self.src[0]));
        } else {
            self.normals.push(self.normals[len - 2]);
        }

        match end {
            EndType::ClosedPolygon => {
                let mut k = len - 1;
                for j in 0..len {
                    self.offset_point(j, &mut k);
                }
                out.push(std::mem::take(&mut self.dest));
            }
            EndType::ClosedLine => {
                let mut k = len - 1;
                for j in 0..len {
                    self.offset_point(j, &mut k);
                }
                out.push(std::mem::take(&mut self.dest));

                // Now go back along the other side.
                let last = self.normals[len - 1];
                for j in (1..len).rev() {
                    self.normals[j] = neg(self.normals[j - 1]);
                }
                self.normals[0] = neg(last);
                let mut k = 0;
                for j in (0..len).rev() {
                    self.offset_point(j, &mut k);
                }
                out.push(std::mem::take(&mut self.dest));
            }
            EndType::OpenButt | EndType::OpenSquare | EndType::OpenRound => {
                let mut k = 0;
                for j in 1..len - 1 {
                    self.offset_point(j, &mut k);
                }
                self.cap(end, len - 1, len - 2);

                for j in (1..len).rev() {
                    self.normals[j] = neg(self.normals[j - 1]);
                }
                self.normals[0] = neg(self.normals[1]);
                let mut k = len - 1;
                for j in (1..len - 1).rev() {
                    self.offset_point(j, &mut k);
                }
                self.cap(end, 0, 1);
                out.push(std::mem::take(&mut self.dest));
            }
        }
    }

    fn at(&self, j: usize, n: Point, scale: f64) -> Point {
        let p = self.src[j];
        Point::new(p.x + n.x * scale, p.y + n.y * scale)
    }

    fn offset_single_point(&mut self) {
        let d = self.delta;
        if self.join == JoinType::Round {
            let (mut x, mut y) = (1.0, 0.0);
            let mut step = 1.0;
            while step <= self.arcs.steps {
                self.dest.push(self.at(0, Point::new(x, y), d));
                (x, y) = (
                    x * self.arcs.cos - self.arcs.sin * y,
                    x * self.arcs.sin + y * self.arcs.cos,
                );
                step += 1.0;
            }
        } else {
            for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                self.dest.push(self.at(0, Point::new(x, y), d));
            }
        }
    }

    /// Caps the end of an open path at vertex `j`, whose neighbor is `k`.
    fn cap(&mut self, end: EndType, j: usize, k: usize) {
        match end {
            EndType::OpenButt => {
                let n = self.normals[j];
                let pts: ArrayVec<Point, 2> = if j == 0 {
                    [self.at(j, n, -self.delta), self.at(j, n, self.delta)].into()
                } else {
                    [self.at(j, n, self.delta), self.at(j, n, -self.delta)].into()
                };
                self.dest.extend(pts);
            }
            EndType::OpenSquare | EndType::OpenRound => {
                self.sin_a = 0.0;
                if j != 0 {
                    self.normals[j] = neg(self.normals[j]);
                }
                if end == EndType::OpenSquare {
                    self.square(j, k);
                } else {
                    self.round(j, k);
                }
            }
            EndType::ClosedPolygon | EndType::ClosedLine => {}
        }
    }

    /// Offsets vertex `j`, where `k` is the previous vertex that was joined.
    fn offset_point(&mut self, j: usize, k: &mut usize) {
        let nk = self.normals[*k];
        let nj = self.normals[j];
        self.sin_a = nk.x * nj.y - nj.x * nk.y;
        if (self.sin_a * self.delta).abs() < self.arcs.precision {
            let cos_a = nk.x * nj.x + nj.y * nk.y;
            if cos_a > 0.0 {
                // Almost straight on: one point is enough.
                self.dest.push(self.at(j, nk, self.delta));
                return;
            }
        } else {
            self.sin_a = self.sin_a.clamp(-1.0, 1.0);
        }

        if self.sin_a * self.delta < 0.0 {
            // The offset edges overlap here; the union cuts off the loop.
            self.dest.push(self.at(j, nk, self.delta));
            self.dest.push(self.src[j]);
            self.dest.push(self.at(j, nj, self.delta));
        } else {
            match self.join {
                JoinType::Miter => {
                    let r = 1.0 + (nj.x * nk.x + nj.y * nk.y);
                    if r >= self.arcs.miter_lim {
                        self.miter(j, *k, r);
                    } else {
                        self.square(j, *k);
                    }
                }
                JoinType::Square => self.square(j, *k),
                JoinType::Round => self.round(j, *k),
            }
        }
        *k = j;
    }

    fn square(&mut self, j: usize, k: usize) {
        let nk = self.normals[k];
        let nj = self.normals[j];
        let dx = (self.sin_a.atan2(nk.x * nj.x + nk.y * nj.y) / 4.0).tan();
        let pts: ArrayVec<Point, 2> = [
            self.at(j, Point::new(nk.x - nk.y * dx, nk.y + nk.x * dx), self.delta),
            self.at(j, Point::new(nj.x + nj.y * dx, nj.y - nj.x * dx), self.delta),
        ]
        .into();
        self.dest.extend(pts);
    }

    fn miter(&mut self, j: usize, k: usize, r: f64) {
        let nk = self.normals[k];
        let nj = self.normals[j];
        let q = self.delta / r;
        self.dest
            .push(self.at(j, Point::new(nk.x + nj.x, nk.y + nj.y), q));
    }

    fn round(&mut self, j: usize, k: usize) {
        let nk = self.normals[k];
        let nj = self.normals[j];
        let a = self.sin_a.atan2(nk.x * nj.x + nk.y * nj.y);
        let steps = ((self.arcs.steps_per_rad * a.abs()).round() as usize).max(1);

        let (mut x, mut y) = (nk.x, nk.y);
        for _ in 0..steps {
            self.dest.push(self.at(j, Point::new(x, y), self.delta));
            (x, y) = (
                x * self.arcs.cos - self.arcs.sin * y,
                x * self.arcs.sin + y * self.arcs.cos,
            );
        }
        self.dest.push(self.at(j, nj, self.delta));
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

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

    fn offset_one(path: &[Point], join: JoinType, end: EndType, delta: f64) -> Paths {
        let mut o = ClipperOffset::new();
        o.add_path(path, join, end).unwrap();
        o.execute(delta).unwrap()
    }

    #[test]
    fn miter_square() {
        let out = offset_one(
            &rect(0.0, 0.0, 10.0, 10.0),
            JoinType::Miter,
            EndType::ClosedPolygon,
            1.0,
        );
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 144.0).abs() < 1e-9, "{out:?}");
    }

    #[test]
    fn square_join_chamfers_corners() {
        let out = offset_one(
            &rect(0.0, 0.0, 10.0, 10.0),
            JoinType::Square,
            EndType::ClosedPolygon,
            1.0,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 8);
        let cut = 1.0 - (PI / 8.0).tan();
        let expected = 144.0 - 4.0 * 0.5 * cut * cut;
        assert!((area(&out[0]) - expected).abs() < 1e-9);
    }

    #[test]
    fn round_join_default_tolerance() {
        let out = offset_one(
            &rect(0.0, 0.0, 10.0, 10.0),
            JoinType::Round,
            EndType::ClosedPolygon,
            2.0,
        );
        assert_eq!(out.len(), 1);
        let exact = 100.0 + 40.0 * 2.0 + PI * 4.0;
        let a = area(&out[0]);
        assert!(a < exact);
        assert!((a - exact).abs() < 2.0, "{a}");
    }

    #[test]
    fn round_join_fine_tolerance() {
        let mut o = ClipperOffset::with_options(OffsetOptions {
            arc_tolerance: 0.01,
            ..OffsetOptions::default()
        });
        o.add_path(&rect(0.0, 0.0, 10.0, 10.0), JoinType::Round, EndType::ClosedPolygon)
            .unwrap();
        let out = o.execute(2.0).unwrap();
        let exact = 100.0 + 40.0 * 2.0 + PI * 4.0;
        assert!((total_area(&out) - exact).abs() < 0.2);
    }

    #[test]
    fn shrink_square() {
        let out = offset_one(
            &rect(0.0, 0.0, 10.0, 10.0),
            JoinType::Round,
            EndType::ClosedPolygon,
            -2.0,
        );
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 36.0).abs() < 1e-9, "{out:?}");
    }

    #[test]
    fn shrink_away() {
        let out = offset_one(
            &rect(0.0, 0.0, 10.0, 2.0),
            JoinType::Miter,
            EndType::ClosedPolygon,
            -1.5,
        );
        assert!(out.is_empty(), "{out:?}");
    }

    #[test]
    fn clockwise_input_is_reoriented() {
        let mut cw = rect(0.0, 0.0, 10.0, 10.0);
        cw.reverse();
        let out = offset_one(&cw, JoinType::Miter, EndType::ClosedPolygon, 1.0);
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 144.0).abs() < 1e-9);
    }

    #[test]
    fn shrinking_grows_holes() {
        let mut hole = rect(5.0, 5.0, 15.0, 15.0);
        hole.reverse();
        let mut o = ClipperOffset::new();
        o.add_paths(
            &[rect(0.0, 0.0, 20.0, 20.0), hole],
            JoinType::Miter,
            EndType::ClosedPolygon,
        )
        .unwrap();
        let out = o.execute(-1.0).unwrap();
        assert_eq!(out.len(), 2);
        assert!((total_area(&out) - (324.0 - 144.0)).abs() < 1e-9, "{out:?}");

        let tree = o.execute_tree(-1.0).unwrap();
        assert_eq!(tree.roots().len(), 1);
        let root = tree.roots()[0];
        assert!((area(tree.contour(root)) - 324.0).abs() < 1e-9);
        assert_eq!(tree.children(root).len(), 1);
        assert!(tree.is_hole(tree.children(root)[0]));
    }

    #[test]
    fn open_butt_line() {
        let out = offset_one(
            &[p(0.0, 0.0), p(10.0, 0.0)],
            JoinType::Square,
            EndType::OpenButt,
            1.0,
        );
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 20.0).abs() < 1e-9, "{out:?}");
    }

    #[test]
    fn open_square_line() {
        let out = offset_one(
            &[p(0.0, 0.0), p(10.0, 0.0)],
            JoinType::Square,
            EndType::OpenSquare,
            1.0,
        );
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 24.0).abs() < 1e-9, "{out:?}");
    }

    #[test]
    fn open_round_line() {
        let out = offset_one(
            &[p(0.0, 0.0), p(10.0, 0.0)],
            JoinType::Round,
            EndType::OpenRound,
            1.0,
        );
        assert_eq!(out.len(), 1);
        let a = area(&out[0]);
        assert!(a > 20.0 && a < 20.0 + PI, "{a}");
    }

    #[test]
    fn closed_line_makes_a_ring() {
        let out = offset_one(
            &rect(0.0, 0.0, 10.0, 10.0),
            JoinType::Miter,
            EndType::ClosedLine,
            1.0,
        );
        assert_eq!(out.len(), 2);
        assert!((total_area(&out) - 80.0).abs() < 1e-9, "{out:?}");
    }

    #[test]
    fn single_point_becomes_a_disc() {
        let mut o = ClipperOffset::with_options(OffsetOptions {
            arc_tolerance: 0.01,
            ..OffsetOptions::default()
        });
        o.add_path(&[p(0.0, 0.0)], JoinType::Round, EndType::OpenRound)
            .unwrap();
        let out = o.execute(10.0).unwrap();
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - PI * 100.0).abs() < 1.0);
    }

    #[test]
    fn open_paths_do_not_shrink() {
        let out = offset_one(
            &[p(0.0, 0.0), p(10.0, 0.0)],
            JoinType::Round,
            EndType::OpenRound,
            -1.0,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn zero_offset_keeps_closed_polygons() {
        let mut o = ClipperOffset::new();
        o.add_path(&rect(0.0, 0.0, 4.0, 4.0), JoinType::Round, EndType::ClosedPolygon)
            .unwrap();
        o.add_path(&[p(0.0, 10.0), p(5.0, 10.0)], JoinType::Round, EndType::OpenRound)
            .unwrap();
        let out = o.execute(0.0).unwrap();
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_paths_are_dropped() {
        let mut o = ClipperOffset::new();
        assert!(!o
            .add_path(&[p(0.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)], JoinType::Round, EndType::ClosedPolygon)
            .unwrap());
        assert!(!o.add_path(&[], JoinType::Round, EndType::OpenButt).unwrap());
        assert!(o.execute(1.0).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        let mut o = ClipperOffset::new();
        assert_matches!(
            o.add_path(&[p(f64::NAN, 0.0)], JoinType::Round, EndType::OpenRound),
            Err(Error::InvalidInput(_))
        );
        assert_matches!(o.execute(f64::INFINITY), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn normals_of_tiny_segments_are_finite() {
        let n = unit_normal(p(0.0, 0.0), p(5e-324, 0.0));
        assert_eq!(n, p(0.0, -1.0));
        assert_eq!(unit_normal(p(1.0, 1.0), p(1.0, 1.0)), Point::default());
    }

    #[test]
    fn arc_steps() {
        let arcs = ArcSteps::new(2.0, &OffsetOptions::default());
        assert!((arcs.precision - 0.25).abs() < 1e-12);
        assert!((arcs.steps - PI / 0.875f64.acos()).abs() < 1e-9);
        assert_eq!(arcs.miter_lim, 0.5);

        // Coarser than a quarter of the distance is capped.
        let arcs = ArcSteps::new(-0.4, &OffsetOptions::default());
        assert!((arcs.precision - 0.1).abs() < 1e-12);
        assert!(arcs.sin < 0.0);
    }
}
