//! Geometric primitives: points, paths, and the handful of queries the
//! clipping and offsetting engines need from them.

use crate::num::CheapOrderedFloat;

/// A two-dimensional point.
///
/// Equality through `==` is exact. The engines compare coordinates through an
/// explicit tolerance (see [`Point::approx_eq`]), because intersection points
/// are computed in floating point and rarely land exactly on an input vertex.
#[derive(Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    ///
    /// Outer contours are returned with positive signed area in the usual
    /// mathematical orientation, meaning counter-clockwise when `y` increases
    /// upwards.
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    ///
    /// Any coordinates are accepted here; the engines reject non-finite ones
    /// when paths are added.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Are `self` and `other` within `eps` of each other in both coordinates?
    #[inline]
    pub fn approx_eq(&self, other: &Point, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }

    /// Squared Euclidean distance.
    pub fn dist_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Converts to a `kurbo` point.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// An ordered sequence of vertices.
///
/// Closed paths don't repeat their first vertex at the end.
pub type Path = Vec<Point>;

/// A collection of paths.
pub type Paths = Vec<Path>;

/// An axis-aligned bounding rectangle.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Smallest `x` coordinate.
    pub min_x: f64,
    /// Smallest `y` coordinate.
    pub min_y: f64,
    /// Largest `x` coordinate.
    pub max_x: f64,
    /// Largest `y` coordinate.
    pub max_y: f64,
}

impl Rect {
    /// The rectangle containing a single point.
    pub fn from_point(p: Point) -> Self {
        Rect {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Grows the rectangle to contain `p`.
    pub fn add_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// The smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// The largest absolute coordinate, used to scale tolerances.
    pub fn magnitude(&self) -> f64 {
        self.min_x
            .abs()
            .max(self.min_y.abs())
            .max(self.max_x.abs())
            .max(self.max_y.abs())
    }
}

/// The bounding rectangle of a collection of paths, or `None` if there are no points.
pub fn bounds<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Option<Rect> {
    let mut points = paths.into_iter().flat_map(|p| p.iter().copied());
    let first = points.next()?;
    let mut rect = Rect::from_point(first);
    for p in points {
        rect.add_point(p);
    }
    Some(rect)
}

/// Signed area of a closed path.
///
/// Counter-clockwise paths (with `y` pointing up) have positive area.
pub fn area(path: &[Point]) -> f64 {
    if path.len() < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    let mut prev = path[path.len() - 1];
    for &p in path {
        a += (prev.x + p.x) * (p.y - prev.y);
        prev = p;
    }
    a * 0.5
}

/// Is this path positively oriented, meaning its signed area is non-negative?
pub fn orientation(path: &[Point]) -> bool {
    area(path) >= 0.0
}

/// Reverses the vertex order of a path in place.
pub fn reverse_path(path: &mut Path) {
    path.reverse();
}

/// Reverses the vertex order of every path.
pub fn reverse_paths(paths: &mut Paths) {
    for p in paths {
        p.reverse();
    }
}

/// Where a point lies relative to a closed polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PointInPolygon {
    /// Strictly outside.
    Outside,
    /// Strictly inside.
    Inside,
    /// On one of the polygon's edges or vertices.
    OnBoundary,
}

/// Classifies `pt` against the closed polygon `path` by crossing parity.
pub fn point_in_polygon(pt: Point, path: &[Point]) -> PointInPolygon {
    let n = path.len();
    if n < 3 {
        return PointInPolygon::Outside;
    }
    let mut inside = false;
    let mut ip = path[0];
    for i in 1..=n {
        let ip_next = if i == n { path[0] } else { path[i] };
        match crossing(pt, ip, ip_next) {
            Crossing::Boundary => return PointInPolygon::OnBoundary,
            Crossing::Toggle => inside = !inside,
            Crossing::None => {}
        }
        ip = ip_next;
    }
    if inside {
        PointInPolygon::Inside
    } else {
        PointInPolygon::Outside
    }
}

pub(crate) enum Crossing {
    None,
    Toggle,
    Boundary,
}

/// How the ray from `pt` towards positive `x` meets the segment `a -> b`.
///
/// Shared by the path and output-ring versions of point-in-polygon.
pub(crate) fn crossing(pt: Point, a: Point, b: Point) -> Crossing {
    if b.y == pt.y && (b.x == pt.x || (a.y == pt.y && ((b.x > pt.x) == (a.x < pt.x)))) {
        return Crossing::Boundary;
    }
    if (a.y < pt.y) != (b.y < pt.y) {
        if a.x >= pt.x {
            if b.x > pt.x {
                return Crossing::Toggle;
            }
        } else if b.x <= pt.x {
            return Crossing::None;
        }
        let d = (a.x - pt.x) * (b.y - pt.y) - (b.x - pt.x) * (a.y - pt.y);
        if d == 0.0 {
            return Crossing::Boundary;
        }
        if (d > 0.0) == (b.y > a.y) {
            return Crossing::Toggle;
        }
    }
    Crossing::None
}

/// Are the segments `p1 -> p2` and `p3 -> p4` parallel, up to `eps`?
///
/// The cross product is compared against `eps` times the segments' lengths,
/// so `eps` is a distance.
pub(crate) fn slopes_equal4(p1: Point, p2: Point, p3: Point, p4: Point, eps: f64) -> bool {
    let (ax, ay) = (p1.x - p2.x, p1.y - p2.y);
    let (bx, by) = (p3.x - p4.x, p3.y - p4.y);
    let cross = ay * bx - ax * by;
    cross.abs() <= eps * (ax.abs() + ay.abs() + bx.abs() + by.abs())
}

/// Are `p1`, `p2` and `p3` collinear, up to `eps`?
pub(crate) fn slopes_equal3(p1: Point, p2: Point, p3: Point, eps: f64) -> bool {
    slopes_equal4(p1, p2, p2, p3, eps)
}

/// Is `p2` strictly between `p1` and `p3`, assuming the three are collinear?
///
/// A `false` for collinear points means `p2` is the tip of a spike.
pub(crate) fn pt2_is_between(p1: Point, p2: Point, p3: Point) -> bool {
    if p1 == p3 || p1 == p2 || p3 == p2 {
        false
    } else if p1.x != p3.x {
        (p2.x > p1.x) == (p2.x < p3.x)
    } else {
        (p2.y > p1.y) == (p2.y < p3.y)
    }
}

/// Squared distance from `pt` to the infinite line through `a` and `b`.
pub(crate) fn distance_from_line_sq(pt: Point, a: Point, b: Point) -> f64 {
    let aa = a.y - b.y;
    let bb = b.x - a.x;
    let c = aa * a.x + bb * a.y;
    let c = aa * pt.x + bb * pt.y - c;
    let denom = aa * aa + bb * bb;
    if denom == 0.0 {
        pt.dist_sq(&a)
    } else {
        (c * c) / denom
    }
}

/// The inverse slope `dx/dy` of the segment from `a` to `b`, with horizontal
/// segments mapped to [`HORIZONTAL`].
pub(crate) fn inverse_slope(a: Point, b: Point) -> f64 {
    if a.y == b.y {
        HORIZONTAL
    } else {
        (b.x - a.x) / (b.y - a.y)
    }
}

/// Sentinel inverse slope for horizontal segments.
pub(crate) const HORIZONTAL: f64 = -1.0e40;

/// Sorts and deduplicates `f64`s, which are assumed finite.
pub(crate) fn sort_dedup(xs: &mut Vec<f64>) {
    xs.sort_by_key(|x| CheapOrderedFloat::from(*x));
    xs.dedup();
}

/// Flattens a `kurbo` path into polylines, one per subpath.
///
/// Curves are approximated to within `tolerance`. A closing segment is
/// implied, so a trailing vertex equal to the first one is dropped.
pub fn path_from_bez(bez: &kurbo::BezPath, tolerance: f64) -> Paths {
    let mut ret = Vec::new();
    let mut current: Path = Vec::new();
    kurbo::flatten(bez.iter(), tolerance, |el| match el {
        kurbo::PathEl::MoveTo(p) => {
            if current.len() > 1 {
                ret.push(std::mem::take(&mut current));
            }
            current.clear();
            current.push(p.into());
        }
        kurbo::PathEl::LineTo(p) => current.push(p.into()),
        kurbo::PathEl::ClosePath => {
            if current.len() > 1 {
                ret.push(std::mem::take(&mut current));
            }
            current.clear();
        }
        // `flatten` only emits lines.
        _ => {}
    });
    if current.len() > 1 {
        ret.push(current);
    }
    for path in &mut ret {
        if path.len() > 1 && path.first() == path.last() {
            path.pop();
        }
    }
    ret
}

/// Converts closed paths to a `kurbo` path, one closed subpath each.
pub fn paths_to_bez(paths: &[Path]) -> kurbo::BezPath {
    let mut ret = kurbo::BezPath::new();
    for path in paths {
        let Some((first, rest)) = path.split_first() else {
            continue;
        };
        ret.move_to(first.to_kurbo());
        for p in rest {
            ret.line_to(p.to_kurbo());
        }
        ret.close_path();
    }
    ret
}
