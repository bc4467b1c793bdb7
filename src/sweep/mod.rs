//! The scanline sweep.
//!
//! [`Clipper`] holds a set of subject and clip paths and computes Boolean
//! operations between them. The sweep line moves through the distinct `y`
//! coordinates of the input (the *scanbeams*) from the largest `y` to the
//! smallest, maintaining the list of edges that cross it (the *active edge
//! list*, ordered by `x`). Between two scanbeams the order of active edges
//! only changes where edges cross, and those crossings are found and
//! applied in bulk before moving on. As edges enter, cross and leave, the
//! ones bounding the result contribute points to output polygons.
//!
//! The submodules split the work by phase:
//!
//! - `scanbeam` keeps the queue of `y` values and inserts new local minima,
//! - `active` manipulates the active and sorted edge lists and computes
//!   winding counts,
//! - `horizontal` handles horizontal edges,
//! - `intersect` finds and applies crossings, and processes the top of each
//!   scanbeam.

use std::collections::BinaryHeap;

use crate::{
    edges::{Edge, EdgeBuilder, EdgeIdx, Edges, LocalMinimum, OutSlot, Side},
    geom::Rect,
    num::{CheapOrderedFloat, Tolerance},
    output::{Join, OutPt, OutPts, OutRec, OutRecs},
    tree::PolyTree,
    BooleanOp, ClipOptions, Error, FillRule, Path, PathType, Paths, Point,
};

mod active;
mod horizontal;
mod intersect;
mod scanbeam;

pub(crate) use intersect::IntersectNode;

/// A polygon clipping engine.
///
/// Add subject and clip paths, then [`execute`](Clipper::execute) a Boolean
/// operation. The same paths can be used for several operations in a row.
///
/// ```
/// use sweepclip::{area, BooleanOp, Clipper, FillRule, PathType, Point};
///
/// let square = |x0: f64, y0: f64| {
///     vec![
///         Point::new(x0, y0),
///         Point::new(x0 + 10.0, y0),
///         Point::new(x0 + 10.0, y0 + 10.0),
///         Point::new(x0, y0 + 10.0),
///     ]
/// };
/// let mut clipper = Clipper::new();
/// clipper.add_path(&square(0.0, 0.0), PathType::Subject, true).unwrap();
/// clipper.add_path(&square(5.0, 5.0), PathType::Clip, true).unwrap();
/// let out = clipper
///     .execute(BooleanOp::Intersection, FillRule::EvenOdd, FillRule::EvenOdd)
///     .unwrap();
/// assert_eq!(out.len(), 1);
/// assert!((area(&out[0]) - 25.0).abs() < 1e-9);
/// ```
pub struct Clipper {
    options: ClipOptions,
    bounds: Option<Rect>,
    in_progress: bool,

    pub(crate) eps: f64,
    pub(crate) edges: Edges<Edge>,
    pub(crate) minima: Vec<LocalMinimum>,
    pub(crate) current_lm: usize,
    pub(crate) has_open_paths: bool,
    pub(crate) scanbeam: BinaryHeap<CheapOrderedFloat>,

    /// The head of the active edge list.
    pub(crate) active: Option<EdgeIdx>,
    /// The head of the sorted edge list, which holds pending horizontals
    /// and serves as scratch space while ordering intersections.
    pub(crate) sorted: Option<EdgeIdx>,
    pub(crate) intersections: Vec<IntersectNode>,
    /// `x` coordinates of local maxima at the current scanbeam, only
    /// collected in strictly simple mode.
    pub(crate) maxima: Vec<f64>,

    pub(crate) outs: OutRecs<OutRec>,
    pub(crate) pts: OutPts<OutPt>,
    pub(crate) joins: Vec<Join>,
    pub(crate) ghost_joins: Vec<Join>,

    pub(crate) op: BooleanOp,
    pub(crate) subj_fill: FillRule,
    pub(crate) clip_fill: FillRule,
    pub(crate) using_tree: bool,
}

impl Default for Clipper {
    fn default() -> Self {
        Clipper::with_options(ClipOptions::default())
    }
}

impl std::fmt::Debug for Clipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clipper")
            .field("options", &self.options)
            .field("edges", &self.edges.len())
            .field("minima", &self.minima.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl Clipper {
    /// Creates an empty engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty engine.
    pub fn with_options(options: ClipOptions) -> Self {
        Clipper {
            options,
            bounds: None,
            in_progress: false,
            eps: options.tolerance,
            edges: Edges::default(),
            minima: Vec::new(),
            current_lm: 0,
            has_open_paths: false,
            scanbeam: BinaryHeap::new(),
            active: None,
            sorted: None,
            intersections: Vec::new(),
            maxima: Vec::new(),
            outs: OutRecs::default(),
            pts: OutPts::default(),
            joins: Vec::new(),
            ghost_joins: Vec::new(),
            op: BooleanOp::Union,
            subj_fill: FillRule::EvenOdd,
            clip_fill: FillRule::EvenOdd,
            using_tree: false,
        }
    }

    /// The options this engine runs with.
    pub fn options(&self) -> &ClipOptions {
        &self.options
    }

    /// Changes the options.
    ///
    /// `preserve_collinear` and `tolerance` only affect paths added afterwards.
    pub fn set_options(&mut self, options: ClipOptions) {
        self.options = options;
        self.update_eps();
    }

    /// The bounding rectangle of every path added so far, including ones
    /// that turned out to be degenerate.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    fn update_eps(&mut self) {
        let magnitude = self.bounds.map(|r| r.magnitude()).unwrap_or(0.0);
        self.eps = Tolerance::scaled(self.options.tolerance, magnitude).eps;
    }

    /// Adds a path to one of the operands.
    ///
    /// Returns `Ok(false)` if the path was dropped because it has too few
    /// distinct vertices. Open paths must be subjects.
    pub fn add_path(
        &mut self,
        path: &[Point],
        poly_type: PathType,
        closed: bool,
    ) -> Result<bool, Error> {
        if self.in_progress {
            return Err(Error::Busy);
        }
        if path.iter().any(|p| !p.is_finite()) {
            return Err(Error::InvalidInput("non-finite coordinate"));
        }
        if !closed && poly_type == PathType::Clip {
            return Err(Error::InvalidInput("open paths must be subjects"));
        }
        if let Some((first, rest)) = path.split_first() {
            let mut r = Rect::from_point(*first);
            for q in rest {
                r.add_point(*q);
            }
            self.bounds = Some(self.bounds.map_or(r, |b| b.union(&r)));
            self.update_eps();
        }
        let added = EdgeBuilder::new(
            &mut self.edges,
            &mut self.minima,
            self.options.preserve_collinear,
            self.eps,
        )
        .add_path(path, poly_type, closed)?;
        if added && !closed {
            self.has_open_paths = true;
        }
        Ok(added)
    }

    /// Adds several paths to one of the operands, returning `Ok(true)` if
    /// any of them survived.
    pub fn add_paths(
        &mut self,
        paths: &[Path],
        poly_type: PathType,
        closed: bool,
    ) -> Result<bool, Error> {
        let mut any = false;
        for path in paths {
            any |= self.add_path(path, poly_type, closed)?;
        }
        Ok(any)
    }

    /// Removes all paths.
    pub fn clear(&mut self) {
        self.dispose_output();
        self.edges.clear();
        self.minima.clear();
        self.has_open_paths = false;
        self.bounds = None;
        self.update_eps();
    }

    /// Computes a Boolean operation and returns the resulting polygons.
    ///
    /// Outer contours have positive area and holes have negative area
    /// (or the reverse, if `reverse_solution` is set). Open paths can only be
    /// clipped with [`execute_tree`](Clipper::execute_tree).
    pub fn execute(
        &mut self,
        op: BooleanOp,
        subj_fill: FillRule,
        clip_fill: FillRule,
    ) -> Result<Paths, Error> {
        if self.has_open_paths {
            return Err(Error::InvalidInput(
                "open paths can only be clipped into a polygon tree",
            ));
        }
        self.run(op, subj_fill, clip_fill, false, Self::build_paths)
    }

    /// Computes a Boolean operation and returns the result as a tree of
    /// outer contours, holes, and open paths.
    pub fn execute_tree(
        &mut self,
        op: BooleanOp,
        subj_fill: FillRule,
        clip_fill: FillRule,
    ) -> Result<PolyTree, Error> {
        self.run(op, subj_fill, clip_fill, true, Self::build_tree)
    }

    fn run<T>(
        &mut self,
        op: BooleanOp,
        subj_fill: FillRule,
        clip_fill: FillRule,
        using_tree: bool,
        build: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, Error> {
        if self.in_progress {
            return Err(Error::Busy);
        }
        self.in_progress = true;
        self.op = op;
        self.subj_fill = subj_fill;
        self.clip_fill = clip_fill;
        self.using_tree = using_tree;

        let result = self.execute_internal().map(|()| build(self));
        match &result {
            Ok(_) => tracing::debug!(
                out_recs = self.outs.len(),
                out_pts = self.pts.len(),
                "sweep finished"
            ),
            Err(e) => tracing::debug!(error = %e, "sweep failed, discarding output"),
        }

        self.dispose_output();
        self.in_progress = false;
        result
    }

    fn execute_internal(&mut self) -> Result<(), Error> {
        self.reset();
        tracing::debug!(
            edges = self.edges.len(),
            minima = self.minima.len(),
            op = ?self.op,
            subj_fill = ?self.subj_fill,
            clip_fill = ?self.clip_fill,
            "starting sweep"
        );
        let Some(bot_y) = self.pop_scanbeam() else {
            return Ok(());
        };
        self.insert_local_minima_into_ael(bot_y)?;
        while let Some(top_y) = self.pop_scanbeam() {
            tracing::trace!(y = top_y, "scanbeam");
            self.process_horizontals()?;
            self.ghost_joins.clear();
            self.process_intersections(top_y)?;
            self.process_edges_at_top_of_scanbeam(top_y)?;
            self.insert_local_minima_into_ael(top_y)?;
            #[cfg(feature = "slow-asserts")]
            self.check_invariants();
        }
        self.finish_output()
    }

    /// Checks that the active edge list is consistently linked and that every
    /// contributing edge points at a live output ring.
    #[cfg(feature = "slow-asserts")]
    fn check_invariants(&self) {
        let mut prev = None;
        let mut next = self.active;
        while let Some(e) = next {
            let edge = &self.edges[e];
            assert_eq!(edge.prev_in_ael, prev, "broken AEL link at {e:?}");
            if let OutSlot::Rec(r) = edge.out {
                assert!(self.outs[r].pts.is_some(), "{e:?} points at dead record {r:?}");
            }
            prev = Some(e);
            next = edge.next_in_ael;
        }
    }

    /// Rewinds the sweep state so that the stored paths can be swept again.
    fn reset(&mut self) {
        self.dispose_output();
        self.minima
            .sort_by(|a, b| CheapOrderedFloat::from(b.y).cmp(&CheapOrderedFloat::from(a.y)));
        self.scanbeam.clear();
        for lm in &self.minima {
            self.scanbeam.push(CheapOrderedFloat::from(lm.y));
            for (e, side) in [
                (lm.left, Side::Left),
                (lm.right, Side::Right),
            ] {
                if let Some(e) = e {
                    let edge = &mut self.edges[e];
                    edge.curr = edge.bot;
                    edge.side = side;
                    edge.out = OutSlot::Unassigned;
                }
            }
        }
        self.current_lm = 0;
    }

    fn dispose_output(&mut self) {
        self.outs.clear();
        self.pts.clear();
        self.joins.clear();
        self.ghost_joins.clear();
        self.intersections.clear();
        self.maxima.clear();
        self.active = None;
        self.sorted = None;
    }

    pub(crate) fn strictly_simple(&self) -> bool {
        self.options.strictly_simple
    }

    pub(crate) fn preserve_collinear(&self) -> bool {
        self.options.preserve_collinear
    }

    pub(crate) fn reverse_solution(&self) -> bool {
        self.options.reverse_solution
    }

    /// Fill rules of an edge's own operand and of the other operand.
    pub(crate) fn fill_rules(&self, e: EdgeIdx) -> (FillRule, FillRule) {
        match self.edges[e].poly_type {
            PathType::Subject => (self.subj_fill, self.clip_fill),
            PathType::Clip => (self.clip_fill, self.subj_fill),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{area, PointInPolygon};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        vec![p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)]
    }

    fn total_area(paths: &Paths) -> f64 {
        paths.iter().map(|p| area(p)).sum()
    }

    fn run(subj: &[Path], clip: &[Path], op: BooleanOp, fill: FillRule) -> Paths {
        let mut c = Clipper::new();
        c.add_paths(subj, PathType::Subject, true).unwrap();
        c.add_paths(clip, PathType::Clip, true).unwrap();
        c.execute(op, fill, fill).unwrap()
    }

    #[test]
    fn overlapping_squares() {
        let a = [rect(0.0, 0.0, 10.0, 10.0)];
        let b = [rect(5.0, 5.0, 15.0, 15.0)];
        let cases = [
            (BooleanOp::Union, 175.0),
            (BooleanOp::Intersection, 25.0),
            (BooleanOp::Difference, 75.0),
            (BooleanOp::Xor, 150.0),
        ];
        for (op, expected) in cases {
            let out = run(&a, &b, op, FillRule::EvenOdd);
            assert!(
                (total_area(&out) - expected).abs() < 1e-9,
                "{op:?}: {out:?}"
            );
        }
    }

    #[test]
    fn square_with_hole() {
        let out = run(
            &[rect(0.0, 0.0, 10.0, 10.0)],
            &[rect(3.0, 3.0, 6.0, 6.0)],
            BooleanOp::Difference,
            FillRule::NonZero,
        );
        assert_eq!(out.len(), 2);
        let (outer, hole): (Vec<_>, Vec<_>) = out.iter().partition(|p| area(p) > 0.0);
        assert_eq!(outer.len(), 1);
        assert_eq!(hole.len(), 1);
        assert!((area(outer[0]) - 100.0).abs() < 1e-9);
        assert!((area(hole[0]) + 9.0).abs() < 1e-9);
        assert_eq!(
            crate::point_in_polygon(hole[0][0], outer[0]),
            PointInPolygon::Inside
        );
    }

    #[test]
    fn reverse_solution() {
        let mut c = Clipper::with_options(ClipOptions {
            reverse_solution: true,
            ..ClipOptions::default()
        });
        c.add_path(&rect(0.0, 0.0, 4.0, 4.0), PathType::Subject, true)
            .unwrap();
        let out = c
            .execute(BooleanOp::Union, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!((area(&out[0]) + 16.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input() {
        let mut c = Clipper::new();
        let out = c
            .execute(BooleanOp::Union, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap();
        assert!(out.is_empty());
        assert!(c.bounds().is_none());
    }

    #[test]
    fn open_paths_need_a_tree() {
        let mut c = Clipper::new();
        c.add_path(&[p(0.0, 0.0), p(10.0, 10.0)], PathType::Subject, false)
            .unwrap();
        assert_matches!(
            c.execute(BooleanOp::Union, FillRule::EvenOdd, FillRule::EvenOdd),
            Err(Error::InvalidInput(_))
        );
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut c = Clipper::new();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_matches!(
                c.add_path(&[p(0.0, 0.0), p(bad, 1.0), p(2.0, 0.0)], PathType::Subject, true),
                Err(Error::InvalidInput(_))
            );
        }
        assert!(c.bounds().is_none());
    }

    #[test]
    fn busy_engine_refuses_work() {
        let mut c = Clipper::new();
        c.in_progress = true;
        assert_matches!(
            c.execute(BooleanOp::Union, FillRule::EvenOdd, FillRule::EvenOdd),
            Err(Error::Busy)
        );
        assert_matches!(
            c.add_path(&rect(0.0, 0.0, 1.0, 1.0), PathType::Subject, true),
            Err(Error::Busy)
        );
    }

    #[test]
    fn repeated_execution() {
        let mut c = Clipper::new();
        c.add_path(&rect(0.0, 0.0, 10.0, 10.0), PathType::Subject, true)
            .unwrap();
        c.add_path(&rect(5.0, 0.0, 15.0, 10.0), PathType::Clip, true)
            .unwrap();
        let first = c
            .execute(BooleanOp::Intersection, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap();
        let union = c
            .execute(BooleanOp::Union, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap();
        let second = c
            .execute(BooleanOp::Intersection, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap();
        assert!((total_area(&first) - 50.0).abs() < 1e-9);
        assert!((total_area(&union) - 150.0).abs() < 1e-9);
        assert_eq!(first, second);

        c.clear();
        assert!(c
            .execute(BooleanOp::Union, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn self_overlapping_union_has_no_orphan_holes() {
        let subj = [vec![
            p(4.0, 3.0),
            p(2.0, 0.0),
            p(0.0, 2.0),
            p(0.0, 4.0),
            p(1.0, 2.0),
            p(0.0, 3.0),
            p(0.0, 0.0),
        ]];
        let clip = [
            vec![p(3.0, 0.0), p(2.0, 3.0), p(0.0, 2.0)],
            vec![p(2.0, 1.0), p(0.0, 0.0), p(3.0, 2.0)],
        ];
        for op in [BooleanOp::Union, BooleanOp::Xor] {
            let out = run(&subj, &clip, op, FillRule::EvenOdd);
            // Every hole sits strictly inside some outer contour.
            for hole in out.iter().filter(|h| area(h) < 0.0) {
                assert!(
                    out.iter().filter(|o| area(o) > 0.0).any(|o| hole
                        .iter()
                        .any(|&v| crate::point_in_polygon(v, o) == PointInPolygon::Inside)),
                    "{op:?}: {out:?}"
                );
            }
            if op == BooleanOp::Union {
                // Covered by the subject and by both clip triangles.
                let winding: i32 = out
                    .iter()
                    .filter(|c| crate::point_in_polygon(p(0.2, 1.0), c) == PointInPolygon::Inside)
                    .map(|c| if area(c) > 0.0 { 1 } else { -1 })
                    .sum();
                assert_eq!(winding, 1, "{out:?}");
            }
        }

        let mut c = Clipper::new();
        c.add_paths(&subj, PathType::Subject, true).unwrap();
        c.add_paths(&clip, PathType::Clip, true).unwrap();
        let tree = c
            .execute_tree(BooleanOp::Union, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap();
        for n in tree.iter() {
            assert_eq!(area(tree.contour(n)) < 0.0, tree.is_hole(n));
        }
    }

    #[test]
    fn bounds_cover_input() {
        let mut c = Clipper::new();
        c.add_path(&rect(-2.0, 1.0, 3.0, 4.0), PathType::Subject, true)
            .unwrap();
        c.add_path(&rect(0.0, 0.0, 1.0, 9.0), PathType::Clip, true)
            .unwrap();
        let b = c.bounds().unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (-2.0, 0.0, 3.0, 9.0));
    }
}
