//! Turning input paths into edges and local minima.
//!
//! Every input vertex becomes an [`Edge`] running to the following vertex.
//! The edges of one path form a ring (through `next` and `prev`), which we
//! then cut into monotone *bounds*: chains of edges that only ever go up.
//! Each bound starts at a local minimum of the path, and each local minimum
//! starts two bounds (a left one and a right one). The sweep walks up each
//! bound by following `next_in_lml`.

use crate::{
    geom::{inverse_slope, pt2_is_between, slopes_equal3, HORIZONTAL},
    output::OutRecIdx,
    Error, PathType, Point,
};

/// An index into the edge arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EdgeIdx(pub usize);

impl_typed_vec!(
    /// The edge arena.
    pub(crate) struct Edges<T>[EdgeIdx],
    "e"
);

/// Which side of its output polygon an edge is currently walking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// The output record an edge is adding points to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutSlot {
    /// Not contributing to the output.
    Unassigned,
    /// Marks the edge closing an open path (from its last vertex back to its
    /// first), which never takes part in the sweep.
    Skip,
    Rec(OutRecIdx),
}

impl OutSlot {
    pub fn rec(self) -> Option<OutRecIdx> {
        match self {
            OutSlot::Rec(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_assigned(self) -> bool {
        matches!(self, OutSlot::Rec(_))
    }
}

/// One edge of an input path, oriented from `bot` (larger `y`) to `top`.
#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub bot: Point,
    /// While building, the vertex this edge was created from. While sweeping,
    /// the edge's position on the current scanline.
    pub curr: Point,
    pub top: Point,
    /// Inverse slope, `dx / dy`, or [`HORIZONTAL`].
    pub dx: f64,
    pub poly_type: PathType,
    pub side: Side,
    /// +1 or -1 for closed paths, depending on direction; 0 for open paths.
    pub wind_delta: i32,
    /// Winding count of the region to the right of this edge, from this
    /// edge's own operand.
    pub wind_cnt: i32,
    /// Winding count from the other operand.
    pub wind_cnt2: i32,
    pub out: OutSlot,
    pub next: EdgeIdx,
    pub prev: EdgeIdx,
    pub next_in_lml: Option<EdgeIdx>,
    pub next_in_ael: Option<EdgeIdx>,
    pub prev_in_ael: Option<EdgeIdx>,
    pub next_in_sel: Option<EdgeIdx>,
    pub prev_in_sel: Option<EdgeIdx>,
}

impl Edge {
    fn new(pt: Point, next: EdgeIdx, prev: EdgeIdx) -> Self {
        Edge {
            bot: pt,
            curr: pt,
            top: pt,
            dx: 0.0,
            poly_type: PathType::Subject,
            side: Side::Left,
            wind_delta: 0,
            wind_cnt: 0,
            wind_cnt2: 0,
            out: OutSlot::Unassigned,
            next,
            prev,
            next_in_lml: None,
            next_in_ael: None,
            prev_in_ael: None,
            next_in_sel: None,
            prev_in_sel: None,
        }
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.dx == HORIZONTAL
    }

    /// The `x` coordinate of this edge (extended to a line) at height `y`.
    #[inline]
    pub fn top_x(&self, y: f64) -> f64 {
        if y == self.top.y {
            self.top.x
        } else {
            self.bot.x + self.dx * (y - self.bot.y)
        }
    }
}

/// Two bounds starting at the same vertex. Either may be missing for open paths.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LocalMinimum {
    pub y: f64,
    pub left: Option<EdgeIdx>,
    pub right: Option<EdgeIdx>,
}

/// Counts iterations of a loop that must terminate, failing once a limit is passed.
pub(crate) struct Guard {
    count: usize,
    limit: usize,
    what: &'static str,
}

impl Guard {
    pub fn new(limit: usize, what: &'static str) -> Self {
        Guard {
            count: 0,
            limit,
            what,
        }
    }

    #[inline]
    pub fn step(&mut self) -> Result<(), Error> {
        self.count += 1;
        if self.count > self.limit {
            tracing::debug!(limit = self.limit, what = self.what, "iteration guard tripped");
            Err(Error::NonTermination(self.what))
        } else {
            Ok(())
        }
    }
}

/// Appends the edges of one path to an edge arena and records its local minima.
pub(crate) struct EdgeBuilder<'a> {
    pub edges: &'a mut Edges<Edge>,
    pub minima: &'a mut Vec<LocalMinimum>,
    pub preserve_collinear: bool,
    /// Distance under which two vertices are merged.
    pub eps: f64,
    ring_len: usize,
}

impl<'a> EdgeBuilder<'a> {
    pub fn new(
        edges: &'a mut Edges<Edge>,
        minima: &'a mut Vec<LocalMinimum>,
        preserve_collinear: bool,
        eps: f64,
    ) -> Self {
        EdgeBuilder {
            edges,
            minima,
            preserve_collinear,
            eps,
            ring_len: 0,
        }
    }

    fn next(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e].next
    }

    fn prev(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e].prev
    }

    fn is_horizontal(&self, e: EdgeIdx) -> bool {
        self.edges[e].is_horizontal()
    }

    fn is_skip(&self, e: EdgeIdx) -> bool {
        self.edges[e].out == OutSlot::Skip
    }

    fn guard(&self, what: &'static str) -> Guard {
        Guard::new(4 * self.ring_len + 8, what)
    }

    /// Unlinks `e` from its ring and returns the edge that followed it.
    ///
    /// The record stays in the arena; nothing refers to it any more.
    fn remove_edge(&mut self, e: EdgeIdx) -> EdgeIdx {
        let (prev, next) = (self.prev(e), self.next(e));
        self.edges[prev].next = next;
        self.edges[next].prev = prev;
        next
    }

    fn reverse_horizontal(&mut self, e: EdgeIdx) {
        let edge = &mut self.edges[e];
        std::mem::swap(&mut edge.top.x, &mut edge.bot.x);
    }

    fn init_geometry(&mut self, e: EdgeIdx, poly_type: PathType) {
        let next_curr = self.edges[self.next(e)].curr;
        let edge = &mut self.edges[e];
        if edge.curr.y >= next_curr.y {
            edge.bot = edge.curr;
            edge.top = next_curr;
        } else {
            edge.top = edge.curr;
            edge.bot = next_curr;
        }
        edge.dx = inverse_slope(edge.bot, edge.top);
        edge.poly_type = poly_type;
    }

    /// Adds one path.
    ///
    /// Returns `Ok(false)` if the path degenerates (fewer than three distinct
    /// non-collinear vertices if closed, fewer than two if open), in which
    /// case it contributes nothing.
    pub fn add_path(
        &mut self,
        path: &[Point],
        poly_type: PathType,
        closed: bool,
    ) -> Result<bool, Error> {
        if !closed && poly_type == PathType::Clip {
            return Err(Error::InvalidInput("open paths must be subjects"));
        }
        if path.iter().any(|p| !p.is_finite()) {
            return Err(Error::InvalidInput("non-finite coordinate"));
        }
        let eps = self.eps;
        let Some(mut high) = path.len().checked_sub(1) else {
            return Ok(false);
        };
        if closed {
            while high > 0 && path[high].approx_eq(&path[0], eps) {
                high -= 1;
            }
        }
        while high > 0 && path[high].approx_eq(&path[high - 1], eps) {
            high -= 1;
        }
        if (closed && high < 2) || (!closed && high < 1) {
            return Ok(false);
        }

        let n = high + 1;
        self.ring_len = n;
        let base = self.edges.len();
        for (i, p) in path[..n].iter().enumerate() {
            let next = EdgeIdx(base + (i + 1) % n);
            let prev = EdgeIdx(base + (i + n - 1) % n);
            self.edges.push(Edge::new(*p, next, prev));
        }

        // Remove duplicate vertices and, for closed paths, collinear ones.
        let mut e_start = EdgeIdx(base);
        let mut e = e_start;
        let mut loop_stop = e_start;
        let mut guard = Guard::new(8 * n + 16, "removing degenerate vertices");
        loop {
            guard.step()?;
            let (prev, next) = (self.prev(e), self.next(e));
            if self.edges[e].curr.approx_eq(&self.edges[next].curr, eps)
                && (closed || next != e_start)
            {
                if e == next {
                    break;
                }
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                loop_stop = e;
                continue;
            }
            if prev == next {
                break;
            }
            let (p0, p1, p2) = (
                self.edges[prev].curr,
                self.edges[e].curr,
                self.edges[next].curr,
            );
            if closed
                && slopes_equal3(p0, p1, p2, eps)
                && (!self.preserve_collinear || !pt2_is_between(p0, p1, p2))
            {
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                e = self.prev(e);
                loop_stop = e;
                continue;
            }
            e = next;
            if e == loop_stop || (!closed && self.next(e) == e_start) {
                break;
            }
        }

        if (!closed && e == self.next(e)) || (closed && self.prev(e) == self.next(e)) {
            return Ok(false);
        }

        if !closed {
            let last = self.prev(e_start);
            self.edges[last].out = OutSlot::Skip;
        }

        let mut is_flat = true;
        let start_y = self.edges[e_start].curr.y;
        let mut e = e_start;
        loop {
            self.init_geometry(e, poly_type);
            e = self.next(e);
            if is_flat && self.edges[e].curr.y != start_y {
                is_flat = false;
            }
            if e == e_start {
                break;
            }
        }

        if is_flat {
            if closed {
                return Ok(false);
            }
            return self.add_flat_open_path(e).map(|()| true);
        }

        // An open path whose ends meet would otherwise have us circling forever.
        let last = self.prev(e);
        if self.edges[last].bot == self.edges[last].top {
            e = self.next(e);
        }

        let mut e_min = None;
        let mut guard = Guard::new(n + 2, "walking local minima");
        loop {
            guard.step()?;
            e = self.find_next_loc_min(e)?;
            if Some(e) == e_min {
                break;
            }
            e_min.get_or_insert(e);

            // `e` and `e.prev` share a local minimum (the left end, if horizontal).
            let y = self.edges[e].bot.y;
            let prev = self.prev(e);
            let (left, right, left_is_forward) = if self.edges[e].dx < self.edges[prev].dx {
                (prev, e, false)
            } else {
                (e, prev, true)
            };

            let wind_delta = if !closed {
                0
            } else if self.next(left) == right {
                -1
            } else {
                1
            };
            self.edges[left].wind_delta = wind_delta;
            self.edges[right].wind_delta = -wind_delta;

            let mut after_left = self.process_bound(left, left_is_forward)?;
            if self.is_skip(after_left) {
                after_left = self.process_bound(after_left, left_is_forward)?;
            }
            let mut after_right = self.process_bound(right, !left_is_forward)?;
            if self.is_skip(after_right) {
                after_right = self.process_bound(after_right, !left_is_forward)?;
            }

            let mut lm = LocalMinimum {
                y,
                left: Some(left),
                right: Some(right),
            };
            if self.is_skip(left) {
                lm.left = None;
            } else if self.is_skip(right) {
                lm.right = None;
            }
            self.minima.push(lm);
            e = if left_is_forward {
                after_left
            } else {
                after_right
            };
        }
        Ok(true)
    }

    /// An open path that is entirely horizontal becomes a single right bound.
    fn add_flat_open_path(&mut self, mut e: EdgeIdx) -> Result<(), Error> {
        let last = self.prev(e);
        self.edges[last].out = OutSlot::Skip;
        let lm = LocalMinimum {
            y: self.edges[e].bot.y,
            left: None,
            right: Some(e),
        };
        self.edges[e].side = Side::Right;
        self.edges[e].wind_delta = 0;
        let mut guard = self.guard("walking a flat path");
        loop {
            guard.step()?;
            let prev_top_x = self.edges[self.prev(e)].top.x;
            if self.edges[e].bot.x != prev_top_x {
                self.reverse_horizontal(e);
            }
            let next = self.next(e);
            if self.is_skip(next) {
                break;
            }
            self.edges[e].next_in_lml = Some(next);
            e = next;
        }
        self.minima.push(lm);
        Ok(())
    }

    fn find_next_loc_min(&self, mut e: EdgeIdx) -> Result<EdgeIdx, Error> {
        let mut guard = self.guard("searching for a local minimum");
        loop {
            while self.edges[e].bot != self.edges[self.prev(e)].bot
                || self.edges[e].curr == self.edges[e].top
            {
                guard.step()?;
                e = self.next(e);
            }
            if !self.is_horizontal(e) && !self.is_horizontal(self.prev(e)) {
                break;
            }
            while self.is_horizontal(self.prev(e)) {
                guard.step()?;
                e = self.prev(e);
            }
            let e2 = e;
            while self.is_horizontal(e) {
                guard.step()?;
                e = self.next(e);
            }
            if self.edges[e].top.y == self.edges[self.prev(e)].bot.y {
                // Just an intermediate horizontal.
                continue;
            }
            if self.edges[self.prev(e2)].bot.x < self.edges[e].bot.x {
                e = e2;
            }
            break;
        }
        Ok(e)
    }

    /// Links up one bound starting at `e`, returning the first edge past its top.
    ///
    /// A bound that runs into the skip edge of an open path may continue on
    /// its other side; that remainder becomes a new local minimum with only a
    /// right bound, and is processed in the same loop.
    fn process_bound(&mut self, mut e: EdgeIdx, forward: bool) -> Result<EdgeIdx, Error> {
        let step = |b: &Self, e: EdgeIdx, fwd: bool| if fwd { b.next(e) } else { b.prev(e) };
        let mut guard = self.guard("processing a bound");

        loop {
            guard.step()?;
            let mut result = e;

            if self.is_skip(e) {
                // Walk past the skip edge. Top horizontals are left for the
                // opposite bound.
                while self.edges[e].top.y == self.edges[step(self, e, forward)].bot.y {
                    guard.step()?;
                    e = step(self, e, forward);
                }
                while e != result && self.is_horizontal(e) {
                    guard.step()?;
                    e = step(self, e, !forward);
                }
                if e == result {
                    return Ok(step(self, e, forward));
                }
                e = step(self, result, forward);
                self.edges[e].wind_delta = 0;
                self.minima.push(LocalMinimum {
                    y: self.edges[e].bot.y,
                    left: None,
                    right: Some(e),
                });
                continue;
            }

            if self.is_horizontal(e) {
                // Consecutive horizontals may head left before they go right,
                // and an open path's bound may start just after its skip edge.
                let e_start = step(self, e, !forward);
                let bot_x = self.edges[e].bot.x;
                if self.is_horizontal(e_start) {
                    if self.edges[e_start].bot.x != bot_x && self.edges[e_start].top.x != bot_x {
                        self.reverse_horizontal(e);
                    }
                } else if self.edges[e_start].bot.x != bot_x {
                    self.reverse_horizontal(e);
                }
            }

            let e_start = e;
            loop {
                let n = step(self, result, forward);
                if self.edges[result].top.y != self.edges[n].bot.y || self.is_skip(n) {
                    break;
                }
                guard.step()?;
                result = n;
            }

            let beyond = step(self, result, forward);
            if self.is_horizontal(result) && !self.is_skip(beyond) {
                // A horizontal at the top of a bound belongs to it only if the
                // preceding edge attaches at the horizontal's left end.
                let mut horz = result;
                while self.is_horizontal(step(self, horz, !forward)) {
                    guard.step()?;
                    horz = step(self, horz, !forward);
                }
                let before = step(self, horz, !forward);
                let before_x = self.edges[before].top.x;
                let beyond_x = self.edges[beyond].top.x;
                if (forward && before_x > beyond_x) || (!forward && before_x >= beyond_x) {
                    result = before;
                }
            }

            loop {
                let behind_top_x = self.edges[step(self, e, !forward)].top.x;
                if self.is_horizontal(e) && e != e_start && self.edges[e].bot.x != behind_top_x {
                    self.reverse_horizontal(e);
                }
                if e == result {
                    break;
                }
                guard.step()?;
                let n = step(self, e, forward);
                self.edges[e].next_in_lml = Some(n);
                e = n;
            }
            return Ok(step(self, result, forward));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn build(path: &[Point], closed: bool) -> (Result<bool, Error>, Edges<Edge>, Vec<LocalMinimum>) {
        let mut edges = Edges::default();
        let mut minima = Vec::new();
        let res = EdgeBuilder::new(&mut edges, &mut minima, false, 1e-9).add_path(
            path,
            PathType::Subject,
            closed,
        );
        (res, edges, minima)
    }

    #[test]
    fn square_has_one_minimum() {
        let (res, edges, minima) = build(
            &[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)],
            true,
        );
        assert_eq!(res, Ok(true));
        assert_eq!(minima.len(), 1);
        let lm = minima[0];
        assert_eq!(lm.y, 10.0);
        let (left, right) = (lm.left.unwrap(), lm.right.unwrap());
        assert_eq!(edges[left].wind_delta, -edges[right].wind_delta);
        assert!(edges[left].bot.x <= edges[right].bot.x);
    }

    #[test]
    fn collinear_and_duplicate_vertices_are_removed() {
        let (res, edges, minima) = build(
            &[
                p(0.0, 0.0),
                p(5.0, 0.0),
                p(10.0, 0.0),
                p(10.0, 0.0),
                p(10.0, 10.0),
                p(0.0, 10.0),
                p(0.0, 0.0),
            ],
            true,
        );
        assert_eq!(res, Ok(true));
        assert_eq!(minima.len(), 1);
        // Walk the ring from a surviving edge and count its vertices.
        let start = minima[0].left.unwrap();
        let mut e = start;
        let mut count = 0;
        loop {
            count += 1;
            e = edges[e].next;
            if e == start {
                break;
            }
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn degenerate_paths() {
        assert_eq!(build(&[p(0.0, 0.0), p(1.0, 1.0)], true).0, Ok(false));
        assert_eq!(
            build(&[p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0)], true).0,
            Ok(false)
        );
        assert_eq!(
            build(&[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)], true).0,
            Ok(false)
        );
        assert_eq!(build(&[p(0.0, 0.0)], false).0, Ok(false));
        assert_eq!(build(&[], true).0, Ok(false));
    }

    #[test]
    fn open_clip_path_is_rejected() {
        let mut edges = Edges::default();
        let mut minima = Vec::new();
        let res = EdgeBuilder::new(&mut edges, &mut minima, false, 1e-9).add_path(
            &[p(0.0, 0.0), p(1.0, 1.0)],
            PathType::Clip,
            false,
        );
        assert!(matches!(res, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn nan_is_rejected() {
        let (res, _, _) = build(&[p(0.0, 0.0), p(1.0, 1.0), Point { x: f64::NAN, y: 0.0 }], true);
        assert!(matches!(res, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn open_polyline() {
        let (res, edges, minima) = build(&[p(0.0, 0.0), p(5.0, 5.0), p(10.0, 0.0)], false);
        assert_eq!(res, Ok(true));
        assert!(!minima.is_empty());
        for lm in &minima {
            for e in lm.left.iter().chain(lm.right.iter()) {
                assert_eq!(edges[*e].wind_delta, 0);
            }
        }
    }

    #[test]
    fn flat_open_path() {
        let (res, _, minima) = build(&[p(0.0, 0.0), p(5.0, 0.0), p(10.0, 0.0)], false);
        assert_eq!(res, Ok(true));
        assert_eq!(minima.len(), 1);
        assert!(minima[0].left.is_none());
    }

    #[test]
    fn guard_trips_past_its_limit() {
        let mut guard = Guard::new(3, "spinning");
        for _ in 0..3 {
            assert_eq!(guard.step(), Ok(()));
        }
        assert_eq!(guard.step(), Err(Error::NonTermination("spinning")));
        assert_eq!(guard.step(), Err(Error::NonTermination("spinning")));
    }

    #[test]
    fn top_x() {
        let (_, edges, minima) = build(&[p(0.0, 0.0), p(10.0, 10.0), p(-10.0, 10.0)], true);
        let lm = minima[0];
        let e = lm
            .left
            .iter()
            .chain(lm.right.iter())
            .map(|&e| &edges[e])
            .find(|e| !e.is_horizontal())
            .unwrap();
        assert_eq!(e.top_x(e.bot.y), e.bot.x);
        assert_eq!(e.top_x(e.top.y), e.top.x);
    }
}
