//! Assembling the output polygons.
//!
//! While sweeping, every contributing edge appends points to an [`OutRec`]:
//! a ring of [`OutPt`]s in which the left bound of the fragment adds at the
//! front and the right bound adds at the back. Fragments are merged when
//! their bounds meet at a local maximum. Once the sweep is done, we fix the
//! orientation of every ring, resolve the [`Join`]s (overlapping collinear
//! edges that belong to the same output polygon), prune degenerate points,
//! and serialize the rings either as a flat list or as a [`PolyTree`].

use crate::{
    edges::{EdgeIdx, Guard, OutSlot, Side},
    geom::{crossing, inverse_slope, pt2_is_between, slopes_equal3, slopes_equal4, Crossing},
    sweep::Clipper,
    tree::{NodeIdx, PolyTree},
    Error, Paths, Point,
};

/// An index into the output record arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct OutRecIdx(pub usize);

impl_typed_vec!(pub(crate) struct OutRecs<T>[OutRecIdx], "or");

/// An index into the output point arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct OutPtIdx(pub usize);

impl_typed_vec!(pub(crate) struct OutPts<T>[OutPtIdx], "op");

/// One output polygon (or polyline) under construction.
#[derive(Clone, Debug)]
pub(crate) struct OutRec {
    /// The record this one has been merged into, or its own index.
    pub idx: OutRecIdx,
    pub is_hole: bool,
    pub is_open: bool,
    /// The nearest record enclosing this one, as far as the sweep could tell.
    pub first_left: Option<OutRecIdx>,
    /// The left-most point of the ring; `None` once merged away or pruned.
    pub pts: Option<OutPtIdx>,
    pub bottom_pt: Option<OutPtIdx>,
    pub node: Option<NodeIdx>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct OutPt {
    pub rec: OutRecIdx,
    pub pt: Point,
    pub next: OutPtIdx,
    pub prev: OutPtIdx,
}

/// Two output points whose polygons share an edge starting at them and
/// passing through `off_pt`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Join {
    pub op1: OutPtIdx,
    pub op2: OutPtIdx,
    pub off_pt: Point,
}

impl OutPts<OutPt> {
    fn pt(&self, op: OutPtIdx) -> Point {
        self[op].pt
    }

    fn next(&self, op: OutPtIdx) -> OutPtIdx {
        self[op].next
    }

    fn prev(&self, op: OutPtIdx) -> OutPtIdx {
        self[op].prev
    }

    /// Makes `b` follow `a`.
    fn link(&mut self, a: OutPtIdx, b: OutPtIdx) {
        self[a].next = b;
        self[b].prev = a;
    }

    fn ring(&self, start: OutPtIdx) -> impl Iterator<Item = OutPtIdx> + '_ {
        let mut cur = Some(start);
        std::iter::from_fn(move || {
            let op = cur?;
            let next = self.next(op);
            cur = (next != start).then_some(next);
            Some(op)
        })
    }

    pub fn ring_len(&self, start: OutPtIdx) -> usize {
        self.ring(start).count()
    }

    /// The signed area enclosed by following `next` links.
    ///
    /// This is positive when the ring, read backwards, runs counter-clockwise,
    /// which is the order in which rings are serialized.
    pub fn ring_area(&self, start: OutPtIdx) -> f64 {
        let a: f64 = self
            .ring(start)
            .map(|op| {
                let (p, q) = (self.pt(self.prev(op)), self.pt(op));
                (p.x + q.x) * (p.y - q.y)
            })
            .sum();
        a * 0.5
    }

    pub fn reverse_ring(&mut self, start: OutPtIdx) {
        let ops: Vec<_> = self.ring(start).collect();
        for op in ops {
            let p = &mut self[op];
            std::mem::swap(&mut p.next, &mut p.prev);
        }
    }

    fn set_rec(&mut self, start: OutPtIdx, rec: OutRecIdx) {
        let ops: Vec<_> = self.ring(start).collect();
        for op in ops {
            self[op].rec = rec;
        }
    }

    /// Inserts a copy of `op` next to it.
    fn dup(&mut self, op: OutPtIdx, insert_after: bool) -> OutPtIdx {
        let OutPt { rec, pt, next, prev } = self[op];
        let (prev, next) = if insert_after { (op, next) } else { (prev, op) };
        let new = self.push(OutPt { rec, pt, next, prev });
        self[prev].next = new;
        self[next].prev = new;
        new
    }

    /// The first point after `op` (in one direction) at a different position.
    fn skip_same(&self, op: OutPtIdx, forward: bool) -> OutPtIdx {
        let target = self.pt(op);
        let step = |p| if forward { self.next(p) } else { self.prev(p) };
        let mut p = step(op);
        while p != op && self.pt(p) == target {
            p = step(p);
        }
        p
    }

    /// Of two rings sharing a bottom point, does the first one run further
    /// outside (i.e. have the more horizontal edges at it)?
    fn first_is_bottom_pt(&self, b1: OutPtIdx, b2: OutPtIdx) -> bool {
        let dx = |b: OutPtIdx, forward| {
            inverse_slope(self.pt(b), self.pt(self.skip_same(b, forward))).abs()
        };
        let (dx1p, dx1n) = (dx(b1, false), dx(b1, true));
        let (dx2p, dx2n) = (dx(b2, false), dx(b2, true));
        if dx1p.max(dx1n) == dx2p.max(dx2n) && dx1p.min(dx1n) == dx2p.min(dx2n) {
            self.ring_area(b1) > 0.0
        } else {
            (dx1p >= dx2p && dx1p >= dx2n) || (dx1n >= dx2p && dx1n >= dx2n)
        }
    }

    /// The lowest (then left-most) point of a ring.
    fn bottom_pt(&self, mut pp: OutPtIdx) -> OutPtIdx {
        let mut dups = None;
        let mut p = self.next(pp);
        while p != pp {
            let (q, best) = (self.pt(p), self.pt(pp));
            if q.y > best.y {
                pp = p;
                dups = None;
            } else if q.y == best.y && q.x <= best.x {
                if q.x < best.x {
                    dups = None;
                    pp = p;
                } else if self.next(p) != pp && self.prev(p) != pp {
                    dups = Some(p);
                }
            }
            p = self.next(p);
        }
        // Several vertices at the bottom point: pick the outermost.
        if let Some(mut d) = dups {
            let anchor = p;
            let target = self.pt(pp);
            while d != anchor {
                if !self.first_is_bottom_pt(anchor, d) {
                    pp = d;
                }
                d = self.next(d);
                while self.pt(d) != target {
                    d = self.next(d);
                }
            }
        }
        pp
    }

    /// Is `pt` inside the ring? `None` if it's on the boundary.
    fn point_in_ring(&self, pt: Point, start: OutPtIdx) -> Option<bool> {
        let mut inside = false;
        for op in self.ring(start) {
            match crossing(pt, self.pt(op), self.pt(self.next(op))) {
                Crossing::None => {}
                Crossing::Toggle => inside = !inside,
                Crossing::Boundary => return None,
            }
        }
        Some(inside)
    }

    /// Does ring `outer` contain ring `inner`? Decided by the first vertex
    /// of `inner` that's not on the boundary of `outer`.
    fn ring_contains(&self, outer: OutPtIdx, inner: OutPtIdx) -> bool {
        self.ring(inner)
            .find_map(|op| self.point_in_ring(self.pt(op), outer))
            .unwrap_or(true)
    }
}

/// The overlap of the `x` ranges `[a1, a2]` and `[b1, b2]` (in either order),
/// if it has positive length.
fn get_overlap(a1: f64, a2: f64, b1: f64, b2: f64) -> Option<(f64, f64)> {
    let (a_lo, a_hi) = if a1 < a2 { (a1, a2) } else { (a2, a1) };
    let (b_lo, b_hi) = if b1 < b2 { (b1, b2) } else { (b2, b1) };
    let (left, right) = (a_lo.max(b_lo), a_hi.min(b_hi));
    (left < right).then_some((left, right))
}

impl Clipper {
    fn create_out_rec(&mut self) -> OutRecIdx {
        let idx = self.outs.next_index();
        self.outs.push(OutRec {
            idx,
            is_hole: false,
            is_open: false,
            first_left: None,
            pts: None,
            bottom_pt: None,
            node: None,
        })
    }

    /// Adds `pt` to the output of `e`, starting a new record if `e` isn't
    /// contributing yet.
    pub(crate) fn add_out_pt(&mut self, e: EdgeIdx, pt: Point) -> OutPtIdx {
        let eps = self.eps;
        let first = self.edges[e]
            .out
            .rec()
            .and_then(|rec| Some((rec, self.outs[rec].pts?)));
        let Some((rec, first)) = first else {
            let rec = match self.edges[e].out.rec() {
                Some(rec) => rec,
                None => self.create_out_rec(),
            };
            let op = self.pts.next_index();
            self.pts.push(OutPt {
                rec,
                pt,
                next: op,
                prev: op,
            });
            let is_open = self.edges[e].wind_delta == 0;
            let out = &mut self.outs[rec];
            out.is_open = is_open;
            out.pts = Some(op);
            if !is_open {
                self.set_hole_state(e, rec);
            }
            self.edges[e].out = OutSlot::Rec(rec);
            return op;
        };

        let to_front = self.edges[e].side == Side::Left;
        let last = self.pts.prev(first);
        if to_front && self.pts.pt(first).approx_eq(&pt, eps) {
            return first;
        }
        if !to_front && self.pts.pt(last).approx_eq(&pt, eps) {
            return last;
        }
        let op = self.pts.push(OutPt {
            rec,
            pt,
            next: first,
            prev: last,
        });
        self.pts.link(last, op);
        self.pts.link(op, first);
        if to_front {
            self.outs[rec].pts = Some(op);
        }
        op
    }

    pub(crate) fn get_last_out_pt(&self, e: EdgeIdx) -> Option<OutPtIdx> {
        let first = self.outs[self.edges[e].out.rec()?].pts?;
        Some(match self.edges[e].side {
            Side::Left => first,
            Side::Right => self.pts.prev(first),
        })
    }

    /// Works out whether a new record is a hole from the contributing edges
    /// to the left of `e`.
    fn set_hole_state(&mut self, e: EdgeIdx, rec: OutRecIdx) {
        let mut left = self.edges[e].prev_in_ael;
        let mut enclosing: Option<EdgeIdx> = None;
        while let Some(l) = left {
            let le = &self.edges[l];
            if le.out.is_assigned() && le.wind_delta != 0 {
                match enclosing {
                    None => enclosing = Some(l),
                    Some(t) if self.edges[t].out == le.out => enclosing = None,
                    Some(_) => {}
                }
            }
            left = le.prev_in_ael;
        }
        let first_left = enclosing.and_then(|t| self.edges[t].out.rec());
        let is_hole = first_left.is_some_and(|fl| !self.outs[fl].is_hole);
        let out = &mut self.outs[rec];
        out.first_left = first_left;
        out.is_hole = is_hole;
    }

    /// Starts a new output fragment where two bounds meet at a local minimum.
    pub(crate) fn add_local_min_poly(&mut self, e1: EdgeIdx, e2: EdgeIdx, pt: Point) -> OutPtIdx {
        let eps = self.eps;
        let (first, second) = if self.edges[e2].is_horizontal() || self.edges[e1].dx > self.edges[e2].dx
        {
            (e1, e2)
        } else {
            (e2, e1)
        };
        let result = self.add_out_pt(first, pt);
        self.edges[second].out = self.edges[first].out;
        self.edges[first].side = Side::Left;
        self.edges[second].side = Side::Right;

        let e = first;
        let prev_e = match self.edges[e].prev_in_ael {
            Some(p) if p == second => self.edges[second].prev_in_ael,
            p => p,
        };
        if let Some(prev_e) = prev_e {
            let (pe, ee) = (&self.edges[prev_e], &self.edges[e]);
            if pe.out.is_assigned() && pe.top.y < pt.y && ee.top.y < pt.y {
                let x_prev = pe.top_x(pt.y);
                let x_e = ee.top_x(pt.y);
                if (x_prev - x_e).abs() <= eps
                    && ee.wind_delta != 0
                    && pe.wind_delta != 0
                    && slopes_equal4(
                        Point::new(x_prev, pt.y),
                        pe.top,
                        Point::new(x_e, pt.y),
                        ee.top,
                        eps,
                    )
                {
                    let top = ee.top;
                    let op = self.add_out_pt(prev_e, pt);
                    self.add_join(result, op, top);
                }
            }
        }
        result
    }

    /// Closes off output where two bounds meet at a local maximum.
    pub(crate) fn add_local_max_poly(&mut self, e1: EdgeIdx, e2: EdgeIdx, pt: Point) {
        self.add_out_pt(e1, pt);
        if self.edges[e2].wind_delta == 0 {
            self.add_out_pt(e2, pt);
        }
        let (o1, o2) = (self.edges[e1].out, self.edges[e2].out);
        if o1 == o2 {
            self.edges[e1].out = OutSlot::Unassigned;
            self.edges[e2].out = OutSlot::Unassigned;
        } else if let (Some(r1), Some(r2)) = (o1.rec(), o2.rec()) {
            if r1 < r2 {
                self.append_polygon(e1, e2);
            } else {
                self.append_polygon(e2, e1);
            }
        }
    }

    /// Is `r1` (transitively) enclosed by `r2`?
    fn rec1_right_of_rec2(&self, r1: OutRecIdx, r2: OutRecIdx) -> bool {
        let mut r = self.outs[r1].first_left;
        for _ in 0..=self.outs.len() {
            match r {
                Some(x) if x == r2 => return true,
                Some(x) => r = self.outs[x].first_left,
                None => return false,
            }
        }
        false
    }

    /// Of two records, the one whose bottom point is lower (or outermost),
    /// which therefore has the right hole state.
    fn lowermost_rec(&mut self, r1: OutRecIdx, r2: OutRecIdx) -> OutRecIdx {
        let bottom = |c: &mut Self, r: OutRecIdx| -> Option<OutPtIdx> {
            if c.outs[r].bottom_pt.is_none() {
                let pts = c.outs[r].pts?;
                c.outs[r].bottom_pt = Some(c.pts.bottom_pt(pts));
            }
            c.outs[r].bottom_pt
        };
        let (Some(b1), Some(b2)) = (bottom(self, r1), bottom(self, r2)) else {
            return r1;
        };
        let (p1, p2) = (self.pts.pt(b1), self.pts.pt(b2));
        if p1.y > p2.y {
            r1
        } else if p1.y < p2.y {
            r2
        } else if p1.x < p2.x {
            r1
        } else if p1.x > p2.x {
            r2
        } else if self.pts.next(b1) == b1 {
            r2
        } else if self.pts.next(b2) == b2 || self.pts.first_is_bottom_pt(b1, b2) {
            r1
        } else {
            r2
        }
    }

    fn hole_state_rec(&mut self, r1: OutRecIdx, r2: OutRecIdx) -> OutRecIdx {
        if r1 == r2 {
            r1
        } else if self.rec1_right_of_rec2(r1, r2) {
            r2
        } else if self.rec1_right_of_rec2(r2, r1) {
            r1
        } else {
            self.lowermost_rec(r1, r2)
        }
    }

    /// Appends the output of `e2` to that of `e1`, where the two bounds meet.
    fn append_polygon(&mut self, e1: EdgeIdx, e2: EdgeIdx) {
        let (Some(r1), Some(r2)) = (self.edges[e1].out.rec(), self.edges[e2].out.rec()) else {
            return;
        };
        let (Some(p1_lft), Some(p2_lft)) = (self.outs[r1].pts, self.outs[r2].pts) else {
            return;
        };
        let hole_state_rec = self.hole_state_rec(r1, r2);

        let p1_rt = self.pts.prev(p1_lft);
        let p2_rt = self.pts.prev(p2_lft);
        let side1 = self.edges[e1].side;
        match (side1, self.edges[e2].side) {
            (Side::Left, Side::Left) => {
                // z y x a b c
                self.pts.reverse_ring(p2_lft);
                self.pts.link(p2_lft, p1_lft);
                self.pts.link(p1_rt, p2_rt);
                self.outs[r1].pts = Some(p2_rt);
            }
            (Side::Left, Side::Right) => {
                // x y z a b c
                self.pts.link(p2_rt, p1_lft);
                self.pts.link(p1_rt, p2_lft);
                self.outs[r1].pts = Some(p2_lft);
            }
            (Side::Right, Side::Right) => {
                // a b c z y x
                self.pts.reverse_ring(p2_lft);
                self.pts.link(p1_rt, p2_rt);
                self.pts.link(p2_lft, p1_lft);
            }
            (Side::Right, Side::Left) => {
                // a b c x y z
                self.pts.link(p1_rt, p2_lft);
                self.pts.link(p2_rt, p1_lft);
            }
        }

        self.outs[r1].bottom_pt = None;
        if hole_state_rec == r2 {
            if self.outs[r2].first_left != Some(r1) {
                self.outs[r1].first_left = self.outs[r2].first_left;
            }
            self.outs[r1].is_hole = self.outs[r2].is_hole;
        }
        let out2 = &mut self.outs[r2];
        out2.pts = None;
        out2.bottom_pt = None;
        out2.first_left = Some(r1);

        self.edges[e1].out = OutSlot::Unassigned;
        self.edges[e2].out = OutSlot::Unassigned;

        // The other edge still adding to the obsolete record now adds to ours.
        let mut e = self.active;
        while let Some(ee) = e {
            if self.edges[ee].out == OutSlot::Rec(r2) {
                self.edges[ee].out = OutSlot::Rec(r1);
                self.edges[ee].side = side1;
                break;
            }
            e = self.edges[ee].next_in_ael;
        }
        self.outs[r2].idx = self.outs[r1].idx;
    }

    pub(crate) fn add_join(&mut self, op1: OutPtIdx, op2: OutPtIdx, off_pt: Point) {
        self.joins.push(Join { op1, op2, off_pt });
    }

    /// Remembers a horizontal output edge from `op` to `off_pt`, in case a
    /// horizontal starting later in this scanbeam overlaps it.
    pub(crate) fn add_ghost_join(&mut self, op: OutPtIdx, off_pt: Point) {
        self.ghost_joins.push(Join {
            op1: op,
            op2: op,
            off_pt,
        });
    }

    /// Follows merges to the record that now owns `r`'s points.
    fn get_out_rec(&self, mut r: OutRecIdx) -> OutRecIdx {
        for _ in 0..=self.outs.len() {
            let next = self.outs[r].idx;
            if next == r {
                break;
            }
            r = next;
        }
        r
    }

    /// The nearest enclosing record that still has points.
    fn parse_first_left(&self, mut fl: Option<OutRecIdx>) -> Option<OutRecIdx> {
        for _ in 0..=self.outs.len() {
            match fl {
                Some(r) if self.outs[r].pts.is_none() => fl = self.outs[r].first_left,
                _ => break,
            }
        }
        fl
    }

    fn fix_orientation(&mut self, r: OutRecIdx) {
        let Some(pts) = self.outs[r].pts else {
            return;
        };
        if (self.outs[r].is_hole ^ self.reverse_solution()) == (self.pts.ring_area(pts) > 0.0) {
            self.pts.reverse_ring(pts);
        }
    }

    /// Runs after the sweep: orientation, joins, and pruning.
    pub(crate) fn finish_output(&mut self) -> Result<(), Error> {
        for r in self.outs.indices().collect::<Vec<_>>() {
            if !self.outs[r].is_open {
                self.fix_orientation(r);
            }
        }

        let joins = self.joins.len();
        self.join_common_edges();

        for r in self.outs.indices().collect::<Vec<_>>() {
            if self.outs[r].pts.is_none() {
                continue;
            }
            if self.outs[r].is_open {
                self.fixup_out_polyline(r);
            } else {
                self.fixup_out_polygon(r)?;
            }
        }

        if self.strictly_simple() {
            self.do_simple_polygons()?;
        }
        self.settle_hole_states();
        tracing::debug!(joins, out_recs = self.outs.len(), "output assembled");
        Ok(())
    }

    /// Checks every closed ring against the record that is supposed to
    /// enclose it, then fixes its orientation.
    ///
    /// Joins on self-overlapping input can leave a ring flagged as a hole
    /// that only touches its outer ring at vertices. Such a ring encloses
    /// filled area, so it becomes an outer.
    fn settle_hole_states(&mut self) {
        for r in self.outs.indices().collect::<Vec<_>>() {
            let rec = &self.outs[r];
            let Some(pts) = rec.pts else {
                continue;
            };
            if rec.is_open || self.pts.ring_len(pts) < 3 {
                continue;
            }
            if rec.is_hole {
                let outer = self.enclosing_outer(r, pts);
                if outer.is_none() {
                    tracing::debug!(?r, "hole without an enclosing outer");
                    self.outs[r].is_hole = false;
                }
                self.outs[r].first_left = outer;
            }
            self.fix_orientation(r);
        }
    }

    /// The live outer record that encloses the ring `pts` of record `r`.
    ///
    /// The record's own `first_left` chain is tried first. Failing that, the
    /// smallest enclosing outer wins.
    fn enclosing_outer(&self, r: OutRecIdx, pts: OutPtIdx) -> Option<OutRecIdx> {
        let outer_pts = |o: OutRecIdx| {
            let out = &self.outs[o];
            if o == r || out.is_open || out.is_hole {
                return None;
            }
            out.pts.filter(|&op| self.pts.ring_len(op) >= 3)
        };
        let encloses = |o: OutRecIdx| outer_pts(o).is_some_and(|op| self.pts.ring_contains(op, pts));

        let mut linked = self.outs[r].first_left;
        for _ in 0..=self.outs.len() {
            match linked {
                Some(o) if self.outs[o].pts.is_none() || self.outs[o].is_hole => {
                    linked = self.outs[o].first_left;
                }
                _ => break,
            }
        }
        if linked.is_some_and(|o| encloses(o)) {
            return linked;
        }
        self.outs
            .indices()
            .filter(|&o| encloses(o))
            .filter_map(|o| Some((o, self.pts.ring_area(outer_pts(o)?).abs())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _)| o)
    }

    fn join_common_edges(&mut self) {
        for i in 0..self.joins.len() {
            let join = self.joins[i];
            let r1 = self.get_out_rec(self.pts[join.op1].rec);
            let mut r2 = self.get_out_rec(self.pts[join.op2].rec);
            if self.outs[r1].pts.is_none() || self.outs[r2].pts.is_none() {
                continue;
            }
            if self.outs[r1].is_open || self.outs[r2].is_open {
                continue;
            }

            let hole_state_rec = self.hole_state_rec(r1, r2);
            let Some((op1, op2)) = self.join_points(join, r1, r2) else {
                continue;
            };

            if r1 == r2 {
                // The join split one polygon in two.
                self.outs[r1].pts = Some(op1);
                self.outs[r1].bottom_pt = None;
                r2 = self.create_out_rec();
                self.outs[r2].pts = Some(op2);
                self.pts.set_rec(op2, r2);
                if let Some(nested) = self.classify_split(r1, r2) {
                    self.fix_orientation(nested);
                }
            } else {
                // The join merged two polygons.
                let out2 = &mut self.outs[r2];
                out2.pts = None;
                out2.bottom_pt = None;
                out2.idx = r1;
                self.outs[r1].is_hole = self.outs[hole_state_rec].is_hole;
                if hole_state_rec == r2 {
                    self.outs[r1].first_left = self.outs[r2].first_left;
                }
                self.outs[r2].first_left = Some(r1);
                if self.using_tree {
                    self.fixup_first_lefts3(r2, r1);
                }
            }
        }
    }

    /// After splitting `r1` into `r1` and `r2`, works out how the two nest.
    ///
    /// Returns the record that ended up inside the other one, if any.
    fn classify_split(&mut self, r1: OutRecIdx, r2: OutRecIdx) -> Option<OutRecIdx> {
        let (Some(p1), Some(p2)) = (self.outs[r1].pts, self.outs[r2].pts) else {
            return None;
        };
        if self.pts.ring_contains(p1, p2) {
            // r2 is inside r1.
            self.outs[r2].is_hole = !self.outs[r1].is_hole;
            self.outs[r2].first_left = Some(r1);
            if self.using_tree {
                self.fixup_first_lefts2(r2, r1);
            }
            Some(r2)
        } else if self.pts.ring_contains(p2, p1) {
            // r1 is inside r2.
            self.outs[r2].is_hole = self.outs[r1].is_hole;
            self.outs[r1].is_hole = !self.outs[r2].is_hole;
            self.outs[r2].first_left = self.outs[r1].first_left;
            self.outs[r1].first_left = Some(r2);
            if self.using_tree {
                self.fixup_first_lefts2(r1, r2);
            }
            Some(r1)
        } else {
            self.outs[r2].is_hole = self.outs[r1].is_hole;
            self.outs[r2].first_left = self.outs[r1].first_left;
            if self.using_tree {
                self.fixup_first_lefts1(r1, r2);
            }
            None
        }
    }

    /// Records enclosed by `old` that turn out to be inside `new` get moved there.
    fn fixup_first_lefts1(&mut self, old: OutRecIdx, new: OutRecIdx) {
        let Some(new_pts) = self.outs[new].pts else {
            return;
        };
        for r in self.outs.indices().collect::<Vec<_>>() {
            let Some(pts) = self.outs[r].pts else {
                continue;
            };
            if self.parse_first_left(self.outs[r].first_left) == Some(old)
                && self.pts.ring_contains(new_pts, pts)
            {
                self.outs[r].first_left = Some(new);
            }
        }
    }

    /// A polygon split into `inner` and `outer`; records around either may
    /// now belong to the other.
    fn fixup_first_lefts2(&mut self, inner: OutRecIdx, outer: OutRecIdx) {
        let (Some(inner_pts), Some(outer_pts)) = (self.outs[inner].pts, self.outs[outer].pts) else {
            return;
        };
        let orfl = self.outs[outer].first_left;
        for r in self.outs.indices().collect::<Vec<_>>() {
            let Some(pts) = self.outs[r].pts else {
                continue;
            };
            if r == outer || r == inner {
                continue;
            }
            let fl = self.parse_first_left(self.outs[r].first_left);
            if fl != orfl && fl != Some(inner) && fl != Some(outer) {
                continue;
            }
            if self.pts.ring_contains(inner_pts, pts) {
                self.outs[r].first_left = Some(inner);
            } else if self.pts.ring_contains(outer_pts, pts) {
                self.outs[r].first_left = Some(outer);
            } else if self.outs[r].first_left == Some(inner) || self.outs[r].first_left == Some(outer)
            {
                self.outs[r].first_left = orfl;
            }
        }
    }

    /// `old` was merged into `new`; everything it enclosed now has `new` around it.
    fn fixup_first_lefts3(&mut self, old: OutRecIdx, new: OutRecIdx) {
        for r in self.outs.indices().collect::<Vec<_>>() {
            if self.outs[r].pts.is_some()
                && self.parse_first_left(self.outs[r].first_left) == Some(old)
            {
                self.outs[r].first_left = Some(new);
            }
        }
    }

    /// Splices the rings of a join together, returning the points that end up
    /// in each of the (one or two) resulting rings, or `None` if the join
    /// doesn't apply after all.
    fn join_points(&mut self, join: Join, r1: OutRecIdx, r2: OutRecIdx) -> Option<(OutPtIdx, OutPtIdx)> {
        let eps = self.eps;
        let (op1, op2, off) = (join.op1, join.op2, join.off_pt);
        let p1 = self.pts.pt(op1);
        let is_horizontal = p1.y == off.y;

        if is_horizontal && off.approx_eq(&p1, eps) && off.approx_eq(&self.pts.pt(op2), eps) {
            // Edges touching at a point, from strictly simple mode.
            if r1 != r2 {
                return None;
            }
            let below = |c: &Self, op: OutPtIdx| {
                let mut b = c.pts.next(op);
                while b != op && c.pts.pt(b).approx_eq(&off, eps) {
                    b = c.pts.next(b);
                }
                c.pts.pt(b).y > off.y
            };
            let reverse1 = below(self, op1);
            let reverse2 = below(self, op2);
            if reverse1 == reverse2 {
                return None;
            }
            return Some(self.splice(op1, op2, reverse1));
        }

        if is_horizontal {
            return self.join_horizontal(op1, op2);
        }

        // The overlap starts at op1 == op2 and runs up towards `off`. Find
        // which way round each ring goes from there.
        let direction = |c: &Self, op: OutPtIdx| -> Option<(bool, OutPtIdx)> {
            let p = c.pts.pt(op);
            let ok = |b: OutPtIdx| {
                let q = c.pts.pt(b);
                q.y <= p.y && slopes_equal3(p, q, off, eps)
            };
            let fwd = c.pts.skip_same(op, true);
            if ok(fwd) {
                return Some((false, fwd));
            }
            let back = c.pts.skip_same(op, false);
            ok(back).then_some((true, back))
        };
        let (reverse1, op1b) = direction(self, op1)?;
        let (reverse2, op2b) = direction(self, op2)?;
        if op1b == op1 || op2b == op2 || op1b == op2b || (r1 == r2 && reverse1 == reverse2) {
            return None;
        }
        Some(self.splice(op1, op2, reverse1))
    }

    /// Cross-links the rings at `op1` and `op2`, which are at the same
    /// position, duplicating both points.
    fn splice(&mut self, op1: OutPtIdx, op2: OutPtIdx, reverse1: bool) -> (OutPtIdx, OutPtIdx) {
        if reverse1 {
            let op1b = self.pts.dup(op1, false);
            let op2b = self.pts.dup(op2, true);
            self.pts.link(op2, op1);
            self.pts.link(op1b, op2b);
            (op1, op1b)
        } else {
            let op1b = self.pts.dup(op1, true);
            let op2b = self.pts.dup(op2, false);
            self.pts.link(op1, op2);
            self.pts.link(op2b, op1b);
            (op1, op1b)
        }
    }

    /// Joins along overlapping horizontal edges, where `op1` and `op2` may
    /// be anywhere on them.
    fn join_horizontal(&mut self, mut op1: OutPtIdx, mut op2: OutPtIdx) -> Option<(OutPtIdx, OutPtIdx)> {
        let pts = &self.pts;
        let same_y = |a: OutPtIdx, b: OutPtIdx| pts.pt(a).y == pts.pt(b).y;

        let mut op1b = op1;
        while same_y(pts.prev(op1), op1) && pts.prev(op1) != op1b && pts.prev(op1) != op2 {
            op1 = pts.prev(op1);
        }
        while same_y(pts.next(op1b), op1b) && pts.next(op1b) != op1 && pts.next(op1b) != op2 {
            op1b = pts.next(op1b);
        }
        if pts.next(op1b) == op1 || pts.next(op1b) == op2 {
            // A flat polygon.
            return None;
        }

        let mut op2b = op2;
        while same_y(pts.prev(op2), op2) && pts.prev(op2) != op2b && pts.prev(op2) != op1b {
            op2 = pts.prev(op2);
        }
        while same_y(pts.next(op2b), op2b) && pts.next(op2b) != op2 && pts.next(op2b) != op1 {
            op2b = pts.next(op2b);
        }
        if pts.next(op2b) == op2 || pts.next(op2b) == op1 {
            return None;
        }

        let (x1, x1b, x2, x2b) = (pts.pt(op1).x, pts.pt(op1b).x, pts.pt(op2).x, pts.pt(op2b).x);
        let (left, right) = get_overlap(x1, x1b, x2, x2b)?;

        // Joining overlapping edges leaves a spike to be cleaned up later. The
        // join points must not end up on the discarded side, since other
        // joins may still need them.
        let within = |x: f64| x >= left && x <= right;
        let (pt, discard_left) = if within(x1) {
            (pts.pt(op1), x1 > x1b)
        } else if within(x2) {
            (pts.pt(op2), x2 > x2b)
        } else if within(x1b) {
            (pts.pt(op1b), x1b > x1)
        } else {
            (pts.pt(op2b), x2b > x2)
        };
        self.join_horz(op1, op1b, op2, op2b, pt, discard_left)
            .then_some((op1, op2))
    }

    fn join_horz(
        &mut self,
        op1: OutPtIdx,
        op1b: OutPtIdx,
        op2: OutPtIdx,
        op2b: OutPtIdx,
        pt: Point,
        discard_left: bool,
    ) -> bool {
        let ltr1 = self.pts.pt(op1).x <= self.pts.pt(op1b).x;
        let ltr2 = self.pts.pt(op2).x <= self.pts.pt(op2b).x;
        if ltr1 == ltr2 {
            return false;
        }
        let (op1, op1b) = self.horz_join_end(op1, pt, ltr1, discard_left);
        let (op2, op2b) = self.horz_join_end(op2, pt, ltr2, discard_left);
        if ltr1 == discard_left {
            self.pts.link(op2, op1);
            self.pts.link(op1b, op2b);
        } else {
            self.pts.link(op1, op2);
            self.pts.link(op2b, op1b);
        }
        true
    }

    /// Moves along a horizontal run to `pt` and makes sure there are two
    /// points there: the returned pair.
    fn horz_join_end(
        &mut self,
        mut op: OutPtIdx,
        pt: Point,
        left_to_right: bool,
        discard_left: bool,
    ) -> (OutPtIdx, OutPtIdx) {
        let eps = self.eps;
        let limit = self.pts.len();
        let mut steps = 0;
        loop {
            let (cur, next) = (self.pts.pt(op), self.pts.pt(self.pts.next(op)));
            let moving = if left_to_right {
                next.x <= pt.x && next.x >= cur.x
            } else {
                next.x >= pt.x && next.x <= cur.x
            };
            if !moving || next.y != pt.y || steps > limit {
                break;
            }
            op = self.pts.next(op);
            steps += 1;
        }
        let skip_to_next = if left_to_right { discard_left } else { !discard_left };
        if skip_to_next && self.pts.pt(op).x != pt.x {
            op = self.pts.next(op);
        }
        let after = if left_to_right { !discard_left } else { discard_left };
        let mut opb = self.pts.dup(op, after);
        if !self.pts.pt(opb).approx_eq(&pt, eps) {
            op = opb;
            self.pts[op].pt = pt;
            opb = self.pts.dup(op, after);
        }
        (op, opb)
    }

    /// Removes duplicate points and collinear vertices from a closed ring.
    fn fixup_out_polygon(&mut self, r: OutRecIdx) -> Result<(), Error> {
        let eps = self.eps;
        let preserve_col = self.preserve_collinear() || self.strictly_simple();
        self.outs[r].bottom_pt = None;
        let Some(mut pp) = self.outs[r].pts else {
            return Ok(());
        };
        let n = self.pts.ring_len(pp);
        let mut guard = Guard::new(n.saturating_mul(n + 2).saturating_add(16), "pruning output points");
        let mut last_ok = None;
        loop {
            guard.step()?;
            let (prev, next) = (self.pts.prev(pp), self.pts.next(pp));
            if prev == pp || prev == next {
                self.outs[r].pts = None;
                return Ok(());
            }
            let (a, b, c) = (self.pts.pt(prev), self.pts.pt(pp), self.pts.pt(next));
            if b.approx_eq(&c, eps)
                || b.approx_eq(&a, eps)
                || (slopes_equal3(a, b, c, eps) && (!preserve_col || !pt2_is_between(a, b, c)))
            {
                last_ok = None;
                self.pts.link(prev, next);
                pp = prev;
            } else if Some(pp) == last_ok {
                break;
            } else {
                last_ok.get_or_insert(pp);
                pp = next;
            }
        }
        self.outs[r].pts = Some(pp);
        Ok(())
    }

    /// Removes duplicate points from an open path.
    fn fixup_out_polyline(&mut self, r: OutRecIdx) {
        let eps = self.eps;
        let Some(mut pp) = self.outs[r].pts else {
            return;
        };
        let mut last = self.pts.prev(pp);
        while pp != last {
            pp = self.pts.next(pp);
            let prev = self.pts.prev(pp);
            if self.pts.pt(pp).approx_eq(&self.pts.pt(prev), eps) {
                if pp == last {
                    last = prev;
                }
                let before = self.pts.prev(prev);
                self.pts.link(before, pp);
                if self.outs[r].pts == Some(prev) {
                    self.outs[r].pts = Some(pp);
                }
            }
        }
        if self.pts.prev(pp) == pp {
            self.outs[r].pts = None;
        }
    }

    /// Splits every ring that touches itself at a vertex into separate rings.
    fn do_simple_polygons(&mut self) -> Result<(), Error> {
        let eps = self.eps;
        let n = self.pts.len();
        let mut guard = Guard::new(
            n.saturating_mul(n).saturating_add(16),
            "splitting self-touching polygons",
        );
        let mut i = 0;
        while i < self.outs.len() {
            let r = OutRecIdx(i);
            i += 1;
            let Some(mut op) = self.outs[r].pts else {
                continue;
            };
            if self.outs[r].is_open {
                continue;
            }
            loop {
                let mut op2 = self.pts.next(op);
                while Some(op2) != self.outs[r].pts {
                    guard.step()?;
                    if self.pts.pt(op).approx_eq(&self.pts.pt(op2), eps)
                        && self.pts.next(op2) != op
                        && self.pts.prev(op2) != op
                    {
                        let op3 = self.pts.prev(op);
                        let op4 = self.pts.prev(op2);
                        self.pts.link(op4, op);
                        self.pts.link(op3, op2);

                        self.outs[r].pts = Some(op);
                        let r2 = self.create_out_rec();
                        self.outs[r2].pts = Some(op2);
                        self.pts.set_rec(op2, r2);
                        self.classify_split(r, r2);
                        op2 = op;
                    }
                    op2 = self.pts.next(op2);
                }
                op = self.pts.next(op);
                if Some(op) == self.outs[r].pts {
                    break;
                }
            }
        }
        Ok(())
    }

    fn contour(&self, pts: OutPtIdx) -> Vec<Point> {
        // Serialized backwards, which is counter-clockwise for outer rings.
        let start = self.pts.prev(pts);
        let mut out = Vec::with_capacity(self.pts.ring_len(start));
        let mut op = start;
        loop {
            out.push(self.pts.pt(op));
            op = self.pts.prev(op);
            if op == start {
                break;
            }
        }
        out
    }

    pub(crate) fn build_paths(&mut self) -> Paths {
        self.outs
            .iter()
            .filter_map(|(_, rec)| rec.pts)
            .filter(|&p| self.pts.ring_len(p) >= 2)
            .map(|p| self.contour(p))
            .collect()
    }

    /// Points each record's `first_left` at its nearest live enclosing
    /// record of the opposite hole state.
    fn fix_hole_linkage(&mut self, r: OutRecIdx) {
        let rec = &self.outs[r];
        let Some(fl) = rec.first_left else {
            return;
        };
        if rec.is_hole != self.outs[fl].is_hole && self.outs[fl].pts.is_some() {
            return;
        }
        let is_hole = rec.is_hole;
        let mut orfl = Some(fl);
        for _ in 0..=self.outs.len() {
            match orfl {
                Some(o) if self.outs[o].is_hole == is_hole || self.outs[o].pts.is_none() => {
                    orfl = self.outs[o].first_left;
                }
                _ => break,
            }
        }
        self.outs[r].first_left = orfl;
    }

    pub(crate) fn build_tree(&mut self) -> PolyTree {
        let mut tree = PolyTree::default();
        for r in self.outs.indices().collect::<Vec<_>>() {
            let Some(pts) = self.outs[r].pts else {
                continue;
            };
            let cnt = self.pts.ring_len(pts);
            let is_open = self.outs[r].is_open;
            if (is_open && cnt < 2) || (!is_open && cnt < 3) {
                continue;
            }
            self.fix_hole_linkage(r);
            let node = tree.add_node(self.contour(pts), is_open);
            self.outs[r].node = Some(node);
        }

        for (_, rec) in self.outs.iter() {
            let Some(node) = rec.node else {
                continue;
            };
            let parent = if rec.is_open {
                None
            } else {
                rec.first_left.and_then(|fl| self.outs[fl].node)
            };
            tree.attach(node, parent);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn ring(pts: &mut OutPts<OutPt>, points: &[Point]) -> OutPtIdx {
        let base = pts.len();
        let n = points.len();
        for (i, pt) in points.iter().enumerate() {
            pts.push(OutPt {
                rec: OutRecIdx(0),
                pt: *pt,
                next: OutPtIdx(base + (i + 1) % n),
                prev: OutPtIdx(base + (i + n - 1) % n),
            });
        }
        OutPtIdx(base)
    }

    #[test]
    fn ring_area_and_reversal() {
        let mut pts = OutPts::default();
        // Read backwards this is counter-clockwise.
        let start = ring(&mut pts, &[p(0.0, 0.0), p(0.0, 10.0), p(10.0, 10.0), p(10.0, 0.0)]);
        assert_eq!(pts.ring_len(start), 4);
        assert_eq!(pts.ring_area(start), 100.0);
        pts.reverse_ring(start);
        assert_eq!(pts.ring_area(start), -100.0);
    }

    #[test]
    fn bottom_point() {
        let mut pts = OutPts::default();
        let start = ring(&mut pts, &[p(5.0, 0.0), p(10.0, 10.0), p(2.0, 10.0), p(0.0, 5.0)]);
        let b = pts.bottom_pt(start);
        assert_eq!(pts.pt(b), p(2.0, 10.0));
    }

    #[test]
    fn containment() {
        let mut pts = OutPts::default();
        let outer = ring(&mut pts, &[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]);
        let inner = ring(&mut pts, &[p(2.0, 2.0), p(4.0, 2.0), p(4.0, 4.0)]);
        let touching = ring(&mut pts, &[p(0.0, 0.0), p(5.0, 0.0), p(5.0, 5.0)]);
        assert!(pts.ring_contains(outer, inner));
        assert!(!pts.ring_contains(inner, outer));
        assert!(pts.ring_contains(outer, touching));
        assert_eq!(pts.point_in_ring(p(10.0, 5.0), outer), None);
        assert_eq!(pts.point_in_ring(p(11.0, 5.0), outer), Some(false));
    }

    #[test]
    fn dup_keeps_ring_consistent() {
        let mut pts = OutPts::default();
        let start = ring(&mut pts, &[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
        let d = pts.dup(start, true);
        assert_eq!(pts.next(start), d);
        assert_eq!(pts.prev(d), start);
        assert_eq!(pts.ring_len(start), 4);
        for op in pts.ring(start).collect::<Vec<_>>() {
            assert_eq!(pts.prev(pts.next(op)), op);
        }
    }

    #[test]
    fn overlap() {
        assert_eq!(get_overlap(0.0, 10.0, 12.0, 5.0), Some((5.0, 10.0)));
        assert_eq!(get_overlap(10.0, 0.0, 10.0, 20.0), None);
    }
}
