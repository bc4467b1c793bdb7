//! The active and sorted edge lists, winding counts, and edge crossings.

use crate::{
    edges::{EdgeIdx, OutSlot},
    BooleanOp, Error, FillRule, PathType, Point,
};

use super::Clipper;

impl Clipper {
    /// Does `e2` belong before `e1` in the active edge list, given that
    /// they're both about to start at the current scanline?
    fn e2_inserts_before_e1(&self, e1: EdgeIdx, e2: EdgeIdx) -> bool {
        let (e1, e2) = (&self.edges[e1], &self.edges[e2]);
        if (e2.curr.x - e1.curr.x).abs() <= self.eps {
            // Same start; compare where they are at the lower of their tops.
            if e2.top.y > e1.top.y {
                e2.top.x < e1.top_x(e2.top.y)
            } else {
                e1.top.x > e2.top_x(e1.top.y)
            }
        } else {
            e2.curr.x < e1.curr.x
        }
    }

    pub(crate) fn insert_edge_into_ael(&mut self, e: EdgeIdx, start: Option<EdgeIdx>) {
        let Some(head) = self.active else {
            self.edges[e].prev_in_ael = None;
            self.edges[e].next_in_ael = None;
            self.active = Some(e);
            return;
        };
        if start.is_none() && self.e2_inserts_before_e1(head, e) {
            self.edges[e].prev_in_ael = None;
            self.edges[e].next_in_ael = Some(head);
            self.edges[head].prev_in_ael = Some(e);
            self.active = Some(e);
            return;
        }
        let mut s = start.unwrap_or(head);
        while let Some(next) = self.edges[s].next_in_ael {
            if self.e2_inserts_before_e1(next, e) {
                break;
            }
            s = next;
        }
        let next = self.edges[s].next_in_ael;
        self.edges[e].next_in_ael = next;
        if let Some(next) = next {
            self.edges[next].prev_in_ael = Some(e);
        }
        self.edges[e].prev_in_ael = Some(s);
        self.edges[s].next_in_ael = Some(e);
    }

    pub(crate) fn delete_from_ael(&mut self, e: EdgeIdx) {
        let (prev, next) = (self.edges[e].prev_in_ael, self.edges[e].next_in_ael);
        if prev.is_none() && next.is_none() && self.active != Some(e) {
            // Already gone.
            return;
        }
        match prev {
            Some(p) => self.edges[p].next_in_ael = next,
            None => self.active = next,
        }
        if let Some(n) = next {
            self.edges[n].prev_in_ael = prev;
        }
        self.edges[e].next_in_ael = None;
        self.edges[e].prev_in_ael = None;
    }

    pub(crate) fn add_edge_to_sel(&mut self, e: EdgeIdx) {
        // The sorted edge list is used as a stack of pending horizontals.
        self.edges[e].prev_in_sel = None;
        self.edges[e].next_in_sel = self.sorted;
        if let Some(head) = self.sorted {
            self.edges[head].prev_in_sel = Some(e);
        }
        self.sorted = Some(e);
    }

    pub(crate) fn pop_edge_from_sel(&mut self) -> Option<EdgeIdx> {
        let e = self.sorted?;
        self.delete_from_sel(e);
        Some(e)
    }

    pub(crate) fn delete_from_sel(&mut self, e: EdgeIdx) {
        let (prev, next) = (self.edges[e].prev_in_sel, self.edges[e].next_in_sel);
        if prev.is_none() && next.is_none() && self.sorted != Some(e) {
            return;
        }
        match prev {
            Some(p) => self.edges[p].next_in_sel = next,
            None => self.sorted = next,
        }
        if let Some(n) = next {
            self.edges[n].prev_in_sel = prev;
        }
        self.edges[e].next_in_sel = None;
        self.edges[e].prev_in_sel = None;
    }

    pub(crate) fn copy_ael_to_sel(&mut self) {
        let mut e = self.active;
        self.sorted = e;
        while let Some(ee) = e {
            let edge = &mut self.edges[ee];
            edge.prev_in_sel = edge.prev_in_ael;
            edge.next_in_sel = edge.next_in_ael;
            e = edge.next_in_ael;
        }
    }

    pub(crate) fn swap_positions_in_ael(&mut self, e1: EdgeIdx, e2: EdgeIdx) {
        let detached = |c: &Self, e: EdgeIdx| {
            let edge = &c.edges[e];
            edge.next_in_ael == edge.prev_in_ael
        };
        if detached(self, e1) || detached(self, e2) {
            return;
        }
        let head = swap_in_list(
            self,
            e1,
            e2,
            |c, e| c.edges[e].next_in_ael,
            |c, e| c.edges[e].prev_in_ael,
            |c, e, v| c.edges[e].next_in_ael = v,
            |c, e, v| c.edges[e].prev_in_ael = v,
        );
        if let Some(head) = head {
            self.active = Some(head);
        }
    }

    pub(crate) fn swap_positions_in_sel(&mut self, e1: EdgeIdx, e2: EdgeIdx) {
        let detached = |c: &Self, e: EdgeIdx| {
            let edge = &c.edges[e];
            edge.next_in_sel.is_none() && edge.prev_in_sel.is_none()
        };
        if detached(self, e1) || detached(self, e2) {
            return;
        }
        let head = swap_in_list(
            self,
            e1,
            e2,
            |c, e| c.edges[e].next_in_sel,
            |c, e| c.edges[e].prev_in_sel,
            |c, e, v| c.edges[e].next_in_sel = v,
            |c, e, v| c.edges[e].prev_in_sel = v,
        );
        if let Some(head) = head {
            self.sorted = Some(head);
        }
    }

    /// Replaces `e` in the active edge list by the next edge of its bound,
    /// which inherits its output and winding state. Returns the new edge.
    pub(crate) fn update_edge_into_ael(&mut self, e: EdgeIdx) -> Result<EdgeIdx, Error> {
        let Some(next) = self.edges[e].next_in_lml else {
            return Err(Error::TopologicalInconsistency);
        };
        let old = self.edges[e].clone();
        match old.prev_in_ael {
            Some(p) => self.edges[p].next_in_ael = Some(next),
            None => self.active = Some(next),
        }
        if let Some(n) = old.next_in_ael {
            self.edges[n].prev_in_ael = Some(next);
        }
        let new = &mut self.edges[next];
        new.out = old.out;
        new.side = old.side;
        new.wind_delta = old.wind_delta;
        new.wind_cnt = old.wind_cnt;
        new.wind_cnt2 = old.wind_cnt2;
        new.curr = new.bot;
        new.prev_in_ael = old.prev_in_ael;
        new.next_in_ael = old.next_in_ael;
        if !new.is_horizontal() {
            let top_y = new.top.y;
            self.insert_scanbeam(top_y);
        }
        Ok(next)
    }

    fn is_even_odd(&self, e: EdgeIdx) -> bool {
        self.fill_rules(e).0 == FillRule::EvenOdd
    }

    fn is_even_odd_alt(&self, e: EdgeIdx) -> bool {
        self.fill_rules(e).1 == FillRule::EvenOdd
    }

    /// Computes the winding counts of a newly inserted edge from its left neighbors.
    pub(crate) fn set_winding_count(&mut self, e: EdgeIdx) {
        let edge = &self.edges[e];
        let (poly_type, wind_delta) = (edge.poly_type, edge.wind_delta);

        // The nearest closed edge of the same operand to the left.
        let mut left = edge.prev_in_ael;
        while let Some(l) = left {
            let le = &self.edges[l];
            if le.poly_type == poly_type && le.wind_delta != 0 {
                break;
            }
            left = le.prev_in_ael;
        }

        let (wind_cnt, mut wind_cnt2, mut scan) = match left {
            None => {
                let wc = if wind_delta == 0 {
                    let (own, _) = self.fill_rules(e);
                    if own == FillRule::Negative {
                        -1
                    } else {
                        1
                    }
                } else {
                    wind_delta
                };
                (wc, 0, self.active)
            }
            Some(l) if wind_delta == 0 && self.op != BooleanOp::Union => {
                let le = &self.edges[l];
                (1, le.wind_cnt2, le.next_in_ael)
            }
            Some(l) if self.is_even_odd(e) => {
                let le = &self.edges[l];
                let wc = if wind_delta == 0 {
                    // An open path: are we inside a polygon of our own operand?
                    let mut inside = true;
                    let mut e2 = le.prev_in_ael;
                    while let Some(x) = e2 {
                        let xe = &self.edges[x];
                        if xe.poly_type == le.poly_type && xe.wind_delta != 0 {
                            inside = !inside;
                        }
                        e2 = xe.prev_in_ael;
                    }
                    if inside {
                        0
                    } else {
                        1
                    }
                } else {
                    wind_delta
                };
                (wc, le.wind_cnt2, le.next_in_ael)
            }
            Some(l) => {
                let le = &self.edges[l];
                let wc = if le.wind_cnt * le.wind_delta < 0 {
                    // The left edge takes the count towards zero, so we're
                    // outside the polygon it bounds.
                    if le.wind_cnt.abs() > 1 {
                        if le.wind_delta * wind_delta < 0 {
                            le.wind_cnt
                        } else {
                            le.wind_cnt + wind_delta
                        }
                    } else if wind_delta == 0 {
                        1
                    } else {
                        wind_delta
                    }
                } else if wind_delta == 0 {
                    if le.wind_cnt < 0 {
                        le.wind_cnt - 1
                    } else {
                        le.wind_cnt + 1
                    }
                } else if le.wind_delta * wind_delta < 0 {
                    le.wind_cnt
                } else {
                    le.wind_cnt + wind_delta
                };
                (wc, le.wind_cnt2, le.next_in_ael)
            }
        };

        // The other operand's count accumulates over everything in between.
        let even_odd_alt = self.is_even_odd_alt(e);
        while let Some(x) = scan {
            if x == e {
                break;
            }
            let xe = &self.edges[x];
            if even_odd_alt {
                if xe.wind_delta != 0 {
                    wind_cnt2 = if wind_cnt2 == 0 { 1 } else { 0 };
                }
            } else {
                wind_cnt2 += xe.wind_delta;
            }
            scan = xe.next_in_ael;
        }

        let edge = &mut self.edges[e];
        edge.wind_cnt = wind_cnt;
        edge.wind_cnt2 = wind_cnt2;
    }

    /// Is this edge on the boundary of the result?
    pub(crate) fn is_contributing(&self, e: EdgeIdx) -> bool {
        let (own, other) = self.fill_rules(e);
        let edge = &self.edges[e];

        let own_ok = match own {
            // An open path flagged as inside a polygon of its own operand.
            FillRule::EvenOdd => edge.wind_delta != 0 || edge.wind_cnt == 1,
            FillRule::NonZero => edge.wind_cnt.abs() == 1,
            FillRule::Positive => edge.wind_cnt == 1,
            FillRule::Negative => edge.wind_cnt == -1,
        };
        if !own_ok {
            return false;
        }

        let inside_other = other.is_inside(edge.wind_cnt2);
        match self.op {
            BooleanOp::Intersection => inside_other,
            BooleanOp::Union => !inside_other,
            BooleanOp::Difference => match edge.poly_type {
                PathType::Subject => !inside_other,
                PathType::Clip => inside_other,
            },
            BooleanOp::Xor => edge.wind_delta != 0 || !inside_other,
        }
    }

    /// Handles the crossing of `e1` and `e2` at `pt`, updating winding counts
    /// and output. `e1` must be the one on the right above the crossing.
    pub(crate) fn intersect_edges(
        &mut self,
        e1: EdgeIdx,
        e2: EdgeIdx,
        pt: Point,
    ) -> Result<(), Error> {
        let e1_contributing = self.edges[e1].out.is_assigned();
        let e2_contributing = self.edges[e2].out.is_assigned();
        let (wd1, wd2) = (self.edges[e1].wind_delta, self.edges[e2].wind_delta);
        let (pt1, pt2) = (self.edges[e1].poly_type, self.edges[e2].poly_type);

        if wd1 == 0 || wd2 == 0 {
            self.intersect_open_edge(e1, e2, pt, e1_contributing, e2_contributing);
            return Ok(());
        }

        // Winding counts.
        if pt1 == pt2 {
            if self.is_even_odd(e1) {
                let old = self.edges[e1].wind_cnt;
                self.edges[e1].wind_cnt = self.edges[e2].wind_cnt;
                self.edges[e2].wind_cnt = old;
            } else {
                let edge1 = &mut self.edges[e1];
                if edge1.wind_cnt + wd2 == 0 {
                    edge1.wind_cnt = -edge1.wind_cnt;
                } else {
                    edge1.wind_cnt += wd2;
                }
                let edge2 = &mut self.edges[e2];
                if edge2.wind_cnt - wd1 == 0 {
                    edge2.wind_cnt = -edge2.wind_cnt;
                } else {
                    edge2.wind_cnt -= wd1;
                }
            }
        } else {
            let e2_even_odd = self.is_even_odd(e2);
            let e1_even_odd = self.is_even_odd(e1);
            let edge1 = &mut self.edges[e1];
            if e2_even_odd {
                edge1.wind_cnt2 = if edge1.wind_cnt2 == 0 { 1 } else { 0 };
            } else {
                edge1.wind_cnt2 += wd2;
            }
            let edge2 = &mut self.edges[e2];
            if e1_even_odd {
                edge2.wind_cnt2 = if edge2.wind_cnt2 == 0 { 1 } else { 0 };
            } else {
                edge2.wind_cnt2 -= wd1;
            }
        }

        let (e1_fill, e1_fill2) = self.fill_rules(e1);
        let (e2_fill, e2_fill2) = self.fill_rules(e2);
        let e1_wc = e1_fill.depth(self.edges[e1].wind_cnt);
        let e2_wc = e2_fill.depth(self.edges[e2].wind_cnt);
        let at_boundary = |wc: i32| wc == 0 || wc == 1;

        if e1_contributing && e2_contributing {
            if !at_boundary(e1_wc)
                || !at_boundary(e2_wc)
                || (pt1 != pt2 && self.op != BooleanOp::Xor)
            {
                self.add_local_max_poly(e1, e2, pt);
            } else {
                self.add_out_pt(e1, pt);
                self.add_out_pt(e2, pt);
                self.swap_sides(e1, e2);
                self.swap_outs(e1, e2);
            }
        } else if e1_contributing {
            if at_boundary(e2_wc) {
                self.add_out_pt(e1, pt);
                self.swap_sides(e1, e2);
                self.swap_outs(e1, e2);
            }
        } else if e2_contributing {
            if at_boundary(e1_wc) {
                self.add_out_pt(e2, pt);
                self.swap_sides(e1, e2);
                self.swap_outs(e1, e2);
            }
        } else if at_boundary(e1_wc) && at_boundary(e2_wc) {
            // Neither edge is contributing yet.
            let e1_wc2 = e1_fill2.depth(self.edges[e1].wind_cnt2);
            let e2_wc2 = e2_fill2.depth(self.edges[e2].wind_cnt2);

            if pt1 != pt2 {
                self.add_local_min_poly(e1, e2, pt);
            } else if e1_wc == 1 && e2_wc == 1 {
                let starts = match self.op {
                    BooleanOp::Intersection => e1_wc2 > 0 && e2_wc2 > 0,
                    BooleanOp::Union => e1_wc2 <= 0 && e2_wc2 <= 0,
                    BooleanOp::Difference => {
                        (pt1 == PathType::Clip && e1_wc2 > 0 && e2_wc2 > 0)
                            || (pt1 == PathType::Subject && e1_wc2 <= 0 && e2_wc2 <= 0)
                    }
                    BooleanOp::Xor => true,
                };
                if starts {
                    self.add_local_min_poly(e1, e2, pt);
                }
            } else {
                self.swap_sides(e1, e2);
            }
        }
        Ok(())
    }

    /// Crossings involving an open path only ever toggle the open path's
    /// output on or off.
    fn intersect_open_edge(
        &mut self,
        e1: EdgeIdx,
        e2: EdgeIdx,
        pt: Point,
        e1_contributing: bool,
        e2_contributing: bool,
    ) {
        let (a, b) = (self.edges[e1].clone(), self.edges[e2].clone());
        if a.wind_delta == 0 && b.wind_delta == 0 {
            // Two open paths never interact.
            return;
        }
        if a.poly_type == b.poly_type && a.wind_delta != b.wind_delta && self.op == BooleanOp::Union
        {
            // An open subject crossing a closed subject.
            if a.wind_delta == 0 {
                if e2_contributing {
                    self.add_out_pt(e1, pt);
                    if e1_contributing {
                        self.edges[e1].out = OutSlot::Unassigned;
                    }
                }
            } else if e1_contributing {
                self.add_out_pt(e2, pt);
                if e2_contributing {
                    self.edges[e2].out = OutSlot::Unassigned;
                }
            }
        } else if a.poly_type != b.poly_type {
            // Toggle the open path on or off as it crosses a clip boundary.
            if a.wind_delta == 0
                && b.wind_cnt.abs() == 1
                && (self.op != BooleanOp::Union || b.wind_cnt2 == 0)
            {
                self.add_out_pt(e1, pt);
                if e1_contributing {
                    self.edges[e1].out = OutSlot::Unassigned;
                }
            } else if b.wind_delta == 0
                && a.wind_cnt.abs() == 1
                && (self.op != BooleanOp::Union || a.wind_cnt2 == 0)
            {
                self.add_out_pt(e2, pt);
                if e2_contributing {
                    self.edges[e2].out = OutSlot::Unassigned;
                }
            }
        }
    }

    fn swap_sides(&mut self, e1: EdgeIdx, e2: EdgeIdx) {
        let s = self.edges[e1].side;
        self.edges[e1].side = self.edges[e2].side;
        self.edges[e2].side = s;
    }

    fn swap_outs(&mut self, e1: EdgeIdx, e2: EdgeIdx) {
        let o = self.edges[e1].out;
        self.edges[e1].out = self.edges[e2].out;
        self.edges[e2].out = o;
    }
}

/// Swaps two elements of a doubly linked list threaded through the edge
/// arena, returning the new head if it changed.
fn swap_in_list(
    c: &mut Clipper,
    e1: EdgeIdx,
    e2: EdgeIdx,
    next: impl Fn(&Clipper, EdgeIdx) -> Option<EdgeIdx>,
    prev: impl Fn(&Clipper, EdgeIdx) -> Option<EdgeIdx>,
    set_next: impl Fn(&mut Clipper, EdgeIdx, Option<EdgeIdx>),
    set_prev: impl Fn(&mut Clipper, EdgeIdx, Option<EdgeIdx>),
) -> Option<EdgeIdx> {
    if next(c, e1) == Some(e2) {
        let n = next(c, e2);
        if let Some(n) = n {
            set_prev(c, n, Some(e1));
        }
        let p = prev(c, e1);
        if let Some(p) = p {
            set_next(c, p, Some(e2));
        }
        set_prev(c, e2, p);
        set_next(c, e2, Some(e1));
        set_prev(c, e1, Some(e2));
        set_next(c, e1, n);
    } else if next(c, e2) == Some(e1) {
        let n = next(c, e1);
        if let Some(n) = n {
            set_prev(c, n, Some(e2));
        }
        let p = prev(c, e2);
        if let Some(p) = p {
            set_next(c, p, Some(e1));
        }
        set_prev(c, e1, p);
        set_next(c, e1, Some(e2));
        set_prev(c, e2, Some(e1));
        set_next(c, e2, n);
    } else {
        let (n1, p1) = (next(c, e1), prev(c, e1));
        let (n2, p2) = (next(c, e2), prev(c, e2));
        set_next(c, e1, n2);
        if let Some(n) = n2 {
            set_prev(c, n, Some(e1));
        }
        set_prev(c, e1, p2);
        if let Some(p) = p2 {
            set_next(c, p, Some(e1));
        }
        set_next(c, e2, n1);
        if let Some(n) = n1 {
            set_prev(c, n, Some(e2));
        }
        set_prev(c, e2, p1);
        if let Some(p) = p1 {
            set_next(c, p, Some(e2));
        }
    }

    if prev(c, e1).is_none() {
        Some(e1)
    } else if prev(c, e2).is_none() {
        Some(e2)
    } else {
        None
    }
}
