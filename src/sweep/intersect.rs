//! Crossings within a scanbeam, and the edges that end at its top.

use crate::{
    edges::{EdgeIdx, Guard, OutSlot},
    geom::{slopes_equal4, sort_dedup},
    Error, Point,
};

use super::Clipper;

/// Two active edges that swap places at `pt`.
///
/// `e1` is to the left of `e2` below the crossing.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IntersectNode {
    pub e1: EdgeIdx,
    pub e2: EdgeIdx,
    pub pt: Point,
}

impl Clipper {
    pub(crate) fn process_intersections(&mut self, top_y: f64) -> Result<(), Error> {
        if self.active.is_none() {
            return Ok(());
        }
        let res = self.build_intersect_list(top_y).and_then(|()| {
            if self.intersections.len() > 1 {
                self.fixup_intersection_order()?;
            }
            self.process_intersect_list()
        });
        self.sorted = None;
        self.intersections.clear();
        res
    }

    /// Finds the crossings between `bot_y` and `top_y` by bubble sorting the
    /// active edges by their `x` at `top_y`; every swap is a crossing.
    fn build_intersect_list(&mut self, top_y: f64) -> Result<(), Error> {
        let eps = self.eps;
        self.copy_ael_to_sel();
        let mut n = 0;
        let mut e = self.active;
        while let Some(ee) = e {
            let edge = &mut self.edges[ee];
            edge.curr.x = edge.top_x(top_y);
            e = edge.next_in_ael;
            n += 1;
        }

        let mut guard = Guard::new(n * n + 1, "ordering crossings");
        loop {
            let mut modified = false;
            let Some(mut e) = self.sorted else {
                break;
            };
            while let Some(next) = self.edges[e].next_in_sel {
                if self.edges[e].curr.x > self.edges[next].curr.x + eps {
                    guard.step()?;
                    let mut pt = self.intersect_point(e, next);
                    if pt.y < top_y {
                        pt = Point::new(self.edges[e].top_x(top_y), top_y);
                    }
                    self.intersections.push(IntersectNode { e1: e, e2: next, pt });
                    self.swap_positions_in_sel(e, next);
                    modified = true;
                } else {
                    e = next;
                }
            }
            // `e` is now in its final place; shorten the list for the next pass.
            match self.edges[e].prev_in_sel {
                Some(prev) => self.edges[prev].next_in_sel = None,
                None => break,
            }
            if !modified {
                break;
            }
        }
        self.sorted = None;
        Ok(())
    }

    /// Where two active edges cross, clamped to the current scanbeam.
    fn intersect_point(&self, e1: EdgeIdx, e2: EdgeIdx) -> Point {
        let (a, b) = (&self.edges[e1], &self.edges[e2]);
        let mut ip = if a.dx == b.dx {
            let y = a.curr.y;
            Point::new(a.top_x(y), y)
        } else if a.dx == 0.0 {
            let x = a.bot.x;
            if b.is_horizontal() {
                Point::new(x, b.bot.y)
            } else {
                Point::new(x, b.bot.y + (x - b.bot.x) / b.dx)
            }
        } else if b.dx == 0.0 {
            let x = b.bot.x;
            if a.is_horizontal() {
                Point::new(x, a.bot.y)
            } else {
                Point::new(x, a.bot.y + (x - a.bot.x) / a.dx)
            }
        } else {
            let b1 = a.bot.x - a.bot.y * a.dx;
            let b2 = b.bot.x - b.bot.y * b.dx;
            let q = (b2 - b1) / (a.dx - b.dx);
            let x = if a.dx.abs() < b.dx.abs() {
                a.dx * q + b1
            } else {
                b.dx * q + b2
            };
            Point::new(x, q)
        };

        if ip.y < a.top.y || ip.y < b.top.y {
            ip.y = a.top.y.max(b.top.y);
            ip.x = if a.dx.abs() < b.dx.abs() {
                a.top_x(ip.y)
            } else {
                b.top_x(ip.y)
            };
        }
        // Never below the bottom of the scanbeam.
        if ip.y > a.curr.y {
            ip.y = a.curr.y;
            // The more vertical edge gives the better `x`.
            ip.x = if a.dx.abs() > b.dx.abs() {
                b.top_x(ip.y)
            } else {
                a.top_x(ip.y)
            };
        }
        ip
    }

    /// Reorders the crossings so that each one swaps edges that are adjacent
    /// at the time it is processed.
    fn fixup_intersection_order(&mut self) -> Result<(), Error> {
        self.copy_ael_to_sel();
        // Stable, so ties keep the order the bubble sort found them in.
        self.intersections.sort_by(|a, b| b.pt.y.total_cmp(&a.pt.y));
        let adjacent = |c: &Self, node: &IntersectNode| {
            let e1 = &c.edges[node.e1];
            e1.next_in_sel == Some(node.e2) || e1.prev_in_sel == Some(node.e2)
        };
        for i in 0..self.intersections.len() {
            if !adjacent(self, &self.intersections[i]) {
                let j = (i + 1..self.intersections.len())
                    .find(|&j| adjacent(self, &self.intersections[j]))
                    .ok_or(Error::TopologicalInconsistency)?;
                self.intersections.swap(i, j);
            }
            let node = self.intersections[i];
            self.swap_positions_in_sel(node.e1, node.e2);
        }
        Ok(())
    }

    fn process_intersect_list(&mut self) -> Result<(), Error> {
        let nodes = std::mem::take(&mut self.intersections);
        for node in &nodes {
            self.intersect_edges(node.e1, node.e2, node.pt)?;
            self.swap_positions_in_ael(node.e1, node.e2);
        }
        self.intersections = nodes;
        Ok(())
    }

    fn is_maxima(&self, e: EdgeIdx, y: f64) -> bool {
        let edge = &self.edges[e];
        edge.top.y == y && edge.next_in_lml.is_none()
    }

    fn is_intermediate(&self, e: EdgeIdx, y: f64) -> bool {
        let edge = &self.edges[e];
        edge.top.y == y && edge.next_in_lml.is_some()
    }

    pub(crate) fn process_edges_at_top_of_scanbeam(&mut self, top_y: f64) -> Result<(), Error> {
        let eps = self.eps;
        let mut e = self.active;
        while let Some(mut ee) = e {
            // Maxima get treated like bent horizontals, unless they're
            // actually the end of a horizontal.
            let is_max = self.is_maxima(ee, top_y)
                && self
                    .get_maxima_pair_ex(ee)
                    .map_or(true, |p| !self.edges[p].is_horizontal());
            if is_max {
                if self.strictly_simple() {
                    self.maxima.push(self.edges[ee].top.x);
                }
                let prev = self.edges[ee].prev_in_ael;
                self.do_maxima(ee)?;
                e = match prev {
                    Some(p) => self.edges[p].next_in_ael,
                    None => self.active,
                };
                continue;
            }

            let promote_horizontal = self.is_intermediate(ee, top_y)
                && self.edges[ee]
                    .next_in_lml
                    .is_some_and(|n| self.edges[n].is_horizontal());
            if promote_horizontal {
                ee = self.update_edge_into_ael(ee)?;
                if self.edges[ee].out.is_assigned() {
                    let bot = self.edges[ee].bot;
                    self.add_out_pt(ee, bot);
                }
                self.add_edge_to_sel(ee);
            } else {
                let edge = &mut self.edges[ee];
                edge.curr = Point::new(edge.top_x(top_y), top_y);
            }

            // In strictly simple mode, two edges touching here both get a vertex.
            if self.strictly_simple() {
                let edge = &self.edges[ee];
                if let Some(prev) = edge.prev_in_ael {
                    let pe = &self.edges[prev];
                    if edge.out.is_assigned()
                        && edge.wind_delta != 0
                        && pe.out.is_assigned()
                        && (pe.curr.x - edge.curr.x).abs() <= eps
                        && pe.wind_delta != 0
                    {
                        let pt = edge.curr;
                        let op = self.add_out_pt(prev, pt);
                        let op2 = self.add_out_pt(ee, pt);
                        self.add_join(op, op2, pt);
                    }
                }
            }
            e = self.edges[ee].next_in_ael;
        }

        sort_dedup(&mut self.maxima);
        let res = self.process_horizontals();
        self.maxima.clear();
        res?;

        let mut e = self.active;
        while let Some(mut ee) = e {
            if self.is_intermediate(ee, top_y) {
                let op = if self.edges[ee].out.is_assigned() {
                    let top = self.edges[ee].top;
                    Some(self.add_out_pt(ee, top))
                } else {
                    None
                };
                ee = self.update_edge_into_ael(ee)?;
                if let Some(op) = op {
                    self.join_continuing_edge(ee, op);
                }
            }
            e = self.edges[ee].next_in_ael;
        }
        Ok(())
    }

    /// If the edge `e` that just replaced its predecessor overlaps an active
    /// neighbor starting at the same point, their output will need joining.
    fn join_continuing_edge(&mut self, e: EdgeIdx, op: crate::output::OutPtIdx) {
        let eps = self.eps;
        let edge = self.edges[e].clone();
        if edge.wind_delta == 0 {
            return;
        }
        let joinable = |c: &Self, n: EdgeIdx| {
            let ne = &c.edges[n];
            (ne.curr.x - edge.bot.x).abs() <= eps
                && ne.curr.y == edge.bot.y
                && ne.out.is_assigned()
                && ne.curr.y > ne.top.y
                && ne.wind_delta != 0
                && slopes_equal4(edge.curr, edge.top, ne.curr, ne.top, eps)
        };
        let neighbor = edge
            .prev_in_ael
            .filter(|&p| joinable(self, p))
            .or_else(|| edge.next_in_ael.filter(|&n| joinable(self, n)));
        if let Some(n) = neighbor {
            let op2 = self.add_out_pt(n, edge.bot);
            self.add_join(op, op2, edge.top);
        }
    }

    /// Finishes a bound at its local maximum, crossing it over the edges
    /// between it and its partner.
    fn do_maxima(&mut self, e: EdgeIdx) -> Result<(), Error> {
        let Some(pair) = self.get_maxima_pair_ex(e) else {
            if self.edges[e].out.is_assigned() {
                let top = self.edges[e].top;
                self.add_out_pt(e, top);
            }
            self.delete_from_ael(e);
            return Ok(());
        };

        let top = self.edges[e].top;
        let mut guard = Guard::new(self.edges.len() + 1, "closing a local maximum");
        while let Some(next) = self.edges[e].next_in_ael {
            if next == pair {
                break;
            }
            guard.step()?;
            self.intersect_edges(e, next, top)?;
            self.swap_positions_in_ael(e, next);
        }

        let (out, pair_out) = (self.edges[e].out, self.edges[pair].out);
        if out == OutSlot::Unassigned && pair_out == OutSlot::Unassigned {
            self.delete_from_ael(e);
            self.delete_from_ael(pair);
        } else if out.is_assigned() && pair_out.is_assigned() {
            self.add_local_max_poly(e, pair, top);
            self.delete_from_ael(e);
            self.delete_from_ael(pair);
        } else if self.edges[e].wind_delta == 0 {
            // The end of an open path.
            if out.is_assigned() {
                self.add_out_pt(e, top);
                self.edges[e].out = OutSlot::Unassigned;
            }
            self.delete_from_ael(e);
            if pair_out.is_assigned() {
                self.add_out_pt(pair, top);
                self.edges[pair].out = OutSlot::Unassigned;
            }
            self.delete_from_ael(pair);
        } else {
            tracing::debug!(?e, ?pair, "maximum with only one contributing edge");
            return Err(Error::TopologicalInconsistency);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::IntersectNode;
    use crate::{area, edges::EdgeIdx, BooleanOp, Clipper, Error, FillRule, PathType, Point};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn union_self(path: &[Point], fill: FillRule) -> Vec<Vec<Point>> {
        let mut c = Clipper::new();
        c.add_path(path, PathType::Subject, true).unwrap();
        c.execute(BooleanOp::Union, fill, fill).unwrap()
    }

    #[test]
    fn bowtie_splits_into_two_triangles() {
        let out = union_self(
            &[p(0.0, 0.0), p(10.0, 10.0), p(10.0, 0.0), p(0.0, 10.0)],
            FillRule::EvenOdd,
        );
        assert_eq!(out.len(), 2);
        for path in &out {
            assert_eq!(path.len(), 3);
            assert!((area(path) - 25.0).abs() < 1e-9);
        }
    }

    #[test]
    fn star_fill_rules() {
        // A five-pointed star drawn in one stroke has a pentagon in the middle
        // with winding number 2.
        let star: Vec<Point> = (0..5)
            .map(|i| {
                let a = std::f64::consts::FRAC_PI_2 + i as f64 * 4.0 * std::f64::consts::PI / 5.0;
                p(100.0 * a.cos(), 100.0 * a.sin())
            })
            .collect();
        let even_odd = union_self(&star, FillRule::EvenOdd);
        let non_zero = union_self(&star, FillRule::NonZero);
        let eo_area: f64 = even_odd.iter().map(|p| area(p)).sum();
        let nz_area: f64 = non_zero.iter().map(|p| area(p)).sum();
        assert_eq!(non_zero.len(), 1);
        assert_eq!(non_zero[0].len(), 10);
        assert!(nz_area > eo_area);
    }

    #[test]
    fn many_crossings_in_one_scanbeam() {
        // Thin slanted strips that all cross each other between the same two
        // scanlines.
        let mut c = Clipper::new();
        for i in 0..6 {
            let x = i as f64 * 3.0;
            c.add_path(
                &[p(x, 0.0), p(x + 1.0, 0.0), p(20.0 - x, 10.0), p(19.0 - x, 10.0)],
                PathType::Subject,
                true,
            )
            .unwrap();
        }
        let out = c
            .execute(BooleanOp::Union, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        assert!(!out.is_empty());
        let total: f64 = out.iter().map(|p| area(p)).sum();
        // Each strip has area 10 and they overlap, so the union is smaller.
        assert!(total > 10.0 && total < 60.0, "{total}");
    }

    #[test]
    fn unorderable_crossings_leave_the_engine_usable() {
        let mut c = Clipper::new();
        for x in [0.0, 10.0, 20.0] {
            c.add_path(
                &[p(x, 0.0), p(x + 5.0, 0.0), p(x + 5.0, 10.0), p(x, 10.0)],
                PathType::Subject,
                true,
            )
            .unwrap();
        }
        c.op = BooleanOp::Union;
        c.subj_fill = FillRule::NonZero;
        c.clip_fill = FillRule::NonZero;
        c.reset();
        let bot_y = c.pop_scanbeam().unwrap();
        c.insert_local_minima_into_ael(bot_y).unwrap();

        let mut ael: Vec<EdgeIdx> = Vec::new();
        let mut e = c.active;
        while let Some(ee) = e {
            ael.push(ee);
            e = c.edges[ee].next_in_ael;
        }
        assert!(ael.len() > 2);
        // The outermost active edges are never neighbors.
        let node = IntersectNode {
            e1: ael[0],
            e2: ael[ael.len() - 1],
            pt: p(12.0, 5.0),
        };
        c.intersections.extend([node, node]);
        assert_matches!(
            c.fixup_intersection_order(),
            Err(Error::TopologicalInconsistency)
        );

        let out = c
            .execute(BooleanOp::Union, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        assert_eq!(out.len(), 3);
        let total: f64 = out.iter().map(|p| area(p)).sum();
        assert!((total - 150.0).abs() < 1e-9, "{out:?}");
    }
}
