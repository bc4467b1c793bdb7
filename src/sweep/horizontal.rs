//! Horizontal edges.
//!
//! A horizontal edge doesn't fit into a scanbeam, so instead of being placed
//! in the active edge list by `x` it gets swept along the scanline from one
//! end to the other, crossing every edge it passes over.

use crate::{
    edges::{EdgeIdx, OutSlot},
    geom::slopes_equal4,
    output::OutPtIdx,
    Error, Point,
};

use super::{scanbeam::horz_segments_overlap, Clipper};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    LeftToRight,
    RightToLeft,
}

impl Clipper {
    pub(crate) fn in_ael(&self, e: EdgeIdx) -> bool {
        let edge = &self.edges[e];
        edge.prev_in_ael.is_some() || edge.next_in_ael.is_some() || self.active == Some(e)
    }

    /// The edge sharing `e`'s top vertex as a local maximum, if any.
    pub(crate) fn get_maxima_pair(&self, e: EdgeIdx) -> Option<EdgeIdx> {
        let edge = &self.edges[e];
        [edge.next, edge.prev].into_iter().find(|&other| {
            let o = &self.edges[other];
            o.top == edge.top && o.next_in_lml.is_none()
        })
    }

    /// Like [`get_maxima_pair`](Self::get_maxima_pair), but only returns a pair
    /// that is still taking part in the sweep.
    pub(crate) fn get_maxima_pair_ex(&self, e: EdgeIdx) -> Option<EdgeIdx> {
        self.get_maxima_pair(e).filter(|&p| {
            self.edges[p].out != OutSlot::Skip && (self.in_ael(p) || self.edges[p].is_horizontal())
        })
    }

    fn horz_direction(&self, e: EdgeIdx) -> (Direction, f64, f64) {
        let edge = &self.edges[e];
        if edge.bot.x < edge.top.x {
            (Direction::LeftToRight, edge.bot.x, edge.top.x)
        } else {
            (Direction::RightToLeft, edge.top.x, edge.bot.x)
        }
    }

    fn next_in_ael_towards(&self, e: EdgeIdx, dir: Direction) -> Option<EdgeIdx> {
        match dir {
            Direction::LeftToRight => self.edges[e].next_in_ael,
            Direction::RightToLeft => self.edges[e].prev_in_ael,
        }
    }

    pub(crate) fn process_horizontals(&mut self) -> Result<(), Error> {
        while let Some(e) = self.pop_edge_from_sel() {
            self.process_horizontal(e)?;
        }
        Ok(())
    }

    /// Joins `op` with the output of every pending horizontal that overlaps
    /// `horz`, and remembers it as a ghost join for horizontals starting later.
    fn join_overlapping_horizontals(&mut self, horz: EdgeIdx, op: OutPtIdx, ghost_off: Point) {
        let (bot_x, top_x) = (self.edges[horz].bot.x, self.edges[horz].top.x);
        let mut next = self.sorted;
        while let Some(h) = next {
            let he = &self.edges[h];
            next = he.next_in_sel;
            if he.out.is_assigned() && horz_segments_overlap(bot_x, top_x, he.bot.x, he.top.x) {
                let top = he.top;
                if let Some(op2) = self.get_last_out_pt(h) {
                    self.add_join(op2, op, top);
                }
            }
        }
        self.add_ghost_join(op, ghost_off);
    }

    fn process_horizontal(&mut self, mut horz: EdgeIdx) -> Result<(), Error> {
        let is_open = self.edges[horz].wind_delta == 0;
        let eps = self.eps;
        let (mut dir, mut horz_left, mut horz_right) = self.horz_direction(horz);

        let mut last_horz = horz;
        while let Some(n) = self.edges[last_horz].next_in_lml {
            if !self.edges[n].is_horizontal() {
                break;
            }
            last_horz = n;
        }
        let max_pair = if self.edges[last_horz].next_in_lml.is_none() {
            self.get_maxima_pair(last_horz)
        } else {
            None
        };

        // Cursors into the (sorted) maxima: `fwd` counts from the front and
        // `rev` counts the entries not yet passed from the back.
        let maxima = std::mem::take(&mut self.maxima);
        let (mut fwd, mut rev) = (0, maxima.len());
        if !maxima.is_empty() {
            let bot_x = self.edges[horz].bot.x;
            let last_top_x = self.edges[last_horz].top.x;
            match dir {
                Direction::LeftToRight => {
                    while fwd < maxima.len() && maxima[fwd] <= bot_x {
                        fwd += 1;
                    }
                    if fwd < maxima.len() && maxima[fwd] >= last_top_x {
                        fwd = maxima.len();
                    }
                }
                Direction::RightToLeft => {
                    while rev > 0 && maxima[rev - 1] > bot_x {
                        rev -= 1;
                    }
                    if rev > 0 && maxima[rev - 1] <= last_top_x {
                        rev = 0;
                    }
                }
            }
        }

        let mut op1 = None;
        let result = (|| -> Result<bool, Error> {
            loop {
                let is_last_horz = horz == last_horz;
                let mut next = self.next_in_ael_towards(horz, dir);
                while let Some(e) = next {
                    let contributing = self.edges[horz].out.is_assigned() && !is_open;
                    let horz_y = self.edges[horz].bot.y;

                    // Add vertices where maxima touch the horizontal, so that
                    // strictly simple output can be split there.
                    let e_x = self.edges[e].curr.x;
                    match dir {
                        Direction::LeftToRight => {
                            while fwd < maxima.len() && maxima[fwd] < e_x {
                                if contributing {
                                    self.add_out_pt(horz, Point::new(maxima[fwd], horz_y));
                                }
                                fwd += 1;
                            }
                        }
                        Direction::RightToLeft => {
                            while rev > 0 && maxima[rev - 1] > e_x {
                                if contributing {
                                    self.add_out_pt(horz, Point::new(maxima[rev - 1], horz_y));
                                }
                                rev -= 1;
                            }
                        }
                    }

                    if (dir == Direction::LeftToRight && e_x > horz_right)
                        || (dir == Direction::RightToLeft && e_x < horz_left)
                    {
                        break;
                    }

                    // At the end of an intermediate horizontal, edges with a
                    // smaller inverse slope stay to the right of the next edge.
                    let h = &self.edges[horz];
                    if let Some(n) = h.next_in_lml {
                        if (e_x - h.top.x).abs() <= eps && self.edges[e].dx < self.edges[n].dx {
                            break;
                        }
                    }

                    if contributing {
                        let curr = self.edges[e].curr;
                        let op = self.add_out_pt(horz, curr);
                        op1 = Some(op);
                        let bot = self.edges[horz].bot;
                        self.join_overlapping_horizontals(horz, op, bot);
                    }

                    if Some(e) == max_pair && is_last_horz {
                        if self.edges[horz].out.is_assigned() {
                            let top = self.edges[horz].top;
                            self.add_local_max_poly(horz, e, top);
                        }
                        self.delete_from_ael(horz);
                        self.delete_from_ael(e);
                        return Ok(true);
                    }

                    let pt = Point::new(e_x, self.edges[horz].curr.y);
                    match dir {
                        Direction::LeftToRight => self.intersect_edges(horz, e, pt)?,
                        Direction::RightToLeft => self.intersect_edges(e, horz, pt)?,
                    }
                    next = self.next_in_ael_towards(e, dir);
                    self.swap_positions_in_ael(horz, e);
                }

                match self.edges[horz].next_in_lml {
                    Some(n) if self.edges[n].is_horizontal() => {}
                    _ => break,
                }
                horz = self.update_edge_into_ael(horz)?;
                if self.edges[horz].out.is_assigned() {
                    let bot = self.edges[horz].bot;
                    self.add_out_pt(horz, bot);
                }
                (dir, horz_left, horz_right) = self.horz_direction(horz);
            }
            Ok(false)
        })();
        self.maxima = maxima;
        if result? {
            return Ok(());
        }

        if self.edges[horz].out.is_assigned() && op1.is_none() {
            if let Some(op) = self.get_last_out_pt(horz) {
                let top = self.edges[horz].top;
                self.join_overlapping_horizontals(horz, op, top);
            }
        }

        if self.edges[horz].next_in_lml.is_none() {
            if self.edges[horz].out.is_assigned() {
                let top = self.edges[horz].top;
                self.add_out_pt(horz, top);
            }
            self.delete_from_ael(horz);
            return Ok(());
        }

        if !self.edges[horz].out.is_assigned() {
            self.update_edge_into_ael(horz)?;
            return Ok(());
        }

        let top = self.edges[horz].top;
        let op1 = self.add_out_pt(horz, top);
        let horz = self.update_edge_into_ael(horz)?;
        let he = self.edges[horz].clone();
        if he.wind_delta == 0 {
            return Ok(());
        }

        // The edge continuing upwards may overlap a neighbor it touches.
        let joinable = |c: &Self, n: EdgeIdx| {
            let ne = &c.edges[n];
            (ne.curr.x - he.bot.x).abs() <= eps
                && ne.curr.y == he.bot.y
                && ne.wind_delta != 0
                && ne.out.is_assigned()
                && ne.curr.y > ne.top.y
                && slopes_equal4(he.bot, he.top, ne.bot, ne.top, eps)
        };
        let neighbor = he
            .prev_in_ael
            .filter(|&p| joinable(self, p))
            .or_else(|| he.next_in_ael.filter(|&n| joinable(self, n)));
        if let Some(n) = neighbor {
            let op2 = self.add_out_pt(n, he.bot);
            self.add_join(op1, op2, he.top);
        }
        Ok(())
    }
}
