//! The scanbeam queue, and inserting local minima into the active edge list.

use crate::{
    edges::{EdgeIdx, LocalMinimum},
    geom::slopes_equal4,
    num::CheapOrderedFloat,
    output::OutPtIdx,
    Error,
};

use super::Clipper;

/// Do the `x` ranges `[a0, a1]` and `[b0, b1]` (in either order) overlap in
/// more than a point?
pub(crate) fn horz_segments_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> bool {
    let (a0, a1) = if a0 > a1 { (a1, a0) } else { (a0, a1) };
    let (b0, b1) = if b0 > b1 { (b1, b0) } else { (b0, b1) };
    a0 < b1 && b0 < a1
}

impl Clipper {
    pub(crate) fn insert_scanbeam(&mut self, y: f64) {
        self.scanbeam.push(CheapOrderedFloat::from(y));
    }

    /// Pops the next (largest) `y`, dropping any duplicates of it.
    pub(crate) fn pop_scanbeam(&mut self) -> Option<f64> {
        let y = self.scanbeam.pop()?;
        while self.scanbeam.peek() == Some(&y) {
            self.scanbeam.pop();
        }
        Some(y.into_inner())
    }

    fn pop_local_minimum(&mut self, y: f64) -> Option<LocalMinimum> {
        let lm = *self.minima.get(self.current_lm)?;
        if lm.y != y {
            return None;
        }
        self.current_lm += 1;
        Some(lm)
    }

    /// Starts every bound whose local minimum is at `bot_y`.
    pub(crate) fn insert_local_minima_into_ael(&mut self, bot_y: f64) -> Result<(), Error> {
        while let Some(lm) = self.pop_local_minimum(bot_y) {
            let mut op1 = None;
            match (lm.left, lm.right) {
                (None, Some(rb)) => {
                    self.insert_edge_into_ael(rb, None);
                    self.set_winding_count(rb);
                    if self.is_contributing(rb) {
                        let bot = self.edges[rb].bot;
                        op1 = Some(self.add_out_pt(rb, bot));
                    }
                }
                (Some(lb), None) => {
                    self.insert_edge_into_ael(lb, None);
                    self.set_winding_count(lb);
                    if self.is_contributing(lb) {
                        let bot = self.edges[lb].bot;
                        op1 = Some(self.add_out_pt(lb, bot));
                    }
                    self.insert_scanbeam(self.edges[lb].top.y);
                }
                (Some(lb), Some(rb)) => {
                    self.insert_edge_into_ael(lb, None);
                    self.insert_edge_into_ael(rb, Some(lb));
                    self.set_winding_count(lb);
                    self.edges[rb].wind_cnt = self.edges[lb].wind_cnt;
                    self.edges[rb].wind_cnt2 = self.edges[lb].wind_cnt2;
                    if self.is_contributing(lb) {
                        let bot = self.edges[lb].bot;
                        op1 = Some(self.add_local_min_poly(lb, rb, bot));
                    }
                    self.insert_scanbeam(self.edges[lb].top.y);
                }
                (None, None) => continue,
            }

            if let Some(rb) = lm.right {
                if self.edges[rb].is_horizontal() {
                    self.add_edge_to_sel(rb);
                    if let Some(next) = self.edges[rb].next_in_lml {
                        self.insert_scanbeam(self.edges[next].top.y);
                    }
                } else {
                    self.insert_scanbeam(self.edges[rb].top.y);
                }
            }

            let (Some(lb), Some(rb)) = (lm.left, lm.right) else {
                continue;
            };
            self.join_at_local_minimum(lb, rb, op1)?;
        }
        Ok(())
    }

    /// Registers joins for a freshly inserted pair of bounds that touch
    /// existing output, and crosses the right bound over any edges that
    /// ended up between the two.
    fn join_at_local_minimum(
        &mut self,
        lb: EdgeIdx,
        rb: EdgeIdx,
        op1: Option<OutPtIdx>,
    ) -> Result<(), Error> {
        let eps = self.eps;

        // Output polygons sharing a horizontal edge need joining later.
        if let Some(op1) = op1 {
            if self.edges[rb].is_horizontal() && self.edges[rb].wind_delta != 0 {
                let (rb_bot_x, rb_top_x) = (self.edges[rb].bot.x, self.edges[rb].top.x);
                let ghosts: Vec<_> = self
                    .ghost_joins
                    .iter()
                    .filter(|j| {
                        let x = self.pts[j.op1].pt.x;
                        horz_segments_overlap(x, j.off_pt.x, rb_bot_x, rb_top_x)
                    })
                    .map(|j| (j.op1, j.off_pt))
                    .collect();
                for (op, off) in ghosts {
                    self.add_join(op, op1, off);
                }
            }
        }

        let lb_edge = self.edges[lb].clone();
        if let (Some(op1), Some(prev)) = (op1, lb_edge.prev_in_ael) {
            let prev_edge = &self.edges[prev];
            if lb_edge.out.is_assigned()
                && (prev_edge.curr.x - lb_edge.bot.x).abs() <= eps
                && prev_edge.out.is_assigned()
                && slopes_equal4(prev_edge.bot, prev_edge.top, lb_edge.curr, lb_edge.top, eps)
                && lb_edge.wind_delta != 0
                && prev_edge.wind_delta != 0
            {
                let op2 = self.add_out_pt(prev, lb_edge.bot);
                self.add_join(op1, op2, lb_edge.top);
            }
        }

        if lb_edge.next_in_ael != Some(rb) {
            let rb_edge = self.edges[rb].clone();
            if let (Some(op1), Some(prev)) = (op1, rb_edge.prev_in_ael) {
                let prev_edge = &self.edges[prev];
                if rb_edge.out.is_assigned()
                    && prev_edge.out.is_assigned()
                    && slopes_equal4(prev_edge.curr, prev_edge.top, rb_edge.curr, rb_edge.top, eps)
                    && rb_edge.wind_delta != 0
                    && prev_edge.wind_delta != 0
                {
                    let op2 = self.add_out_pt(prev, rb_edge.bot);
                    self.add_join(op1, op2, rb_edge.top);
                }
            }

            // `intersect_edges` expects its first edge to be on the right above
            // the crossing, which is where the right bound ends up.
            let pt = self.edges[lb].curr;
            let mut e = self.edges[lb].next_in_ael;
            while let Some(ee) = e {
                if ee == rb {
                    break;
                }
                self.intersect_edges(rb, ee, pt)?;
                e = self.edges[ee].next_in_ael;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap() {
        assert!(horz_segments_overlap(0.0, 10.0, 5.0, 15.0));
        assert!(horz_segments_overlap(10.0, 0.0, 15.0, 5.0));
        assert!(!horz_segments_overlap(0.0, 5.0, 5.0, 10.0));
        assert!(!horz_segments_overlap(0.0, 1.0, 2.0, 3.0));
    }

    #[test]
    fn scanbeam_pops_descending_without_duplicates() {
        let mut c = Clipper::new();
        for y in [3.0, 1.0, 3.0, 2.0, 1.0] {
            c.insert_scanbeam(y);
        }
        let mut ys = Vec::new();
        while let Some(y) = c.pop_scanbeam() {
            ys.push(y);
        }
        assert_eq!(ys, vec![3.0, 2.0, 1.0]);
    }
}
