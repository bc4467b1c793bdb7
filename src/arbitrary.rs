//! Utilities for fuzz and/or property testing using `arbitrary`.
//!
//! Random polygons almost never have coincident vertices or collinear
//! edges, but those are where sweep algorithms go wrong. The generators here
//! bias towards them: new coordinates have a good chance of repeating or
//! nearly repeating ones that came before.

use arbitrary::Unstructured;

use crate::{BooleanOp, FillRule, Path, Paths, Point};

const COORD_RANGE: f64 = 1e3;

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a coordinate, with a chance of reusing (or almost reusing) one of
/// the coordinates in `seen`.
fn coordinate(seen: &[f64], u: &mut Unstructured<'_>) -> Result<f64, arbitrary::Error> {
    let reuse: u8 = u.int_in_range(0..=3)?;
    if reuse == 0 || seen.is_empty() {
        return float_in_range(-COORD_RANGE, COORD_RANGE, u);
    }
    let orig = *u.choose(seen)?;
    if reuse == 1 {
        let ulps: i32 = u.int_in_range(-32..=32)?;
        Ok(orig * (1.0 + ulps as f64 * f64::EPSILON))
    } else {
        Ok(orig)
    }
}

/// Generate a closed path with between 3 and 16 vertices.
///
/// Coordinates are drawn partly from `seen`, and every new coordinate is
/// added to it.
pub fn path(seen: &mut Vec<f64>, u: &mut Unstructured<'_>) -> Result<Path, arbitrary::Error> {
    let len = u.int_in_range(3..=16)?;
    let mut ret = Vec::with_capacity(len);
    for _ in 0..len {
        let x = coordinate(seen, u)?;
        let y = coordinate(seen, u)?;
        seen.push(x);
        seen.push(y);
        ret.push(Point::new(x, y));
    }
    Ok(ret)
}

/// Generate a handful of closed paths.
pub fn paths(seen: &mut Vec<f64>, u: &mut Unstructured<'_>) -> Result<Paths, arbitrary::Error> {
    let count = u.int_in_range(1..=4)?;
    (0..count).map(|_| path(seen, u)).collect()
}

/// A complete input for a Boolean operation.
#[derive(Clone, Debug)]
pub struct BooleanOpInput {
    /// The subject paths.
    pub subject: Paths,
    /// The clip paths.
    pub clip: Paths,
    /// The fill rule, used for both operands.
    pub fill_rule: FillRule,
    /// The operation.
    pub op: BooleanOp,
}

impl<'a> arbitrary::Arbitrary<'a> for BooleanOpInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut seen = Vec::new();
        let subject = paths(&mut seen, u)?;
        let clip = paths(&mut seen, u)?;
        let fill_rule = *u.choose(&[
            FillRule::EvenOdd,
            FillRule::NonZero,
            FillRule::Positive,
            FillRule::Negative,
        ])?;
        let op = *u.choose(&[
            BooleanOp::Intersection,
            BooleanOp::Union,
            BooleanOp::Difference,
            BooleanOp::Xor,
        ])?;
        Ok(BooleanOpInput {
            subject,
            clip,
            fill_rule,
            op,
        })
    }
}

#[cfg(test)]
mod tests {
    use arbitrary::Arbitrary;

    use super::*;

    #[test]
    fn reuses_coordinates() {
        let bytes: Vec<u8> = (0..=255).cycle().take(4096).collect();
        let mut u = Unstructured::new(&bytes);
        let mut seen = Vec::new();
        let ps = paths(&mut seen, &mut u).unwrap();
        let n: usize = ps.iter().map(|p| p.len()).sum();
        assert_eq!(seen.len(), 2 * n);
        assert!(ps.iter().all(|p| (3..=16).contains(&p.len())));
        assert!(seen.iter().all(|x| x.abs() <= COORD_RANGE * 1.01));
    }

    #[test]
    fn whole_input() {
        let bytes = [7u8; 1024];
        let input = BooleanOpInput::arbitrary(&mut Unstructured::new(&bytes)).unwrap();
        assert!(!input.subject.is_empty());
        assert!(!input.clip.is_empty());
    }
}
