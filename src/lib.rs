#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
#[cfg(feature = "debug-svg")]
pub mod debug_svg;
mod edges;
mod geom;
pub mod num;
pub mod offset;
pub mod ops;
mod output;
pub mod sweep;
pub mod tree;

#[cfg(feature = "generators")]
pub mod generators;

pub use geom::{
    area, bounds, orientation, path_from_bez, paths_to_bez, point_in_polygon, reverse_path,
    reverse_paths, Path, Paths, Point, PointInPolygon, Rect,
};
pub use offset::{ClipperOffset, OffsetOptions};
pub use ops::{
    boolean_op, clean_polygon, clean_polygons, minkowski_diff, minkowski_sum, minkowski_sum_paths,
    offset_paths, simplify_polygon, simplify_polygons, DEFAULT_CLEAN_DISTANCE,
};
pub use sweep::Clipper;
pub use tree::{NodeIdx, PolyTree};

/// A fill rule tells us how to decide whether a point is "inside" a collection of paths,
/// given its winding number.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    #[default]
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
    /// The point is "inside" if its winding number is positive.
    Positive,
    /// The point is "inside" if its winding number is negative.
    Negative,
}

impl FillRule {
    /// Maps a winding count to a non-negative "depth", which is one exactly
    /// on the boundary of the filled region.
    pub(crate) fn depth(self, wind_cnt: i32) -> i32 {
        match self {
            FillRule::Positive => wind_cnt,
            FillRule::Negative => -wind_cnt,
            FillRule::EvenOdd | FillRule::NonZero => wind_cnt.abs(),
        }
    }

    /// Is a region with the opposite operand's winding count `wind_cnt2` filled?
    pub(crate) fn is_inside(self, wind_cnt2: i32) -> bool {
        match self {
            FillRule::EvenOdd | FillRule::NonZero => wind_cnt2 != 0,
            FillRule::Positive => wind_cnt2 > 0,
            FillRule::Negative => wind_cnt2 < 0,
        }
    }
}

/// Binary operations between sets.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BooleanOp {
    /// A point is in the intersection of two sets if it is in both.
    Intersection,
    /// A point is in the union of two sets if it is in either one.
    #[default]
    Union,
    /// A point is in the difference of two sets if it is in the first but not the second.
    Difference,
    /// A point is in the exclusive-or of two sets if it is in one or the other, but not both.
    Xor,
}

/// Which operand of a Boolean operation a path belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PathType {
    /// The first operand. Open paths must be subjects.
    Subject,
    /// The second operand.
    Clip,
}

/// How corners are rendered when offsetting.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum JoinType {
    /// Corners are cut off with a flat chamfer at distance `delta`.
    #[default]
    Square,
    /// Corners are approximated by circular arcs.
    Round,
    /// Corners are extended to a point, unless that point would be further
    /// than the miter limit allows, in which case they are squared off.
    Miter,
}

/// How the ends of paths are treated when offsetting.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EndType {
    /// The path is a closed polygon, offset on one side.
    #[default]
    ClosedPolygon,
    /// The path is closed, but treated as a closed polyline and offset on both sides.
    ClosedLine,
    /// Open path with ends squared off flush with the end vertices.
    OpenButt,
    /// Open path with ends extended by `delta` and squared off.
    OpenSquare,
    /// Open path with round end caps.
    OpenRound,
}

impl EndType {
    pub(crate) fn is_closed(self) -> bool {
        matches!(self, EndType::ClosedPolygon | EndType::ClosedLine)
    }
}

/// Options controlling a [`Clipper`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClipOptions {
    /// Return outer contours with negative area and holes with positive area.
    pub reverse_solution: bool,
    /// Split output polygons that touch themselves at a vertex into separate
    /// simple polygons.
    pub strictly_simple: bool,
    /// Keep collinear vertices of closed input paths. Spikes are removed regardless.
    pub preserve_collinear: bool,
    /// Relative tolerance for coordinate comparisons.
    ///
    /// This is scaled by the largest absolute input coordinate to give the
    /// distance under which two points are considered equal.
    pub tolerance: f64,
}

impl Default for ClipOptions {
    fn default() -> Self {
        ClipOptions {
            reverse_solution: false,
            strictly_simple: false,
            preserve_collinear: false,
            tolerance: 1e-9,
        }
    }
}

/// The ways in which clipping and offsetting can fail.
///
/// Whenever an operation fails, none of its partial output is returned.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// The input can't be processed, for example because it contains a NaN
    /// or an open clip path.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Intersections within one scanbeam couldn't be ordered so that only
    /// adjacent edges cross.
    #[error("intersections could not be ordered consistently")]
    TopologicalInconsistency,
    /// A loop that should make progress on every iteration didn't.
    #[error("iteration limit exceeded while {0}")]
    NonTermination(&'static str),
    /// The engine is already executing an operation.
    #[error("an operation is already in progress on this engine")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rule_depth() {
        assert_eq!(FillRule::NonZero.depth(-2), 2);
        assert_eq!(FillRule::Positive.depth(-2), -2);
        assert_eq!(FillRule::Negative.depth(-1), 1);
        assert!(FillRule::EvenOdd.is_inside(3));
        assert!(!FillRule::Positive.is_inside(-1));
    }

    #[test]
    fn options_from_partial_yaml() {
        let opts: ClipOptions = serde_yaml::from_str("strictly_simple: true").unwrap();
        assert!(opts.strictly_simple);
        assert_eq!(opts.tolerance, 1e-9);
    }

    #[test]
    fn error_messages() {
        insta::assert_snapshot!(
            Error::NonTermination("ordering intersections").to_string(),
            @"iteration limit exceeded while ordering intersections"
        );
    }
}
