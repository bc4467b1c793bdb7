//! Ordering helpers for floating point coordinates.

use std::cmp::Ordering;

/// A wrapper for `f64` that implements `Ord`, for keys of sorts and heaps.
///
/// NaN compares equal to everything. Input coordinates are checked for
/// finiteness before they reach the engine, so that never comes up.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CheapOrderedFloat(f64);

impl CheapOrderedFloat {
    /// Retrieve the inner `f64`.
    pub fn into_inner(self) -> f64 {
        self.0
    }
}

impl From<f64> for CheapOrderedFloat {
    fn from(value: f64) -> Self {
        CheapOrderedFloat(value)
    }
}

impl Eq for CheapOrderedFloat {}

impl Ord for CheapOrderedFloat {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for CheapOrderedFloat {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A comparison tolerance, scaled to the magnitude of the input.
///
/// Both engines derive the epsilon for their point and slope comparisons
/// from one of these, so they behave the same way on millimeters and on
/// kilometers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    /// Absolute distance under which two coordinates are considered equal.
    pub eps: f64,
}

impl Tolerance {
    /// Builds a tolerance from a relative epsilon and the largest absolute
    /// coordinate in play.
    pub fn scaled(relative: f64, magnitude: f64) -> Self {
        let eps = relative * magnitude.abs().max(1.0);
        Tolerance { eps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        let mut v: Vec<CheapOrderedFloat> = [3.0, -1.0, 2.5, 0.0]
            .into_iter()
            .map(CheapOrderedFloat::from)
            .collect();
        v.sort();
        let v: Vec<f64> = v.into_iter().map(CheapOrderedFloat::into_inner).collect();
        assert_eq!(v, vec![-1.0, 0.0, 2.5, 3.0]);
    }

    #[test]
    fn scaled_tolerance() {
        let tol = Tolerance::scaled(1e-9, -1000.0);
        assert!((tol.eps - 1e-6).abs() < 1e-18);

        // Small magnitudes don't shrink the tolerance below the relative epsilon.
        let tol = Tolerance::scaled(1e-9, 1e-3);
        assert_eq!(tol.eps, 1e-9);
    }
}
