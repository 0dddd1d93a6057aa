//! Fuzzification: crisp value → degree per term.
//!
//! Degrees are read from the term's stored curve by linear interpolation
//! between the two bracketing universe samples. Values outside the
//! universe take the boundary sample's degree; no extrapolation.

use focus_common::consts::MAX_TERMS;
use heapless::Vec;

use crate::fuzzy::universe::{Clamp, Universe};
use crate::fuzzy::variable::LinguisticVariable;

/// Degrees of one variable's terms for one crisp input, in term order.
pub type Degrees = Vec<f64, MAX_TERMS>;

/// Interpolate `curve` (sampled at `universe`) at `x`, clamping at the ends.
///
/// Returns the degree and the clamp direction applied to `x`.
pub fn interpolate(universe: &Universe, curve: &[f64], x: f64) -> (f64, Clamp) {
    let points = universe.points();
    let (x, clamp) = universe.clamp(x);

    // First sample strictly above x; x == max lands past the end.
    let hi = points.partition_point(|&p| p <= x);
    if hi == 0 {
        return (curve[0], clamp);
    }
    if hi >= points.len() {
        return (curve[points.len() - 1], clamp);
    }

    let lo = hi - 1;
    let t = (x - points[lo]) / (points[hi] - points[lo]);
    (curve[lo] + t * (curve[hi] - curve[lo]), clamp)
}

impl LinguisticVariable {
    /// Degree of term `term` for crisp value `x`; 0 for an unknown term index.
    pub fn degree_of(&self, term: usize, x: f64) -> f64 {
        match self.term(term) {
            Some(t) => interpolate(self.universe(), t.curve(), x).0,
            None => 0.0,
        }
    }

    /// Degrees of every term for crisp value `x`.
    pub fn fuzzify(&self, x: f64) -> (Degrees, Clamp) {
        let (_, clamp) = self.universe().clamp(x);
        let degrees = self
            .terms()
            .iter()
            .map(|t| interpolate(self.universe(), t.curve(), x).0)
            .collect();
        (degrees, clamp)
    }
}
