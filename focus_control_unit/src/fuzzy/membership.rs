//! Triangular membership functions.
//!
//! `evaluate(a, b, c, x)` is 1 at `x == b`, rises linearly on `(a, b)`,
//! falls linearly on `(b, c)`, and is 0 elsewhere. `a == b` or `b == c`
//! collapses the corresponding side into a vertical edge at the peak.

use crate::error::MalformedBreakpoints;
use crate::fuzzy::universe::{Curve, Universe};

/// Degree of membership of `x` in the triangle `(a, b, c)`.
///
/// Pure; breakpoint ordering is validated by [`Triangle::new`].
#[inline]
pub fn evaluate(a: f64, b: f64, c: f64, x: f64) -> f64 {
    if x == b {
        1.0
    } else if x > a && x < b {
        (x - a) / (b - a)
    } else if x > b && x < c {
        (c - x) / (c - b)
    } else {
        0.0
    }
}

/// Validated breakpoints `a <= b <= c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    a: f64,
    b: f64,
    c: f64,
}

impl Triangle {
    /// # Errors
    ///
    /// [`MalformedBreakpoints`] for `a > b`, `b > c`, or a non-finite breakpoint.
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self, MalformedBreakpoints> {
        let finite = a.is_finite() && b.is_finite() && c.is_finite();
        if !finite || a > b || b > c {
            return Err(MalformedBreakpoints { a, b, c });
        }
        Ok(Self { a, b, c })
    }

    #[inline]
    pub const fn breakpoints(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    #[inline]
    pub fn degree(&self, x: f64) -> f64 {
        evaluate(self.a, self.b, self.c, x)
    }

    /// Sample the triangle at every point of `universe`.
    pub fn sample(&self, universe: &Universe) -> Curve {
        universe.points().iter().map(|&x| self.degree(x)).collect()
    }
}
