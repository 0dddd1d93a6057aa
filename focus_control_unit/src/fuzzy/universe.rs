//! Universe of discourse and fixed-capacity membership curves.

use focus_common::consts::MAX_UNIVERSE_POINTS;
use heapless::Vec;

use crate::error::ConfigurationError;

/// One degree per universe sample, sized for allocation-free evaluation.
pub type Curve = Vec<f64, MAX_UNIVERSE_POINTS>;

/// Direction in which a crisp value was clamped to the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clamp {
    #[default]
    None,
    BelowMin,
    AboveMax,
}

/// Ordered, strictly increasing sample points of one linguistic variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    points: Curve,
}

impl Universe {
    /// Build a universe for `variable` from raw samples.
    ///
    /// # Errors
    ///
    /// - `UniverseTooShort` for fewer than two samples
    /// - `UniverseNotIncreasing` for a non-finite sample or one not above its predecessor
    /// - `Capacity` for more than [`MAX_UNIVERSE_POINTS`] samples
    pub fn new(variable: &str, samples: &[f64]) -> Result<Self, ConfigurationError> {
        if samples.len() < 2 {
            return Err(ConfigurationError::UniverseTooShort {
                variable: variable.to_string(),
                len: samples.len(),
            });
        }
        if samples.len() > MAX_UNIVERSE_POINTS {
            return Err(ConfigurationError::Capacity {
                what: "universe samples",
                limit: MAX_UNIVERSE_POINTS,
                actual: samples.len(),
            });
        }

        let mut points = Curve::new();
        for (index, &x) in samples.iter().enumerate() {
            let increasing = match points.last() {
                Some(&prev) => x > prev,
                None => true,
            };
            if !x.is_finite() || !increasing {
                return Err(ConfigurationError::UniverseNotIncreasing {
                    variable: variable.to_string(),
                    index,
                });
            }
            points
                .push(x)
                .map_err(|_| ConfigurationError::Capacity {
                    what: "universe samples",
                    limit: MAX_UNIVERSE_POINTS,
                    actual: samples.len(),
                })?;
        }

        Ok(Self { points })
    }

    #[inline]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a constructed universe.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.points[0]
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min() + self.max())
    }

    /// Clamp `x` into `[min, max]`. NaN maps to the minimum.
    #[inline]
    pub fn clamp(&self, x: f64) -> (f64, Clamp) {
        if x.is_nan() || x < self.min() {
            (self.min(), Clamp::BelowMin)
        } else if x > self.max() {
            (self.max(), Clamp::AboveMax)
        } else {
            (x, Clamp::None)
        }
    }

    /// An all-zero curve of this universe's length.
    pub fn zero_curve(&self) -> Curve {
        self.points.iter().map(|_| 0.0).collect()
    }
}
