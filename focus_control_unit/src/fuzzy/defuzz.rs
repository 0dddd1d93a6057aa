//! Centroid (center of gravity) defuzzification.

/// Crisp output of one defuzzification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defuzzified {
    pub value: f64,
    /// The curve summed to zero and `value` is the supplied fallback.
    pub fallback: bool,
}

/// `Σ(x_i · μ_i) / Σ(μ_i)` over the output universe.
///
/// `None` when `Σ(μ_i) == 0`, i.e. no rule fired.
pub fn centroid(universe: &[f64], curve: &[f64]) -> Option<f64> {
    let (moment, mass) = universe
        .iter()
        .zip(curve)
        .fold((0.0, 0.0), |(m, s), (&x, &mu)| (m + x * mu, s + mu));
    if mass > 0.0 {
        Some(moment / mass)
    } else {
        None
    }
}

/// Centroid of `curve`, or `fallback` when it is undefined.
#[inline]
pub fn defuzzify(universe: &[f64], curve: &[f64], fallback: f64) -> Defuzzified {
    match centroid(universe, curve) {
        Some(value) => Defuzzified {
            value,
            fallback: false,
        },
        None => Defuzzified {
            value: fallback,
            fallback: true,
        },
    }
}
