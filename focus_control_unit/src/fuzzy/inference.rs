//! Rule evaluation and max aggregation.
//!
//! A rule's activation is its consequent curve clipped (elementwise min)
//! at the rule's firing strength. The aggregate is the elementwise max of
//! all activations. Both operations are commutative, so rule order never
//! affects the result.

use focus_common::consts::MAX_INPUTS;
use focus_common::flc::FlcConfig;
use heapless::Vec;
use serde::Serialize;

use crate::error::{ClampFlags, ConfigurationError, FlcError};
use crate::fuzzy::defuzz::centroid;
use crate::fuzzy::fuzzify::Degrees;
use crate::fuzzy::rule::RuleBase;
use crate::fuzzy::universe::Curve;
use crate::fuzzy::variable::{LinguisticVariable, VariableRole};

/// Consequent curve clipped at `strength`.
pub fn activation(strength: f64, consequent: &[f64]) -> Curve {
    consequent.iter().map(|&mu| mu.min(strength)).collect()
}

/// Fold one rule's clipped consequent into `aggregate` in place.
#[inline]
pub fn accumulate(aggregate: &mut [f64], strength: f64, consequent: &[f64]) {
    for (acc, &mu) in aggregate.iter_mut().zip(consequent) {
        *acc = acc.max(mu.min(strength));
    }
}

/// Elementwise maximum of `activations`, `width` samples long.
///
/// No activations yields the all-zero curve.
pub fn aggregate<'a>(width: usize, activations: impl IntoIterator<Item = &'a [f64]>) -> Curve {
    let mut out: Curve = (0..width).map(|_| 0.0).collect();
    for curve in activations {
        for (acc, &mu) in out.iter_mut().zip(curve) {
            *acc = acc.max(mu);
        }
    }
    out
}

/// Output of one allocation-free inference pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    /// Aggregated output curve over the consequent universe.
    pub aggregate: Curve,
    /// Inputs clamped to their universe boundary.
    pub clamped: ClampFlags,
}

/// Every intermediate value of one evaluation, for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceTrace {
    pub inputs: std::vec::Vec<f64>,
    /// Per antecedent, per term.
    pub degrees: std::vec::Vec<std::vec::Vec<f64>>,
    pub rules: std::vec::Vec<RuleTrace>,
    pub universe: std::vec::Vec<f64>,
    pub aggregate: std::vec::Vec<f64>,
    /// `None` when no rule fired.
    pub centroid: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTrace {
    pub strength: f64,
    pub consequent: String,
    pub activation: std::vec::Vec<f64>,
}

/// Immutable engine: variables, sampled curves and rule base.
///
/// Evaluation takes `&self`, so one engine may be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceEngine {
    antecedents: Vec<LinguisticVariable, MAX_INPUTS>,
    consequent: LinguisticVariable,
    rules: RuleBase,
}

impl InferenceEngine {
    /// Build and validate every variable, term and rule of `config`.
    pub fn build(config: &FlcConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        if config.antecedents.len() > MAX_INPUTS {
            return Err(ConfigurationError::Capacity {
                what: "antecedent variables",
                limit: MAX_INPUTS,
                actual: config.antecedents.len(),
            });
        }

        let mut antecedents: Vec<LinguisticVariable, MAX_INPUTS> = Vec::new();
        for var in &config.antecedents {
            let taken = antecedents.iter().any(|v| v.name() == var.name)
                || var.name == config.consequent.name;
            if taken {
                return Err(ConfigurationError::DuplicateVariable {
                    variable: var.name.clone(),
                });
            }
            let built = LinguisticVariable::from_config(var, VariableRole::Antecedent)?;
            antecedents
                .push(built)
                .map_err(|_| ConfigurationError::Capacity {
                    what: "antecedent variables",
                    limit: MAX_INPUTS,
                    actual: config.antecedents.len(),
                })?;
        }

        let consequent =
            LinguisticVariable::from_config(&config.consequent, VariableRole::Consequent)?;
        let rules = RuleBase::from_config(&config.rules, &antecedents, &consequent)?;

        Ok(Self {
            antecedents,
            consequent,
            rules,
        })
    }

    #[inline]
    pub fn antecedents(&self) -> &[LinguisticVariable] {
        &self.antecedents
    }

    #[inline]
    pub const fn consequent(&self) -> &LinguisticVariable {
        &self.consequent
    }

    #[inline]
    pub const fn rules(&self) -> &RuleBase {
        &self.rules
    }

    fn fuzzify_all(
        &self,
        inputs: &[f64],
    ) -> Result<(Vec<Degrees, MAX_INPUTS>, ClampFlags), FlcError> {
        let arity = FlcError::InputArity {
            expected: self.antecedents.len(),
            actual: inputs.len(),
        };
        if inputs.len() != self.antecedents.len() {
            return Err(arity);
        }

        let mut clamped = ClampFlags::empty();
        let mut degrees = Vec::new();
        for (i, (var, &x)) in self.antecedents.iter().zip(inputs).enumerate() {
            let (d, clamp) = var.fuzzify(x);
            clamped |= ClampFlags::for_input(i, clamp);
            degrees.push(d).map_err(|_| arity.clone())?;
        }
        Ok((degrees, clamped))
    }

    /// Fuzzify `inputs`, fire every rule and aggregate, without allocating.
    ///
    /// # Errors
    ///
    /// `FlcError::InputArity` when `inputs.len()` differs from the number of antecedents.
    pub fn infer(&self, inputs: &[f64]) -> Result<Inference, FlcError> {
        let (degrees, clamped) = self.fuzzify_all(inputs)?;

        let mut aggregate = self.consequent.universe().zero_curve();
        for rule in self.rules.rules() {
            let strength = rule.firing_strength(&degrees);
            if let Some(term) = self.consequent.term(rule.consequent()) {
                accumulate(&mut aggregate, strength, term.curve());
            }
        }

        Ok(Inference { aggregate, clamped })
    }

    /// Same evaluation as [`infer`](Self::infer), keeping every intermediate value.
    pub fn trace(&self, inputs: &[f64]) -> Result<InferenceTrace, FlcError> {
        let (degrees, _) = self.fuzzify_all(inputs)?;

        let mut rules = std::vec::Vec::with_capacity(self.rules.len());
        for rule in self.rules.rules() {
            let strength = rule.firing_strength(&degrees);
            let (consequent, curve) = match self.consequent.term(rule.consequent()) {
                Some(term) => (term.name().to_string(), activation(strength, term.curve())),
                None => (String::new(), self.consequent.universe().zero_curve()),
            };
            rules.push(RuleTrace {
                strength,
                consequent,
                activation: curve.to_vec(),
            });
        }

        let universe = self.consequent.universe().points();
        let combined = aggregate(
            universe.len(),
            rules.iter().map(|r| r.activation.as_slice()),
        );

        Ok(InferenceTrace {
            inputs: inputs.to_vec(),
            degrees: degrees.iter().map(|d| d.to_vec()).collect(),
            rules,
            universe: universe.to_vec(),
            centroid: centroid(universe, &combined),
            aggregate: combined.to_vec(),
        })
    }
}
