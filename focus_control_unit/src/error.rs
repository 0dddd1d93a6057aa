//! Error and warning taxonomy of the fuzzy controller.
//!
//! - [`ConfigurationError`]: fatal to `setup()`, the controller stays unconfigured.
//! - [`ClampFlags`]: non-fatal, an input was clamped to its universe boundary.
//! - Undefined defuzzification is not an error; see `Evaluation::fallback`.
//! - [`FlcError::LifecycleViolation`]: operation rejected, state unchanged.

use bitflags::bitflags;
use focus_common::config::ConfigError;
use focus_common::consts::MAX_INPUTS;
use thiserror::Error;

use crate::fuzzy::universe::Clamp;
use crate::state::{ControllerState, LifecycleEvent};

/// Breakpoints violating `a <= b <= c` (or not finite).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("malformed breakpoints ({a}, {b}, {c}): require a <= b <= c")]
pub struct MalformedBreakpoints {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Semantic configuration error raised by `setup()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Schema-level failure (universe range, service name, cycle time).
    #[error(transparent)]
    Schema(#[from] ConfigError),

    #[error("variable '{variable}': universe needs at least 2 samples, got {len}")]
    UniverseTooShort { variable: String, len: usize },

    /// Sample at `index` is not strictly greater than its predecessor.
    #[error("variable '{variable}': universe not strictly increasing at sample {index}")]
    UniverseNotIncreasing { variable: String, index: usize },

    #[error("variable '{variable}', term '{term}': {source}")]
    MalformedTerm {
        variable: String,
        term: String,
        #[source]
        source: MalformedBreakpoints,
    },

    #[error("variable '{variable}' has no terms")]
    NoTerms { variable: String },

    #[error("variable '{variable}': duplicate term '{term}'")]
    DuplicateTerm { variable: String, term: String },

    #[error("duplicate variable '{variable}'")]
    DuplicateVariable { variable: String },

    #[error("controller expects {expected} antecedents, configured {actual}")]
    AntecedentCount { expected: usize, actual: usize },

    #[error("rule base is empty")]
    EmptyRuleBase,

    #[error("rule {rule}: no conditions")]
    RuleWithoutConditions { rule: usize },

    #[error("rule {rule}: unknown variable '{variable}'")]
    UnknownVariable { rule: usize, variable: String },

    #[error("rule {rule}: variable '{variable}' has no term '{term}'")]
    UnknownTerm {
        rule: usize,
        variable: String,
        term: String,
    },

    #[error("rule {rule}: consequent has no term '{term}'")]
    UnknownConsequent { rule: usize, term: String },

    #[error("{what}: capacity {limit} exceeded ({actual})")]
    Capacity {
        what: &'static str,
        limit: usize,
        actual: usize,
    },
}

/// Top-level controller error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlcError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("lifecycle violation: {operation} not permitted in {state:?} state")]
    LifecycleViolation {
        state: ControllerState,
        operation: LifecycleEvent,
    },

    #[error("expected {expected} crisp inputs, got {actual}")]
    InputArity { expected: usize, actual: usize },
}

bitflags! {
    /// Inputs clamped to their universe boundary during one evaluation.
    ///
    /// Two bits per antecedent, in input order: `2i` below minimum,
    /// `2i + 1` above maximum.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClampFlags: u8 {
        const DISTANCE_BELOW_MIN   = 0x01;
        const DISTANCE_ABOVE_MAX   = 0x02;
        const BEAM_WIDTH_BELOW_MIN = 0x04;
        const BEAM_WIDTH_ABOVE_MAX = 0x08;
        const _ = !0;
    }
}

impl ClampFlags {
    /// Flag for antecedent `input` clamped in direction `clamp`.
    #[inline]
    pub const fn for_input(input: usize, clamp: Clamp) -> Self {
        if input >= MAX_INPUTS {
            return Self::empty();
        }
        match clamp {
            Clamp::None => Self::empty(),
            Clamp::BelowMin => Self::from_bits_retain(1 << (2 * input)),
            Clamp::AboveMax => Self::from_bits_retain(1 << (2 * input + 1)),
        }
    }

    /// Whether antecedent `input` was clamped in either direction.
    #[inline]
    pub const fn is_clamped(&self, input: usize) -> bool {
        if input >= MAX_INPUTS {
            return false;
        }
        self.bits() & (0b11 << (2 * input)) != 0
    }
}
