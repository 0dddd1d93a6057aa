//! Fuzzy logic controller configuration schema.
//!
//! Serde-facing description of the controller: the antecedent and
//! consequent linguistic variables, their triangular terms, the rule base,
//! and the runtime settings of the control loop. The structures here are
//! pure data; `focus_control_unit` turns them into an inference engine and
//! performs the semantic validation at setup time.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "dynfocus-bench-01"
//!
//! [controller]
//! zero_sum_fallback = "hold_last"
//!
//! [[antecedents]]
//! name = "distance"
//! universe = { start = 0.0, stop = 50.0, step = 1.0 }
//! terms = [
//!     { name = "Near", triangle = [0.0, 0.0, 25.0] },
//!     { name = "Far", triangle = [0.0, 25.0, 50.0] },
//! ]
//!
//! [consequent]
//! name = "voltage"
//! universe = { points = [2.0, 4.0, 6.0] }
//! terms = [
//!     { name = "Low", triangle = [2.0, 2.0, 4.0] },
//!     { name = "High", triangle = [2.0, 4.0, 6.0] },
//! ]
//!
//! [[rules]]
//! combinator = "and"
//! when = [{ variable = "distance", term = "Near" }]
//! then = "Low"
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{CYCLE_TIME_US, MAX_UNIVERSE_POINTS};

// Tolerance for the inclusive end of a stepped universe.
const RANGE_EPSILON: f64 = 1e-9;

// ─── Universe ───────────────────────────────────────────────────────

/// Discretization domain of one linguistic variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniverseConfig {
    /// Explicit, strictly increasing sample points.
    Points { points: Vec<f64> },
    /// Evenly stepped samples from `start`, `stop` included when reached exactly.
    Range { start: f64, stop: f64, step: f64 },
}

impl UniverseConfig {
    /// Materialize the sample points.
    ///
    /// Ordering is not checked here; the engine rejects non-increasing
    /// universes during setup.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` for a non-finite or non-positive step,
    /// a reversed range, or more than [`MAX_UNIVERSE_POINTS`] samples.
    pub fn samples(&self) -> Result<Vec<f64>, ConfigError> {
        match self {
            Self::Points { points } => Ok(points.clone()),
            Self::Range { start, stop, step } => {
                let (start, stop, step) = (*start, *stop, *step);
                if !(start.is_finite() && stop.is_finite() && step.is_finite()) || step <= 0.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "universe range {start}..{stop} step {step} is not a finite, positive-step range"
                    )));
                }
                if stop < start {
                    return Err(ConfigError::ValidationError(format!(
                        "universe range stop {stop} is below start {start}"
                    )));
                }
                let steps = ((stop - start) / step + RANGE_EPSILON).floor();
                if steps + 1.0 > MAX_UNIVERSE_POINTS as f64 {
                    return Err(ConfigError::ValidationError(format!(
                        "universe range {start}..{stop} step {step} exceeds {MAX_UNIVERSE_POINTS} samples"
                    )));
                }
                let count = steps as usize + 1;
                Ok((0..count).map(|i| start + i as f64 * step).collect())
            }
        }
    }
}

// ─── Terms & Variables ──────────────────────────────────────────────

/// A named triangular membership function `[a, b, c]`, peaking at `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermConfig {
    pub name: String,
    pub triangle: [f64; 3],
}

impl TermConfig {
    pub fn new(name: &str, triangle: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            triangle,
        }
    }
}

/// A linguistic variable: a universe plus its ordered terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    pub universe: UniverseConfig,
    pub terms: Vec<TermConfig>,
}

// ─── Rules ──────────────────────────────────────────────────────────

/// How the conditions of one rule premise are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// All conditions must hold: minimum of the degrees.
    And,
    /// Any condition suffices: maximum of the degrees.
    Or,
}

/// One `variable is term` condition of a rule premise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub variable: String,
    pub term: String,
}

impl ConditionConfig {
    pub fn new(variable: &str, term: &str) -> Self {
        Self {
            variable: variable.to_string(),
            term: term.to_string(),
        }
    }
}

/// A fuzzy rule. The combinator is mandatory for every rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub combinator: Combinator,
    pub when: Vec<ConditionConfig>,
    /// Consequent term name.
    pub then: String,
}

// ─── Controller Settings ────────────────────────────────────────────

/// Output produced when no rule fires and the centroid is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSumFallback {
    /// Repeat the previous crisp output; the midpoint before the first output.
    #[default]
    HoldLast,
    /// Midpoint of the output universe.
    Midpoint,
}

/// Runtime settings of the controller and its control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub zero_sum_fallback: ZeroSumFallback,
    /// Control loop period in microseconds.
    pub cycle_time_us: u64,
    /// Abort the control loop on a cycle overrun instead of counting it.
    pub strict_overrun: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            zero_sum_fallback: ZeroSumFallback::default(),
            cycle_time_us: CYCLE_TIME_US,
            strict_overrun: false,
        }
    }
}

// ─── Top-level Config ───────────────────────────────────────────────

/// Complete fuzzy controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlcConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub controller: ControllerSettings,
    /// Input variables, in the order crisp inputs are supplied.
    pub antecedents: Vec<VariableConfig>,
    pub consequent: VariableConfig,
    pub rules: Vec<RuleConfig>,
}

impl FlcConfig {
    /// Validate the fields that do not need the inference engine.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` for an empty service name or a zero
    /// cycle time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.controller.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "controller.cycle_time_us must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The reference dynamic-focus deployment.
    ///
    /// Antecedents are camera distance in cm (0..=50, step 1) and beam-width
    /// area in pixels (seven samples between 25000 and 79000). The rule base
    /// is the full AND grid of the three distance terms against the three
    /// beam-width terms.
    pub fn dynamic_focus(levels: OutputLevels) -> Self {
        use names::*;

        let distance = VariableConfig {
            name: DISTANCE.to_string(),
            universe: UniverseConfig::Range {
                start: 0.0,
                stop: 50.0,
                step: 1.0,
            },
            terms: vec![
                TermConfig::new(NEAR, [0.0, 0.0, 25.0]),
                TermConfig::new(FAR, [0.0, 25.0, 50.0]),
                TermConfig::new(VERY_FAR, [25.0, 50.0, 50.0]),
            ],
        };

        let beam_width = VariableConfig {
            name: BEAM_WIDTH.to_string(),
            universe: UniverseConfig::Points {
                points: vec![25000.0, 34000.0, 43000.0, 50000.0, 58000.0, 73000.0, 79000.0],
            },
            terms: vec![
                TermConfig::new(LARGE, [25000.0, 25000.0, 50000.0]),
                TermConfig::new(X_LARGE, [25000.0, 50000.0, 79000.0]),
                TermConfig::new(XX_LARGE, [50000.0, 79000.0, 79000.0]),
            ],
        };

        let [lo, mid, hi] = levels.0;
        let voltage = VariableConfig {
            name: VOLTAGE.to_string(),
            universe: UniverseConfig::Points {
                points: vec![lo, mid, hi],
            },
            terms: vec![
                TermConfig::new(LOW, [lo, lo, mid]),
                TermConfig::new(MID, [lo, mid, hi]),
                TermConfig::new(HIGH, [mid, hi, hi]),
            ],
        };

        let grid = [
            (NEAR, LARGE, LOW),
            (NEAR, X_LARGE, MID),
            (NEAR, XX_LARGE, MID),
            (FAR, LARGE, LOW),
            (FAR, X_LARGE, MID),
            (FAR, XX_LARGE, MID),
            (VERY_FAR, LARGE, LOW),
            (VERY_FAR, X_LARGE, MID),
            (VERY_FAR, XX_LARGE, HIGH),
        ];
        let rules = grid
            .iter()
            .map(|(d, w, out)| RuleConfig {
                combinator: Combinator::And,
                when: vec![
                    ConditionConfig::new(DISTANCE, d),
                    ConditionConfig::new(BEAM_WIDTH, w),
                ],
                then: (*out).to_string(),
            })
            .collect();

        Self {
            shared: SharedConfig::default(),
            controller: ControllerSettings::default(),
            antecedents: vec![distance, beam_width],
            consequent: voltage,
            rules,
        }
    }
}

impl Default for FlcConfig {
    fn default() -> Self {
        Self::dynamic_focus(OutputLevels::default())
    }
}

/// Variable and term names of the reference deployment.
pub mod names {
    pub const DISTANCE: &str = "distance";
    pub const BEAM_WIDTH: &str = "beam_width";
    pub const VOLTAGE: &str = "voltage";

    pub const NEAR: &str = "Near";
    pub const FAR: &str = "Far";
    pub const VERY_FAR: &str = "Very Far";

    pub const LARGE: &str = "Large";
    pub const X_LARGE: &str = "X-Large";
    pub const XX_LARGE: &str = "XX-Large";

    pub const LOW: &str = "Low";
    pub const MID: &str = "Mid";
    pub const HIGH: &str = "High";
}

/// The three candidate actuator voltages, ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputLevels(pub [f64; 3]);

impl OutputLevels {
    /// 0 V / 1 V / 2 V actuator driver.
    pub const ZERO_ONE_TWO: Self = Self([0.0, 1.0, 2.0]);
    /// 2 V / 4 V / 6 V actuator driver.
    pub const TWO_FOUR_SIX: Self = Self([2.0, 4.0, 6.0]);
}

impl Default for OutputLevels {
    fn default() -> Self {
        Self::TWO_FOUR_SIX
    }
}
