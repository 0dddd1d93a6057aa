//! Dynamic-focus controller façade.
//!
//! Owns the configuration, the lifecycle state machine, the immutable
//! inference engine built by `setup()`, and the last evaluation. The only
//! state mutated by `run()` is the last-known output.
//!
//! ```rust
//! use focus_control_unit::controller::FocusController;
//!
//! let mut flc = FocusController::with_defaults();
//! flc.setup().unwrap();
//! let volts = flc.run(10.0, 25000.0).unwrap();
//! assert!(volts < 4.0);
//! flc.stop().unwrap();
//! ```

use std::sync::Arc;

use focus_common::flc::{FlcConfig, OutputLevels, ZeroSumFallback};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ClampFlags, ConfigurationError, FlcError};
use crate::fuzzy::defuzz::defuzzify;
use crate::fuzzy::inference::{InferenceEngine, InferenceTrace};
use crate::fuzzy::variable::{LinguisticVariable, VariableRole};
use crate::state::{ControllerState, ControllerStateMachine, LifecycleEvent, TransitionResult};

/// Crisp inputs of the façade: distance, then beam width.
pub const INPUT_COUNT: usize = 2;

/// Result of one `run()` cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub voltage: f64,
    /// Inputs clamped to their universe boundary.
    pub clamped: ClampFlags,
    /// No rule fired; `voltage` comes from the zero-sum fallback.
    pub fallback: bool,
}

/// Sampled membership curves of every variable, for external rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSet {
    pub variables: Vec<VariableCurves>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableCurves {
    pub name: String,
    pub role: &'static str,
    pub universe: Vec<f64>,
    pub terms: Vec<TermCurve>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermCurve {
    pub name: String,
    pub breakpoints: [f64; 3],
    pub degrees: Vec<f64>,
}

impl VariableCurves {
    fn from_variable(var: &LinguisticVariable) -> Self {
        Self {
            name: var.name().to_string(),
            role: match var.role() {
                VariableRole::Antecedent => "antecedent",
                VariableRole::Consequent => "consequent",
            },
            universe: var.universe().points().to_vec(),
            terms: var
                .terms()
                .iter()
                .map(|t| TermCurve {
                    name: t.name().to_string(),
                    breakpoints: t.triangle().breakpoints(),
                    degrees: t.curve().to_vec(),
                })
                .collect(),
        }
    }
}

/// Fuzzy logic controller for the dynamic-focus actuator.
#[derive(Debug)]
pub struct FocusController {
    config: FlcConfig,
    machine: ControllerStateMachine,
    engine: Option<Arc<InferenceEngine>>,
    last: Option<Evaluation>,
}

impl FocusController {
    /// Create an unconfigured controller; nothing is validated until `setup()`.
    pub fn new(config: FlcConfig) -> Self {
        Self {
            config,
            machine: ControllerStateMachine::new(),
            engine: None,
            last: None,
        }
    }

    /// The reference deployment with {2, 4, 6} V output levels.
    pub fn with_defaults() -> Self {
        Self::new(FlcConfig::dynamic_focus(OutputLevels::default()))
    }

    #[inline]
    pub const fn state(&self) -> ControllerState {
        self.machine.state()
    }

    #[inline]
    pub const fn config(&self) -> &FlcConfig {
        &self.config
    }

    /// The built engine, once `setup()` succeeded.
    pub fn engine(&self) -> Option<&InferenceEngine> {
        self.engine.as_deref()
    }

    /// Shared handle to the engine for concurrent read-only evaluation.
    pub fn shared_engine(&self) -> Option<Arc<InferenceEngine>> {
        self.engine.clone()
    }

    /// Crisp output of the most recent `run()`.
    pub fn last_output(&self) -> Option<f64> {
        self.last.map(|e| e.voltage)
    }

    pub const fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last.as_ref()
    }

    fn guard(&self, event: LifecycleEvent) -> Result<(), FlcError> {
        if self.machine.permits(event) {
            Ok(())
        } else {
            Err(FlcError::LifecycleViolation {
                state: self.state(),
                operation: event,
            })
        }
    }

    fn transition(&mut self, event: LifecycleEvent) -> Result<ControllerState, FlcError> {
        let from = self.state();
        match self.machine.handle_event(event) {
            TransitionResult::Ok(to) => {
                if from != to {
                    info!(?from, ?to, "FLC {event}");
                }
                Ok(to)
            }
            TransitionResult::Rejected(reason) => {
                warn!(state = ?from, %event, reason, "lifecycle transition rejected");
                Err(FlcError::LifecycleViolation {
                    state: from,
                    operation: event,
                })
            }
        }
    }

    fn ready_engine(&self, event: LifecycleEvent) -> Result<&InferenceEngine, FlcError> {
        self.guard(event)?;
        self.engine
            .as_deref()
            .ok_or(FlcError::LifecycleViolation {
                state: self.state(),
                operation: event,
            })
    }

    /// Build universes, terms and the rule base; Unconfigured → Configured.
    ///
    /// # Errors
    ///
    /// - `LifecycleViolation` unless Unconfigured
    /// - `Configuration` for any invalid setting; the controller stays Unconfigured
    pub fn setup(&mut self) -> Result<(), FlcError> {
        self.guard(LifecycleEvent::Setup)?;

        if self.config.antecedents.len() != INPUT_COUNT {
            return Err(ConfigurationError::AntecedentCount {
                expected: INPUT_COUNT,
                actual: self.config.antecedents.len(),
            }
            .into());
        }

        let engine = InferenceEngine::build(&self.config).inspect_err(|e| {
            warn!(service = %self.config.shared.service_name, error = %e, "FLC setup failed");
        })?;
        info!(
            service = %self.config.shared.service_name,
            rules = engine.rules().len(),
            output_min = engine.consequent().universe().min(),
            output_max = engine.consequent().universe().max(),
            "FLC setup complete"
        );

        self.engine = Some(Arc::new(engine));
        self.transition(LifecycleEvent::Setup)?;
        Ok(())
    }

    /// Evaluate one sensing cycle and return the crisp voltage.
    ///
    /// # Errors
    ///
    /// `LifecycleViolation` before `setup()` or after `stop()`; state unchanged.
    pub fn run(&mut self, distance: f64, beam_width: f64) -> Result<f64, FlcError> {
        self.evaluate(distance, beam_width).map(|e| e.voltage)
    }

    /// [`run`](Self::run) with the clamp and fallback diagnostics.
    pub fn evaluate(&mut self, distance: f64, beam_width: f64) -> Result<Evaluation, FlcError> {
        let engine = self.ready_engine(LifecycleEvent::Run)?;
        let inference = engine.infer(&[distance, beam_width])?;

        let universe = engine.consequent().universe();
        let fallback_value = match self.config.controller.zero_sum_fallback {
            ZeroSumFallback::HoldLast => self
                .last
                .map_or_else(|| universe.midpoint(), |e| e.voltage),
            ZeroSumFallback::Midpoint => universe.midpoint(),
        };
        let out = defuzzify(universe.points(), &inference.aggregate, fallback_value);

        let (prev_clamped, prev_fallback) = self
            .last
            .map_or((ClampFlags::empty(), false), |e| (e.clamped, e.fallback));
        if inference.clamped != prev_clamped && !inference.clamped.is_empty() {
            warn!(
                distance,
                beam_width,
                clamped = ?inference.clamped,
                "input outside universe, clamped to boundary"
            );
        }
        if out.fallback && !prev_fallback {
            warn!(
                distance,
                beam_width,
                voltage = out.value,
                policy = ?self.config.controller.zero_sum_fallback,
                "no rule fired, centroid undefined; using fallback output"
            );
        }
        debug!(distance, beam_width, voltage = out.value, "FLC output");

        let evaluation = Evaluation {
            voltage: out.value,
            clamped: inference.clamped,
            fallback: out.fallback,
        };
        self.last = Some(evaluation);
        self.transition(LifecycleEvent::Run)?;
        Ok(evaluation)
    }

    /// Full intermediate trace for the given inputs. Does not touch the
    /// last output or the lifecycle state.
    pub fn trace(&self, distance: f64, beam_width: f64) -> Result<InferenceTrace, FlcError> {
        self.ready_engine(LifecycleEvent::Run)?
            .trace(&[distance, beam_width])
    }

    /// Sampled curves of every variable.
    pub fn curves(&self) -> Result<CurveSet, FlcError> {
        let engine = self.ready_engine(LifecycleEvent::Run)?;
        let variables = engine
            .antecedents()
            .iter()
            .chain(std::iter::once(engine.consequent()))
            .map(VariableCurves::from_variable)
            .collect();
        Ok(CurveSet { variables })
    }

    /// Configured/Running → Stopped. Terminal.
    pub fn stop(&mut self) -> Result<(), FlcError> {
        self.guard(LifecycleEvent::Stop)?;
        self.transition(LifecycleEvent::Stop)?;
        Ok(())
    }
}
