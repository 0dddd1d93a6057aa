//! Periodic control loop: take sample → evaluate → command actuator.
//!
//! ## Thread Preparation
//! [`rt_setup`] prefaults the stack. The `rt` feature adds `mlockall`, CPU
//! pinning and `SCHED_FIFO`; without it the process keeps its default
//! scheduling so the loop runs unprivileged.
//!
//! ## Pacing
//! With `rt`: absolute-time `clock_nanosleep` on `CLOCK_MONOTONIC`.
//! Otherwise: `std::thread::sleep` for the remainder of the cycle.
//! An overrun is counted and logged; with `strict_overrun` it aborts the loop.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::controller::{Evaluation, FocusController};
use crate::error::FlcError;
use crate::handoff::InputSlot;
use crate::state::ControllerState;

// ─── Sensor / Actuator seams ────────────────────────────────────────

/// One sensing result from the camera pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Camera distance [cm].
    pub distance: f64,
    /// Beam-width area [px].
    pub beam_width: f64,
}

/// Error parsing a `distance beam_width` sample line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleParseError {
    #[error("expected 2 fields (distance, beam_width), got {0}")]
    FieldCount(usize),
    #[error("invalid number '{0}'")]
    Number(String),
}

impl FromStr for SensorSample {
    type Err = SampleParseError;

    /// Two numbers separated by whitespace or a comma.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .collect();
        let &[distance, beam_width] = fields.as_slice() else {
            return Err(SampleParseError::FieldCount(fields.len()));
        };
        let number = |f: &str| {
            f.parse::<f64>()
                .map_err(|_| SampleParseError::Number(f.to_string()))
        };
        Ok(Self {
            distance: number(distance)?,
            beam_width: number(beam_width)?,
        })
    }
}

/// Sink for the controller's crisp output.
pub trait Actuator {
    /// Apply one output. Called once per evaluated cycle.
    fn command(&mut self, sample: &SensorSample, evaluation: &Evaluation);
}

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Cycles that issued an actuator command.
    pub commands: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    /// Cycles exceeding the budget.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (RT pacing only).
    pub max_latency_ns: i64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            commands: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("RT setup failed at {step}: {reason}")]
    RtSetup { step: &'static str, reason: String },

    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },

    #[error("controller error: {0}")]
    Controller(#[from] FlcError),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Stack touched before the first cycle. One evaluation keeps a few
/// fixed-capacity curves on the stack; 64 KiB covers it with margin.
const PREFAULT_STACK_BYTES: usize = 64 * 1024;

/// Prepare the calling thread for the control loop.
///
/// Always prefaults the stack. With `rt`, also locks memory, pins the
/// thread to `cpu_core` and switches it to `SCHED_FIFO` at `rt_priority`.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    #[cfg(feature = "rt")]
    {
        realtime::lock_memory()?;
        realtime::pin_to_core(cpu_core)?;
        realtime::fifo_priority(rt_priority)?;
    }

    let touched = std::hint::black_box([0x5Au8; PREFAULT_STACK_BYTES]);
    std::hint::black_box(&touched);

    info!(
        cpu_core,
        rt_priority,
        rt = cfg!(feature = "rt"),
        "control thread prepared"
    );
    Ok(())
}

#[cfg(feature = "rt")]
mod realtime {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::sys::mman::{MlockallFlags, mlockall};
    use nix::unistd::Pid;

    use super::CycleError;

    pub(super) fn failed<E: std::fmt::Display>(step: &'static str) -> impl FnOnce(E) -> CycleError {
        move |e| CycleError::RtSetup {
            step,
            reason: e.to_string(),
        }
    }

    pub(super) fn lock_memory() -> Result<(), CycleError> {
        mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
            .map_err(failed("mlockall"))
    }

    pub(super) fn pin_to_core(cpu: usize) -> Result<(), CycleError> {
        let mut cpus = CpuSet::new();
        cpus.set(cpu).map_err(failed("cpu set"))?;
        sched_setaffinity(Pid::from_raw(0), &cpus).map_err(failed("sched_setaffinity"))
    }

    /// nix has no `sched_setscheduler` wrapper.
    pub(super) fn fifo_priority(priority: i32) -> Result<(), CycleError> {
        let param = libc::sched_param {
            sched_priority: priority,
        };
        // SAFETY: `param` is a valid sched_param for the duration of the call.
        match unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } {
            0 => Ok(()),
            _ => Err(CycleError::RtSetup {
                step: "sched_setscheduler",
                reason: std::io::Error::last_os_error().to_string(),
            }),
        }
    }
}

// ─── Control Loop ───────────────────────────────────────────────────

/// Result of one [`ControlLoop::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// No sample has arrived yet; nothing commanded.
    Idle,
    /// The actuator was commanded.
    Commanded(Evaluation),
}

/// Periodic driver of a [`FocusController`].
pub struct ControlLoop<A: Actuator> {
    controller: FocusController,
    input: Arc<InputSlot<SensorSample>>,
    actuator: A,
    last_sample: Option<SensorSample>,
    stats: CycleStats,
    cycle_time_ns: i64,
    strict_overrun: bool,
}

impl<A: Actuator> ControlLoop<A> {
    /// Wrap `controller`, running `setup()` first if it is still unconfigured.
    ///
    /// # Errors
    /// Any setup error, or `LifecycleViolation` for a stopped controller.
    pub fn new(
        mut controller: FocusController,
        input: Arc<InputSlot<SensorSample>>,
        actuator: A,
    ) -> Result<Self, CycleError> {
        if controller.state() == ControllerState::Unconfigured {
            controller.setup()?;
        }
        if !controller.state().is_ready() {
            return Err(FlcError::LifecycleViolation {
                state: controller.state(),
                operation: crate::state::LifecycleEvent::Run,
            }
            .into());
        }

        let settings = &controller.config().controller;
        let cycle_time_ns = i64::try_from(settings.cycle_time_us.saturating_mul(1000))
            .unwrap_or(i64::MAX);
        let strict_overrun = settings.strict_overrun;

        Ok(Self {
            controller,
            input,
            actuator,
            last_sample: None,
            stats: CycleStats::new(),
            cycle_time_ns,
            strict_overrun,
        })
    }

    pub fn controller(&self) -> &FocusController {
        &self.controller
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// The slot producers publish into.
    pub fn input(&self) -> &Arc<InputSlot<SensorSample>> {
        &self.input
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Configured budget of one cycle [ns].
    pub const fn cycle_time_ns(&self) -> i64 {
        self.cycle_time_ns
    }

    /// One unpaced cycle: newest sample (or the last one), evaluate, command.
    pub fn step(&mut self) -> Result<StepOutcome, CycleError> {
        if let Some(sample) = self.input.take_latest() {
            self.last_sample = Some(sample);
        }
        let Some(sample) = self.last_sample else {
            return Ok(StepOutcome::Idle);
        };

        let evaluation = self
            .controller
            .evaluate(sample.distance, sample.beam_width)?;
        self.actuator.command(&sample, &evaluation);
        self.stats.commands += 1;
        Ok(StepOutcome::Commanded(evaluation))
    }

    /// Run exactly `cycles` paced cycles.
    pub fn run_for(&mut self, cycles: u64) -> Result<(), CycleError> {
        self.run_until(Some(cycles), || false)
    }

    /// Run paced cycles until `done()` returns true (checked before every
    /// cycle) or `max_cycles` have executed.
    pub fn run_until(
        &mut self,
        max_cycles: Option<u64>,
        mut done: impl FnMut() -> bool,
    ) -> Result<(), CycleError> {
        debug!(
            ?max_cycles,
            cycle_time_ns = self.cycle_time_ns,
            strict = self.strict_overrun,
            "entering control loop"
        );

        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(max_cycles, &mut done)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop(max_cycles, &mut done)
        }
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(
        &mut self,
        max_cycles: Option<u64>,
        done: &mut dyn FnMut() -> bool,
    ) -> Result<(), CycleError> {
        use nix::sys::time::{TimeSpec, TimeValLike};
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        // Monotonic time in plain nanoseconds; converted back only to sleep.
        let clock = ClockId::CLOCK_MONOTONIC;
        let now_ns = || {
            clock_gettime(clock)
                .map(|ts| ts.num_nanoseconds())
                .map_err(|e| CycleError::RtSetup {
                    step: "clock_gettime",
                    reason: e.to_string(),
                })
        };
        let mut wake_ns = now_ns()?;
        let mut executed = 0u64;

        while max_cycles.is_none_or(|max| executed < max) && !done() {
            let start_ns = now_ns()?;
            let latency_ns = (start_ns - wake_ns).abs();
            wake_ns += self.cycle_time_ns;

            self.step()?;

            self.finish_cycle(now_ns()? - start_ns, latency_ns)?;
            executed += 1;

            let _ = clock_nanosleep(
                clock,
                ClockNanosleepFlags::TIMER_ABSTIME,
                &TimeSpec::nanoseconds(wake_ns),
            );
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(
        &mut self,
        max_cycles: Option<u64>,
        done: &mut dyn FnMut() -> bool,
    ) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let budget = Duration::from_nanos(self.cycle_time_ns.unsigned_abs());
        let mut executed = 0u64;

        while max_cycles.is_none_or(|max| executed < max) && !done() {
            let cycle_start = Instant::now();
            self.step()?;
            let elapsed = cycle_start.elapsed();

            let duration_ns = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
            self.finish_cycle(duration_ns, 0)?;
            executed += 1;

            if let Some(remaining) = budget.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    fn finish_cycle(&mut self, duration_ns: i64, latency_ns: i64) -> Result<(), CycleError> {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns <= self.cycle_time_ns {
            return Ok(());
        }

        self.stats.overruns += 1;
        warn!(
            duration_ns,
            budget_ns = self.cycle_time_ns,
            overruns = self.stats.overruns,
            "cycle overrun"
        );
        if self.strict_overrun {
            return Err(CycleError::CycleOverrun {
                actual_ns: duration_ns,
                budget_ns: self.cycle_time_ns,
            });
        }
        Ok(())
    }

    /// Stop the controller and return the final statistics.
    pub fn shutdown(mut self) -> Result<CycleStats, CycleError> {
        self.controller.stop()?;
        info!(
            cycles = self.stats.cycle_count,
            commands = self.stats.commands,
            overruns = self.stats.overruns,
            dropped_samples = self.input.overwritten(),
            avg_cycle_ns = self.stats.avg_cycle_ns(),
            max_cycle_ns = self.stats.max_cycle_ns,
            "control loop stopped"
        );
        Ok(self.stats)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
