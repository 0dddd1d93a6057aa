//! # Dynamic-Focus Control Unit
//!
//! Command-line front end of the fuzzy focus controller.
//!
//! - `eval`: one evaluation, prints the actuator voltage
//! - `curves`: membership curves of every variable as JSON
//! - `trace`: every intermediate value of one evaluation as JSON
//! - `loop`: periodic control loop fed with `distance beam_width`
//!   lines on stdin
//!
//! Without `--config`, `/etc/dynfocus/flc.toml` is loaded when present;
//! otherwise the built-in reference deployment is used, with the output
//! levels selected by `--levels`. Logs go to stderr; stdout carries
//! only results.

use clap::{Parser, Subcommand, ValueEnum};
use focus_common::prelude::{DEFAULT_CONFIG_PATH, FlcConfig, LogLevel, OutputLevels};
use focus_control_unit::config::load_config;
use focus_control_unit::controller::{Evaluation, FocusController};
use focus_control_unit::cycle::{rt_setup, Actuator, ControlLoop, SensorSample};
use focus_control_unit::handoff::InputSlot;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Dynamic-focus fuzzy logic controller
#[derive(Parser, Debug)]
#[command(name = "focus_control_unit")]
#[command(version)]
#[command(about = "Fuzzy logic controller for a laser dynamic-focus actuator")]
struct Args {
    /// Controller configuration TOML [default: /etc/dynfocus/flc.toml if present,
    /// else the built-in deployment].
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output voltage levels of the built-in deployment.
    #[arg(long, value_enum, default_value_t = Levels::TwoFourSix, global = true)]
    levels: Levels,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Levels {
    /// 0 V / 1 V / 2 V
    #[value(name = "012")]
    ZeroOneTwo,
    /// 2 V / 4 V / 6 V
    #[value(name = "246")]
    TwoFourSix,
}

impl From<Levels> for OutputLevels {
    fn from(levels: Levels) -> Self {
        match levels {
            Levels::ZeroOneTwo => OutputLevels::ZERO_ONE_TWO,
            Levels::TwoFourSix => OutputLevels::TWO_FOUR_SIX,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one sample and print the voltage.
    Eval {
        /// Camera distance [cm].
        #[arg(long, allow_negative_numbers = true)]
        distance: f64,
        /// Beam-width area [px].
        #[arg(long, allow_negative_numbers = true)]
        beam_width: f64,
    },
    /// Print the membership curves of every variable as JSON.
    Curves,
    /// Print the full inference trace of one sample as JSON.
    Trace {
        #[arg(long, allow_negative_numbers = true)]
        distance: f64,
        #[arg(long, allow_negative_numbers = true)]
        beam_width: f64,
    },
    /// Run the control loop on samples read from stdin.
    Loop {
        /// Stop after this many cycles (default: at end of input).
        #[arg(long)]
        cycles: Option<u64>,

        /// CPU core to pin the loop thread to (`rt` builds).
        #[arg(long, default_value_t = 0)]
        cpu_core: usize,

        /// SCHED_FIFO priority (`rt` builds).
        #[arg(long, default_value_t = 80)]
        rt_priority: i32,
    },
}

fn main() {
    let args = Args::parse();
    let config = load(&args);

    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn load(args: &Args) -> Result<FlcConfig, focus_control_unit::error::FlcError> {
    match args.config {
        Some(ref path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
            load_config(Path::new(DEFAULT_CONFIG_PATH))
        }
        None => Ok(FlcConfig::dynamic_focus(args.levels.into())),
    }
}

fn run(args: &Args, config: FlcConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %config.shared.service_name,
        rules = config.rules.len(),
        "dynamic-focus control unit v{} starting",
        env!("CARGO_PKG_VERSION")
    );
    let mut controller = FocusController::new(config);

    match args.command {
        Command::Eval {
            distance,
            beam_width,
        } => {
            controller.setup()?;
            let evaluation = controller.evaluate(distance, beam_width)?;
            println!("{}", evaluation.voltage);
            controller.stop()?;
        }
        Command::Curves => {
            controller.setup()?;
            println!("{}", serde_json::to_string_pretty(&controller.curves()?)?);
        }
        Command::Trace {
            distance,
            beam_width,
        } => {
            controller.setup()?;
            let trace = controller.trace(distance, beam_width)?;
            println!("{}", serde_json::to_string_pretty(&trace)?);
        }
        Command::Loop {
            cycles,
            cpu_core,
            rt_priority,
        } => run_loop(controller, cycles, cpu_core, rt_priority)?,
    }

    Ok(())
}

/// Logs every command; stands in for the actuator driver.
struct LogActuator;

impl Actuator for LogActuator {
    fn command(&mut self, sample: &SensorSample, evaluation: &Evaluation) {
        info!(
            distance = sample.distance,
            beam_width = sample.beam_width,
            voltage = evaluation.voltage,
            fallback = evaluation.fallback,
            "actuator command"
        );
    }
}

fn run_loop(
    controller: FocusController,
    cycles: Option<u64>,
    cpu_core: usize,
    rt_priority: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let slot = Arc::new(InputSlot::new());
    let eof = Arc::new(AtomicBool::new(false));

    // Sensing side: stdin lines → latest-value slot.
    {
        let slot = Arc::clone(&slot);
        let eof = Arc::clone(&eof);
        thread::Builder::new()
            .name("sensor-reader".to_string())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!("stdin read failed: {e}");
                            break;
                        }
                    };
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }
                    match trimmed.parse::<SensorSample>() {
                        Ok(sample) => slot.publish(sample),
                        Err(e) => warn!(line = trimmed, "skipping sample: {e}"),
                    }
                }
                eof.store(true, Ordering::Release);
            })?;
    }

    rt_setup(cpu_core, rt_priority)?;
    let mut control = ControlLoop::new(controller, slot, LogActuator)?;

    // After end of input, run one more cycle so the final sample is taken.
    let mut drained = false;
    control.run_until(cycles, || {
        if drained {
            return true;
        }
        drained = eof.load(Ordering::Acquire);
        false
    })?;

    control.shutdown()?;
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        "debug"
    } else {
        log_level.as_directive()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
