//! System-wide constants for the dynamic-focus workspace.
//!
//! Capacity limits sized for allocation-free evaluation, plus default
//! pacing and paths. Imported by all crates, no duplication permitted.

use static_assertions::const_assert;

/// Maximum number of samples in one universe of discourse.
pub const MAX_UNIVERSE_POINTS: usize = 128;

/// Maximum number of linguistic terms per variable.
pub const MAX_TERMS: usize = 8;

/// Maximum number of antecedent (input) variables.
pub const MAX_INPUTS: usize = 4;

/// Maximum number of rules in one rule base.
pub const MAX_RULES: usize = 32;

/// Maximum number of conditions in one rule premise.
pub const MAX_ANTECEDENTS: usize = 4;

/// Default control cycle time in microseconds (one camera frame at 30 fps).
pub const CYCLE_TIME_US: u64 = 33_333;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dynfocus/flc.toml";

// Clamp warnings pack two bits per input into a `u8`.
const_assert!(2 * MAX_INPUTS <= 8);
// The distance universe of the reference deployment has 51 samples.
const_assert!(MAX_UNIVERSE_POINTS >= 51);
// The reference rule base is a full 3x3 grid.
const_assert!(MAX_RULES >= 9);
