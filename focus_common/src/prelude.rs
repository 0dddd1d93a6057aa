//! Prelude module for common re-exports.
//!
//! ```rust
//! use focus_common::prelude::*;
//!
//! let config = FlcConfig::dynamic_focus(OutputLevels::TWO_FOUR_SIX);
//! assert_eq!(config.rules.len(), 9);
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Fuzzy Controller Schema ────────────────────────────────────────
pub use crate::flc::{
    Combinator, ConditionConfig, ControllerSettings, FlcConfig, OutputLevels, RuleConfig,
    TermConfig, UniverseConfig, VariableConfig, ZeroSumFallback,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{
    CYCLE_TIME_US, DEFAULT_CONFIG_PATH, MAX_ANTECEDENTS, MAX_INPUTS, MAX_RULES, MAX_TERMS,
    MAX_UNIVERSE_POINTS,
};

/// Default control cycle time as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US);
