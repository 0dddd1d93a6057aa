//! Dynamic-focus common library.
//!
//! Shared constants, TOML configuration loading, and the configuration
//! schema of the fuzzy logic controller used by every crate of the
//! dynamic-focus workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Capacity limits and defaults
//! - [`config`] - Configuration loading trait and shared types
//! - [`flc`] - Fuzzy controller schema and the reference deployment
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod flc;
pub mod prelude;
