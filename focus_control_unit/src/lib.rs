//! # Dynamic-Focus Control Unit Library
//!
//! Fuzzy logic controller that maps the camera distance and the measured
//! laser beam-width area to the voltage of the dynamic-focus actuator.
//!
//! ## Pipeline
//!
//! 1. **Fuzzify**: crisp input → degree per term (interpolated, clamped)
//! 2. **Fire**: per-rule AND (min) / OR (max) of condition degrees
//! 3. **Activate**: consequent curve clipped at the firing strength
//! 4. **Aggregate**: elementwise max of all activations
//! 5. **Defuzzify**: discrete centroid, with a zero-sum fallback
//!
//! ## Allocation-Free Evaluation
//!
//! Universes, curves, terms and rules live in fixed-capacity `heapless`
//! storage built once by `setup()`. `run()` performs no heap allocation.

pub mod config;
pub mod controller;
pub mod cycle;
pub mod error;
pub mod fuzzy;
pub mod handoff;
pub mod state;

use static_assertions::assert_impl_all;

assert_impl_all!(fuzzy::inference::InferenceEngine: Send, Sync);
assert_impl_all!(controller::FocusController: Send);
assert_impl_all!(handoff::InputSlot<cycle::SensorSample>: Send, Sync);
