//! Fuzzy inference core.
//!
//! Strictly forward pipeline: crisp inputs → fuzzification → rule
//! evaluation → aggregation → centroid defuzzification → crisp output.
//! Every stage is a pure function over fixed-capacity curves. Only the
//! trace path allocates.

pub mod defuzz;
pub mod fuzzify;
pub mod inference;
pub mod membership;
pub mod rule;
pub mod universe;
pub mod variable;
