//! Linguistic variables and their terms.
//!
//! A term's membership curve is sampled once, at build time, over its
//! variable's universe. After that the variable is read-only.

use focus_common::consts::MAX_TERMS;
use focus_common::flc::VariableConfig;
use heapless::Vec;

use crate::error::ConfigurationError;
use crate::fuzzy::membership::Triangle;
use crate::fuzzy::universe::{Curve, Universe};

/// Whether a variable feeds rule premises or receives rule conclusions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableRole {
    Antecedent,
    Consequent,
}

/// A named triangular term with its curve sampled over the owning universe.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    name: String,
    triangle: Triangle,
    curve: Curve,
}

impl Term {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    /// Degrees at each universe sample.
    #[inline]
    pub fn curve(&self) -> &[f64] {
        &self.curve
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinguisticVariable {
    name: String,
    role: VariableRole,
    universe: Universe,
    terms: Vec<Term, MAX_TERMS>,
}

impl LinguisticVariable {
    /// Build a variable: materialize the universe, validate every term's
    /// breakpoints and sample its curve.
    ///
    /// # Errors
    ///
    /// Universe errors, `MalformedTerm`, `NoTerms`, `DuplicateTerm`, or
    /// `Capacity` when more than [`MAX_TERMS`] terms are configured.
    pub fn from_config(
        config: &VariableConfig,
        role: VariableRole,
    ) -> Result<Self, ConfigurationError> {
        let samples = config.universe.samples()?;
        let universe = Universe::new(&config.name, &samples)?;

        if config.terms.is_empty() {
            return Err(ConfigurationError::NoTerms {
                variable: config.name.clone(),
            });
        }
        if config.terms.len() > MAX_TERMS {
            return Err(ConfigurationError::Capacity {
                what: "terms per variable",
                limit: MAX_TERMS,
                actual: config.terms.len(),
            });
        }

        let mut terms: Vec<Term, MAX_TERMS> = Vec::new();
        for term in &config.terms {
            if terms.iter().any(|t| t.name == term.name) {
                return Err(ConfigurationError::DuplicateTerm {
                    variable: config.name.clone(),
                    term: term.name.clone(),
                });
            }
            let [a, b, c] = term.triangle;
            let triangle =
                Triangle::new(a, b, c).map_err(|source| ConfigurationError::MalformedTerm {
                    variable: config.name.clone(),
                    term: term.name.clone(),
                    source,
                })?;
            let curve = triangle.sample(&universe);
            terms
                .push(Term {
                    name: term.name.clone(),
                    triangle,
                    curve,
                })
                .map_err(|_| ConfigurationError::Capacity {
                    what: "terms per variable",
                    limit: MAX_TERMS,
                    actual: config.terms.len(),
                })?;
        }

        Ok(Self {
            name: config.name.clone(),
            role,
            universe,
            terms,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn role(&self) -> VariableRole {
        self.role
    }

    #[inline]
    pub const fn universe(&self) -> &Universe {
        &self.universe
    }

    #[inline]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    #[inline]
    pub fn term(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    pub fn term_index(&self, name: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.name == name)
    }
}
