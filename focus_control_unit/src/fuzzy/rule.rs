//! Rule base: resolved, immutable fuzzy rules.
//!
//! Each rule names its own combinator. AND takes the minimum of the
//! condition degrees, OR the maximum.

use focus_common::consts::{MAX_ANTECEDENTS, MAX_RULES};
use focus_common::flc::{Combinator, RuleConfig};
use heapless::Vec;

use crate::error::ConfigurationError;
use crate::fuzzy::fuzzify::Degrees;
use crate::fuzzy::variable::LinguisticVariable;

/// Combine condition degrees. An empty premise yields 0.
#[inline]
pub fn combine(combinator: Combinator, degrees: impl IntoIterator<Item = f64>) -> f64 {
    let mut iter = degrees.into_iter();
    let Some(first) = iter.next() else {
        return 0.0;
    };
    match combinator {
        Combinator::And => iter.fold(first, f64::min),
        Combinator::Or => iter.fold(first, f64::max),
    }
}

/// `antecedents[variable]` is `terms[term]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub variable: usize,
    pub term: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    combinator: Combinator,
    conditions: Vec<Condition, MAX_ANTECEDENTS>,
    consequent: usize,
}

impl Rule {
    /// Resolve a configured rule's names to indices.
    ///
    /// `index` is the rule's position, used for error context only.
    pub fn resolve(
        index: usize,
        config: &RuleConfig,
        antecedents: &[LinguisticVariable],
        consequent: &LinguisticVariable,
    ) -> Result<Self, ConfigurationError> {
        if config.when.is_empty() {
            return Err(ConfigurationError::RuleWithoutConditions { rule: index });
        }
        if config.when.len() > MAX_ANTECEDENTS {
            return Err(ConfigurationError::Capacity {
                what: "conditions per rule",
                limit: MAX_ANTECEDENTS,
                actual: config.when.len(),
            });
        }

        let mut conditions = Vec::new();
        for cond in &config.when {
            let variable = antecedents
                .iter()
                .position(|v| v.name() == cond.variable)
                .ok_or_else(|| ConfigurationError::UnknownVariable {
                    rule: index,
                    variable: cond.variable.clone(),
                })?;
            let term = antecedents[variable].term_index(&cond.term).ok_or_else(|| {
                ConfigurationError::UnknownTerm {
                    rule: index,
                    variable: cond.variable.clone(),
                    term: cond.term.clone(),
                }
            })?;
            conditions
                .push(Condition { variable, term })
                .map_err(|_| ConfigurationError::Capacity {
                    what: "conditions per rule",
                    limit: MAX_ANTECEDENTS,
                    actual: config.when.len(),
                })?;
        }

        let consequent = consequent.term_index(&config.then).ok_or_else(|| {
            ConfigurationError::UnknownConsequent {
                rule: index,
                term: config.then.clone(),
            }
        })?;

        Ok(Self {
            combinator: config.combinator,
            conditions,
            consequent,
        })
    }

    #[inline]
    pub const fn combinator(&self) -> Combinator {
        self.combinator
    }

    #[inline]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Index of the consequent term.
    #[inline]
    pub const fn consequent(&self) -> usize {
        self.consequent
    }

    /// Firing strength given each antecedent's fuzzified degrees.
    pub fn firing_strength(&self, degrees: &[Degrees]) -> f64 {
        combine(
            self.combinator,
            self.conditions.iter().map(|c| {
                degrees
                    .get(c.variable)
                    .and_then(|d| d.get(c.term))
                    .copied()
                    .unwrap_or(0.0)
            }),
        )
    }
}

/// Ordered, non-empty set of rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBase {
    rules: Vec<Rule, MAX_RULES>,
}

impl RuleBase {
    /// # Errors
    ///
    /// `EmptyRuleBase`, `Capacity`, or any resolution error of [`Rule::resolve`].
    pub fn from_config(
        rules: &[RuleConfig],
        antecedents: &[LinguisticVariable],
        consequent: &LinguisticVariable,
    ) -> Result<Self, ConfigurationError> {
        if rules.is_empty() {
            return Err(ConfigurationError::EmptyRuleBase);
        }
        if rules.len() > MAX_RULES {
            return Err(ConfigurationError::Capacity {
                what: "rules",
                limit: MAX_RULES,
                actual: rules.len(),
            });
        }

        let mut resolved = Vec::new();
        for (index, config) in rules.iter().enumerate() {
            let rule = Rule::resolve(index, config, antecedents, consequent)?;
            resolved
                .push(rule)
                .map_err(|_| ConfigurationError::Capacity {
                    what: "rules",
                    limit: MAX_RULES,
                    actual: rules.len(),
                })?;
        }
        Ok(Self { rules: resolved })
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Never true for a constructed rule base.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
