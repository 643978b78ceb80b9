use std::collections::BTreeMap;

use optstore_ids::VariableId;
use serde::{Deserialize, Serialize};

use crate::storage::symmetric_key;

/// Optimization sense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    pub fn is_maximize(self) -> bool {
        matches!(self, Sense::Maximize)
    }

    pub fn from_maximize(maximize: bool) -> Self {
        if maximize {
            Sense::Maximize
        } else {
            Sense::Minimize
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Minimize => "minimize",
            Sense::Maximize => "maximize",
        }
    }
}

/// Bounds for a variable or constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(with = "crate::wire::float::scalar")]
    pub lower: f64,
    #[serde(with = "crate::wire::float::scalar")]
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `(-inf, +inf)`
    pub fn free() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::free()
    }
}

/// A decision variable with bounds and integrality constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableData {
    pub bounds: Bounds,
    pub is_integer: bool,
    pub name: String,
}

impl VariableData {
    /// Create a binary variable with bounds [0, 1] and integer constraint.
    pub fn binary() -> Self {
        Self {
            bounds: Bounds::new(0.0, 1.0),
            is_integer: true,
            name: String::new(),
        }
    }

    /// Create a continuous variable with specified bounds.
    pub fn continuous(bounds: Bounds) -> Self {
        Self {
            bounds,
            is_integer: false,
            name: String::new(),
        }
    }

    /// Create an integer variable with specified bounds.
    pub fn integer(bounds: Bounds) -> Self {
        Self {
            bounds,
            is_integer: true,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for VariableData {
    fn default() -> Self {
        Self::continuous(Bounds::free())
    }
}

/// A linear constraint row with lower and upper bounds.
///
/// Coefficients live in the model's sparse matrix, not in this record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearConstraintData {
    pub bounds: Bounds,
    pub name: String,
}

impl LinearConstraintData {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Merge duplicate variables, drop zero coefficients and sort by id.
pub fn normalize_linear_terms(
    terms: impl IntoIterator<Item = (VariableId, f64)>,
) -> Vec<(VariableId, f64)> {
    let mut merged: BTreeMap<VariableId, f64> = BTreeMap::new();
    for (var_id, coeff) in terms {
        *merged.entry(var_id).or_insert(0.0) += coeff;
    }
    merged.into_iter().filter(|(_, coeff)| *coeff != 0.0).collect()
}

/// Like [`normalize_linear_terms`] for unordered variable pairs; each pair is
/// reported with the lower id first.
pub fn normalize_quadratic_terms(
    terms: impl IntoIterator<Item = (VariableId, VariableId, f64)>,
) -> Vec<(VariableId, VariableId, f64)> {
    let mut merged: BTreeMap<(VariableId, VariableId), f64> = BTreeMap::new();
    for (first, second, coeff) in terms {
        *merged.entry(symmetric_key(first, second)).or_insert(0.0) += coeff;
    }
    merged
        .into_iter()
        .filter(|(_, coeff)| *coeff != 0.0)
        .map(|((lo, hi), coeff)| (lo, hi, coeff))
        .collect()
}

/// Affine expression `sum(coeff * var) + offset` with normalized terms.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearExpression {
    pub terms: Vec<(VariableId, f64)>,
    pub offset: f64,
}

impl LinearExpression {
    pub fn new(terms: impl IntoIterator<Item = (VariableId, f64)>, offset: f64) -> Self {
        Self {
            terms: normalize_linear_terms(terms),
            offset,
        }
    }

    pub fn constant(offset: f64) -> Self {
        Self {
            terms: Vec::new(),
            offset,
        }
    }

    pub fn coefficient(&self, variable: VariableId) -> f64 {
        self.terms
            .binary_search_by_key(&variable, |(id, _)| *id)
            .map(|idx| self.terms[idx].1)
            .unwrap_or(0.0)
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.terms.iter().map(|(id, _)| *id)
    }

    /// Drop `variable` from the expression. Returns true if it was present.
    pub fn remove_variable(&mut self, variable: VariableId) -> bool {
        let before = self.terms.len();
        self.terms.retain(|(id, _)| *id != variable);
        self.terms.len() != before
    }
}
