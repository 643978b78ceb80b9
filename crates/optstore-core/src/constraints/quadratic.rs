use std::collections::BTreeSet;

use optstore_ids::{QuadraticConstraintId, VariableId};
use serde::{Deserialize, Serialize};

use crate::storage::{ConstraintFamily, symmetric_key};
use crate::types::{Bounds, normalize_linear_terms, normalize_quadratic_terms};

/// `lower <= a'x + x'Qx <= upper`, with `Q` stored as upper-triangular pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticConstraint {
    pub linear_terms: Vec<(VariableId, f64)>,
    pub quadratic_terms: Vec<(VariableId, VariableId, f64)>,
    pub bounds: Bounds,
    #[serde(default)]
    pub name: String,
}

impl QuadraticConstraint {
    pub fn new(
        linear_terms: impl IntoIterator<Item = (VariableId, f64)>,
        quadratic_terms: impl IntoIterator<Item = (VariableId, VariableId, f64)>,
        bounds: Bounds,
    ) -> Self {
        Self {
            linear_terms: normalize_linear_terms(linear_terms),
            quadratic_terms: normalize_quadratic_terms(quadratic_terms),
            bounds,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn linear_coefficient(&self, variable: VariableId) -> f64 {
        self.linear_terms
            .iter()
            .find(|(id, _)| *id == variable)
            .map_or(0.0, |(_, coeff)| *coeff)
    }

    /// Coefficient of the unordered pair `{first, second}`.
    pub fn quadratic_coefficient(&self, first: VariableId, second: VariableId) -> f64 {
        let key = symmetric_key(first, second);
        self.quadratic_terms
            .iter()
            .find(|(lo, hi, _)| (*lo, *hi) == key)
            .map_or(0.0, |(_, _, coeff)| *coeff)
    }
}

impl ConstraintFamily for QuadraticConstraint {
    type Id = QuadraticConstraintId;

    fn related_variables(&self) -> Vec<VariableId> {
        let mut related: BTreeSet<VariableId> =
            self.linear_terms.iter().map(|(id, _)| *id).collect();
        for (lo, hi, _) in &self.quadratic_terms {
            related.insert(*lo);
            related.insert(*hi);
        }
        related.into_iter().collect()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_name(&mut self) {
        self.name.clear();
    }

    fn delete_variable(&mut self, variable: VariableId) {
        self.linear_terms.retain(|(id, _)| *id != variable);
        self.quadratic_terms
            .retain(|(lo, hi, _)| *lo != variable && *hi != variable);
    }

    fn invalid_coefficient(&self) -> Option<f64> {
        self.linear_terms
            .iter()
            .map(|(_, coeff)| *coeff)
            .chain(self.quadratic_terms.iter().map(|(_, _, coeff)| *coeff))
            .find(|coeff| !coeff.is_finite())
    }
}
