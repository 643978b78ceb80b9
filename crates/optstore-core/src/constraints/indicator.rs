use std::collections::BTreeSet;

use optstore_ids::{IndicatorConstraintId, VariableId};
use serde::{Deserialize, Serialize};

use crate::storage::ConstraintFamily;
use crate::types::{Bounds, normalize_linear_terms};

/// `indicator = 1` (or `0` when `activate_on_zero`) implies
/// `lower <= a'x <= upper`.
///
/// Deleting the indicator variable leaves `indicator` as `None`; the implied
/// constraint is kept so its data stays inspectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConstraint {
    pub indicator: Option<VariableId>,
    #[serde(default)]
    pub activate_on_zero: bool,
    pub terms: Vec<(VariableId, f64)>,
    pub bounds: Bounds,
    #[serde(default)]
    pub name: String,
}

impl IndicatorConstraint {
    pub fn new(
        indicator: VariableId,
        terms: impl IntoIterator<Item = (VariableId, f64)>,
        bounds: Bounds,
    ) -> Self {
        Self {
            indicator: Some(indicator),
            activate_on_zero: false,
            terms: normalize_linear_terms(terms),
            bounds,
            name: String::new(),
        }
    }

    pub fn activate_on_zero(mut self, activate_on_zero: bool) -> Self {
        self.activate_on_zero = activate_on_zero;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ConstraintFamily for IndicatorConstraint {
    type Id = IndicatorConstraintId;

    fn related_variables(&self) -> Vec<VariableId> {
        let mut related: BTreeSet<VariableId> = self.terms.iter().map(|(id, _)| *id).collect();
        related.extend(self.indicator);
        related.into_iter().collect()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_name(&mut self) {
        self.name.clear();
    }

    fn delete_variable(&mut self, variable: VariableId) {
        if self.indicator == Some(variable) {
            self.indicator = None;
        }
        self.terms.retain(|(id, _)| *id != variable);
    }

    fn invalid_coefficient(&self) -> Option<f64> {
        self.terms
            .iter()
            .map(|(_, coeff)| *coeff)
            .find(|coeff| !coeff.is_finite())
    }
}
