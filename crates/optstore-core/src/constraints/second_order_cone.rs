use std::collections::BTreeSet;

use optstore_ids::{SecondOrderConeConstraintId, VariableId};
use serde::{Deserialize, Serialize};

use crate::storage::ConstraintFamily;
use crate::types::LinearExpression;

/// `||arguments_to_norm||_2 <= upper_bound`, every side affine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondOrderConeConstraint {
    pub upper_bound: LinearExpression,
    pub arguments_to_norm: Vec<LinearExpression>,
    #[serde(default)]
    pub name: String,
}

impl SecondOrderConeConstraint {
    pub fn new(upper_bound: LinearExpression, arguments_to_norm: Vec<LinearExpression>) -> Self {
        Self {
            upper_bound,
            arguments_to_norm,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn expressions(&self) -> impl Iterator<Item = &LinearExpression> {
        std::iter::once(&self.upper_bound).chain(&self.arguments_to_norm)
    }
}

impl ConstraintFamily for SecondOrderConeConstraint {
    type Id = SecondOrderConeConstraintId;

    fn related_variables(&self) -> Vec<VariableId> {
        let related: BTreeSet<VariableId> = self
            .expressions()
            .flat_map(|expr| expr.variables())
            .collect();
        related.into_iter().collect()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_name(&mut self) {
        self.name.clear();
    }

    fn delete_variable(&mut self, variable: VariableId) {
        self.upper_bound.remove_variable(variable);
        for argument in &mut self.arguments_to_norm {
            argument.remove_variable(variable);
        }
    }

    fn invalid_coefficient(&self) -> Option<f64> {
        self.expressions()
            .flat_map(|expr| {
                expr.terms
                    .iter()
                    .map(|(_, coeff)| *coeff)
                    .chain(std::iter::once(expr.offset))
            })
            .find(|value| !value.is_finite())
    }
}
