//! Special ordered sets of type 1 and 2.
//!
//! Both families share one record layout: a list of affine expressions and
//! optional weights ordering them. An empty `weights` list means the natural
//! order `1, 2, ..., n`; otherwise there is exactly one weight per expression.

use std::collections::BTreeSet;

use optstore_ids::{Sos1ConstraintId, Sos2ConstraintId, VariableId};
use serde::{Deserialize, Serialize};

use crate::storage::ConstraintFamily;
use crate::types::LinearExpression;

macro_rules! define_sos_constraint {
    ($(#[$doc:meta])* $name:ident, $id:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub expressions: Vec<LinearExpression>,
            #[serde(default)]
            pub weights: Vec<f64>,
            #[serde(default)]
            pub name: String,
        }

        impl $name {
            pub fn new(expressions: Vec<LinearExpression>, weights: Vec<f64>) -> Self {
                Self {
                    expressions,
                    weights,
                    name: String::new(),
                }
            }

            pub fn with_name(mut self, name: impl Into<String>) -> Self {
                self.name = name.into();
                self
            }

            /// Weight of the expression at `index`, its 1-based position
            /// when no weights were given.
            pub fn weight(&self, index: usize) -> f64 {
                if self.weights.is_empty() {
                    (index + 1) as f64
                } else {
                    self.weights[index]
                }
            }
        }

        impl ConstraintFamily for $name {
            type Id = $id;

            fn related_variables(&self) -> Vec<VariableId> {
                let related: BTreeSet<VariableId> = self
                    .expressions
                    .iter()
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
                for expr in &mut self.expressions {
                    expr.remove_variable(variable);
                }
            }

            fn invalid_coefficient(&self) -> Option<f64> {
                self.expressions
                    .iter()
                    .flat_map(|expr| {
                        expr.terms
                            .iter()
                            .map(|(_, coeff)| *coeff)
                            .chain(std::iter::once(expr.offset))
                    })
                    .chain(self.weights.iter().copied())
                    .find(|value| !value.is_finite())
            }

            fn shape_error(&self) -> Option<String> {
                if self.weights.is_empty() || self.weights.len() == self.expressions.len() {
                    None
                } else {
                    Some(format!(
                        "{} weights for {} expressions",
                        self.weights.len(),
                        self.expressions.len()
                    ))
                }
            }
        }
    };
}

define_sos_constraint!(
    /// At most one expression may be nonzero.
    Sos1Constraint,
    Sos1ConstraintId
);

define_sos_constraint!(
    /// At most two expressions may be nonzero, and they must be adjacent in
    /// weight order.
    Sos2Constraint,
    Sos2ConstraintId
);
