//! Metadata methods for entity naming.
//!
//! Names are fixed when an entity is created. Lookups by name return the
//! lowest matching id; names need not be unique.

use optstore_ids::{LinearConstraintId, ObjectiveId, VariableId};

use crate::constraints::AtomicFamily;
use crate::model::ModelStore;
use crate::model::error::ModelError;

/// Reported for a variable that no longer exists.
pub const DELETED_VARIABLE_NAME: &str = "[variable deleted from model]";
/// Reported for a linear constraint that no longer exists.
pub const DELETED_LINEAR_CONSTRAINT_NAME: &str = "[linear constraint deleted from model]";
/// Reported for an auxiliary objective that no longer exists.
pub const DELETED_OBJECTIVE_NAME: &str = "[objective deleted from model]";
/// Reported for an atomic constraint that no longer exists.
pub const DELETED_CONSTRAINT_NAME: &str = "[constraint deleted from model]";

impl ModelStore {
    /// Get name for a variable.
    pub fn get_variable_name(&self, id: VariableId) -> Result<&str, ModelError> {
        self.variables.get(id).map(|data| data.name.as_str())
    }

    /// Name of `id`, or a fixed placeholder once it has been deleted.
    pub fn variable_name_or_placeholder(&self, id: VariableId) -> &str {
        self.get_variable_name(id).unwrap_or(DELETED_VARIABLE_NAME)
    }

    /// Get name for a linear constraint.
    pub fn get_linear_constraint_name(&self, id: LinearConstraintId) -> Result<&str, ModelError> {
        self.linear_constraints.get(id).map(|data| data.name.as_str())
    }

    pub fn linear_constraint_name_or_placeholder(&self, id: LinearConstraintId) -> &str {
        self.get_linear_constraint_name(id)
            .unwrap_or(DELETED_LINEAR_CONSTRAINT_NAME)
    }

    /// Get objective name.
    pub fn get_objective_name(&self, id: ObjectiveId) -> Result<&str, ModelError> {
        self.objectives.get(id).map(|data| data.name.as_str())
    }

    pub fn objective_name_or_placeholder(&self, id: ObjectiveId) -> &str {
        self.get_objective_name(id).unwrap_or(DELETED_OBJECTIVE_NAME)
    }

    /// Get name for an atomic constraint of family `F`.
    pub fn get_constraint_name<F: AtomicFamily>(&self, id: F::Id) -> Result<&str, ModelError> {
        F::store(&self.atomic).data(id).map(|data| data.name())
    }

    pub fn constraint_name_or_placeholder<F: AtomicFamily>(&self, id: F::Id) -> &str {
        self.get_constraint_name::<F>(id)
            .unwrap_or(DELETED_CONSTRAINT_NAME)
    }

    /// Lookup a variable by name.
    pub fn get_variable_by_name(&self, name: &str) -> Option<VariableId> {
        self.variables
            .sorted_ids()
            .into_iter()
            .find(|id| self.variables.get(*id).is_ok_and(|data| data.name == name))
    }

    /// Lookup a linear constraint by name.
    pub fn get_linear_constraint_by_name(&self, name: &str) -> Option<LinearConstraintId> {
        self.linear_constraints
            .sorted_ids()
            .into_iter()
            .find(|id| {
                self.linear_constraints
                    .get(*id)
                    .is_ok_and(|data| data.name == name)
            })
    }
}
