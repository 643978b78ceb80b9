//! Storage access methods for the model.

use optstore_ids::{AuxiliaryObjectiveId, LinearConstraintId, ObjectiveId, VariableId};

use super::ModelStore;
use super::error::ModelError;
use crate::constraints::AtomicFamily;
use crate::storage::ObjectiveData;
use crate::types::{LinearConstraintData, VariableData};

impl ModelStore {
    /// Get the number of live variables
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Get the number of live linear constraints
    pub fn num_linear_constraints(&self) -> usize {
        self.linear_constraints.len()
    }

    /// Get the number of nonzero linear constraint matrix entries.
    pub fn num_matrix_entries(&self) -> usize {
        self.linear_constraints.matrix().len()
    }

    pub fn num_auxiliary_objectives(&self) -> usize {
        self.objectives.num_auxiliary()
    }

    /// Number of live constraints of family `F`.
    pub fn num_constraints<F: AtomicFamily>(&self) -> usize {
        F::store(&self.atomic).size()
    }

    /// Number of live atomic constraints across every family.
    pub fn num_atomic_constraints(&self) -> usize {
        self.atomic.len()
    }

    pub fn has_variable(&self, id: VariableId) -> bool {
        self.variables.contains(id)
    }

    pub fn has_linear_constraint(&self, id: LinearConstraintId) -> bool {
        self.linear_constraints.contains(id)
    }

    pub fn has_auxiliary_objective(&self, id: AuxiliaryObjectiveId) -> bool {
        self.objectives.contains(id.into())
    }

    pub fn has_constraint<F: AtomicFamily>(&self, id: F::Id) -> bool {
        F::store(&self.atomic).contains(id)
    }

    /// Id the next added variable will receive.
    pub fn next_variable_id(&self) -> VariableId {
        self.variables.next_id()
    }

    pub fn next_linear_constraint_id(&self) -> LinearConstraintId {
        self.linear_constraints.next_id()
    }

    pub fn next_auxiliary_objective_id(&self) -> AuxiliaryObjectiveId {
        self.objectives.next_auxiliary_id()
    }

    pub fn next_constraint_id<F: AtomicFamily>(&self) -> F::Id {
        F::store(&self.atomic).next_id()
    }

    /// Live variable ids in ascending order.
    pub fn variable_ids(&self) -> Vec<VariableId> {
        self.variables.sorted_ids()
    }

    pub fn linear_constraint_ids(&self) -> Vec<LinearConstraintId> {
        self.linear_constraints.sorted_ids()
    }

    /// The primary objective followed by auxiliary objectives by id.
    pub fn objective_ids(&self) -> Vec<ObjectiveId> {
        self.objectives.ids()
    }

    pub fn constraint_ids<F: AtomicFamily>(&self) -> Vec<F::Id> {
        F::store(&self.atomic).sorted_ids()
    }

    /// Get a variable by ID.
    pub fn get_variable(&self, id: VariableId) -> Result<&VariableData, ModelError> {
        self.variables.get(id)
    }

    /// Get a linear constraint by ID.
    pub fn get_linear_constraint(
        &self,
        id: LinearConstraintId,
    ) -> Result<&LinearConstraintData, ModelError> {
        self.linear_constraints.get(id)
    }

    /// Get an objective; the primary objective always exists.
    pub fn get_objective(&self, id: ObjectiveId) -> Result<&ObjectiveData, ModelError> {
        self.objectives.get(id)
    }

    /// Get an atomic constraint of family `F`.
    pub fn get_constraint<F: AtomicFamily>(&self, id: F::Id) -> Result<&F, ModelError> {
        F::store(&self.atomic).data(id)
    }

    /// Matrix coefficient, 0.0 when absent. Both ends must be live.
    pub fn get_linear_constraint_coefficient(
        &self,
        constraint: LinearConstraintId,
        variable: VariableId,
    ) -> Result<f64, ModelError> {
        self.linear_constraints.get(constraint)?;
        self.ensure_variable_exists(variable)?;
        Ok(self.linear_constraints.coefficient(constraint, variable))
    }

    /// Nonzero `(variable, coefficient)` pairs of one row, by variable id.
    pub fn get_linear_constraint_terms(
        &self,
        id: LinearConstraintId,
    ) -> Result<Vec<(VariableId, f64)>, ModelError> {
        self.linear_constraints.get(id)?;
        Ok(self.linear_constraints.matrix().row(id))
    }

    /// Linear constraints with a nonzero coefficient on `variable`, ascending.
    pub fn linear_constraints_with_variable(
        &self,
        variable: VariableId,
    ) -> Result<Vec<LinearConstraintId>, ModelError> {
        self.ensure_variable_exists(variable)?;
        Ok(self
            .linear_constraints
            .matrix()
            .column_entries(variable)
            .collect())
    }

    /// Variables with a nonzero coefficient in `constraint`, ascending.
    pub fn variables_in_linear_constraint(
        &self,
        constraint: LinearConstraintId,
    ) -> Result<Vec<VariableId>, ModelError> {
        self.linear_constraints.get(constraint)?;
        Ok(self
            .linear_constraints
            .matrix()
            .row_entries(constraint)
            .collect())
    }

    /// Objectives with a nonzero linear or quadratic term on `variable`.
    pub fn objectives_with_variable(
        &self,
        variable: VariableId,
    ) -> Result<Vec<ObjectiveId>, ModelError> {
        self.ensure_variable_exists(variable)?;
        Ok(self.objectives.objectives_with_variable(variable))
    }

    /// Constraints of family `F` that reference `variable`, ascending.
    pub fn constraints_with_variable<F: AtomicFamily>(
        &self,
        variable: VariableId,
    ) -> Result<Vec<F::Id>, ModelError> {
        self.ensure_variable_exists(variable)?;
        Ok(F::store(&self.atomic).related_constraints(variable))
    }
}
