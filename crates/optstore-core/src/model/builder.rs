//! Model builder methods for adding, deleting and editing entities.
//!
//! Every mutation that changes a value fans out to all live trackers.

use optstore_ids::{AuxiliaryObjectiveId, EntityId, LinearConstraintId, ObjectiveId, VariableId};

use crate::constraints::{AtomicFamily, validate_record};
use crate::model::ModelStore;
use crate::model::error::ModelError;
use crate::storage::ObjectiveData;
use crate::types::{LinearConstraintData, Sense, VariableData, normalize_linear_terms};

fn ensure_finite(value: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidCoefficient { value })
    }
}

impl ModelStore {
    /// Add a variable to the model.
    pub fn add_variable(&mut self, data: VariableData) -> VariableId {
        let id = self.variables.add(data);
        tracing::trace!(
            component = "model",
            operation = "add_variable",
            status = "success",
            variable_id = id.inner(),
            "Added variable"
        );
        id
    }

    /// Delete a variable and every coefficient that references it.
    ///
    /// Cost is proportional to the number of matrix entries, objective terms
    /// and atomic constraints referencing the variable, plus one pass over the
    /// auxiliary objectives.
    pub fn delete_variable(&mut self, id: VariableId) -> Result<(), ModelError> {
        self.variables
            .delete(id, self.trackers.diffs_mut().map(|diff| &mut diff.variables))?;
        let families = self.atomic.families_with_variable(id);
        let rows = self.linear_constraints.delete_variable(
            id,
            self.trackers
                .diffs_mut()
                .map(|diff| &mut diff.linear_constraints),
        );
        let objectives = self
            .objectives
            .delete_variable(id, self.trackers.diffs_mut().map(|diff| &mut diff.objectives));
        let atomic = self.atomic.delete_variable(id);
        tracing::debug!(
            component = "model",
            operation = "delete_variable",
            status = "success",
            variable_id = id.inner(),
            linear_constraints = rows.len(),
            objectives = objectives.len(),
            atomic_constraints = atomic,
            families = ?families,
            "Deleted variable"
        );
        Ok(())
    }

    pub fn set_variable_lower_bound(&mut self, id: VariableId, value: f64) -> Result<(), ModelError> {
        self.variables.set_lower_bound(
            id,
            value,
            self.trackers.diffs_mut().map(|diff| &mut diff.variables),
        )
    }

    pub fn set_variable_upper_bound(&mut self, id: VariableId, value: f64) -> Result<(), ModelError> {
        self.variables.set_upper_bound(
            id,
            value,
            self.trackers.diffs_mut().map(|diff| &mut diff.variables),
        )
    }

    pub fn set_variable_integer(&mut self, id: VariableId, is_integer: bool) -> Result<(), ModelError> {
        self.variables.set_integer(
            id,
            is_integer,
            self.trackers.diffs_mut().map(|diff| &mut diff.variables),
        )
    }

    /// Add a linear constraint with an empty row.
    pub fn add_linear_constraint(&mut self, data: LinearConstraintData) -> LinearConstraintId {
        let id = self.linear_constraints.add(data);
        tracing::trace!(
            component = "model",
            operation = "add_linear_constraint",
            status = "success",
            constraint_id = id.inner(),
            "Added linear constraint"
        );
        id
    }

    /// Add a linear constraint together with its row coefficients.
    ///
    /// Terms are validated before anything is stored.
    pub fn add_linear_constraint_with_terms(
        &mut self,
        data: LinearConstraintData,
        terms: impl IntoIterator<Item = (VariableId, f64)>,
    ) -> Result<LinearConstraintId, ModelError> {
        let terms = normalize_linear_terms(terms);
        for (variable, coefficient) in &terms {
            ensure_finite(*coefficient)?;
            self.ensure_variable_exists(*variable)?;
        }
        let id = self.add_linear_constraint(data);
        for (variable, coefficient) in terms {
            self.set_linear_constraint_coefficient(id, variable, coefficient)?;
        }
        Ok(id)
    }

    pub fn delete_linear_constraint(&mut self, id: LinearConstraintId) -> Result<(), ModelError> {
        self.linear_constraints.delete(
            id,
            self.trackers
                .diffs_mut()
                .map(|diff| &mut diff.linear_constraints),
        )?;
        tracing::debug!(
            component = "model",
            operation = "delete_linear_constraint",
            status = "success",
            constraint_id = id.inner(),
            "Deleted linear constraint"
        );
        Ok(())
    }

    pub fn set_linear_constraint_lower_bound(
        &mut self,
        id: LinearConstraintId,
        value: f64,
    ) -> Result<(), ModelError> {
        self.linear_constraints.set_lower_bound(
            id,
            value,
            self.trackers
                .diffs_mut()
                .map(|diff| &mut diff.linear_constraints),
        )
    }

    pub fn set_linear_constraint_upper_bound(
        &mut self,
        id: LinearConstraintId,
        value: f64,
    ) -> Result<(), ModelError> {
        self.linear_constraints.set_upper_bound(
            id,
            value,
            self.trackers
                .diffs_mut()
                .map(|diff| &mut diff.linear_constraints),
        )
    }

    /// Set a constraint matrix coefficient; zero erases the entry.
    pub fn set_linear_constraint_coefficient(
        &mut self,
        constraint: LinearConstraintId,
        variable: VariableId,
        value: f64,
    ) -> Result<(), ModelError> {
        ensure_finite(value)?;
        self.ensure_variable_exists(variable)?;
        self.linear_constraints.set_coefficient(
            constraint,
            variable,
            value,
            self.trackers
                .diffs_mut()
                .map(|diff| &mut diff.linear_constraints),
        )
    }

    /// Add an auxiliary objective with no terms, minimizing by default.
    pub fn add_auxiliary_objective(
        &mut self,
        priority: i64,
        name: impl Into<String>,
    ) -> AuxiliaryObjectiveId {
        let id = self
            .objectives
            .add_auxiliary(ObjectiveData::new(Sense::Minimize, priority).with_name(name));
        tracing::debug!(
            component = "model",
            operation = "add_auxiliary_objective",
            status = "success",
            objective_id = id.inner(),
            priority,
            "Added auxiliary objective"
        );
        id
    }

    pub fn delete_auxiliary_objective(&mut self, id: AuxiliaryObjectiveId) -> Result<(), ModelError> {
        self.objectives
            .delete_auxiliary(id, self.trackers.diffs_mut().map(|diff| &mut diff.objectives))?;
        tracing::debug!(
            component = "model",
            operation = "delete_auxiliary_objective",
            status = "success",
            objective_id = id.inner(),
            "Deleted auxiliary objective"
        );
        Ok(())
    }

    pub fn set_objective_sense(&mut self, id: ObjectiveId, sense: Sense) -> Result<(), ModelError> {
        self.objectives
            .set_sense(id, sense, self.trackers.diffs_mut().map(|diff| &mut diff.objectives))
    }

    pub fn set_objective_priority(&mut self, id: ObjectiveId, priority: i64) -> Result<(), ModelError> {
        self.objectives.set_priority(
            id,
            priority,
            self.trackers.diffs_mut().map(|diff| &mut diff.objectives),
        )
    }

    pub fn set_objective_offset(&mut self, id: ObjectiveId, offset: f64) -> Result<(), ModelError> {
        ensure_finite(offset)?;
        self.objectives
            .set_offset(id, offset, self.trackers.diffs_mut().map(|diff| &mut diff.objectives))
    }

    /// Set a linear objective coefficient; zero erases the term.
    pub fn set_objective_linear_coefficient(
        &mut self,
        id: ObjectiveId,
        variable: VariableId,
        value: f64,
    ) -> Result<(), ModelError> {
        ensure_finite(value)?;
        self.ensure_variable_exists(variable)?;
        self.objectives.set_linear_coefficient(
            id,
            variable,
            value,
            self.trackers.diffs_mut().map(|diff| &mut diff.objectives),
        )
    }

    /// Set the coefficient of the unordered pair `{first, second}`.
    pub fn set_objective_quadratic_coefficient(
        &mut self,
        id: ObjectiveId,
        first: VariableId,
        second: VariableId,
        value: f64,
    ) -> Result<(), ModelError> {
        ensure_finite(value)?;
        self.ensure_variable_exists(first)?;
        self.ensure_variable_exists(second)?;
        self.objectives.set_quadratic_coefficient(
            id,
            first,
            second,
            value,
            self.trackers.diffs_mut().map(|diff| &mut diff.objectives),
        )
    }

    /// Zero the offset and every term, keeping sense and priority.
    pub fn clear_objective(&mut self, id: ObjectiveId) -> Result<(), ModelError> {
        self.objectives
            .clear(id, self.trackers.diffs_mut().map(|diff| &mut diff.objectives))
    }

    /// Add an atomic constraint of any family.
    ///
    /// Fails without storing anything if a coefficient is not finite or a
    /// referenced variable does not exist.
    pub fn add_constraint<F: AtomicFamily>(&mut self, data: F) -> Result<F::Id, ModelError> {
        validate_record(&data, |variable| self.variables.contains(variable))?;
        let id = F::store_mut(&mut self.atomic).add(data);
        tracing::debug!(
            component = "model",
            operation = "add_constraint",
            status = "success",
            family = F::SECTION,
            constraint_id = id.inner(),
            "Added atomic constraint"
        );
        Ok(id)
    }

    pub fn delete_constraint<F: AtomicFamily>(&mut self, id: F::Id) -> Result<(), ModelError> {
        F::store_mut(&mut self.atomic).delete(
            id,
            self.trackers
                .diffs_mut()
                .map(|diff| F::diff_mut(&mut diff.atomic)),
        )?;
        tracing::debug!(
            component = "model",
            operation = "delete_constraint",
            status = "success",
            family = F::SECTION,
            constraint_id = id.inner(),
            "Deleted atomic constraint"
        );
        Ok(())
    }
}
