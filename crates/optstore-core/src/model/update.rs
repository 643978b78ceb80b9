//! Validated application of incremental updates.
//!
//! Every reference in an update is checked against the store before the
//! first mutation, so a rejected update leaves the store untouched.

use std::collections::BTreeSet;
use std::time::Instant;

use optstore_ids::{AuxiliaryObjectiveId, LinearConstraintId, ObjectiveId, VariableId};

use crate::model::ModelStore;
use crate::model::error::ModelError;
use crate::storage::ObjectiveData;
use crate::types::{Bounds, LinearConstraintData, Sense, VariableData};
use crate::wire::{
    AuxiliaryObjectivesSection, LinearConstraintsSection, ModelUpdate, ObjectiveSection,
    ObjectiveUpdates, SparseBoolVector, SparseDoubleMatrix, SparseDoubleVector, VariablesSection,
};

/// Which ids survive an update: live and not deleted by it, or created by it.
struct Survivors {
    live: BTreeSet<u64>,
    deleted: BTreeSet<u64>,
    created: BTreeSet<u64>,
}

impl Survivors {
    fn exists_after(&self, id: u64) -> bool {
        self.created.contains(&id) || (self.live.contains(&id) && !self.deleted.contains(&id))
    }

    /// Attribute updates may only target entities the consumer already knew.
    fn updatable(&self, id: u64) -> bool {
        self.live.contains(&id) && !self.deleted.contains(&id)
    }
}

fn check_deleted(
    section: &str,
    deleted_ids: &[u64],
    is_live: impl Fn(u64) -> bool,
) -> Result<BTreeSet<u64>, ModelError> {
    let mut deleted = BTreeSet::new();
    for id in deleted_ids {
        if !is_live(*id) {
            return Err(ModelError::invalid_update(
                section,
                Some(*id),
                "deleted id is not live",
            ));
        }
        if !deleted.insert(*id) {
            return Err(ModelError::invalid_update(
                section,
                Some(*id),
                "id deleted twice",
            ));
        }
    }
    Ok(deleted)
}

/// New ids must start at the store's next id, strictly increase and stay
/// below `u64::MAX`.
pub(crate) fn check_new_ids(
    section: &str,
    ids: &[u64],
    next_id: u64,
) -> Result<BTreeSet<u64>, ModelError> {
    let mut floor = next_id;
    for id in ids {
        if *id < floor {
            return Err(ModelError::invalid_update(
                section,
                Some(*id),
                format!("new id must be at least {floor} and strictly increasing"),
            ));
        }
        floor = id.checked_add(1).ok_or_else(|| {
            ModelError::invalid_update(section, Some(*id), "new id must be below u64::MAX")
        })?;
    }
    Ok(ids.iter().copied().collect())
}

fn check_unique_ids(section: &str, ids: &[u64]) -> Result<(), ModelError> {
    let mut seen = BTreeSet::new();
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(id) => Err(ModelError::invalid_update(
            section,
            Some(*id),
            "id listed more than once",
        )),
        None => Ok(()),
    }
}

fn check_lengths(section: &str, expected: usize, lengths: &[usize]) -> Result<(), ModelError> {
    if lengths.iter().all(|len| *len == expected) {
        Ok(())
    } else {
        Err(ModelError::invalid_update(
            section,
            None,
            format!("parallel arrays have lengths {lengths:?}, expected {expected}"),
        ))
    }
}

fn check_finite(section: &str, id: Option<u64>, value: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::invalid_update(
            section,
            id,
            format!("coefficient must be finite (got {value})"),
        ))
    }
}

fn check_sparse_doubles(
    section: &str,
    vector: &SparseDoubleVector,
    target_ok: impl Fn(u64) -> bool,
) -> Result<(), ModelError> {
    check_lengths(section, vector.ids.len(), &[vector.values.len()])?;
    check_unique_ids(section, &vector.ids)?;
    match vector.ids.iter().find(|id| !target_ok(**id)) {
        Some(id) => Err(ModelError::invalid_update(
            section,
            Some(*id),
            "attribute update targets an unknown id",
        )),
        None => Ok(()),
    }
}

fn check_sparse_bools(
    section: &str,
    vector: &SparseBoolVector,
    target_ok: impl Fn(u64) -> bool,
) -> Result<(), ModelError> {
    check_lengths(section, vector.ids.len(), &[vector.values.len()])?;
    check_unique_ids(section, &vector.ids)?;
    match vector.ids.iter().find(|id| !target_ok(**id)) {
        Some(id) => Err(ModelError::invalid_update(
            section,
            Some(*id),
            "attribute update targets an unknown id",
        )),
        None => Ok(()),
    }
}

/// `key` maps an entry to the cell it writes; two entries with the same key
/// are rejected.
fn check_matrix(
    section: &str,
    matrix: &SparseDoubleMatrix,
    row_ok: impl Fn(u64) -> bool,
    column_ok: impl Fn(u64) -> bool,
    key: impl Fn(u64, u64) -> (u64, u64),
) -> Result<(), ModelError> {
    check_lengths(
        section,
        matrix.row_ids.len(),
        &[matrix.column_ids.len(), matrix.coefficients.len()],
    )?;
    let mut seen = BTreeSet::new();
    for (row, column, value) in matrix.iter() {
        if !seen.insert(key(row, column)) {
            return Err(ModelError::invalid_update(
                section,
                Some(row),
                format!("entry ({row}, {column}) listed more than once"),
            ));
        }
        if !row_ok(row) {
            return Err(ModelError::invalid_update(
                section,
                Some(row),
                "row id does not exist",
            ));
        }
        if !column_ok(column) {
            return Err(ModelError::invalid_update(
                section,
                Some(column),
                "column id does not exist",
            ));
        }
        check_finite(section, Some(row), value)?;
    }
    Ok(())
}

fn check_objective_terms(
    section: &str,
    id: Option<u64>,
    offset: Option<f64>,
    linear: &SparseDoubleVector,
    quadratic: &SparseDoubleMatrix,
    variables: &Survivors,
) -> Result<(), ModelError> {
    if let Some(offset) = offset {
        check_finite(section, id, offset)?;
    }
    check_sparse_doubles(section, linear, |variable| variables.exists_after(variable))?;
    for value in &linear.values {
        check_finite(section, id, *value)?;
    }
    check_matrix(
        section,
        quadratic,
        |variable| variables.exists_after(variable),
        |variable| variables.exists_after(variable),
        |first, second| (first.min(second), first.max(second)),
    )
}

fn variable_from_section(section: &VariablesSection, idx: usize) -> VariableData {
    VariableData {
        bounds: Bounds::new(section.lower_bounds[idx], section.upper_bounds[idx]),
        is_integer: section.integers[idx],
        name: section.names[idx].clone(),
    }
}

fn linear_constraint_from_section(
    section: &LinearConstraintsSection,
    idx: usize,
) -> LinearConstraintData {
    LinearConstraintData::new(Bounds::new(
        section.lower_bounds[idx],
        section.upper_bounds[idx],
    ))
    .with_name(section.names[idx].clone())
}

fn objective_from_section(section: &ObjectiveSection) -> ObjectiveData {
    let mut data = ObjectiveData::new(Sense::from_maximize(section.maximize), section.priority)
        .with_name(section.name.clone());
    data.offset = section.offset;
    for (variable, value) in section.linear_coefficients.iter() {
        if value != 0.0 {
            data.linear.insert(VariableId::new(variable), value);
        }
    }
    for (first, second, value) in section.quadratic_coefficients.iter() {
        data.quadratic
            .set(VariableId::new(first), VariableId::new(second), value);
    }
    data
}

impl ModelStore {
    /// Apply an update exported from a model equal to this one.
    ///
    /// All ids and coefficients are validated first; on error nothing is
    /// changed. Changes are recorded by this store's own trackers like any
    /// other mutation.
    pub fn apply_update(&mut self, update: &ModelUpdate) -> Result<(), ModelError> {
        let started = Instant::now();
        if let Err(err) = self.validate_update(update) {
            tracing::warn!(
                component = "update",
                operation = "apply_update",
                status = "error",
                error_code = err.code(),
                error = %err,
                "Rejected update"
            );
            return Err(err);
        }
        self.apply_validated(update)?;
        tracing::debug!(
            component = "update",
            operation = "apply_update",
            status = "success",
            deleted_variables = update.variables.deleted_ids.len(),
            new_variables = update.variables.new_variables.ids.len(),
            new_linear_constraints = update.linear_constraints.new_constraints.ids.len(),
            matrix_entries = update.linear_constraints.matrix.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Applied update"
        );
        Ok(())
    }

    fn validate_update(&self, update: &ModelUpdate) -> Result<(), ModelError> {
        let vars = &update.variables;
        let new_vars = &vars.new_variables;
        let variables = Survivors {
            live: self.variables.ids().map(|id| id.inner()).collect(),
            deleted: check_deleted("variables", &vars.deleted_ids, |id| {
                self.variables.contains(VariableId::new(id))
            })?,
            created: {
                check_lengths(
                    "variables.new_variables",
                    new_vars.ids.len(),
                    &[
                        new_vars.lower_bounds.len(),
                        new_vars.upper_bounds.len(),
                        new_vars.integers.len(),
                        new_vars.names.len(),
                    ],
                )?;
                check_new_ids(
                    "variables.new_variables",
                    &new_vars.ids,
                    self.variables.next_id().inner(),
                )?
            },
        };
        check_sparse_doubles("variables.lower_bounds", &vars.lower_bounds, |id| {
            variables.updatable(id)
        })?;
        check_sparse_doubles("variables.upper_bounds", &vars.upper_bounds, |id| {
            variables.updatable(id)
        })?;
        check_sparse_bools("variables.integers", &vars.integers, |id| {
            variables.updatable(id)
        })?;

        let linear = &update.linear_constraints;
        let new_rows = &linear.new_constraints;
        let constraints = Survivors {
            live: self
                .linear_constraints
                .sorted_ids()
                .into_iter()
                .map(|id| id.inner())
                .collect(),
            deleted: check_deleted("linear_constraints", &linear.deleted_ids, |id| {
                self.linear_constraints
                    .contains(LinearConstraintId::new(id))
            })?,
            created: {
                check_lengths(
                    "linear_constraints.new_constraints",
                    new_rows.ids.len(),
                    &[
                        new_rows.lower_bounds.len(),
                        new_rows.upper_bounds.len(),
                        new_rows.names.len(),
                    ],
                )?;
                check_new_ids(
                    "linear_constraints.new_constraints",
                    &new_rows.ids,
                    self.linear_constraints.next_id().inner(),
                )?
            },
        };
        check_sparse_doubles(
            "linear_constraints.lower_bounds",
            &linear.lower_bounds,
            |id| constraints.updatable(id),
        )?;
        check_sparse_doubles(
            "linear_constraints.upper_bounds",
            &linear.upper_bounds,
            |id| constraints.updatable(id),
        )?;
        check_matrix(
            "linear_constraints.matrix",
            &linear.matrix,
            |row| constraints.exists_after(row),
            |column| variables.exists_after(column),
            |row, column| (row, column),
        )?;

        let primary = &update.objective;
        check_objective_terms(
            "objective",
            None,
            primary.offset,
            &primary.linear_coefficients,
            &primary.quadratic_coefficients,
            &variables,
        )?;

        let auxiliary = &update.auxiliary_objectives;
        let objectives = Survivors {
            live: self
                .objectives
                .sorted_auxiliary_ids()
                .into_iter()
                .map(|id| id.inner())
                .collect(),
            deleted: check_deleted("auxiliary_objectives", &auxiliary.deleted_ids, |id| {
                self.objectives
                    .contains(AuxiliaryObjectiveId::new(id).into())
            })?,
            created: {
                let new_objectives = &auxiliary.new_objectives;
                check_lengths(
                    "auxiliary_objectives.new_objectives",
                    new_objectives.ids.len(),
                    &[new_objectives.objectives.len()],
                )?;
                check_new_ids(
                    "auxiliary_objectives.new_objectives",
                    &new_objectives.ids,
                    self.objectives.next_auxiliary_id().inner(),
                )?
            },
        };
        check_lengths(
            "auxiliary_objectives",
            auxiliary.ids.len(),
            &[auxiliary.updates.len()],
        )?;
        check_unique_ids("auxiliary_objectives", &auxiliary.ids)?;
        for (id, updates) in auxiliary.ids.iter().zip(&auxiliary.updates) {
            if !objectives.updatable(*id) {
                return Err(ModelError::invalid_update(
                    "auxiliary_objectives",
                    Some(*id),
                    "attribute update targets an unknown id",
                ));
            }
            check_objective_terms(
                "auxiliary_objectives",
                Some(*id),
                updates.offset,
                &updates.linear_coefficients,
                &updates.quadratic_coefficients,
                &variables,
            )?;
        }
        for (id, section) in auxiliary
            .new_objectives
            .ids
            .iter()
            .zip(&auxiliary.new_objectives.objectives)
        {
            check_objective_terms(
                "auxiliary_objectives.new_objectives",
                Some(*id),
                Some(section.offset),
                &section.linear_coefficients,
                &section.quadratic_coefficients,
                &variables,
            )?;
        }

        let variable_exists = |variable: VariableId| variables.exists_after(variable.inner());
        self.atomic.validate_update(update, &variable_exists)
    }

    /// Mutation half of [`ModelStore::apply_update`]; `update` is valid.
    fn apply_validated(&mut self, update: &ModelUpdate) -> Result<(), ModelError> {
        self.atomic
            .apply_deletions(update, self.trackers.diffs_mut().map(|diff| &mut diff.atomic))?;
        for id in &update.linear_constraints.deleted_ids {
            self.delete_linear_constraint(LinearConstraintId::new(*id))?;
        }
        for id in &update.auxiliary_objectives.deleted_ids {
            self.delete_auxiliary_objective(AuxiliaryObjectiveId::new(*id))?;
        }
        for id in &update.variables.deleted_ids {
            self.delete_variable(VariableId::new(*id))?;
        }

        let vars = &update.variables;
        for (idx, id) in vars.new_variables.ids.iter().enumerate() {
            self.variables.ensure_next_id_at_least(VariableId::new(*id));
            self.add_variable(variable_from_section(&vars.new_variables, idx));
        }
        for (id, value) in vars.lower_bounds.iter() {
            self.set_variable_lower_bound(VariableId::new(id), value)?;
        }
        for (id, value) in vars.upper_bounds.iter() {
            self.set_variable_upper_bound(VariableId::new(id), value)?;
        }
        for (id, value) in vars.integers.iter() {
            self.set_variable_integer(VariableId::new(id), value)?;
        }

        let linear = &update.linear_constraints;
        for (idx, id) in linear.new_constraints.ids.iter().enumerate() {
            self.linear_constraints
                .ensure_next_id_at_least(LinearConstraintId::new(*id));
            self.add_linear_constraint(linear_constraint_from_section(&linear.new_constraints, idx));
        }
        for (id, value) in linear.lower_bounds.iter() {
            self.set_linear_constraint_lower_bound(LinearConstraintId::new(id), value)?;
        }
        for (id, value) in linear.upper_bounds.iter() {
            self.set_linear_constraint_upper_bound(LinearConstraintId::new(id), value)?;
        }
        for (row, column, value) in linear.matrix.iter() {
            self.set_linear_constraint_coefficient(
                LinearConstraintId::new(row),
                VariableId::new(column),
                value,
            )?;
        }

        self.apply_objective_updates(ObjectiveId::Primary, &update.objective)?;
        let auxiliary = &update.auxiliary_objectives;
        for (id, updates) in auxiliary.ids.iter().zip(&auxiliary.updates) {
            self.apply_objective_updates(AuxiliaryObjectiveId::new(*id).into(), updates)?;
        }
        self.add_objectives(&auxiliary.new_objectives);

        self.atomic.apply_additions(update);
        Ok(())
    }

    fn apply_objective_updates(
        &mut self,
        id: ObjectiveId,
        updates: &ObjectiveUpdates,
    ) -> Result<(), ModelError> {
        if let Some(maximize) = updates.maximize {
            self.set_objective_sense(id, Sense::from_maximize(maximize))?;
        }
        if let Some(priority) = updates.priority {
            self.set_objective_priority(id, priority)?;
        }
        if let Some(offset) = updates.offset {
            self.set_objective_offset(id, offset)?;
        }
        for (variable, value) in updates.linear_coefficients.iter() {
            self.set_objective_linear_coefficient(id, VariableId::new(variable), value)?;
        }
        for (first, second, value) in updates.quadratic_coefficients.iter() {
            self.set_objective_quadratic_coefficient(
                id,
                VariableId::new(first),
                VariableId::new(second),
                value,
            )?;
        }
        Ok(())
    }

    fn add_objectives(&mut self, section: &AuxiliaryObjectivesSection) {
        for (id, objective) in section.ids.iter().zip(&section.objectives) {
            self.objectives
                .ensure_next_auxiliary_id_at_least(AuxiliaryObjectiveId::new(*id));
            self.objectives
                .add_auxiliary(objective_from_section(objective));
        }
    }
}
