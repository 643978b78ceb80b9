//! Linear constraint storage: row records plus the constraint x variable matrix.

use std::collections::{BTreeMap, BTreeSet};

use optstore_ids::{LinearConstraintId, VariableId};

use crate::model::ModelError;
use crate::storage::{EntityTable, PairIndex, SparseMatrix};
use crate::types::LinearConstraintData;
use crate::wire::{LinearConstraintUpdates, LinearConstraintsSection, SparseDoubleMatrix};

/// Changes to linear constraints since a tracker checkpoint.
///
/// Matrix entries are only recorded when both the row and the column existed
/// at the checkpoint; entries touching a newer row or column are exported from
/// the live matrix instead.
#[derive(Debug, Clone)]
pub struct LinearConstraintDiff {
    checkpoint: LinearConstraintId,
    variable_checkpoint: VariableId,
    deleted: BTreeSet<LinearConstraintId>,
    lower_bounds: BTreeSet<LinearConstraintId>,
    upper_bounds: BTreeSet<LinearConstraintId>,
    matrix: PairIndex<LinearConstraintId, VariableId>,
}

impl LinearConstraintDiff {
    pub fn new(checkpoint: LinearConstraintId, variable_checkpoint: VariableId) -> Self {
        Self {
            checkpoint,
            variable_checkpoint,
            deleted: BTreeSet::new(),
            lower_bounds: BTreeSet::new(),
            upper_bounds: BTreeSet::new(),
            matrix: PairIndex::new(),
        }
    }

    pub fn checkpoint(&self) -> LinearConstraintId {
        self.checkpoint
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
            && self.lower_bounds.is_empty()
            && self.upper_bounds.is_empty()
            && self.matrix.is_empty()
    }

    fn tracks(&self, id: LinearConstraintId) -> bool {
        id < self.checkpoint
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinearConstraintStore {
    constraints: EntityTable<LinearConstraintId, LinearConstraintData>,
    matrix: SparseMatrix<LinearConstraintId, VariableId>,
}

impl LinearConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, data: LinearConstraintData) -> LinearConstraintId {
        self.constraints.add(data)
    }

    pub fn get(&self, id: LinearConstraintId) -> Result<&LinearConstraintData, ModelError> {
        self.constraints.get(id)
    }

    pub fn contains(&self, id: LinearConstraintId) -> bool {
        self.constraints.contains(id)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn next_id(&self) -> LinearConstraintId {
        self.constraints.next_id()
    }

    pub fn ensure_next_id_at_least(&mut self, id: LinearConstraintId) {
        self.constraints.ensure_next_id_at_least(id);
    }

    pub fn sorted_ids(&self) -> Vec<LinearConstraintId> {
        self.constraints.sorted_ids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LinearConstraintId, &LinearConstraintData)> + '_ {
        self.constraints.iter()
    }

    pub fn matrix(&self) -> &SparseMatrix<LinearConstraintId, VariableId> {
        &self.matrix
    }

    pub fn set_lower_bound<'a>(
        &mut self,
        id: LinearConstraintId,
        value: f64,
        diffs: impl IntoIterator<Item = &'a mut LinearConstraintDiff>,
    ) -> Result<(), ModelError> {
        let data = self.constraints.get_mut(id)?;
        if data.bounds.lower == value {
            return Ok(());
        }
        data.bounds.lower = value;
        for diff in diffs {
            if diff.tracks(id) {
                diff.lower_bounds.insert(id);
            }
        }
        Ok(())
    }

    pub fn set_upper_bound<'a>(
        &mut self,
        id: LinearConstraintId,
        value: f64,
        diffs: impl IntoIterator<Item = &'a mut LinearConstraintDiff>,
    ) -> Result<(), ModelError> {
        let data = self.constraints.get_mut(id)?;
        if data.bounds.upper == value {
            return Ok(());
        }
        data.bounds.upper = value;
        for diff in diffs {
            if diff.tracks(id) {
                diff.upper_bounds.insert(id);
            }
        }
        Ok(())
    }

    /// Set one matrix coefficient; zero erases it.
    ///
    /// Only the row is validated here, the root store checks the variable.
    pub fn set_coefficient<'a>(
        &mut self,
        constraint: LinearConstraintId,
        variable: VariableId,
        value: f64,
        diffs: impl IntoIterator<Item = &'a mut LinearConstraintDiff>,
    ) -> Result<(), ModelError> {
        if !self.constraints.contains(constraint) {
            return Err(ModelError::not_found(constraint));
        }
        if !self.matrix.set(constraint, variable, value) {
            return Ok(());
        }
        for diff in diffs {
            if diff.tracks(constraint) && variable < diff.variable_checkpoint {
                diff.matrix.insert(constraint, variable);
            }
        }
        Ok(())
    }

    pub fn coefficient(&self, constraint: LinearConstraintId, variable: VariableId) -> f64 {
        self.matrix.get(constraint, variable)
    }

    /// Delete a constraint and its whole matrix row.
    pub fn delete<'a>(
        &mut self,
        id: LinearConstraintId,
        diffs: impl IntoIterator<Item = &'a mut LinearConstraintDiff>,
    ) -> Result<LinearConstraintData, ModelError> {
        let data = self.constraints.delete(id)?;
        self.matrix.delete_row(id);
        for diff in diffs {
            if !diff.tracks(id) {
                continue;
            }
            diff.lower_bounds.remove(&id);
            diff.upper_bounds.remove(&id);
            diff.matrix.remove_row(id);
            diff.deleted.insert(id);
        }
        Ok(data)
    }

    /// Erase a deleted variable's column. Returns the rows it appeared in.
    ///
    /// Cost is proportional to the number of rows referencing the variable.
    pub fn delete_variable<'a>(
        &mut self,
        variable: VariableId,
        diffs: impl IntoIterator<Item = &'a mut LinearConstraintDiff>,
    ) -> Vec<LinearConstraintId> {
        let rows = self.matrix.delete_column(variable);
        for diff in diffs {
            diff.matrix.remove_column(variable);
        }
        rows
    }

    pub fn export(&self, remove_names: bool) -> (LinearConstraintsSection, SparseDoubleMatrix) {
        let section = self.section(&self.sorted_ids(), remove_names);
        let mut matrix = SparseDoubleMatrix::default();
        for (row, column, value) in self.matrix.sorted_entries() {
            matrix.push(row.inner(), column.inner(), value);
        }
        (section, matrix)
    }

    /// Export changes since `diff`'s checkpoint. `new_variables` are the live
    /// variables created after that checkpoint; their columns are exported
    /// in full.
    pub fn export_update(
        &self,
        diff: &LinearConstraintDiff,
        new_variables: &[VariableId],
        remove_names: bool,
    ) -> LinearConstraintUpdates {
        let mut updates = LinearConstraintUpdates {
            deleted_ids: diff.deleted.iter().map(|id| id.inner()).collect(),
            ..LinearConstraintUpdates::default()
        };
        for id in &diff.lower_bounds {
            if let Ok(data) = self.constraints.get(*id) {
                updates.lower_bounds.push(id.inner(), data.bounds.lower);
            }
        }
        for id in &diff.upper_bounds {
            if let Ok(data) = self.constraints.get(*id) {
                updates.upper_bounds.push(id.inner(), data.bounds.upper);
            }
        }

        let new_rows = self.constraints.sorted_ids_from(diff.checkpoint);
        updates.new_constraints = self.section(&new_rows, remove_names);

        let mut entries: BTreeMap<(LinearConstraintId, VariableId), f64> = diff
            .matrix
            .iter()
            .map(|(row, column)| ((row, column), self.matrix.get(row, column)))
            .collect();
        for row in &new_rows {
            for (column, value) in self.matrix.row(*row) {
                entries.insert((*row, column), value);
            }
        }
        for column in new_variables {
            for (row, value) in self.matrix.column(*column) {
                entries.insert((row, *column), value);
            }
        }
        for ((row, column), value) in entries {
            updates.matrix.push(row.inner(), column.inner(), value);
        }
        updates
    }

    fn section(&self, ids: &[LinearConstraintId], remove_names: bool) -> LinearConstraintsSection {
        let mut section = LinearConstraintsSection::default();
        for id in ids {
            let Ok(data) = self.constraints.get(*id) else {
                continue;
            };
            section.ids.push(id.inner());
            section.lower_bounds.push(data.bounds.lower);
            section.upper_bounds.push(data.bounds.upper);
            section.names.push(if remove_names {
                String::new()
            } else {
                data.name.clone()
            });
        }
        section
    }
}
