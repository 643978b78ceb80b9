//! Primary and auxiliary objective storage.

use std::collections::{BTreeMap, BTreeSet};

use optstore_ids::{AuxiliaryObjectiveId, ObjectiveId, VariableId};

use crate::model::ModelError;
use crate::storage::{EntityTable, PairIndex, SymmetricMatrix, symmetric_key};
use crate::types::Sense;
use crate::wire::{
    AuxiliaryObjectiveUpdates, AuxiliaryObjectivesSection, ObjectiveSection, ObjectiveUpdates,
    SparseDoubleMatrix, SparseDoubleVector,
};

/// One objective: sense, priority, offset, linear and quadratic terms.
///
/// Priority is only stored; lexicographic solving interprets it downstream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectiveData {
    pub sense: Sense,
    pub priority: i64,
    pub offset: f64,
    pub linear: BTreeMap<VariableId, f64>,
    pub quadratic: SymmetricMatrix<VariableId>,
    pub name: String,
}

impl ObjectiveData {
    pub fn new(sense: Sense, priority: i64) -> Self {
        Self {
            sense,
            priority,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn linear_coefficient(&self, variable: VariableId) -> f64 {
        self.linear.get(&variable).copied().unwrap_or(0.0)
    }

    pub fn quadratic_coefficient(&self, first: VariableId, second: VariableId) -> f64 {
        self.quadratic.get(first, second)
    }

    /// True if `variable` has a nonzero linear or quadratic coefficient.
    pub fn references(&self, variable: VariableId) -> bool {
        self.linear.contains_key(&variable) || !self.quadratic.related(variable).is_empty()
    }

    fn set_linear(&mut self, variable: VariableId, value: f64) -> bool {
        if value == 0.0 {
            self.linear.remove(&variable).is_some()
        } else {
            self.linear.insert(variable, value) != Some(value)
        }
    }

    fn to_section(&self, remove_names: bool) -> ObjectiveSection {
        let mut linear_coefficients = SparseDoubleVector::default();
        for (id, value) in &self.linear {
            linear_coefficients.push(id.inner(), *value);
        }
        let mut quadratic_coefficients = SparseDoubleMatrix::default();
        for (lo, hi, value) in self.quadratic.sorted_entries() {
            quadratic_coefficients.push(lo.inner(), hi.inner(), value);
        }
        ObjectiveSection {
            maximize: self.sense.is_maximize(),
            priority: self.priority,
            offset: self.offset,
            linear_coefficients,
            quadratic_coefficients,
            name: if remove_names {
                String::new()
            } else {
                self.name.clone()
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DirtyObjective {
    sense: bool,
    priority: bool,
    offset: bool,
    linear: BTreeSet<VariableId>,
    quadratic: PairIndex<VariableId, VariableId>,
}

impl DirtyObjective {
    fn is_empty(&self) -> bool {
        !self.sense
            && !self.priority
            && !self.offset
            && self.linear.is_empty()
            && self.quadratic.is_empty()
    }

    fn drop_variable(&mut self, variable: VariableId) {
        self.linear.remove(&variable);
        self.quadratic.remove_row(variable);
        self.quadratic.remove_column(variable);
    }
}

/// Changes to objectives since a tracker checkpoint.
#[derive(Debug, Clone)]
pub struct ObjectiveDiff {
    checkpoint: AuxiliaryObjectiveId,
    variable_checkpoint: VariableId,
    deleted: BTreeSet<AuxiliaryObjectiveId>,
    dirty: BTreeMap<ObjectiveId, DirtyObjective>,
}

impl ObjectiveDiff {
    pub fn new(checkpoint: AuxiliaryObjectiveId, variable_checkpoint: VariableId) -> Self {
        Self {
            checkpoint,
            variable_checkpoint,
            deleted: BTreeSet::new(),
            dirty: BTreeMap::new(),
        }
    }

    pub fn checkpoint(&self) -> AuxiliaryObjectiveId {
        self.checkpoint
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.dirty.values().all(DirtyObjective::is_empty)
    }

    fn tracks(&self, id: ObjectiveId) -> bool {
        match id {
            ObjectiveId::Primary => true,
            ObjectiveId::Auxiliary(aux) => aux < self.checkpoint,
        }
    }

    fn dirty_mut(&mut self, id: ObjectiveId) -> Option<&mut DirtyObjective> {
        if self.tracks(id) {
            Some(self.dirty.entry(id).or_default())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Scalar {
    Sense,
    Priority,
    Offset,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectiveStore {
    primary: ObjectiveData,
    auxiliary: EntityTable<AuxiliaryObjectiveId, ObjectiveData>,
}

impl ObjectiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ObjectiveId) -> Result<&ObjectiveData, ModelError> {
        match id {
            ObjectiveId::Primary => Ok(&self.primary),
            ObjectiveId::Auxiliary(aux) => self.auxiliary.get(aux),
        }
    }

    fn get_mut(&mut self, id: ObjectiveId) -> Result<&mut ObjectiveData, ModelError> {
        match id {
            ObjectiveId::Primary => Ok(&mut self.primary),
            ObjectiveId::Auxiliary(aux) => self.auxiliary.get_mut(aux),
        }
    }

    pub fn contains(&self, id: ObjectiveId) -> bool {
        match id {
            ObjectiveId::Primary => true,
            ObjectiveId::Auxiliary(aux) => self.auxiliary.contains(aux),
        }
    }

    pub fn num_auxiliary(&self) -> usize {
        self.auxiliary.len()
    }

    pub fn next_auxiliary_id(&self) -> AuxiliaryObjectiveId {
        self.auxiliary.next_id()
    }

    pub fn ensure_next_auxiliary_id_at_least(&mut self, id: AuxiliaryObjectiveId) {
        self.auxiliary.ensure_next_id_at_least(id);
    }

    pub fn sorted_auxiliary_ids(&self) -> Vec<AuxiliaryObjectiveId> {
        self.auxiliary.sorted_ids()
    }

    /// Primary first, then auxiliary objectives by id.
    pub fn ids(&self) -> Vec<ObjectiveId> {
        std::iter::once(ObjectiveId::Primary)
            .chain(
                self.sorted_auxiliary_ids()
                    .into_iter()
                    .map(ObjectiveId::Auxiliary),
            )
            .collect()
    }

    /// Names are not tracked, so this never dirties a diff.
    pub fn set_primary_name(&mut self, name: impl Into<String>) {
        self.primary.name = name.into();
    }

    /// Add an auxiliary objective.
    pub fn add_auxiliary(&mut self, data: ObjectiveData) -> AuxiliaryObjectiveId {
        self.auxiliary.add(data)
    }

    pub fn delete_auxiliary<'a>(
        &mut self,
        id: AuxiliaryObjectiveId,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Result<ObjectiveData, ModelError> {
        let data = self.auxiliary.delete(id)?;
        for diff in diffs {
            if diff.tracks(ObjectiveId::Auxiliary(id)) {
                diff.dirty.remove(&ObjectiveId::Auxiliary(id));
                diff.deleted.insert(id);
            }
        }
        Ok(data)
    }

    pub fn set_sense<'a>(
        &mut self,
        id: ObjectiveId,
        sense: Sense,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Result<(), ModelError> {
        let data = self.get_mut(id)?;
        if data.sense == sense {
            return Ok(());
        }
        data.sense = sense;
        mark_scalar(diffs, id, Scalar::Sense);
        Ok(())
    }

    pub fn set_priority<'a>(
        &mut self,
        id: ObjectiveId,
        priority: i64,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Result<(), ModelError> {
        let data = self.get_mut(id)?;
        if data.priority == priority {
            return Ok(());
        }
        data.priority = priority;
        mark_scalar(diffs, id, Scalar::Priority);
        Ok(())
    }

    pub fn set_offset<'a>(
        &mut self,
        id: ObjectiveId,
        offset: f64,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Result<(), ModelError> {
        let data = self.get_mut(id)?;
        if data.offset == offset {
            return Ok(());
        }
        data.offset = offset;
        mark_scalar(diffs, id, Scalar::Offset);
        Ok(())
    }

    pub fn set_linear_coefficient<'a>(
        &mut self,
        id: ObjectiveId,
        variable: VariableId,
        value: f64,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Result<(), ModelError> {
        if !self.get_mut(id)?.set_linear(variable, value) {
            return Ok(());
        }
        for diff in diffs {
            if variable >= diff.variable_checkpoint {
                continue;
            }
            if let Some(dirty) = diff.dirty_mut(id) {
                dirty.linear.insert(variable);
            }
        }
        Ok(())
    }

    pub fn set_quadratic_coefficient<'a>(
        &mut self,
        id: ObjectiveId,
        first: VariableId,
        second: VariableId,
        value: f64,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Result<(), ModelError> {
        if !self.get_mut(id)?.quadratic.set(first, second, value) {
            return Ok(());
        }
        let (lo, hi) = symmetric_key(first, second);
        for diff in diffs {
            if hi >= diff.variable_checkpoint {
                continue;
            }
            if let Some(dirty) = diff.dirty_mut(id) {
                dirty.quadratic.insert(lo, hi);
            }
        }
        Ok(())
    }

    /// Reset offset and every coefficient to zero, keeping sense and priority.
    pub fn clear<'a>(
        &mut self,
        id: ObjectiveId,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Result<(), ModelError> {
        let data = self.get(id)?;
        let linear: Vec<VariableId> = data.linear.keys().copied().collect();
        let quadratic: Vec<(VariableId, VariableId)> = data
            .quadratic
            .sorted_entries()
            .into_iter()
            .map(|(lo, hi, _)| (lo, hi))
            .collect();

        let mut diffs: Vec<&'a mut ObjectiveDiff> = diffs.into_iter().collect();
        self.set_offset(id, 0.0, diffs.iter_mut().map(|diff| &mut **diff))?;
        for variable in linear {
            self.set_linear_coefficient(id, variable, 0.0, diffs.iter_mut().map(|diff| &mut **diff))?;
        }
        for (lo, hi) in quadratic {
            self.set_quadratic_coefficient(
                id,
                lo,
                hi,
                0.0,
                diffs.iter_mut().map(|diff| &mut **diff),
            )?;
        }
        Ok(())
    }

    /// Strip a deleted variable from every objective.
    ///
    /// Visits each objective once, so cost grows with the number of
    /// auxiliary objectives plus the variable's quadratic partners.
    pub fn delete_variable<'a>(
        &mut self,
        variable: VariableId,
        diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    ) -> Vec<ObjectiveId> {
        let mut touched = Vec::new();
        if strip_variable(&mut self.primary, variable) {
            touched.push(ObjectiveId::Primary);
        }
        for (id, data) in self.auxiliary.iter_mut() {
            if strip_variable(data, variable) {
                touched.push(ObjectiveId::Auxiliary(id));
            }
        }
        for diff in diffs {
            for dirty in diff.dirty.values_mut() {
                dirty.drop_variable(variable);
            }
        }
        touched.sort_unstable();
        touched
    }

    /// Objectives with a nonzero term on `variable`.
    pub fn objectives_with_variable(&self, variable: VariableId) -> Vec<ObjectiveId> {
        self.ids()
            .into_iter()
            .filter(|id| self.get(*id).is_ok_and(|data| data.references(variable)))
            .collect()
    }

    pub fn export(&self, remove_names: bool) -> (ObjectiveSection, AuxiliaryObjectivesSection) {
        let mut auxiliary = AuxiliaryObjectivesSection::default();
        for id in self.sorted_auxiliary_ids() {
            if let Ok(data) = self.auxiliary.get(id) {
                auxiliary.ids.push(id.inner());
                auxiliary.objectives.push(data.to_section(remove_names));
            }
        }
        (self.primary.to_section(remove_names), auxiliary)
    }

    pub fn export_update(
        &self,
        diff: &ObjectiveDiff,
        new_variables: &[VariableId],
        remove_names: bool,
    ) -> (ObjectiveUpdates, AuxiliaryObjectiveUpdates) {
        let primary = self.objective_updates(ObjectiveId::Primary, diff, new_variables);

        let mut auxiliary = AuxiliaryObjectiveUpdates {
            deleted_ids: diff.deleted.iter().map(|id| id.inner()).collect(),
            ..AuxiliaryObjectiveUpdates::default()
        };
        for id in self.auxiliary.sorted_ids() {
            if id >= diff.checkpoint {
                if let Ok(data) = self.auxiliary.get(id) {
                    auxiliary.new_objectives.ids.push(id.inner());
                    auxiliary
                        .new_objectives
                        .objectives
                        .push(data.to_section(remove_names));
                }
                continue;
            }
            let updates = self.objective_updates(ObjectiveId::Auxiliary(id), diff, new_variables);
            if !updates.is_empty() {
                auxiliary.ids.push(id.inner());
                auxiliary.updates.push(updates);
            }
        }
        (primary, auxiliary)
    }

    fn objective_updates(
        &self,
        id: ObjectiveId,
        diff: &ObjectiveDiff,
        new_variables: &[VariableId],
    ) -> ObjectiveUpdates {
        let Ok(data) = self.get(id) else {
            return ObjectiveUpdates::default();
        };
        let mut updates = ObjectiveUpdates::default();

        let mut linear: BTreeMap<VariableId, f64> = BTreeMap::new();
        let mut quadratic: BTreeMap<(VariableId, VariableId), f64> = BTreeMap::new();
        if let Some(dirty) = diff.dirty.get(&id) {
            if dirty.sense {
                updates.maximize = Some(data.sense.is_maximize());
            }
            if dirty.priority {
                updates.priority = Some(data.priority);
            }
            if dirty.offset {
                updates.offset = Some(data.offset);
            }
            for variable in &dirty.linear {
                linear.insert(*variable, data.linear_coefficient(*variable));
            }
            for (lo, hi) in dirty.quadratic.iter() {
                quadratic.insert((lo, hi), data.quadratic.get(lo, hi));
            }
        }
        for (variable, value) in data.linear.range(diff.variable_checkpoint..) {
            linear.insert(*variable, *value);
        }
        for variable in new_variables {
            for partner in data.quadratic.related(*variable) {
                let key = symmetric_key(*variable, partner);
                quadratic.insert(key, data.quadratic.get(key.0, key.1));
            }
        }

        for (variable, value) in linear {
            updates.linear_coefficients.push(variable.inner(), value);
        }
        for ((lo, hi), value) in quadratic {
            updates.quadratic_coefficients.push(lo.inner(), hi.inner(), value);
        }
        updates
    }
}

fn strip_variable(data: &mut ObjectiveData, variable: VariableId) -> bool {
    let linear = data.linear.remove(&variable).is_some();
    let quadratic = !data.quadratic.delete_variable(variable).is_empty();
    linear || quadratic
}

fn mark_scalar<'a>(
    diffs: impl IntoIterator<Item = &'a mut ObjectiveDiff>,
    id: ObjectiveId,
    field: Scalar,
) {
    for diff in diffs {
        if let Some(dirty) = diff.dirty_mut(id) {
            match field {
                Scalar::Sense => dirty.sense = true,
                Scalar::Priority => dirty.priority = true,
                Scalar::Offset => dirty.offset = true,
            }
        }
    }
}
