//! Variable storage and its per-tracker change accumulator.

use std::collections::BTreeSet;

use optstore_ids::VariableId;

use crate::model::ModelError;
use crate::storage::EntityTable;
use crate::types::VariableData;
use crate::wire::{VariableUpdates, VariablesSection};

/// Changes to variables since a tracker checkpoint.
///
/// Only ids below `checkpoint` are recorded; anything newer is exported in
/// full as a new variable.
#[derive(Debug, Clone)]
pub struct VariableDiff {
    checkpoint: VariableId,
    deleted: BTreeSet<VariableId>,
    lower_bounds: BTreeSet<VariableId>,
    upper_bounds: BTreeSet<VariableId>,
    integers: BTreeSet<VariableId>,
}

impl VariableDiff {
    pub fn new(checkpoint: VariableId) -> Self {
        Self {
            checkpoint,
            deleted: BTreeSet::new(),
            lower_bounds: BTreeSet::new(),
            upper_bounds: BTreeSet::new(),
            integers: BTreeSet::new(),
        }
    }

    pub fn checkpoint(&self) -> VariableId {
        self.checkpoint
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
            && self.lower_bounds.is_empty()
            && self.upper_bounds.is_empty()
            && self.integers.is_empty()
    }

    fn tracks(&self, id: VariableId) -> bool {
        id < self.checkpoint
    }
}

#[derive(Debug, Clone, Copy)]
enum Attribute {
    LowerBound,
    UpperBound,
    Integer,
}

#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    variables: EntityTable<VariableId, VariableData>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, data: VariableData) -> VariableId {
        self.variables.add(data)
    }

    pub fn get(&self, id: VariableId) -> Result<&VariableData, ModelError> {
        self.variables.get(id)
    }

    pub fn contains(&self, id: VariableId) -> bool {
        self.variables.contains(id)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn next_id(&self) -> VariableId {
        self.variables.next_id()
    }

    pub fn ensure_next_id_at_least(&mut self, id: VariableId) {
        self.variables.ensure_next_id_at_least(id);
    }

    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.variables.ids()
    }

    pub fn sorted_ids(&self) -> Vec<VariableId> {
        self.variables.sorted_ids()
    }

    /// Live variables created at or after `start`, sorted.
    pub fn sorted_ids_from(&self, start: VariableId) -> Vec<VariableId> {
        self.variables.sorted_ids_from(start)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &VariableData)> + '_ {
        self.variables.iter()
    }

    pub fn set_lower_bound<'a>(
        &mut self,
        id: VariableId,
        value: f64,
        diffs: impl IntoIterator<Item = &'a mut VariableDiff>,
    ) -> Result<(), ModelError> {
        let data = self.variables.get_mut(id)?;
        if data.bounds.lower == value {
            return Ok(());
        }
        data.bounds.lower = value;
        mark(diffs, id, Attribute::LowerBound);
        Ok(())
    }

    pub fn set_upper_bound<'a>(
        &mut self,
        id: VariableId,
        value: f64,
        diffs: impl IntoIterator<Item = &'a mut VariableDiff>,
    ) -> Result<(), ModelError> {
        let data = self.variables.get_mut(id)?;
        if data.bounds.upper == value {
            return Ok(());
        }
        data.bounds.upper = value;
        mark(diffs, id, Attribute::UpperBound);
        Ok(())
    }

    pub fn set_integer<'a>(
        &mut self,
        id: VariableId,
        is_integer: bool,
        diffs: impl IntoIterator<Item = &'a mut VariableDiff>,
    ) -> Result<(), ModelError> {
        let data = self.variables.get_mut(id)?;
        if data.is_integer == is_integer {
            return Ok(());
        }
        data.is_integer = is_integer;
        mark(diffs, id, Attribute::Integer);
        Ok(())
    }

    /// Remove the record. References from other stores are the caller's job.
    pub fn delete<'a>(
        &mut self,
        id: VariableId,
        diffs: impl IntoIterator<Item = &'a mut VariableDiff>,
    ) -> Result<VariableData, ModelError> {
        let data = self.variables.delete(id)?;
        for diff in diffs {
            if !diff.tracks(id) {
                continue;
            }
            diff.lower_bounds.remove(&id);
            diff.upper_bounds.remove(&id);
            diff.integers.remove(&id);
            diff.deleted.insert(id);
        }
        Ok(data)
    }

    pub fn export(&self, remove_names: bool) -> VariablesSection {
        self.section(&self.sorted_ids(), remove_names)
    }

    pub fn export_update(&self, diff: &VariableDiff, remove_names: bool) -> VariableUpdates {
        let mut updates = VariableUpdates {
            deleted_ids: diff.deleted.iter().map(|id| id.inner()).collect(),
            ..VariableUpdates::default()
        };
        for (id, data) in self.tracked(&diff.lower_bounds) {
            updates.lower_bounds.push(id.inner(), data.bounds.lower);
        }
        for (id, data) in self.tracked(&diff.upper_bounds) {
            updates.upper_bounds.push(id.inner(), data.bounds.upper);
        }
        for (id, data) in self.tracked(&diff.integers) {
            updates.integers.push(id.inner(), data.is_integer);
        }
        updates.new_variables = self.section(&self.sorted_ids_from(diff.checkpoint), remove_names);
        updates
    }

    fn tracked<'s>(
        &'s self,
        ids: &'s BTreeSet<VariableId>,
    ) -> impl Iterator<Item = (VariableId, &'s VariableData)> + 's {
        ids.iter().map(move |id| {
            let data = self
                .variables
                .get(*id)
                .expect("dirty variable ids are dropped on delete");
            (*id, data)
        })
    }

    fn section(&self, ids: &[VariableId], remove_names: bool) -> VariablesSection {
        let mut section = VariablesSection::default();
        for id in ids {
            let Ok(data) = self.variables.get(*id) else {
                continue;
            };
            section.ids.push(id.inner());
            section.lower_bounds.push(data.bounds.lower);
            section.upper_bounds.push(data.bounds.upper);
            section.integers.push(data.is_integer);
            section.names.push(if remove_names {
                String::new()
            } else {
                data.name.clone()
            });
        }
        section
    }
}

fn mark<'a>(
    diffs: impl IntoIterator<Item = &'a mut VariableDiff>,
    id: VariableId,
    attribute: Attribute,
) {
    for diff in diffs {
        if !diff.tracks(id) {
            continue;
        }
        let dirty = match attribute {
            Attribute::LowerBound => &mut diff.lower_bounds,
            Attribute::UpperBound => &mut diff.upper_bounds,
            Attribute::Integer => &mut diff.integers,
        };
        dirty.insert(id);
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::Bounds;

    fn store_with(count: usize) -> VariableStore {
        let mut store = VariableStore::new();
        for idx in 0..count {
            store.add(VariableData::continuous(Bounds::new(0.0, 1.0)).with_name(format!("x{idx}")));
        }
        store
    }

    #[test]
    fn setters_dirty_only_tracked_ids() {
        let mut store = store_with(2);
        let mut diff = VariableDiff::new(store.next_id());
        let fresh = store.add(VariableData::default());

        store
            .set_lower_bound(VariableId::new(0), -1.0, [&mut diff])
            .unwrap();
        store.set_integer(fresh, true, [&mut diff]).unwrap();

        let updates = store.export_update(&diff, false);
        assert_eq!(updates.lower_bounds.ids, vec![0]);
        assert_eq!(updates.lower_bounds.values, vec![-1.0]);
        assert!(updates.integers.is_empty());
        assert_eq!(updates.new_variables.ids, vec![fresh.inner()]);
        assert_eq!(updates.new_variables.integers, vec![true]);
    }

    #[test]
    fn unchanged_value_does_not_dirty() {
        let mut store = store_with(1);
        let mut diff = VariableDiff::new(store.next_id());
        store
            .set_upper_bound(VariableId::new(0), 1.0, [&mut diff])
            .unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn delete_replaces_attribute_changes() {
        let mut store = store_with(2);
        let mut diff = VariableDiff::new(store.next_id());
        let x = VariableId::new(0);
        store.set_upper_bound(x, 5.0, [&mut diff]).unwrap();
        store.set_integer(x, true, [&mut diff]).unwrap();
        store.delete(x, [&mut diff]).unwrap();

        let updates = store.export_update(&diff, false);
        assert_eq!(updates.deleted_ids, vec![0]);
        assert!(updates.upper_bounds.is_empty());
        assert!(updates.integers.is_empty());
    }

    #[test]
    fn new_then_deleted_is_invisible() {
        let mut store = store_with(1);
        let mut diff = VariableDiff::new(store.next_id());
        let fresh = store.add(VariableData::default());
        store.delete(fresh, [&mut diff]).unwrap();
        assert!(diff.is_empty());
        assert!(store.export_update(&diff, false).is_empty());
    }

    #[test]
    fn setter_on_missing_variable_fails() {
        let mut store = store_with(1);
        store.delete(VariableId::new(0), []).unwrap();
        let result = store.set_lower_bound(VariableId::new(0), 0.0, []);
        assert!(matches!(result, Err(ModelError::NotFound { .. })));
    }

    #[test]
    fn export_can_strip_names() {
        let store = store_with(2);
        assert_eq!(store.export(false).names, vec!["x0", "x1"]);
        assert_eq!(store.export(true).names, vec!["", ""]);
    }
}
