//! Generic storage shared by every atomic constraint family.
//!
//! A family supplies its data record and a [`ConstraintFamily`] impl; this
//! module handles ids, deletion, the variable -> constraint reverse index and
//! change tracking without knowing anything else about the family.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use optstore_ids::{EntityId, VariableId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::ModelError;
use crate::storage::EntityTable;
use crate::wire::{AtomicConstraintUpdates, ConstraintSection};

/// Capabilities the generic store needs from a constraint family's record.
pub trait ConstraintFamily:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Id: EntityId;

    /// Variables appearing with a nonzero coefficient, ascending, no duplicates.
    fn related_variables(&self) -> Vec<VariableId>;

    fn name(&self) -> &str;

    fn clear_name(&mut self);

    /// Remove every occurrence of a variable that is being deleted.
    fn delete_variable(&mut self, variable: VariableId);

    /// First NaN or infinite coefficient/offset in the record, if any.
    /// Bounds may be infinite and are not checked.
    fn invalid_coefficient(&self) -> Option<f64> {
        None
    }

    /// Why the record's parts do not fit together, if they don't.
    fn shape_error(&self) -> Option<String> {
        None
    }
}

/// Changes to one family since a tracker checkpoint.
///
/// Records are immutable once added, so only deletions of constraints that
/// existed at the checkpoint need remembering.
#[derive(Debug, Clone)]
pub struct AtomicConstraintDiff<I> {
    checkpoint: I,
    deleted: BTreeSet<I>,
}

impl<I: EntityId> AtomicConstraintDiff<I> {
    pub fn new(checkpoint: I) -> Self {
        Self {
            checkpoint,
            deleted: BTreeSet::new(),
        }
    }

    pub fn checkpoint(&self) -> I {
        self.checkpoint
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AtomicConstraintStore<F: ConstraintFamily> {
    constraints: EntityTable<F::Id, F>,
    by_variable: HashMap<VariableId, BTreeSet<F::Id>>,
}

impl<F: ConstraintFamily> AtomicConstraintStore<F> {
    pub fn new() -> Self {
        Self {
            constraints: EntityTable::new(),
            by_variable: HashMap::new(),
        }
    }

    pub fn add(&mut self, data: F) -> F::Id {
        let related = data.related_variables();
        let id = self.constraints.add(data);
        for variable in related {
            self.by_variable.entry(variable).or_default().insert(id);
        }
        id
    }

    pub fn delete<'a>(
        &mut self,
        id: F::Id,
        diffs: impl IntoIterator<Item = &'a mut AtomicConstraintDiff<F::Id>>,
    ) -> Result<F, ModelError> {
        let data = self.constraints.delete(id)?;
        for variable in data.related_variables() {
            let emptied = match self.by_variable.get_mut(&variable) {
                Some(ids) => {
                    ids.remove(&id);
                    ids.is_empty()
                }
                None => false,
            };
            if emptied {
                self.by_variable.remove(&variable);
            }
        }
        for diff in diffs {
            if id < diff.checkpoint {
                diff.deleted.insert(id);
            }
        }
        Ok(data)
    }

    pub fn data(&self, id: F::Id) -> Result<&F, ModelError> {
        self.constraints.get(id)
    }

    pub fn contains(&self, id: F::Id) -> bool {
        self.constraints.contains(id)
    }

    pub fn size(&self) -> usize {
        self.constraints.len()
    }

    pub fn next_id(&self) -> F::Id {
        self.constraints.next_id()
    }

    pub fn ensure_next_id_at_least(&mut self, id: F::Id) {
        self.constraints.ensure_next_id_at_least(id);
    }

    pub fn ids(&self) -> impl Iterator<Item = F::Id> + '_ {
        self.constraints.ids()
    }

    pub fn sorted_ids(&self) -> Vec<F::Id> {
        self.constraints.sorted_ids()
    }

    /// Constraints of this family that reference `variable`, ascending.
    pub fn related_constraints(&self, variable: VariableId) -> Vec<F::Id> {
        self.by_variable
            .get(&variable)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Strip a deleted variable from every constraint that references it.
    ///
    /// Constraints keep their ids; consumers see the variable deletion and
    /// apply the same stripping on their side, so no diff entry is recorded.
    pub fn delete_variable(&mut self, variable: VariableId) -> Vec<F::Id> {
        let Some(ids) = self.by_variable.remove(&variable) else {
            return Vec::new();
        };
        for id in &ids {
            if let Ok(data) = self.constraints.get_mut(*id) {
                data.delete_variable(variable);
            }
        }
        ids.into_iter().collect()
    }

    pub fn export(&self, remove_names: bool) -> ConstraintSection<F> {
        self.section(&self.sorted_ids(), remove_names)
    }

    pub fn export_update(
        &self,
        diff: &AtomicConstraintDiff<F::Id>,
        remove_names: bool,
    ) -> AtomicConstraintUpdates<F> {
        AtomicConstraintUpdates {
            deleted_ids: diff.deleted.iter().map(|id| id.inner()).collect(),
            new_constraints: self
                .section(&self.constraints.sorted_ids_from(diff.checkpoint), remove_names),
        }
    }

    fn section(&self, ids: &[F::Id], remove_names: bool) -> ConstraintSection<F> {
        let mut section = ConstraintSection::default();
        for id in ids {
            let Ok(data) = self.constraints.get(*id) else {
                continue;
            };
            let mut data = data.clone();
            if remove_names {
                data.clear_name();
            }
            section.ids.push(id.inner());
            section.constraints.push(data);
        }
        section
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut expected: HashMap<VariableId, BTreeSet<F::Id>> = HashMap::new();
        for (id, data) in self.constraints.iter() {
            for variable in data.related_variables() {
                expected.entry(variable).or_default().insert(id);
            }
        }
        assert_eq!(expected, self.by_variable);
    }
}

impl<F: ConstraintFamily> Default for AtomicConstraintStore<F> {
    fn default() -> Self {
        Self::new()
    }
}
