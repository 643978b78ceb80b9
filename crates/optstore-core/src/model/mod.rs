//! The root model store.
//!
//! [`ModelStore`] owns every entity store and the tracker set, and is the only
//! type collaborators mutate. Operations are split across submodules:
//!
//! - `error`: Model error types
//! - `builder`: adding, deleting and editing entities
//! - `storage`: read access, search by variable and counts
//! - `metadata`: names, placeholders and lookup by name
//! - `tracking`: checkpoint trackers and incremental update export
//! - `snapshot`: full snapshot export and import
//! - `update`: validated application of incremental updates

mod builder;
mod error;
mod metadata;
mod snapshot;
mod storage;
mod tracking;
pub(crate) mod update;

use optstore_ids::{
    AuxiliaryObjectiveId, EntityId, IndicatorConstraintId, LinearConstraintId,
    QuadraticConstraintId, SecondOrderConeConstraintId, Sos1ConstraintId, Sos2ConstraintId,
    VariableId,
};

use crate::constraints::{AtomicConstraints, AtomicFamily};
use crate::constraints::{
    IndicatorConstraint, QuadraticConstraint, SecondOrderConeConstraint, Sos1Constraint,
    Sos2Constraint,
};
use crate::handle::{Handle, StoreId};
use crate::storage::{LinearConstraintStore, ObjectiveStore, VariableStore};
use crate::tracker::TrackerSet;

pub use error::ModelError;
pub use metadata::{
    DELETED_CONSTRAINT_NAME, DELETED_LINEAR_CONSTRAINT_NAME, DELETED_OBJECTIVE_NAME,
    DELETED_VARIABLE_NAME,
};

/// In-memory optimization model with checkpoint/diff tracking.
///
/// Single writer: mutations need `&mut self`. Exporting updates for
/// different trackers only needs `&self` and may run concurrently.
///
/// Methods taking a raw typed id (`VariableId`, `LinearConstraintId`, ...)
/// only check that the id is live in this store; an id carries no owner. Code
/// holding ids from several stores should keep [`Handle`]s and go through
/// [`ModelStore::resolve`] or [`ModelStore::delete`], which reject handles
/// minted by another store with `ForeignStorage`.
#[derive(Debug)]
pub struct ModelStore {
    name: String,
    store_id: StoreId,
    pub(crate) variables: VariableStore,
    pub(crate) objectives: ObjectiveStore,
    pub(crate) linear_constraints: LinearConstraintStore,
    pub(crate) atomic: AtomicConstraints,
    pub(crate) trackers: TrackerSet,
}

impl ModelStore {
    /// Create an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        let store_id = StoreId::fresh();
        Self {
            name: name.into(),
            store_id,
            variables: VariableStore::new(),
            objectives: ObjectiveStore::new(),
            linear_constraints: LinearConstraintStore::new(),
            atomic: AtomicConstraints::default(),
            trackers: TrackerSet::new(store_id),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity tag carried by every handle and tracker this store issues.
    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    /// Deep copy of every entity, including id counters, with no trackers.
    ///
    /// The copy gets a fresh [`StoreId`], so handles and trackers of `self`
    /// are rejected by it.
    pub fn clone_model(&self, new_name: Option<&str>) -> ModelStore {
        let store_id = StoreId::fresh();
        let clone = ModelStore {
            name: new_name.map_or_else(|| self.name.clone(), str::to_string),
            store_id,
            variables: self.variables.clone(),
            objectives: self.objectives.clone(),
            linear_constraints: self.linear_constraints.clone(),
            atomic: self.atomic.clone(),
            trackers: TrackerSet::new(store_id),
        };
        tracing::debug!(
            component = "model",
            operation = "clone_model",
            status = "success",
            source_store = self.store_id.inner(),
            store = store_id.inner(),
            variables = clone.variables.len(),
            "Cloned model"
        );
        clone
    }

    /// Bind a live id to this store.
    pub fn handle<I: StoredEntity>(&self, id: I) -> Result<Handle<I>, ModelError> {
        if I::exists(self, id) {
            Ok(Handle::new(self.store_id, id))
        } else {
            Err(ModelError::not_found(id))
        }
    }

    /// Check a handle's owner and that its entity is still live.
    pub fn resolve<I: StoredEntity>(&self, handle: Handle<I>) -> Result<I, ModelError> {
        if handle.store() != self.store_id {
            return Err(ModelError::ForeignStorage {
                expected: self.store_id,
                actual: handle.store(),
            });
        }
        if I::exists(self, handle.id()) {
            Ok(handle.id())
        } else {
            Err(ModelError::not_found(handle.id()))
        }
    }

    /// Delete the entity behind `handle` after checking its owner.
    ///
    /// Deleting a variable cascades exactly like
    /// [`ModelStore::delete_variable`].
    pub fn delete<I: StoredEntity>(&mut self, handle: Handle<I>) -> Result<(), ModelError> {
        let id = self.resolve(handle)?;
        I::delete(self, id)
    }

    pub(crate) fn ensure_variable_exists(&self, id: VariableId) -> Result<(), ModelError> {
        if self.variables.contains(id) {
            Ok(())
        } else {
            Err(ModelError::not_found(id))
        }
    }
}

/// Id kinds a [`ModelStore`] can hand out [`Handle`]s for.
pub trait StoredEntity: EntityId {
    fn exists(store: &ModelStore, id: Self) -> bool;
    fn delete(store: &mut ModelStore, id: Self) -> Result<(), ModelError>;
}

impl StoredEntity for VariableId {
    fn exists(store: &ModelStore, id: Self) -> bool {
        store.variables.contains(id)
    }

    fn delete(store: &mut ModelStore, id: Self) -> Result<(), ModelError> {
        store.delete_variable(id)
    }
}

impl StoredEntity for LinearConstraintId {
    fn exists(store: &ModelStore, id: Self) -> bool {
        store.linear_constraints.contains(id)
    }

    fn delete(store: &mut ModelStore, id: Self) -> Result<(), ModelError> {
        store.delete_linear_constraint(id)
    }
}

impl StoredEntity for AuxiliaryObjectiveId {
    fn exists(store: &ModelStore, id: Self) -> bool {
        store.objectives.contains(id.into())
    }

    fn delete(store: &mut ModelStore, id: Self) -> Result<(), ModelError> {
        store.delete_auxiliary_objective(id)
    }
}

macro_rules! stored_atomic_entity {
    ($($id:ty => $family:ty),+ $(,)?) => {
        $(
            impl StoredEntity for $id {
                fn exists(store: &ModelStore, id: Self) -> bool {
                    <$family as AtomicFamily>::store(&store.atomic).contains(id)
                }

                fn delete(store: &mut ModelStore, id: Self) -> Result<(), ModelError> {
                    store.delete_constraint::<$family>(id)
                }
            }
        )+
    };
}

stored_atomic_entity! {
    QuadraticConstraintId => QuadraticConstraint,
    SecondOrderConeConstraintId => SecondOrderConeConstraint,
    Sos1ConstraintId => Sos1Constraint,
    Sos2ConstraintId => Sos2Constraint,
    IndicatorConstraintId => IndicatorConstraint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackerId;
    use crate::types::{Bounds, LinearConstraintData, LinearExpression, Sense, VariableData};
    use crate::wire::{ModelSnapshot, ModelUpdate};
    use optstore_ids::ObjectiveId;

    mod cascade;
    mod snapshot_update;
    mod support;
    mod tracking;
}
