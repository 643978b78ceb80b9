//! Checkpoint trackers.
//!
//! A tracker is a [`ModelDiff`]: one accumulator per entity kind plus the
//! per-kind boundary it was created (or last advanced) at. The root store
//! fans every mutation out to all live trackers through
//! [`TrackerSet::diffs_mut`].

use std::collections::BTreeMap;

use crate::constraints::AtomicDiffs;
use crate::handle::StoreId;
use crate::model::ModelError;
use crate::storage::{LinearConstraintDiff, ObjectiveDiff, VariableDiff};

/// Identifies one tracker of one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackerId {
    store: StoreId,
    index: u64,
}

impl TrackerId {
    /// The store that created this tracker.
    pub fn store(&self) -> StoreId {
        self.store
    }

    pub fn index(&self) -> u64 {
        self.index
    }
}

impl std::fmt::Display for TrackerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tracker#{}@store#{}", self.index, self.store.inner())
    }
}

/// Everything one tracker has accumulated since its checkpoint.
#[derive(Debug, Clone)]
pub struct ModelDiff {
    pub(crate) variables: VariableDiff,
    pub(crate) objectives: ObjectiveDiff,
    pub(crate) linear_constraints: LinearConstraintDiff,
    pub(crate) atomic: AtomicDiffs,
}

impl ModelDiff {
    pub(crate) fn new(
        variables: VariableDiff,
        objectives: ObjectiveDiff,
        linear_constraints: LinearConstraintDiff,
        atomic: AtomicDiffs,
    ) -> Self {
        Self {
            variables,
            objectives,
            linear_constraints,
            atomic,
        }
    }

    /// True when no change to a checkpointed entity was recorded.
    ///
    /// Entities created after the checkpoint are not tracked here, so an
    /// empty diff does not by itself mean the exported update is empty.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.objectives.is_empty()
            && self.linear_constraints.is_empty()
            && self.atomic.is_empty()
    }
}

/// Live trackers of one store.
#[derive(Debug)]
pub(crate) struct TrackerSet {
    store: StoreId,
    next_index: u64,
    trackers: BTreeMap<u64, ModelDiff>,
}

impl TrackerSet {
    pub(crate) fn new(store: StoreId) -> Self {
        Self {
            store,
            next_index: 0,
            trackers: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, diff: ModelDiff) -> TrackerId {
        let index = self.next_index;
        self.next_index += 1;
        self.trackers.insert(index, diff);
        TrackerId {
            store: self.store,
            index,
        }
    }

    pub(crate) fn get(&self, id: TrackerId) -> Result<&ModelDiff, ModelError> {
        self.check_store(id)?;
        self.trackers
            .get(&id.index)
            .ok_or(ModelError::TrackerDestroyed(id.index))
    }

    pub(crate) fn get_mut(&mut self, id: TrackerId) -> Result<&mut ModelDiff, ModelError> {
        self.check_store(id)?;
        self.trackers
            .get_mut(&id.index)
            .ok_or(ModelError::TrackerDestroyed(id.index))
    }

    pub(crate) fn remove(&mut self, id: TrackerId) -> Result<(), ModelError> {
        self.check_store(id)?;
        self.trackers
            .remove(&id.index)
            .map(|_| ())
            .ok_or(ModelError::TrackerDestroyed(id.index))
    }

    /// Accumulators of every live tracker, for mutation fan-out.
    pub(crate) fn diffs_mut(&mut self) -> impl Iterator<Item = &mut ModelDiff> + '_ {
        self.trackers.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.trackers.len()
    }

    fn check_store(&self, id: TrackerId) -> Result<(), ModelError> {
        if id.store == self.store {
            Ok(())
        } else {
            Err(ModelError::ForeignStorage {
                expected: self.store,
                actual: id.store,
            })
        }
    }
}
