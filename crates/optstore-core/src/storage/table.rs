//! Append-mostly entity table keyed by a typed index.

use std::collections::HashMap;

use optstore_ids::EntityId;

use crate::model::ModelError;

/// Maps a typed index to its data record.
///
/// Ids are issued strictly monotonically and never reused: a deleted id stays
/// below `next_id` forever and every lookup of it fails with `NotFound`.
#[derive(Debug, Clone)]
pub struct EntityTable<I: EntityId, D> {
    entries: HashMap<I, D>,
    next_id: I,
}

impl<I: EntityId, D> EntityTable<I, D> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: I::new(0),
        }
    }

    /// Insert a record under the next free id.
    ///
    /// # Panics
    ///
    /// Panics if the `u64` id space is exhausted. Updates and snapshots
    /// never name `u64::MAX` as a new id, so this is unreachable from wire data.
    pub fn add(&mut self, data: D) -> I {
        let id = self.next_id;
        self.next_id = id.next().expect("entity id space exhausted");
        self.entries.insert(id, data);
        id
    }

    pub fn get(&self, id: I) -> Result<&D, ModelError> {
        self.entries.get(&id).ok_or_else(|| ModelError::not_found(id))
    }

    pub fn get_mut(&mut self, id: I) -> Result<&mut D, ModelError> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| ModelError::not_found(id))
    }

    /// Remove a record, returning it. The id is never issued again.
    pub fn delete(&mut self, id: I) -> Result<D, ModelError> {
        self.entries
            .remove(&id)
            .ok_or_else(|| ModelError::not_found(id))
    }

    pub fn contains(&self, id: I) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The id the next `add` will return.
    pub fn next_id(&self) -> I {
        self.next_id
    }

    /// Raise the allocation counter without creating an entity.
    ///
    /// Lowering is a no-op, so ids can never be reissued through this path.
    pub fn ensure_next_id_at_least(&mut self, id: I) {
        if id > self.next_id {
            self.next_id = id;
        }
    }

    /// Live ids in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.entries.keys().copied()
    }

    pub fn sorted_ids(&self) -> Vec<I> {
        let mut ids: Vec<I> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted live ids greater than or equal to `start`.
    pub fn sorted_ids_from(&self, start: I) -> Vec<I> {
        let span = self.next_id.inner().saturating_sub(start.inner());
        if span <= self.entries.len() as u64 {
            (start.inner()..self.next_id.inner())
                .map(I::new)
                .filter(|id| self.entries.contains_key(id))
                .collect()
        } else {
            let mut ids: Vec<I> = self.entries.keys().copied().filter(|id| *id >= start).collect();
            ids.sort_unstable();
            ids
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &D)> + '_ {
        self.entries.iter().map(|(id, data)| (*id, data))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut D)> + '_ {
        self.entries.iter_mut().map(|(id, data)| (*id, data))
    }
}

impl<I: EntityId, D> Default for EntityTable<I, D> {
    fn default() -> Self {
        Self::new()
    }
}
