//! Store identity and store-bound entity handles.

use std::sync::atomic::{AtomicU64, Ordering};

use optstore_ids::EntityId;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tag identifying one [`crate::ModelStore`].
///
/// Tags are drawn from a global counter and never reused, so two stores
/// (including a store and its clone) always compare unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the inner u64 value.
    pub fn inner(self) -> u64 {
        self.0
    }
}

/// An entity index bound to the store that issued it.
///
/// Handles can only be minted by a store, so ownership can be checked in O(1)
/// with [`crate::ModelStore::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle<I> {
    store: StoreId,
    id: I,
}

impl<I: EntityId> Handle<I> {
    pub(crate) fn new(store: StoreId, id: I) -> Self {
        Self { store, id }
    }

    /// The store that minted this handle.
    pub fn store(&self) -> StoreId {
        self.store
    }

    /// The raw index, without any ownership check.
    pub fn id(&self) -> I {
        self.id
    }
}
