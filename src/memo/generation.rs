// Generation-scoped storage shared by all memoizing wrappers.
// Reconciles the stored entries against the controller epoch on every access.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use super::epoch::{CacheController, Epoch};

/// Entries recorded during one epoch.
pub(crate) struct Generation<K, S> {
    pub(crate) epoch: Epoch,
    pub(crate) slots: HashMap<K, S>,
}

/// Storage for one memoized method, bound to one controller.
///
/// `K` is `()` for unkeyed wrappers. `S` is the value itself for synchronous
/// wrappers and a shared pending computation for asynchronous ones.
pub(crate) struct Memo<K, S> {
    controller: CacheController,
    generation: Mutex<Generation<K, S>>,
}

impl<K: Eq + Hash, S> Memo<K, S> {
    pub(crate) fn new(controller: &CacheController) -> Self {
        Self {
            controller: controller.clone(),
            generation: Mutex::new(Generation {
                epoch: controller.epoch(),
                slots: HashMap::new(),
            }),
        }
    }

    pub(crate) fn controller(&self) -> &CacheController {
        &self.controller
    }

    /// Lock the storage, discarding every entry if the epoch moved on.
    pub(crate) fn current(&self) -> MutexGuard<'_, Generation<K, S>> {
        let mut generation = self.generation.lock();
        let epoch = self.controller.epoch();
        if generation.epoch != epoch {
            trace!(dropped = generation.slots.len(), "stale cache generation cleared");
            generation.slots.clear();
            generation.epoch = epoch;
        }
        generation
    }

    /// Current epoch and a copy of the entry for `key`, if any.
    pub(crate) fn lookup<Q>(&self, key: &Q) -> (Epoch, Option<S>)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: Clone,
    {
        let generation = self.current();
        (generation.epoch, generation.slots.get(key).cloned())
    }

    /// Store `value` under `key` if the epoch is still `epoch`.
    ///
    /// An entry written meanwhile wins and is returned instead. A value
    /// computed for an epoch that has since been invalidated is handed back
    /// without being stored.
    pub(crate) fn insert(&self, key: K, epoch: Epoch, value: S) -> S
    where
        S: Clone,
    {
        let mut generation = self.current();
        if generation.epoch != epoch {
            return value;
        }
        generation.slots.entry(key).or_insert(value).clone()
    }

    /// Remove `key` if it still holds the slot matched by `is_same` in `epoch`.
    pub(crate) fn evict_if<Q>(&self, key: &Q, epoch: Epoch, is_same: impl FnOnce(&S) -> bool)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut generation = self.generation.lock();
        if generation.epoch == epoch && generation.slots.get(key).is_some_and(is_same) {
            generation.slots.remove(key);
        }
    }

    /// Number of entries valid in the current epoch.
    pub(crate) fn len(&self) -> usize {
        self.current().slots.len()
    }
}
