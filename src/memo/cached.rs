// Synchronous memoizing wrappers.
// Cache the value returned by a plain function until the controller is invalidated.

use std::borrow::Borrow;
use std::convert::Infallible;
use std::hash::Hash;

use super::epoch::CacheController;
use super::generation::Memo;

/// Single-slot cache for a synchronous computation.
///
/// The computation runs once per epoch for single-threaded callers. No lock
/// is held while it runs, so `init` may call back into other wrappers or
/// this one. Threads racing on a miss may each run `init`; the first value
/// stored is the one every caller gets.
pub struct Cached<T> {
    memo: Memo<(), T>,
}

impl<T: Clone> Cached<T> {
    /// Create an empty cache bound to `controller`.
    pub fn new(controller: &CacheController) -> Self {
        Self {
            memo: Memo::new(controller),
        }
    }

    /// Return the cached value, computing it with `init` on a miss.
    pub fn get_with(&self, init: impl FnOnce() -> T) -> T {
        match self.try_get_with(|| Ok::<_, Infallible>(init())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`Cached::get_with`], for a fallible computation.
    ///
    /// An error is returned to the caller and nothing is stored, so the next
    /// call runs `init` again.
    pub fn try_get_with<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let (epoch, cached) = self.memo.lookup(&());
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = init()?;
        Ok(self.memo.insert((), epoch, value))
    }

    /// Whether a value is cached for the current epoch.
    pub fn is_cached(&self) -> bool {
        self.memo.len() > 0
    }

    pub fn controller(&self) -> &CacheController {
        self.memo.controller()
    }
}

/// Per-key cache for a synchronous computation.
///
/// Only the key takes part in lookups. Any further arguments the computation
/// needs are captured by `init` and do not distinguish entries.
pub struct CachedByKey<K, T> {
    memo: Memo<K, T>,
}

impl<K: Eq + Hash, T: Clone> CachedByKey<K, T> {
    /// Create an empty cache bound to `controller`.
    pub fn new(controller: &CacheController) -> Self {
        Self {
            memo: Memo::new(controller),
        }
    }

    /// Return the value cached for `key`, computing it with `init` on a miss.
    pub fn get_with<Q>(&self, key: &Q, init: impl FnOnce(&Q) -> T) -> T
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        match self.try_get_with(key, |key| Ok::<_, Infallible>(init(key))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`CachedByKey::get_with`], for a fallible computation.
    pub fn try_get_with<Q, E>(
        &self,
        key: &Q,
        init: impl FnOnce(&Q) -> Result<T, E>,
    ) -> Result<T, E>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let (epoch, cached) = self.memo.lookup(key);
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = init(key)?;
        Ok(self.memo.insert(key.to_owned(), epoch, value))
    }

    /// Number of keys cached for the current epoch.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn controller(&self) -> &CacheController {
        self.memo.controller()
    }
}
