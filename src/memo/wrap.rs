// Higher-order memoization helpers.
// Turn a plain function into a cached replacement with the same call shape.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::cached::{Cached, CachedByKey};
use super::cached_async::{CachedAsync, CachedByKeyAsync};
use super::epoch::CacheController;

/// Wrap `original` so its result is computed once per epoch of `controller`.
///
/// The argument is passed through on a miss but never inspected by the cache.
pub fn memoize<A, T, F>(
    controller: &CacheController,
    original: F,
) -> impl Fn(A) -> T + use<A, T, F>
where
    T: Clone,
    F: Fn(A) -> T,
{
    let cached = Cached::new(controller);
    move |args: A| cached.get_with(|| original(args))
}

/// Wrap `original` so its result is computed once per key and epoch.
///
/// Trailing arguments are passed through on a miss and do not affect lookups.
pub fn memoize_by_key<A, T, F>(
    controller: &CacheController,
    original: F,
) -> impl Fn(&str, A) -> T + use<A, T, F>
where
    T: Clone,
    F: Fn(&str, A) -> T,
{
    let cached: CachedByKey<String, T> = CachedByKey::new(controller);
    move |key: &str, args: A| cached.get_with(key, |key| original(key, args))
}

/// Asynchronous form of [`memoize`] for fallible computations.
pub fn memoize_async<A, T, E, F, Fut>(
    controller: &CacheController,
    original: F,
) -> impl Fn(A) -> BoxFuture<'static, Result<T, E>> + use<A, T, E, F, Fut>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let cached = Arc::new(CachedAsync::new(controller));
    let original = Arc::new(original);
    move |args: A| {
        let cached = cached.clone();
        let original = original.clone();
        async move { cached.try_get_with(move || original(args)).await }.boxed()
    }
}

/// Asynchronous form of [`memoize_by_key`] for fallible computations.
pub fn memoize_by_key_async<K, A, T, E, F, Fut>(
    controller: &CacheController,
    original: F,
) -> impl Fn(K, A) -> BoxFuture<'static, Result<T, E>> + use<K, A, T, E, F, Fut>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(&K, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let cached: Arc<CachedByKeyAsync<K, T, E>> = Arc::new(CachedByKeyAsync::new(controller));
    let original = Arc::new(original);
    move |key: K, args: A| {
        let cached = cached.clone();
        let original = original.clone();
        async move {
            cached
                .try_get_with::<K, _, _>(&key, move |key| original(key, args))
                .await
        }
        .boxed()
    }
}
