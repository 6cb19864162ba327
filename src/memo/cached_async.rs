// Asynchronous memoizing wrappers.
// Share one pending computation between concurrent callers and cache its outcome.

use std::any::Any;
use std::borrow::Borrow;
use std::convert::Infallible;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, warn};

use super::epoch::{CacheController, Epoch};
use super::generation::Memo;

/// Result of a stored computation, or the message of the panic that ended it.
type Outcome<T, E> = Result<Result<T, E>, Arc<str>>;

/// A computation that every caller of the same slot awaits together.
type Pending<T, E> = Shared<BoxFuture<'static, Outcome<T, E>>>;

fn start<T, E, Fut>(fut: Fut) -> Pending<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    AssertUnwindSafe(fut)
        .catch_unwind()
        .map(|outcome| outcome.map_err(|payload| panic_message(&*payload)))
        .boxed()
        .shared()
}

fn panic_message(payload: &(dyn Any + Send)) -> Arc<str> {
    if let Some(message) = payload.downcast_ref::<&str>() {
        Arc::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Arc::from(message.as_str())
    } else {
        Arc::from("non-string panic payload")
    }
}

/// Await `pending` and clear its slot unless it succeeded.
///
/// A panic inside the computation is raised again in every caller awaiting it.
async fn settle<K, Q, T, E>(
    memo: &Memo<K, Pending<T, E>>,
    key: &Q,
    epoch: Epoch,
    pending: Pending<T, E>,
) -> Result<T, E>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let outcome = pending.clone().await;
    if !matches!(outcome, Ok(Ok(_))) {
        memo.evict_if(key, epoch, |slot| Shared::ptr_eq(slot, &pending));
    }
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            debug!("cached computation failed, slot re-armed");
            Err(err)
        }
        Err(message) => {
            warn!(%message, "cached computation panicked, slot re-armed");
            panic!("memoized computation panicked: {message}");
        }
    }
}

/// Single-slot cache for an asynchronous computation.
///
/// The future returned by `init` is stored before it is first polled, so
/// callers that arrive while it is still running await the same computation
/// instead of starting another one. A failed computation is dropped from the
/// slot once it resolves and the next call starts over.
///
/// Dropping a caller does not cancel the computation: it stays in the slot
/// and the next caller resumes it. A computation that panics is treated like
/// a failed one, except the panic is re-raised in each caller awaiting it.
pub struct CachedAsync<T, E> {
    memo: Memo<(), Pending<T, E>>,
}

impl<T, E> CachedAsync<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an empty cache bound to `controller`.
    pub fn new(controller: &CacheController) -> Self {
        Self {
            memo: Memo::new(controller),
        }
    }

    /// Return the cached outcome, starting `init` if nothing is cached or
    /// in flight for the current epoch.
    pub async fn try_get_with<F, Fut>(&self, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (epoch, pending) = {
            let mut generation = self.memo.current();
            let pending = generation
                .slots
                .entry(())
                .or_insert_with(|| start(init()))
                .clone();
            (generation.epoch, pending)
        };

        settle(&self.memo, &(), epoch, pending).await
    }

    /// Whether a computation is cached or in flight for the current epoch.
    pub fn is_cached(&self) -> bool {
        self.memo.len() > 0
    }

    pub fn controller(&self) -> &CacheController {
        self.memo.controller()
    }
}

impl<T> CachedAsync<T, Infallible>
where
    T: Clone + Send + Sync + 'static,
{
    /// Infallible form of [`CachedAsync::try_get_with`].
    pub async fn get_with<F, Fut>(&self, init: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        match self.try_get_with(|| init().map(Ok)).await {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

/// Per-key cache for an asynchronous computation.
///
/// Behaves like [`CachedAsync`] for every key independently; invalidation
/// drops every key at once.
pub struct CachedByKeyAsync<K, T, E> {
    memo: Memo<K, Pending<T, E>>,
}

impl<K, T, E> CachedByKeyAsync<K, T, E>
where
    K: Eq + Hash,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an empty cache bound to `controller`.
    pub fn new(controller: &CacheController) -> Self {
        Self {
            memo: Memo::new(controller),
        }
    }

    /// Return the outcome cached for `key`, starting `init` if nothing is
    /// cached or in flight for it in the current epoch.
    pub async fn try_get_with<Q, F, Fut>(&self, key: &Q, init: F) -> Result<T, E>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce(&Q) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (epoch, pending) = {
            let mut generation = self.memo.current();
            let pending = match generation.slots.get(key) {
                Some(pending) => pending.clone(),
                None => {
                    let pending = start(init(key));
                    generation.slots.insert(key.to_owned(), pending.clone());
                    pending
                }
            };
            (generation.epoch, pending)
        };

        settle(&self.memo, key, epoch, pending).await
    }

    /// Number of keys cached or in flight for the current epoch.
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

impl<K, T> CachedByKeyAsync<K, T, Infallible>
where
    K: Eq + Hash,
    T: Clone + Send + Sync + 'static,
{
    /// Infallible form of [`CachedByKeyAsync::try_get_with`].
    pub async fn get_with<Q, F, Fut>(&self, key: &Q, init: F) -> T
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce(&Q) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        match self.try_get_with(key, |key| init(key).map(Ok)).await {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn test_concurrent_callers_share_computation() {
        let controller = CacheController::new();
        let cached: CachedByKeyAsync<String, u64, String> = CachedByKeyAsync::new(&controller);
        let started = Arc::new(AtomicUsize::new(0));

        let load = || {
            let started = started.clone();
            cached.try_get_with("a", move |_| async move {
                let n = started.fetch_add(1, Ordering::SeqCst) as u64;
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(100 + n)
            })
        };

        let (first, second) = tokio::join!(load(), load());
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(first, Ok(100));
        assert_eq!(second, Ok(100));
        assert_eq!(load().await, Ok(100));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pending_is_stored_before_completion() {
        let controller = CacheController::new();
        let cached: CachedAsync<u32, Infallible> = CachedAsync::new(&controller);
        let (tx, rx) = oneshot::channel::<u32>();
        let duplicate = Arc::new(AtomicUsize::new(0));

        let first = cached.get_with(move || async move { rx.await.unwrap_or(0) });
        let second = {
            let duplicate = duplicate.clone();
            cached.get_with(move || async move {
                duplicate.fetch_add(1, Ordering::SeqCst);
                0
            })
        };

        let release = async move {
            tokio::task::yield_now().await;
            let _ = tx.send(5);
        };
        let (a, b, ()) = tokio::join!(first, second, release);
        assert_eq!((a, b), (5, 5));
        assert_eq!(duplicate.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_replayed() {
        let controller = CacheController::new();
        let cached: CachedAsync<u32, String> = CachedAsync::new(&controller);
        let attempts = Arc::new(AtomicUsize::new(0));

        let load = || {
            let attempts = attempts.clone();
            cached.try_get_with(move || async move {
                match attempts.fetch_add(1, Ordering::SeqCst) {
                    0 => Err("unavailable".to_string()),
                    n => Ok(n as u32),
                }
            })
        };

        assert_eq!(load().await, Err("unavailable".to_string()));
        assert!(!cached.is_cached());
        assert_eq!(load().await, Ok(1));
        assert_eq!(load().await, Ok(1));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panic_is_not_replayed() {
        let controller = CacheController::new();
        let cached: CachedAsync<u32, String> = CachedAsync::new(&controller);
        let attempts = Arc::new(AtomicUsize::new(0));

        let load = || {
            let attempts = attempts.clone();
            cached.try_get_with(move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first attempt");
                }
                Ok(7)
            })
        };

        assert!(AssertUnwindSafe(load()).catch_unwind().await.is_err());
        assert!(!cached.is_cached());
        assert_eq!(load().await, Ok(7));
        assert_eq!(load().await, Ok(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_keyed_panic_reaches_all_waiters() {
        let controller = CacheController::new();
        let cached: CachedByKeyAsync<String, u32, Infallible> = CachedByKeyAsync::new(&controller);
        let attempts = Arc::new(AtomicUsize::new(0));

        let load = || {
            let attempts = attempts.clone();
            cached.get_with("k", move |_| async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                if n == 0 {
                    panic!("first attempt");
                }
                n as u32
            })
        };

        let (a, b) = tokio::join!(
            AssertUnwindSafe(load()).catch_unwind(),
            AssertUnwindSafe(load()).catch_unwind()
        );
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(cached.is_empty());

        assert_eq!(load().await, 1);
        assert_eq!(cached.len(), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(&*panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(3_u8);
        assert_eq!(&*panic_message(&*payload), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_concurrent_failure_reaches_all_waiters() {
        let controller = CacheController::new();
        let cached: CachedByKeyAsync<String, u32, String> = CachedByKeyAsync::new(&controller);
        let attempts = Arc::new(AtomicUsize::new(0));

        let load = || {
            let attempts = attempts.clone();
            cached.try_get_with("k", move |key| {
                let key = key.to_string();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Err::<u32, _>(format!("{key} failed"))
                }
            })
        };

        let (a, b) = tokio::join!(load(), load());
        assert_eq!(a, Err("k failed".to_string()));
        assert_eq!(b, Err("k failed".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(cached.is_empty());

        let _ = load().await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_recomputes_every_key() {
        let controller = CacheController::new();
        let cached: CachedByKeyAsync<String, usize, Infallible> =
            CachedByKeyAsync::new(&controller);
        let calls = Arc::new(AtomicUsize::new(0));

        let load = |key: &'static str| {
            let calls = calls.clone();
            cached.get_with(key, move |_| async move { calls.fetch_add(1, Ordering::SeqCst) })
        };

        assert_eq!(load("a").await, 0);
        assert_eq!(load("b").await, 1);
        assert_eq!(load("a").await, 0);

        controller.invalidate();
        assert_eq!(load("a").await, 2);
        assert_eq!(load("b").await, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_invalidate_while_pending() {
        let controller = CacheController::new();
        let cached: CachedAsync<&'static str, Infallible> = CachedAsync::new(&controller);

        let stale = cached.get_with(|| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            "old"
        });
        let invalidate = async {
            tokio::task::yield_now().await;
            controller.invalidate();
        };
        let (old, ()) = tokio::join!(stale, invalidate);
        assert_eq!(old, "old");

        assert_eq!(cached.get_with(|| async { "new" }).await, "new");
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel() {
        let controller = CacheController::new();
        let cached: CachedAsync<u32, Infallible> = CachedAsync::new(&controller);
        let runs = Arc::new(AtomicUsize::new(0));

        {
            let runs = runs.clone();
            let abandoned = cached.get_with(move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                42
            });
            let _ = tokio::time::timeout(Duration::from_millis(1), abandoned).await;
        }

        assert!(cached.is_cached());
        assert_eq!(cached.get_with(|| async { 0 }).await, 42);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
