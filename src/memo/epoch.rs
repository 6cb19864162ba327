// Epoch tokens and the invalidation controller.
// A controller owns the current epoch; invalidating it mints a fresh one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use tracing::debug;

/// Source of epoch identities for every controller in the process.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(0);

/// Process-wide default cache domain.
static GLOBAL: LazyLock<CacheController> = LazyLock::new(CacheController::new);

/// Opaque cache generation marker.
///
/// Epochs only support equality. Every call to [`Epoch::mint`] yields a value
/// that is distinct from all previously minted epochs, whichever controller
/// asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

impl Epoch {
    fn mint() -> Self {
        Epoch(NEXT_EPOCH.fetch_add(1, Ordering::Relaxed))
    }
}

/// Owner of the current epoch for one cache domain.
///
/// Cloning yields another handle to the same domain. Memoizing wrappers keep
/// a handle and compare their last-seen epoch against [`CacheController::epoch`]
/// on every call, so [`CacheController::invalidate`] costs the same no matter
/// how many wrappers or entries exist.
#[derive(Debug, Clone)]
pub struct CacheController {
    current: Arc<AtomicU64>,
}

impl CacheController {
    /// Create an independent cache domain.
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(Epoch::mint().0)),
        }
    }

    /// Handle to the process-wide default domain.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// The epoch currently in force.
    pub fn epoch(&self) -> Epoch {
        Epoch(self.current.load(Ordering::Acquire))
    }

    /// Replace the current epoch, marking every bound wrapper stale.
    ///
    /// Nothing is cleared here: each wrapper drops its entries the next time
    /// it is called.
    pub fn invalidate(&self) {
        let next = Epoch::mint();
        let previous = self.current.swap(next.0, Ordering::AcqRel);
        debug!(previous, next = next.0, "cache epoch invalidated");
    }

    /// Whether two handles refer to the same domain.
    pub fn same_domain(&self, other: &CacheController) -> bool {
        Arc::ptr_eq(&self.current, &other.current)
    }
}

impl Default for CacheController {
    fn default() -> Self {
        Self::new()
    }
}
