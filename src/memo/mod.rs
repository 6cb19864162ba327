// Generational memoization.
// Method-level caches that a shared controller invalidates together in constant time.

pub mod cached;
pub mod cached_async;
pub mod epoch;
mod generation;
pub mod wrap;

pub use cached::{Cached, CachedByKey};
pub use cached_async::{CachedAsync, CachedByKeyAsync};
pub use epoch::{CacheController, Epoch};
pub use wrap::{memoize, memoize_async, memoize_by_key, memoize_by_key_async};
