// mcmeta: generational memoization and cached game metadata.
// Memoizing wrappers share a controller so one call invalidates all of them.

pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod source;

pub use config::MetaConfig;
pub use error::{MetaError, Result};
pub use memo::{
    CacheController, Cached, CachedAsync, CachedByKey, CachedByKeyAsync, Epoch, memoize,
    memoize_async, memoize_by_key, memoize_by_key_async,
};
pub use source::{BlockStates, Blocks, GameMeta, MetaClient, SummaryData, Version, VersionType};
