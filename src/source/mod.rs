// Game metadata source.
// Client, schema types and memoized views over the downloaded summaries.

pub mod client;
pub mod game_meta;
pub mod summary;
pub mod types;

pub use client::MetaClient;
pub use game_meta::GameMeta;
pub use summary::SummaryData;
pub use types::*;
