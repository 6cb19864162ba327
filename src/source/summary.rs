// Per-version summary view.
// Lazily loads and memoizes the JSON files of one extracted summary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::{paths, store};
use crate::error::{MetaError, Result};
use crate::memo::{CacheController, CachedAsync};

use super::types::{Blocks, Version};

/// Extracted summary data of one game version.
///
/// Each accessor reads its file once per cache epoch; after the controller is
/// invalidated the next call reads the file again.
pub struct SummaryData {
    version: String,
    path: PathBuf,
    version_info: CachedAsync<Arc<Version>, MetaError>,
    blocks: CachedAsync<Arc<Blocks>, MetaError>,
}

impl SummaryData {
    /// View the summary of `version` extracted at `path`.
    pub fn new(
        version: impl Into<String>,
        path: impl Into<PathBuf>,
        controller: &CacheController,
    ) -> Self {
        Self {
            version: version.into(),
            path: path.into(),
            version_info: CachedAsync::new(controller),
            blocks: CachedAsync::new(controller),
        }
    }

    /// Version identifier this summary belongs to.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory the summary was extracted to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contents of `version.json`.
    pub async fn get_version(&self) -> Result<Arc<Version>> {
        let file = paths::version_file(&self.path);
        self.version_info.try_get_with(|| load_json(file)).await
    }

    /// Contents of `blocks/data.min.json`.
    pub async fn get_blocks(&self) -> Result<Arc<Blocks>> {
        let file = paths::blocks_file(&self.path);
        self.blocks.try_get_with(|| load_json(file)).await
    }
}

impl std::fmt::Debug for SummaryData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryData")
            .field("version", &self.version)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

async fn load_json<T>(file: PathBuf) -> Result<Arc<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let value = tokio::task::spawn_blocking(move || store::read_json::<T>(&file)).await??;
    Ok(Arc::new(value))
}
