// Game metadata entry point.
// Downloads, stores and memoizes the versions index and per-version summaries.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

use crate::cache::{archive, paths, store};
use crate::config::MetaConfig;
use crate::error::{MetaError, Result};
use crate::memo::{CacheController, CachedAsync, CachedByKeyAsync};

use super::client::MetaClient;
use super::summary::SummaryData;
use super::types::Version;

/// Cached access to the upstream metadata.
///
/// Results are memoized in memory per cache epoch and backed by files under
/// [`MetaConfig::data_dir`]. [`GameMeta::clear_cache`] removes both.
pub struct GameMeta {
    inner: Arc<Inner>,
    versions: CachedAsync<Arc<Vec<Version>>, MetaError>,
    summaries: CachedByKeyAsync<String, Arc<SummaryData>, MetaError>,
}

struct Inner {
    config: MetaConfig,
    client: MetaClient,
    controller: CacheController,
}

impl GameMeta {
    /// Create a source bound to the process-wide cache domain.
    pub fn new(config: MetaConfig) -> Result<Self> {
        Self::with_controller(config, CacheController::global())
    }

    /// Create a source bound to `controller`.
    pub fn with_controller(config: MetaConfig, controller: CacheController) -> Result<Self> {
        let client = MetaClient::new(&config)?;
        Ok(Self {
            versions: CachedAsync::new(&controller),
            summaries: CachedByKeyAsync::new(&controller),
            inner: Arc::new(Inner {
                config,
                client,
                controller,
            }),
        })
    }

    pub fn config(&self) -> &MetaConfig {
        &self.inner.config
    }

    pub fn controller(&self) -> &CacheController {
        &self.inner.controller
    }

    /// Delete every downloaded file and invalidate all memoized results of
    /// this cache domain.
    pub async fn clear_cache(&self) -> Result<()> {
        let data_dir = self.inner.config.data_dir.clone();
        info!(dir = %data_dir.display(), "clearing metadata cache");
        remove_dir(data_dir).await?;
        self.inner.controller.invalidate();
        Ok(())
    }

    /// All known versions, newest first as published upstream.
    pub async fn load_versions(&self) -> Result<Arc<Vec<Version>>> {
        let inner = self.inner.clone();
        self.versions
            .try_get_with(|| async move { inner.load_versions().await.map(Arc::new) })
            .await
    }

    /// Summary data of `version`, downloaded on first use.
    pub async fn load_version_summary(&self, version: &str) -> Result<Arc<SummaryData>> {
        paths::validate_version(version)?;
        let inner = self.inner.clone();
        self.summaries
            .try_get_with(version, |version| {
                let version = version.to_string();
                async move { inner.load_version_summary(version).await.map(Arc::new) }
            })
            .await
    }
}

impl Inner {
    async fn load_versions(&self) -> Result<Vec<Version>> {
        let versions_file = paths::versions_path(&self.config.data_dir);
        let max_age = self.config.max_versions_age;

        let path = versions_file.clone();
        let reused = tokio::task::spawn_blocking(move || -> Result<Option<Vec<Version>>> {
            if !store::is_fresh(&path, max_age)? {
                return Ok(None);
            }
            store::read_json_if_exists(&path)
        })
        .await??;
        if let Some(versions) = reused {
            debug!(file = %versions_file.display(), "reusing downloaded version data");
            return Ok(versions);
        }

        let compressed = self.client.fetch_versions().await?;
        let versions = tokio::task::spawn_blocking(move || -> Result<Vec<Version>> {
            let json = gunzip(&compressed)?;
            let versions = serde_json::from_slice(&json)?;
            store::write_bytes(&versions_file, &json)?;
            Ok(versions)
        })
        .await??;

        info!(count = versions.len(), "downloaded version data");
        Ok(versions)
    }

    async fn load_version_summary(&self, version: String) -> Result<SummaryData> {
        let dir = paths::version_dir(&self.config.data_dir, &version)?;
        let extracted = tokio::fs::metadata(&dir).await.is_ok_and(|meta| meta.is_dir());
        if extracted {
            debug!(version, dir = %dir.display(), "reusing extracted summary");
            return Ok(SummaryData::new(version, dir, &self.controller));
        }

        let files = match self.download_summary(&version, &dir).await {
            Ok(files) => files,
            Err(err) => {
                warn!(version, error = %err, "summary download failed");
                if let Err(cleanup) = remove_dir(dir).await {
                    warn!(version, error = %cleanup, "could not remove partial summary");
                }
                return Err(err);
            }
        };

        info!(version, files, "downloaded version summary");
        Ok(SummaryData::new(version, dir, &self.controller))
    }

    async fn download_summary(&self, version: &str, dir: &Path) -> Result<usize> {
        tokio::fs::create_dir_all(dir).await?;
        let tarball = self.client.fetch_summary_archive(version).await?;
        let dest = dir.to_path_buf();
        tokio::task::spawn_blocking(move || archive::extract_summary(&tarball, &dest)).await?
    }
}

async fn remove_dir(dir: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || store::delete_dir(&dir)).await?
}

fn gunzip(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut json = Vec::new();
    GzDecoder::new(compressed).read_to_end(&mut json)?;
    Ok(json)
}
