// Metadata source configuration.
// Resolves the data directory, upstream URLs and freshness window.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;

/// Gzipped versions index published on the summary branch.
pub const DEFAULT_VERSIONS_URL: &str =
    "https://raw.githubusercontent.com/misode/mcmeta/summary/versions/data.json.gz";

/// Base URL of the per-version summary tarballs.
pub const DEFAULT_ARCHIVE_URL: &str = "https://codeload.github.com/misode/mcmeta/tar.gz/refs/tags";

/// How long a downloaded versions index is reused: 2 hours.
pub const DEFAULT_MAX_VERSIONS_AGE: Duration = Duration::from_secs(2 * 60 * 60);

/// Where metadata is downloaded from and stored.
#[derive(Debug, Clone)]
pub struct MetaConfig {
    /// Root of the on-disk layout.
    pub data_dir: PathBuf,
    /// URL of the gzipped versions index.
    pub versions_url: String,
    /// Base URL that `<version>-summary` is appended to.
    pub archive_url: String,
    /// Maximum age of `versions.json` before it is downloaded again.
    pub max_versions_age: Duration,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            versions_url: DEFAULT_VERSIONS_URL.to_string(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            max_versions_age: DEFAULT_MAX_VERSIONS_AGE,
        }
    }
}

impl MetaConfig {
    /// Defaults overridden by `MCMETA_CACHE_DIR`, `MCMETA_VERSIONS_URL` and
    /// `MCMETA_ARCHIVE_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os("MCMETA_CACHE_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("MCMETA_VERSIONS_URL") {
            config.versions_url = url;
        }
        if let Ok(url) = std::env::var("MCMETA_ARCHIVE_URL") {
            config.archive_url = url;
        }
        config
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_versions_url(mut self, url: impl Into<String>) -> Self {
        self.versions_url = url.into();
        self
    }

    pub fn with_archive_url(mut self, url: impl Into<String>) -> Self {
        self.archive_url = url.into();
        self
    }

    pub fn with_max_versions_age(mut self, age: Duration) -> Self {
        self.max_versions_age = age;
        self
    }
}

/// Platform cache directory (~/.cache/mcmeta on Linux), or `./temp` when
/// no home directory can be resolved.
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "mcmeta")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("temp"))
}
