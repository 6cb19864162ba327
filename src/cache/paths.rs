// Cache path utilities.
// Constructs filesystem paths for the downloaded metadata layout.

use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};

/// Path to the decompressed versions index.
pub fn versions_path(data_dir: &Path) -> PathBuf {
    data_dir.join("versions.json")
}

/// Directory holding every extracted version summary.
pub fn versions_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("version")
}

/// Directory holding the extracted summary of one version.
pub fn version_dir(data_dir: &Path, version: &str) -> Result<PathBuf> {
    validate_version(version)?;
    Ok(versions_dir(data_dir).join(version))
}

/// Path to a summary's version metadata file.
pub fn version_file(summary_dir: &Path) -> PathBuf {
    summary_dir.join("version.json")
}

/// Path to a summary's block state file.
pub fn blocks_file(summary_dir: &Path) -> PathBuf {
    summary_dir.join("blocks").join("data.min.json")
}

/// Check a version identifier before it is used in a path or URL.
///
/// Accepts `[a-zA-Z0-9][a-zA-Z0-9_+.-]+`: at least two characters, starting
/// with an ASCII letter or digit.
pub fn validate_version(version: &str) -> Result<()> {
    let mut chars = version.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && version.len() >= 2
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        Err(MetaError::InvalidVersion(version.to_string()))
    }
}
