// Summary archive extraction.
// Unpacks the files of a gzipped summary tarball that the metadata views read.

use std::fs;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, warn};

use crate::error::{MetaError, Result};

/// Extract a `.tar.gz` summary archive into `dest`.
///
/// The top-level directory of every entry is stripped. Only `version.json`
/// and `*.min.json` files are kept, except the nested versions list, which is
/// served separately. Returns the number of files written.
pub fn extract_summary(archive: &[u8], dest: &Path) -> Result<usize> {
    let mut archive = Archive::new(GzDecoder::new(archive));
    let mut extracted = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.into_owned();
        let Some(relative) = strip_root(&path) else {
            warn!(path = %path.display(), "skipping archive entry outside the summary root");
            continue;
        };
        if !is_summary_file(&relative) {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
        extracted += 1;
    }

    if extracted == 0 {
        return Err(MetaError::Archive("no summary files in archive".to_string()));
    }

    debug!(files = extracted, dest = %dest.display(), "extracted summary archive");
    Ok(extracted)
}

/// Drop the leading directory of an entry path, rejecting anything that is
/// not a plain relative path below it.
fn strip_root(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(_)) => {}
        _ => return None,
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    (!relative.as_os_str().is_empty()).then_some(relative)
}

/// Filter applied to stripped entry paths.
fn is_summary_file(relative: &Path) -> bool {
    let name = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/");

    name == "version.json" || (name.ends_with(".min.json") && name != "versions/data.min.json")
}
