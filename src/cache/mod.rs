// On-disk cache of downloaded metadata.
// Path layout, file helpers and summary archive extraction.

pub mod archive;
pub mod paths;
pub mod store;

pub use archive::extract_summary;
pub use paths::{validate_version, version_dir, versions_path};
