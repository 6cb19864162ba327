// Cache store for reading and writing downloaded metadata.
// Handles JSON parsing, freshness checks, and filesystem operations.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read(path)?;
    Ok(serde_json::from_slice(&contents)?)
}

/// Parse a JSON file, returning None if it does not exist.
pub fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path) {
        Ok(contents) => Ok(Some(serde_json::from_slice(&contents)?)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write raw bytes to the cache.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Get the modification time of a cache file, if it exists.
pub fn modified_at(path: &Path) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.modified()?)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Whether a cache file exists and was written less than `max_age` ago.
pub fn is_fresh(path: &Path, max_age: Duration) -> Result<bool> {
    let Some(modified) = modified_at(path)? else {
        return Ok(false);
    };

    // A timestamp in the future counts as just written.
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    Ok(age < max_age)
}

/// Delete a cached directory and all contents; a missing directory is fine.
pub fn delete_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_and_read_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("test.json");

        write_bytes(&path, br#"{"name":"test","value":42}"#).unwrap();

        let data: TestData = read_json(&path).unwrap();
        assert_eq!(
            data,
            TestData {
                name: "test".to_string(),
                value: 42
            }
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let data: Option<TestData> = read_json_if_exists(&path).unwrap();
        assert!(data.is_none());
        assert!(read_json::<TestData>(&path).unwrap_err().is_not_found());
    }

    #[test]
    fn test_is_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("versions.json");

        assert!(!is_fresh(&path, Duration::from_secs(60)).unwrap());

        write_bytes(&path, b"[]").unwrap();
        assert!(is_fresh(&path, Duration::from_secs(60)).unwrap());
        assert!(!is_fresh(&path, Duration::ZERO).unwrap());
    }

    #[test]
    fn test_delete_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("version").join("1.19.2");
        write_bytes(&dir.join("version.json"), b"{}").unwrap();
        assert!(dir.is_dir());

        delete_dir(&dir).unwrap();
        assert!(!dir.exists());
        delete_dir(&dir).unwrap();
    }
}
