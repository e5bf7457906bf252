//! Crash-safe snapshot files for the file-backed store.
//!
//! A snapshot is written to a temporary file in the target directory and
//! renamed over the old one, so a reader never observes a half-written
//! snapshot even if the process dies mid-write.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{PersistenceError, Result};

/// Writes `data` to `path` via temp file + rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| PersistenceError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    // Same directory so the rename never crosses filesystems
    let mut temp_file =
        tempfile::NamedTempFile::new_in(dir).map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .write_all(data)
        .and_then(|_| temp_file.as_file().sync_all())
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

/// Reads a JSON snapshot, returning `None` if the file doesn't exist yet.
pub fn read_json_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::ReadError {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(Some(serde_json::from_slice(&data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.json");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/store/kv.json");

        atomic_write(&path, b"{}").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_snapshot_json_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.json");

        let mut snapshot = BTreeMap::new();
        snapshot.insert("tg:mode:1".to_string(), "notes".to_string());

        atomic_write(&path, &serde_json::to_vec(&snapshot).unwrap()).unwrap();
        let loaded: Option<BTreeMap<String, String>> = read_json_optional(&path).unwrap();

        assert_eq!(loaded, Some(snapshot));
    }

    #[test]
    fn test_read_json_optional_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let result: Option<BTreeMap<String, String>> = read_json_optional(&path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_json_optional_corrupt_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.json");
        fs::write(&path, b"{not json").unwrap();

        let result: Result<Option<BTreeMap<String, String>>> = read_json_optional(&path);
        assert!(matches!(result, Err(PersistenceError::SerializeError(_))));
    }
}
