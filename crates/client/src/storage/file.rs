//! File-backed storage under the client data directory.
//!
//! One file per key. Keys contain characters that are not filesystem-safe
//! (`/`, `?`, `=` from cache keys), so file names are the SHA-256 of the
//! key. Writes go to a temp file first and are renamed into place so a
//! crash mid-write never leaves a truncated value behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{Storage, StorageError};

/// Key-value store backed by one JSON file per key.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be created.
    pub fn new(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            root: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!("{}.json", hex::encode(digest)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::new(dir.path()).unwrap();
            storage.put("cart:guest", &json!({"items": []})).unwrap();
        }

        let storage = FileStorage::new(dir.path()).unwrap();
        assert_eq!(
            storage.get("cart:guest").unwrap(),
            Some(json!({"items": []}))
        );
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert_eq!(storage.get("absent").unwrap(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.put("k", &json!(true)).unwrap();
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_awkward_keys_map_to_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.put("cache:products?limit=6", &json!(1)).unwrap();
        storage.put("cache:products?limit=12", &json!(2)).unwrap();

        assert_eq!(storage.get("cache:products?limit=6").unwrap(), Some(json!(1)));
        assert_eq!(
            storage.get("cache:products?limit=12").unwrap(),
            Some(json!(2))
        );
    }

    #[test]
    fn test_corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.put("k", &json!(1)).unwrap();
        std::fs::write(storage.path_for("k"), b"not json").unwrap();

        assert!(matches!(storage.get("k"), Err(StorageError::Json(_))));
    }
}
