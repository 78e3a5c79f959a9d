//! Persistent key-value storage for client state.
//!
//! The device store holds JSON values by string key, with no transactions.
//! Consumers must tolerate missing keys on first run. Two implementations:
//!
//! - [`FileStorage`] - one file per key under the data directory
//! - [`MemoryStorage`] - in-process map for tests and ephemeral use
//!
//! Which writes may fail silently is a property of the *caller*, not of the
//! store: guest-cart and credential writes propagate errors, response-cache
//! and history writes report to the diagnostic sink and continue.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur reading or writing the device store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value was not valid JSON, or a value failed to serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key to JSON value storage.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the stored
    /// bytes are not valid JSON.
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    fn put(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the removal fails.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed convenience methods over [`Storage`].
pub trait StorageExt: Storage {
    /// Read and deserialize the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails or the value does not match
    /// `T`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.put(key, &serde_json::to_value(value)?)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

/// Storage keys for client state.
pub mod keys {
    use orchard_core::CategoryId;

    /// Key for the persisted bearer credential.
    pub const AUTH_TOKEN: &str = "auth:token";

    /// Key for the guest cart blob.
    pub const GUEST_CART: &str = "cart:guest";

    /// Key for the persisted search history list.
    pub const SEARCH_HISTORY: &str = "search:history";

    /// Prefix for response-cache entries.
    pub const RESPONSE_CACHE_PREFIX: &str = "cache:";

    /// Key for a basket blob, one per scope.
    #[must_use]
    pub fn basket(scope: &CategoryId) -> String {
        format!("basket:{scope}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        quantity: u32,
    }

    #[test]
    fn test_typed_round_trip() {
        let storage = MemoryStorage::new();
        let blob = Blob {
            name: "apples".to_string(),
            quantity: 3,
        };

        storage.put_json("test:blob", &blob).unwrap();
        let back: Option<Blob> = storage.get_json("test:blob").unwrap();
        assert_eq!(back, Some(blob));
    }

    #[test]
    fn test_missing_key_is_none() {
        let storage = MemoryStorage::new();
        let value: Option<Blob> = storage.get_json("never:written").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_mismatched_shape_is_error() {
        let storage = MemoryStorage::new();
        storage
            .put("test:blob", &serde_json::json!({"unexpected": true}))
            .unwrap();

        let result: Result<Option<Blob>, _> = storage.get_json("test:blob");
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[test]
    fn test_basket_key_includes_scope() {
        let scope = orchard_core::CategoryId::new("fruit");
        assert_eq!(keys::basket(&scope), "basket:fruit");
    }
}
