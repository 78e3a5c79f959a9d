//! Store-through response cache.
//!
//! Keys are a pure function of (path, params): the same logical request maps
//! to the same key no matter how the caller ordered the parameters. Entries
//! are overwritten on every successful read; there is no TTL and no
//! versioning - the cache answers "what did this request last return", not
//! "is this still current".

use std::sync::Arc;

use moka::future::Cache;
use serde_json::Value;

use crate::diagnostics::DiagnosticSink;
use crate::storage::{Storage, keys};

/// Derive the cache key for a request.
///
/// Parameter names are sorted before serializing, so object-key ordering at
/// the call site cannot produce distinct keys for the same request.
#[must_use]
pub fn cache_key(path: &str, params: &[(&str, &str)]) -> String {
    let path = path.trim_start_matches('/');
    if params.is_empty() {
        return path.to_string();
    }

    let mut sorted = params.to_vec();
    sorted.sort_unstable();

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish();
    format!("{path}?{query}")
}

/// Two-level response cache: `moka` in memory, device storage behind it.
///
/// Cheaply cloneable; clones share both levels.
#[derive(Clone)]
pub struct ResponseCache {
    memory: Cache<String, Value>,
    storage: Arc<dyn Storage>,
    diagnostics: DiagnosticSink,
}

impl ResponseCache {
    /// Create a cache with the given in-memory capacity.
    #[must_use]
    pub fn new(capacity: u64, storage: Arc<dyn Storage>, diagnostics: DiagnosticSink) -> Self {
        Self {
            memory: Cache::builder().max_capacity(capacity).build(),
            storage,
            diagnostics,
        }
    }

    /// Look up the last-known-good payload for `key`.
    ///
    /// Misses the memory front, then falls through to persistent storage
    /// (warming the front on a hit). Storage read failures are reported and
    /// treated as a miss - the cache is best-effort.
    pub async fn lookup(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.memory.get(key).await {
            return Some(value);
        }

        match self.storage.get(&storage_key(key)) {
            Ok(Some(value)) => {
                self.memory.insert(key.to_string(), value.clone()).await;
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                self.diagnostics.report("response-cache read", &e);
                None
            }
        }
    }

    /// Store a successful payload under `key`, overwriting any prior entry.
    ///
    /// The memory front is updated synchronously; the persistent write runs
    /// as a detached task whose failure goes to the diagnostic sink, never
    /// to the caller.
    pub async fn store(&self, key: &str, value: &Value) {
        self.memory.insert(key.to_string(), value.clone()).await;

        let storage = Arc::clone(&self.storage);
        let diagnostics = self.diagnostics.clone();
        let persisted_key = storage_key(key);
        let value = value.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.put(&persisted_key, &value) {
                diagnostics.report("response-cache write", &e);
            }
        });
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.memory.entry_count())
            .finish()
    }
}

fn storage_key(key: &str) -> String {
    format!("{}{key}", keys::RESPONSE_CACHE_PREFIX)
}
