//! Best-effort persisted search history.
//!
//! History is a convenience, never load-bearing: read and write failures
//! go to the diagnostic sink and the feature degrades to empty. Recording
//! a term moves an existing entry to the front rather than duplicating it,
//! and the list is capped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticSink;
use crate::storage::{Storage, StorageExt, keys};

const DEFAULT_CAPACITY: usize = 20;

/// One recorded search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The search term as typed (trimmed).
    pub term: String,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Persisted search history.
///
/// Cheaply cloneable; all clones share the same backing store.
#[derive(Clone)]
pub struct SearchHistory {
    inner: Arc<HistoryInner>,
}

struct HistoryInner {
    storage: Arc<dyn Storage>,
    diagnostics: DiagnosticSink,
    capacity: usize,
}

impl SearchHistory {
    /// Create a history over the given store with the default cap.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, diagnostics: DiagnosticSink) -> Self {
        Self {
            inner: Arc::new(HistoryInner {
                storage,
                diagnostics,
                capacity: DEFAULT_CAPACITY,
            }),
        }
    }

    /// Record a search term.
    ///
    /// Blank terms are ignored. An existing entry for the same term
    /// (case-insensitive) moves to the front with a fresh timestamp.
    pub fn record(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }

        let mut entries = self.entries();
        entries.retain(|entry| !entry.term.eq_ignore_ascii_case(term));
        entries.insert(
            0,
            HistoryEntry {
                term: term.to_string(),
                recorded_at: Utc::now(),
            },
        );
        entries.truncate(self.inner.capacity);

        if let Err(e) = self
            .inner
            .storage
            .put_json(keys::SEARCH_HISTORY, &entries)
        {
            self.inner.diagnostics.report("search history write", &e);
        }
    }

    /// All recorded entries, most recent first.
    ///
    /// Unreadable history degrades to empty.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        match self
            .inner
            .storage
            .get_json::<Vec<HistoryEntry>>(keys::SEARCH_HISTORY)
        {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                self.inner.diagnostics.report("search history read", &e);
                Vec::new()
            }
        }
    }

    /// Forget all recorded searches.
    pub fn clear(&self) {
        if let Err(e) = self.inner.storage.remove(keys::SEARCH_HISTORY) {
            self.inner.diagnostics.report("search history clear", &e);
        }
    }
}

impl std::fmt::Debug for SearchHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHistory")
            .field("entries", &self.entries().len())
            .finish()
    }
}
