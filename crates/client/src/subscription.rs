//! Explicit subscribe/unsubscribe change notification.
//!
//! Stores are constructed once at application start and handed to the parts
//! of the UI that need them; interested parties register callbacks instead
//! of relying on ambient global reactivity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A registry of change callbacks.
pub struct Subscribers<T> {
    entries: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> Subscribers<T> {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback, returning its subscription handle.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if the handle was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Invoke every registered callback with `value`.
    ///
    /// Callbacks must not subscribe or unsubscribe re-entrantly.
    pub fn notify(&self, value: &T) {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, callback) in entries.iter() {
            callback(value);
        }
    }
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Subscribers").field("count", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_subscribe_and_notify() {
        let subscribers = Subscribers::<u32>::new();
        let seen = Arc::new(AtomicU32::new(0));

        let seen_clone = Arc::clone(&seen);
        subscribers.subscribe(move |value| {
            seen_clone.store(*value, Ordering::SeqCst);
        });

        subscribers.notify(&42);
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let subscribers = Subscribers::<u32>::new();
        let calls = Arc::new(AtomicU32::new(0));

        let calls_clone = Arc::clone(&calls);
        let id = subscribers.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        subscribers.notify(&1);
        assert!(subscribers.unsubscribe(id));
        subscribers.notify(&2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Second unsubscribe is a no-op
        assert!(!subscribers.unsubscribe(id));
    }
}
