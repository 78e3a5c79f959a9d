//! Diagnostic sink for background and best-effort failures.
//!
//! Cache persistence, history writes, and corrupt-blob recoveries are not
//! allowed to fail a user-facing operation, but silently dropping them makes
//! the failure mode invisible. Every such failure is logged and retained
//! here so callers (and tests) can observe what went wrong.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

/// A single captured background failure.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// Where the failure happened (e.g., "response-cache write").
    pub context: String,
    /// The rendered error.
    pub message: String,
    /// When it was captured.
    pub at: DateTime<Utc>,
}

/// Collects background failures that must not surface to callers.
///
/// Cheaply cloneable; all clones share the same event list.
#[derive(Clone, Default)]
pub struct DiagnosticSink {
    inner: Arc<SinkInner>,
}

#[derive(Default)]
struct SinkInner {
    events: Mutex<Vec<DiagnosticEvent>>,
    notify: Notify,
}

impl DiagnosticSink {
    /// Create a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a background failure.
    ///
    /// Logs at warn level and retains the event for inspection.
    pub fn report(&self, context: &str, error: &dyn fmt::Display) {
        let message = error.to_string();
        tracing::warn!(context = %context, error = %message, "background operation failed");

        let mut events = self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        events.push(DiagnosticEvent {
            context: context.to_string(),
            message,
            at: Utc::now(),
        });
        drop(events);

        self.inner.notify.notify_waiters();
    }

    /// Snapshot of all captured events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether nothing has been reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Wait until at least `count` events have been captured.
    ///
    /// Used by tests to observe detached background tasks without sleeping.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.inner.notify.notified();
            if self.events().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("events", &self.events().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_retains_events() {
        let sink = DiagnosticSink::new();
        assert!(sink.is_empty());

        sink.report("unit-test", &"disk full");
        sink.report("unit-test", &"still full");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].context, "unit-test");
        assert_eq!(events[0].message, "disk full");
    }

    #[tokio::test]
    async fn test_wait_for_sees_reports_from_tasks() {
        let sink = DiagnosticSink::new();
        let background = sink.clone();
        tokio::spawn(async move {
            background.report("task", &"boom");
        });

        sink.wait_for(1).await;
        assert_eq!(sink.events().len(), 1);
    }
}
