//! Bearer credential handling and signed-out notification.
//!
//! The session owns the persisted bearer token. It does not talk to the
//! identity provider; it only answers "is there a current credential" and
//! "give me the token", and broadcasts the forced sign-out that follows an
//! unauthorized response.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::SecretString;

use crate::diagnostics::DiagnosticSink;
use crate::storage::{Storage, StorageError, StorageExt, keys};
use crate::subscription::{Subscribers, SubscriptionId};

/// Session state shared across the client.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Arc<dyn Storage>,
    diagnostics: DiagnosticSink,
    signed_out: Subscribers<()>,
    /// Set once an unauthorized teardown has fired; reset by `set_token`.
    /// Keeps repeated 401s from stacking sign-out notifications.
    teardown_fired: AtomicBool,
}

impl Session {
    /// Create a session over the given store.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, diagnostics: DiagnosticSink) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                storage,
                diagnostics,
                signed_out: Subscribers::new(),
                teardown_fired: AtomicBool::new(false),
            }),
        }
    }

    /// The current bearer token, if a credential is stored.
    ///
    /// Absence is not an error; unreadable credentials are reported to the
    /// diagnostic sink and treated as absent.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        match self.inner.storage.get_json::<String>(keys::AUTH_TOKEN) {
            Ok(token) => token.map(SecretString::from),
            Err(e) => {
                self.inner.diagnostics.report("credential read", &e);
                None
            }
        }
    }

    /// Whether a credential is currently stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Store a new bearer token.
    ///
    /// Re-arms the unauthorized teardown for the new credential.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails. Credential writes are
    /// correctness-critical and never swallowed.
    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.inner
            .storage
            .put_json(keys::AUTH_TOKEN, &token.to_string())?;
        self.inner.teardown_fired.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Remove the stored bearer token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the removal fails.
    pub fn clear_token(&self) -> Result<(), StorageError> {
        self.inner.storage.remove(keys::AUTH_TOKEN)
    }

    /// Register a callback invoked when the session is forcibly signed out.
    pub fn on_signed_out(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.signed_out.subscribe(move |_| callback())
    }

    /// Remove a signed-out callback.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.signed_out.unsubscribe(id)
    }

    /// Tear down the session after an unauthorized response.
    ///
    /// Clears the credential and notifies signed-out subscribers exactly
    /// once per failure; repeat calls are no-ops until a new token is
    /// stored.
    pub(crate) fn handle_unauthorized(&self) {
        if self.inner.teardown_fired.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!("unauthorized response, clearing credential");
        if let Err(e) = self.clear_token() {
            // The caller is already receiving the unauthorized error; a
            // failed clear still leaves the session unusable, so record it
            // rather than masking the original failure.
            self.inner.diagnostics.report("credential clear", &e);
        }

        self.inner.signed_out.notify(&());
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
