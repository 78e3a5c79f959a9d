//! Client state shared across the application.
//!
//! One `ClientState` is constructed at startup and passed (not ambient) to
//! the parts of the UI tree that need it. It wires storage, session, API
//! client, and stores together, including the session-to-cart link: a
//! forced sign-out drops the cart back to guest mode.

use std::sync::Arc;

use thiserror::Error;

use orchard_core::CategoryId;

use crate::api::{ApiClient, ApiError};
use crate::basket::BasketStore;
use crate::cart::CartStore;
use crate::config::ClientConfig;
use crate::diagnostics::DiagnosticSink;
use crate::history::SearchHistory;
use crate::session::Session;
use crate::storage::{FileStorage, Storage, StorageError};

/// Error creating the client state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Device storage could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// HTTP client could not be built.
    #[error("API client error: {0}")]
    Api(#[from] ApiError),
}

/// Application state shared across the client.
///
/// Cheaply cloneable via `Arc`; all clones share the same stores.
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<ClientStateInner>,
}

struct ClientStateInner {
    config: ClientConfig,
    storage: Arc<dyn Storage>,
    diagnostics: DiagnosticSink,
    session: Session,
    api: ApiClient,
    cart: CartStore,
    history: SearchHistory,
}

impl ClientState {
    /// Create the client state over file storage in the configured data
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the data directory or HTTP client cannot be
    /// set up.
    pub fn new(config: ClientConfig) -> Result<Self, StateError> {
        let storage = Arc::new(FileStorage::new(&config.data_dir)?);
        Self::with_storage(config, storage)
    }

    /// Create the client state over an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the HTTP client cannot be built.
    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, StateError> {
        let diagnostics = DiagnosticSink::new();
        let session = Session::new(Arc::clone(&storage), diagnostics.clone());
        let api = ApiClient::new(
            &config,
            Arc::clone(&storage),
            session.clone(),
            diagnostics.clone(),
        )?;
        let cart = CartStore::new(api.clone(), Arc::clone(&storage), diagnostics.clone());
        let history = SearchHistory::new(Arc::clone(&storage), diagnostics.clone());

        // A forced sign-out (unauthorized response) drops the cart back to
        // guest mode
        let cart_on_sign_out = cart.clone();
        session.on_signed_out(move || cart_on_sign_out.sign_out());

        Ok(Self {
            inner: Arc::new(ClientStateInner {
                config,
                storage,
                diagnostics,
                session,
                api,
                cart,
                history,
            }),
        })
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the device storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Get a reference to the diagnostic sink.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.inner.diagnostics
    }

    /// Get a reference to the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Get a reference to the API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the search history.
    #[must_use]
    pub fn history(&self) -> &SearchHistory {
        &self.inner.history
    }

    /// Open the basket for a category scope.
    #[must_use]
    pub fn basket(&self, scope: CategoryId, label: impl Into<String>) -> BasketStore {
        BasketStore::new(
            scope,
            label,
            Arc::clone(&self.inner.storage),
            &self.inner.diagnostics,
        )
    }
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("base_url", &self.inner.config.api_base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::path::PathBuf;

    #[test]
    fn test_with_storage_wires_shared_state() {
        let config = ClientConfig::new("http://localhost:4000", PathBuf::from("unused")).unwrap();
        let state =
            ClientState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap();

        assert!(!state.session().is_authenticated());
        assert!(!state.cart().is_authenticated());
        assert_eq!(state.cart().summary().count, 0);
    }

    #[test]
    fn test_basket_is_scoped() {
        let config = ClientConfig::new("http://localhost:4000", PathBuf::from("unused")).unwrap();
        let state =
            ClientState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap();

        let basket = state.basket(CategoryId::new("fruit"), "Fruit Box");
        assert_eq!(basket.scope().as_str(), "fruit");
    }
}
