//! Cart store with guest and authenticated modes.
//!
//! # Modes
//!
//! - **Guest**: the device blob is the only source of truth. Every mutation
//!   updates in-memory state first, then writes the blob (mutate-then-
//!   persist, so memory stays authoritative during the write). A failed
//!   write propagates - silently losing a cart mutation is a correctness
//!   violation, not a cosmetic one.
//! - **Authenticated**: the server is the only source of truth. Every
//!   mutation is sent to the server and the canonical cart is re-fetched
//!   afterwards, never optimistically applied. Mutations are serialized
//!   through a single-writer queue so two rapid taps cannot interleave
//!   their read-modify-write cycles and lose an update.
//!
//! Signing in merges the guest cart into the server cart; signing out
//! returns to whatever guest blob remains on the device.

pub(crate) mod lines;
pub mod types;

pub use types::{CartLineView, CartState, CartSummary, GuestLine, ServerCart, ServerLine};

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use orchard_core::{ProductId, ProductSnapshot};

use crate::api::{ApiClient, ApiError};
use crate::diagnostics::DiagnosticSink;
use crate::storage::{Storage, StorageError, StorageExt, keys};
use crate::subscription::{Subscribers, SubscriptionId};

/// Errors that can occur mutating the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Backend API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Guest cart blob could not be written.
    #[error("failed to persist cart: {0}")]
    Persist(#[from] StorageError),
}

/// The cart store.
///
/// Constructed once at application start and passed to whatever needs it.
/// Cheaply cloneable; all clones share the same state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: Mutex<CartState>,
    storage: Arc<dyn Storage>,
    api: ApiClient,
    /// Single-writer queue for authenticated mutations.
    mutation: tokio::sync::Mutex<()>,
    subscribers: Subscribers<CartSummary>,
    diagnostics: DiagnosticSink,
}

/// A mutation destined for the server cart.
enum ServerRequest {
    Add { product_id: ProductId, quantity: u32 },
    Remove { product_id: ProductId },
    SetQuantity { product_id: ProductId, quantity: u32 },
    Clear,
}

impl CartStore {
    /// Create a cart store, starting in guest mode from the persisted blob.
    ///
    /// A missing blob is first-run; a corrupt one is reported to the
    /// diagnostic sink and treated as empty.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>, diagnostics: DiagnosticSink) -> Self {
        let items = load_guest_items(storage.as_ref(), &diagnostics);
        Self {
            inner: Arc::new(CartStoreInner {
                state: Mutex::new(CartState::Guest { items }),
                storage,
                api,
                mutation: tokio::sync::Mutex::new(()),
                subscribers: Subscribers::new(),
                diagnostics,
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current aggregates, recomputed fresh.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.lock_state().summary()
    }

    /// Read-only views of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineView> {
        self.lock_state().lines()
    }

    /// Quantity of one product, or 0 - drives the add-button vs. quantity-
    /// stepper decision in the UI.
    #[must_use]
    pub fn item_count(&self, product_id: &ProductId) -> u32 {
        self.lock_state().item_count(product_id)
    }

    /// Whether the store is currently in authenticated (server-synced) mode.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(*self.lock_state(), CartState::Authenticated { .. })
    }

    /// Register a callback invoked with the fresh summary after every state
    /// change.
    pub fn subscribe(
        &self,
        callback: impl Fn(&CartSummary) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.subscribers.subscribe(callback)
    }

    /// Remove a change callback.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product`.
    ///
    /// Merges into an existing line for the same product rather than
    /// appending a second one. Adding zero units is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the guest blob write or the server round-trip
    /// fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &ProductSnapshot, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Ok(());
        }
        if self.is_authenticated() {
            self.server_mutation(ServerRequest::Add {
                product_id: product.id.clone(),
                quantity,
            })
            .await
        } else {
            self.mutate_guest(|items| lines::merge_add(items, product, quantity))
        }
    }

    /// Drop the line for `product_id`. Absent lines are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the guest blob write or the server round-trip
    /// fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), CartError> {
        if self.is_authenticated() {
            self.server_mutation(ServerRequest::Remove {
                product_id: product_id.clone(),
            })
            .await
        } else {
            self.mutate_guest(|items| lines::remove(items, product_id))
        }
    }

    /// Replace the stored quantity for `product_id`; zero removes the line.
    ///
    /// No upper bound is enforced here - stock limits are the server's
    /// concern.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the guest blob write or the server round-trip
    /// fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if self.is_authenticated() {
            let request = if quantity == 0 {
                ServerRequest::Remove {
                    product_id: product_id.clone(),
                }
            } else {
                ServerRequest::SetQuantity {
                    product_id: product_id.clone(),
                    quantity,
                }
            };
            self.server_mutation(request).await
        } else {
            self.mutate_guest(|items| lines::set_quantity(items, product_id, quantity))
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the guest blob write or the server round-trip
    /// fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        if self.is_authenticated() {
            self.server_mutation(ServerRequest::Clear).await
        } else {
            self.mutate_guest(Vec::clear)
        }
    }

    /// Re-fetch the canonical cart view (authenticated mode only).
    ///
    /// Uses the cache-fallback read path: when offline, the cart shows what
    /// we last knew instead of an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the fetch fails and nothing is cached.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), CartError> {
        if !self.is_authenticated() {
            return Ok(());
        }

        let value = self.inner.api.get("cart", &[]).await?;
        let cart: ServerCart = serde_json::from_value(value).map_err(ApiError::Parse)?;
        self.adopt_server_cart(cart);
        Ok(())
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    /// Switch to authenticated mode, merging the guest cart into the server
    /// cart.
    ///
    /// Each guest line is added server-side through the single-writer
    /// queue; the guest blob is cleared only once every add has succeeded,
    /// then the canonical cart is fetched and adopted. On failure the store
    /// stays in guest mode with its blob intact.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if a server add, the blob removal, or the final
    /// fetch fails.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<(), CartError> {
        let _guard = self.inner.mutation.lock().await;

        let guest_items = match &*self.lock_state() {
            CartState::Guest { items } => items.clone(),
            CartState::Authenticated { .. } => return Ok(()),
        };

        for line in &guest_items {
            self.inner
                .api
                .post(
                    "cart/items",
                    &json!({
                        "product_id": line.product.id,
                        "quantity": line.quantity,
                    }),
                )
                .await?;
        }

        // Every line is on the server now; the blob would double-count on
        // the next sign-in if it survived
        self.inner.storage.remove(keys::GUEST_CART)?;

        let cart = self.fetch_canonical().await?;
        let summary = {
            let mut state = self.lock_state();
            *state = CartState::Authenticated { cart };
            state.summary()
        };
        self.inner.subscribers.notify(&summary);
        Ok(())
    }

    /// Switch back to guest mode, reloading whatever blob remains.
    #[instrument(skip(self))]
    pub fn sign_out(&self) {
        let items = load_guest_items(self.inner.storage.as_ref(), &self.inner.diagnostics);
        let summary = {
            let mut state = self.lock_state();
            *state = CartState::Guest { items };
            state.summary()
        };
        self.inner.subscribers.notify(&summary);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a guest mutation: mutate in memory, persist, then notify.
    fn mutate_guest(&self, mutate: impl FnOnce(&mut Vec<GuestLine>)) -> Result<(), CartError> {
        let (persisted, summary) = {
            let mut state = self.lock_state();
            let CartState::Guest { items } = &mut *state else {
                // Mode flipped between dispatch and lock; the server path
                // owns this mutation now
                return Ok(());
            };
            mutate(items);
            let persisted = self.inner.storage.put_json(keys::GUEST_CART, items);
            (persisted, state.summary())
        };

        self.inner.subscribers.notify(&summary);
        persisted.map_err(CartError::Persist)
    }

    /// Send one mutation to the server, then re-fetch the canonical cart.
    async fn server_mutation(&self, request: ServerRequest) -> Result<(), CartError> {
        let _guard = self.inner.mutation.lock().await;

        match request {
            ServerRequest::Add {
                product_id,
                quantity,
            } => {
                self.inner
                    .api
                    .post(
                        "cart/items",
                        &json!({"product_id": product_id, "quantity": quantity}),
                    )
                    .await?;
            }
            ServerRequest::Remove { product_id } => {
                self.inner
                    .api
                    .delete(&format!("cart/items/{product_id}"))
                    .await?;
            }
            ServerRequest::SetQuantity {
                product_id,
                quantity,
            } => {
                self.inner
                    .api
                    .put(
                        &format!("cart/items/{product_id}"),
                        &json!({"quantity": quantity}),
                    )
                    .await?;
            }
            ServerRequest::Clear => {
                self.inner.api.delete("cart").await?;
            }
        }

        let cart = self.fetch_canonical().await?;
        self.adopt_server_cart(cart);
        Ok(())
    }

    /// Fetch the canonical cart, bypassing the cache fallback.
    ///
    /// After a mutation, stale data would silently mask whether the server
    /// actually applied it.
    async fn fetch_canonical(&self) -> Result<ServerCart, CartError> {
        let value = self.inner.api.get_fresh("cart", &[]).await?;
        Ok(serde_json::from_value(value).map_err(ApiError::Parse)?)
    }

    fn adopt_server_cart(&self, cart: ServerCart) {
        let summary = {
            let mut state = self.lock_state();
            match &mut *state {
                CartState::Authenticated { cart: current } => *current = cart,
                // Signed out while the fetch was in flight; the server view
                // no longer applies
                CartState::Guest { .. } => return,
            }
            state.summary()
        };
        self.inner.subscribers.notify(&summary);
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("summary", &self.summary())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Load the guest blob, tolerating first-run and corruption.
fn load_guest_items(storage: &dyn Storage, diagnostics: &DiagnosticSink) -> Vec<GuestLine> {
    match storage.get_json::<Vec<GuestLine>>(keys::GUEST_CART) {
        Ok(Some(items)) => items,
        Ok(None) => Vec::new(),
        Err(e) => {
            diagnostics.report("guest cart load", &e);
            Vec::new()
        }
    }
}
