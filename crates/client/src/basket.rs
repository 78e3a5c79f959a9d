//! Category-scoped basket store.
//!
//! A basket is a device-local line list bound to one category (a curated
//! fruit basket, a weekly vegetable box). Unlike the cart it enforces a
//! domain rule on every add: products outside the basket's scope are
//! rejected outright, before any I/O, with an explanation the UI can show
//! verbatim. This is a hard business invariant, not a soft warning.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::instrument;

use orchard_core::{CategoryId, ProductId, ProductSnapshot};

use crate::cart::types::{CartLineView, CartSummary, GuestLine, summarize};
use crate::cart::lines;
use crate::diagnostics::DiagnosticSink;
use crate::storage::{Storage, StorageError, StorageExt, keys};
use crate::subscription::{Subscribers, SubscriptionId};

/// Errors that can occur mutating a basket.
#[derive(Debug, Error)]
pub enum BasketError {
    /// The product does not belong to this basket's category.
    #[error("{product_title} is not part of the {scope_label} basket")]
    OutOfScope {
        /// Title of the rejected product.
        product_title: String,
        /// Human-readable basket label.
        scope_label: String,
    },

    /// Basket blob could not be written.
    #[error("failed to persist basket: {0}")]
    Persist(#[from] StorageError),
}

/// A category-scoped local basket.
///
/// Cheaply cloneable; all clones share the same state.
#[derive(Clone)]
pub struct BasketStore {
    inner: Arc<BasketStoreInner>,
}

struct BasketStoreInner {
    scope: CategoryId,
    label: String,
    items: Mutex<Vec<GuestLine>>,
    storage: Arc<dyn Storage>,
    subscribers: Subscribers<CartSummary>,
}

impl BasketStore {
    /// Open the basket for `scope`, loading any persisted blob.
    ///
    /// A missing blob is first-run; a corrupt one is reported to the
    /// diagnostic sink and treated as empty.
    #[must_use]
    pub fn new(
        scope: CategoryId,
        label: impl Into<String>,
        storage: Arc<dyn Storage>,
        diagnostics: &DiagnosticSink,
    ) -> Self {
        let items = match storage.get_json::<Vec<GuestLine>>(&keys::basket(&scope)) {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                diagnostics.report("basket load", &e);
                Vec::new()
            }
        };

        Self {
            inner: Arc::new(BasketStoreInner {
                scope,
                label: label.into(),
                items: Mutex::new(items),
                storage,
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// The category this basket is scoped to.
    #[must_use]
    pub fn scope(&self) -> &CategoryId {
        &self.inner.scope
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::OutOfScope`] when the product's category does
    /// not match this basket's scope - checked synchronously, before any
    /// write. Returns [`BasketError::Persist`] if the blob write fails.
    #[instrument(skip(self, product), fields(product_id = %product.id, scope = %self.inner.scope))]
    pub fn add(&self, product: &ProductSnapshot, quantity: u32) -> Result<(), BasketError> {
        if product.category != self.inner.scope {
            return Err(BasketError::OutOfScope {
                product_title: product.title.clone(),
                scope_label: self.inner.label.clone(),
            });
        }
        if quantity == 0 {
            return Ok(());
        }
        self.mutate(|items| lines::merge_add(items, product, quantity))
    }

    /// Drop the line for `product_id`. Absent lines are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `BasketError` if the blob write fails.
    pub fn remove(&self, product_id: &ProductId) -> Result<(), BasketError> {
        self.mutate(|items| lines::remove(items, product_id))
    }

    /// Replace the stored quantity for `product_id`; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `BasketError` if the blob write fails.
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BasketError> {
        self.mutate(|items| lines::set_quantity(items, product_id, quantity))
    }

    /// Empty the basket.
    ///
    /// # Errors
    ///
    /// Returns `BasketError` if the blob write fails.
    pub fn clear(&self) -> Result<(), BasketError> {
        self.mutate(Vec::clear)
    }

    /// Current aggregates, recomputed fresh.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        summarize(&self.items())
    }

    /// Read-only views of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineView> {
        self.lock_items().iter().map(CartLineView::from).collect()
    }

    /// Quantity of one product, or 0.
    #[must_use]
    pub fn item_count(&self, product_id: &ProductId) -> u32 {
        lines::quantity_of(&self.lock_items(), product_id)
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

    fn lock_items(&self) -> std::sync::MutexGuard<'_, Vec<GuestLine>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate in memory, persist, then notify.
    fn mutate(&self, mutate: impl FnOnce(&mut Vec<GuestLine>)) -> Result<(), BasketError> {
        let (persisted, summary) = {
            let mut items = self.lock_items();
            mutate(&mut items);
            let persisted = self
                .inner
                .storage
                .put_json(&keys::basket(&self.inner.scope), &*items);
            let views: Vec<CartLineView> = items.iter().map(CartLineView::from).collect();
            (persisted, summarize(&views))
        };

        self.inner.subscribers.notify(&summary);
        persisted.map_err(BasketError::Persist)
    }
}

impl std::fmt::Debug for BasketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasketStore")
            .field("scope", &self.inner.scope)
            .field("summary", &self.summary())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use orchard_core::{CurrencyCode, Price};
    use rust_decimal::Decimal;

    fn product(id: &str, category: &str) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            title: id.to_string(),
            unit_price: Some(Price::new(Decimal::from(25), CurrencyCode::INR)),
            category: CategoryId::new(category),
            image_url: None,
        }
    }

    fn fruit_basket(storage: Arc<MemoryStorage>) -> BasketStore {
        BasketStore::new(
            CategoryId::new("fruit"),
            "Fruit Box",
            storage,
            &DiagnosticSink::new(),
        )
    }

    #[test]
    fn test_out_of_scope_add_is_rejected_before_write() {
        let storage = Arc::new(MemoryStorage::new());
        // Even a broken store never sees the rejected add
        storage.set_fail_writes(true);

        let basket = fruit_basket(Arc::clone(&storage));
        let result = basket.add(&product("soap", "household"), 1);

        match result {
            Err(BasketError::OutOfScope { product_title, scope_label }) => {
                assert_eq!(product_title, "soap");
                assert_eq!(scope_label, "Fruit Box");
            }
            other => panic!("expected OutOfScope, got {other:?}"),
        }
        assert!(basket.items().is_empty());
    }

    #[test]
    fn test_out_of_scope_message_is_user_visible() {
        let basket = fruit_basket(Arc::new(MemoryStorage::new()));
        let err = basket.add(&product("soap", "household"), 1).unwrap_err();
        assert_eq!(err.to_string(), "soap is not part of the Fruit Box basket");
    }

    #[test]
    fn test_in_scope_adds_merge() {
        let basket = fruit_basket(Arc::new(MemoryStorage::new()));
        let mango = product("mango", "fruit");

        basket.add(&mango, 1).unwrap();
        basket.add(&mango, 2).unwrap();

        assert_eq!(basket.item_count(&mango.id), 3);
        assert_eq!(basket.summary().total, Decimal::from(75));
    }

    #[test]
    fn test_basket_persists_per_scope() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let basket = fruit_basket(Arc::clone(&storage));
            basket.add(&product("mango", "fruit"), 2).unwrap();
        }

        let reopened = fruit_basket(storage);
        assert_eq!(reopened.summary().count, 2);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let basket = fruit_basket(Arc::new(MemoryStorage::new()));
        let mango = product("mango", "fruit");

        basket.add(&mango, 2).unwrap();
        basket.update_quantity(&mango.id, 0).unwrap();
        assert!(basket.items().is_empty());
    }
}
