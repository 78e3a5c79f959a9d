//! End-to-end tests for the authenticated cart flow.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use rust_decimal::Decimal;

use orchard_client::storage::Storage;
use orchard_core::{CategoryId, CurrencyCode, Price, ProductId, ProductSnapshot};
use orchard_integration_tests::{MockBackend, client_for};

fn snapshot(id: &str, rupees: i64) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(id),
        title: id.to_string(),
        unit_price: Some(Price::new(Decimal::from(rupees), CurrencyCode::INR)),
        category: CategoryId::new("fruit"),
        image_url: None,
    }
}

#[tokio::test]
async fn mutations_refetch_the_canonical_cart() {
    let backend = MockBackend::start().await;
    let (state, _) = client_for(&backend);

    state.session().set_token("tok").unwrap();
    backend.require_token("tok");
    state.cart().sign_in().await.unwrap();

    state.cart().add(&snapshot("p-mango", 0), 2).await.unwrap();

    // The store shows what the server computed, including the price the
    // client never sent
    let items = state.cart().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Alphonso Mango");
    assert_eq!(
        items[0].unit_price.map(|price| price.amount),
        Some(Decimal::new(12000, 2))
    );
    assert_eq!(state.cart().summary().count, 2);
    assert_eq!(backend.cart_quantity("p-mango"), 2);

    state
        .cart()
        .update_quantity(&ProductId::new("p-mango"), 5)
        .await
        .unwrap();
    assert_eq!(backend.cart_quantity("p-mango"), 5);
    assert_eq!(state.cart().summary().count, 5);

    state
        .cart()
        .update_quantity(&ProductId::new("p-mango"), 0)
        .await
        .unwrap();
    assert_eq!(backend.cart_quantity("p-mango"), 0);
    assert!(state.cart().items().is_empty());
}

#[tokio::test]
async fn concurrent_adds_are_serialized() {
    let backend = MockBackend::start().await;
    let (state, _) = client_for(&backend);

    state.session().set_token("tok").unwrap();
    backend.require_token("tok");
    state.cart().sign_in().await.unwrap();

    // The backend's add handler reads, sleeps, then writes; unserialized
    // clients would lose one of these updates
    backend.set_mutation_delay(Duration::from_millis(25));

    let mango = snapshot("p-mango", 0);
    let (first, second) = tokio::join!(
        state.cart().add(&mango, 1),
        state.cart().add(&mango, 1)
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(backend.cart_quantity("p-mango"), 2);
    assert_eq!(state.cart().summary().count, 2);
}

#[tokio::test]
async fn sign_in_merges_the_guest_cart() {
    let backend = MockBackend::start().await;
    let (state, storage) = client_for(&backend);

    // Build up a guest cart first
    state.cart().add(&snapshot("p-mango", 120), 2).await.unwrap();
    state.cart().add(&snapshot("p-banana", 50), 1).await.unwrap();
    assert!(!state.cart().is_authenticated());

    state.session().set_token("tok").unwrap();
    backend.require_token("tok");
    state.cart().sign_in().await.unwrap();

    assert!(state.cart().is_authenticated());
    assert_eq!(backend.cart_quantity("p-mango"), 2);
    assert_eq!(backend.cart_quantity("p-banana"), 1);
    assert_eq!(state.cart().summary().count, 3);

    // The guest blob was consumed by the merge
    assert!(storage.get("cart:guest").unwrap().is_none());
}

#[tokio::test]
async fn failed_merge_leaves_the_guest_cart_intact() {
    let backend = MockBackend::start().await;
    let (state, storage) = client_for(&backend);

    state.cart().add(&snapshot("p-mango", 120), 2).await.unwrap();

    // Credential the backend will reject
    state.session().set_token("bad-token").unwrap();
    backend.require_token("tok");

    let result = state.cart().sign_in().await;
    assert!(result.is_err());

    // Note: the unauthorized teardown flipped the store back to guest mode
    // with its blob intact - nothing was lost
    assert!(!state.cart().is_authenticated());
    assert_eq!(state.cart().summary().count, 2);
    assert!(storage.get("cart:guest").unwrap().is_some());
}

#[tokio::test]
async fn unauthorized_mid_session_drops_back_to_guest() {
    let backend = MockBackend::start().await;
    let (state, _) = client_for(&backend);

    state.session().set_token("tok").unwrap();
    backend.require_token("tok");
    state.cart().sign_in().await.unwrap();
    state.cart().add(&snapshot("p-mango", 0), 1).await.unwrap();

    // Token rotates server-side; the next mutation hits a 401
    backend.require_token("rotated");
    let result = state.cart().add(&snapshot("p-banana", 0), 1).await;
    assert!(result.is_err());

    // Credential cleared, cart back in guest mode (empty - the server cart
    // stays server-side)
    assert!(!state.session().is_authenticated());
    assert!(!state.cart().is_authenticated());
    assert_eq!(state.cart().summary().count, 0);
}
